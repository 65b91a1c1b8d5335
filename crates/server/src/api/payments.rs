use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct StageResponse {
    pub staged: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
}

/// Stage a payment event. Always accepted; a failed write is only logged.
pub async fn stage_payment(
    State(state): State<Arc<AppState>>,
    Json(event): Json<Value>,
) -> (StatusCode, Json<StageResponse>) {
    let id = state.stager().stage(event).await;
    (
        StatusCode::ACCEPTED,
        Json(StageResponse {
            staged: id.is_some(),
            id,
        }),
    )
}
