//! Trigger endpoints for the dispatch engine and the queue reconciler.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use std::sync::Arc;

use payflow_core::{DispatchOutcome, ReconcileReport, TriggerEvent};

use crate::state::AppState;

/// Error response
#[derive(Debug, Serialize)]
pub struct TriggerErrorResponse {
    pub error: String,
}

/// Serve one change notification or drain signal.
///
/// Eligibility aborts answer 200 with their outcome. A failed invocation has
/// already been compensated and reported when the 500 is returned.
pub async fn get_payments(
    State(state): State<Arc<AppState>>,
    Json(event): Json<TriggerEvent>,
) -> Result<Json<DispatchOutcome>, impl IntoResponse> {
    match state.engine().handle(event).await {
        Ok(outcome) => Ok(Json(outcome)),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(TriggerErrorResponse {
                error: e.to_string(),
            }),
        )),
    }
}

/// Run one queue reconciliation.
pub async fn init_process(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ReconcileReport>, impl IntoResponse> {
    match state.reconciler().run().await {
        Ok(report) => Ok(Json(report)),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(TriggerErrorResponse {
                error: e.to_string(),
            }),
        )),
    }
}
