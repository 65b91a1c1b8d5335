use std::sync::Arc;

use payflow_core::{
    Config, DispatchEngine, DispatchSettings, Invoker, PaymentStager, QueueReconciler,
    QueueService, ReconcileSettings, RecordStore, SanitizedConfig, StagingStore,
};

/// Shared application state
pub struct AppState {
    config: Config,
    engine: DispatchEngine,
    reconciler: QueueReconciler,
    stager: PaymentStager,
}

impl AppState {
    /// Wire both handlers and the staging writer over the given collaborators.
    pub fn new(
        config: Config,
        records: Arc<dyn RecordStore>,
        queues: Arc<dyn QueueService>,
        invoker: Arc<dyn Invoker>,
        staging: Arc<dyn StagingStore>,
    ) -> Self {
        let engine = DispatchEngine::new(
            DispatchSettings::from_config(&config),
            records,
            Arc::clone(&queues),
            Arc::clone(&invoker),
        );
        let reconciler =
            QueueReconciler::new(ReconcileSettings::from_config(&config), queues, invoker);
        let stager = PaymentStager::new(staging);

        Self {
            config,
            engine,
            reconciler,
            stager,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn engine(&self) -> &DispatchEngine {
        &self.engine
    }

    pub fn reconciler(&self) -> &QueueReconciler {
        &self.reconciler
    }

    pub fn stager(&self) -> &PaymentStager {
        &self.stager
    }
}
