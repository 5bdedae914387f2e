use std::sync::Arc;

use crosspost_core::{
    Config, Extractor, JobRunner, JobStore, SanitizedConfig, UploadTransport,
};

/// Shared application state
pub struct AppState {
    config: Config,
    store: Arc<dyn JobStore>,
    extractor: Arc<dyn Extractor>,
    transport: Arc<dyn UploadTransport>,
    runner: Arc<JobRunner>,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn JobStore>,
        extractor: Arc<dyn Extractor>,
        transport: Arc<dyn UploadTransport>,
        runner: Arc<JobRunner>,
    ) -> Self {
        Self {
            config,
            store,
            extractor,
            transport,
            runner,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn store(&self) -> &dyn JobStore {
        self.store.as_ref()
    }

    pub fn extractor(&self) -> &dyn Extractor {
        self.extractor.as_ref()
    }

    pub fn transport(&self) -> &dyn UploadTransport {
        self.transport.as_ref()
    }

    pub fn runner(&self) -> &Arc<JobRunner> {
        &self.runner
    }
}
