//! Wiring of the handlers over one storage backend.

use std::sync::Arc;

use tracing::info;

use zanzi_domain::model::load_model_file;
use zanzi_storage::DataStore;

use crate::config::ServerConfig;
use crate::error::ServerResult;
use crate::handlers::{BatchCheckHandler, CheckHandler, WriteHandler};
use crate::models::ModelRegistry;

/// The check service: model registry plus check, batch check and write handlers.
pub struct CheckService<S: DataStore> {
    pub models: Arc<ModelRegistry<S>>,
    pub checks: Arc<CheckHandler<S>>,
    pub batch: BatchCheckHandler<S>,
    pub writes: WriteHandler<S>,
}

impl<S: DataStore> CheckService<S> {
    /// Builds the handlers over `storage` using the resolver limits in `config`.
    pub fn new(storage: Arc<S>, config: &ServerConfig) -> Self {
        let models = Arc::new(ModelRegistry::new(Arc::clone(&storage)));
        let checks = Arc::new(CheckHandler::new(
            Arc::clone(&storage),
            Arc::clone(&models),
            config.resolver_config(),
        ));
        Self {
            batch: BatchCheckHandler::new(Arc::clone(&checks)),
            writes: WriteHandler::new(storage, Arc::clone(&models)),
            checks,
            models,
        }
    }

    /// Like [`new`](Self::new), then writes the model file named by
    /// `config.model.path`, if any.
    pub async fn bootstrap(storage: Arc<S>, config: &ServerConfig) -> ServerResult<Self> {
        let service = Self::new(storage, config);
        if let Some(path) = &config.model.path {
            let model = load_model_file(path)?;
            let id = service.models.write_model(model).await?;
            info!(path = %path, model_id = %id, "loaded startup model");
        }
        Ok(service)
    }
}
