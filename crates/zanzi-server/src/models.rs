//! Authorization model registry.
//!
//! Models are immutable once written. The registry compiles each model once,
//! keeps the JSON form in the model store and caches the compiled
//! `TypeSystem` by id so concurrent checks share one `Arc`.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, info, instrument};
use ulid::Ulid;

use zanzi_domain::model::{AuthorizationModel, TypeSystem};
use zanzi_storage::{DataStore, StoredAuthorizationModel};

use crate::error::ServerResult;

/// A compiled model together with the id it was stored under.
#[derive(Debug, Clone)]
pub struct ModelSnapshot {
    pub id: String,
    pub type_system: Arc<TypeSystem>,
}

/// Writes models and hands out compiled snapshots.
pub struct ModelRegistry<S: DataStore> {
    storage: Arc<S>,
    compiled: DashMap<String, Arc<TypeSystem>>,
}

impl<S: DataStore> ModelRegistry<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self {
            storage,
            compiled: DashMap::new(),
        }
    }

    /// Compiles and stores `model`, returning its new id.
    ///
    /// Models that fail validation are rejected before anything is stored.
    #[instrument(skip_all, fields(types = model.type_definitions.len()))]
    pub async fn write_model(&self, model: AuthorizationModel) -> ServerResult<String> {
        let model_json = serde_json::to_string(&model)?;
        let schema_version = model.schema_version.clone();
        let type_system = TypeSystem::compile(model)?;

        let id = Ulid::new().to_string();
        self.storage
            .write_authorization_model(StoredAuthorizationModel {
                id: id.clone(),
                schema_version,
                model_json,
                created_at: chrono::Utc::now(),
            })
            .await?;

        self.compiled.insert(id.clone(), Arc::new(type_system));
        info!(model_id = %id, "authorization model written");
        Ok(id)
    }

    /// Returns the model with `id`, or the latest model when `id` is `None`.
    pub async fn get(&self, id: Option<&str>) -> ServerResult<ModelSnapshot> {
        let stored = match id {
            Some(id) => {
                if let Some(type_system) = self.compiled.get(id) {
                    return Ok(ModelSnapshot {
                        id: id.to_string(),
                        type_system: Arc::clone(type_system.value()),
                    });
                }
                self.storage.get_authorization_model(id).await?
            }
            None => self.storage.get_latest_authorization_model().await?,
        };

        if let Some(type_system) = self.compiled.get(&stored.id) {
            return Ok(ModelSnapshot {
                id: stored.id,
                type_system: Arc::clone(type_system.value()),
            });
        }

        debug!(model_id = %stored.id, "compiling stored authorization model");
        let model: AuthorizationModel = serde_json::from_str(&stored.model_json)?;
        let type_system = Arc::new(TypeSystem::compile(model)?);
        let type_system = Arc::clone(
            self.compiled
                .entry(stored.id.clone())
                .or_insert(type_system)
                .value(),
        );
        Ok(ModelSnapshot {
            id: stored.id,
            type_system,
        })
    }
}
