// Allow dead_code because each test file is compiled as a separate crate,
// so not all helpers are used in every test file.
#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{ensure, Context, Result};

use zanzi_domain::model::parse;
use zanzi_server::handlers::batch::{BatchCheckItem, BatchCheckRequest, MAX_BATCH_SIZE};
use zanzi_server::handlers::{CheckQuery, TupleKey, WriteRequest};
use zanzi_server::{CheckService, ServerConfig};
use zanzi_storage::MemoryDataStore;

/// Container-platform model: server, projects inside it, and resources inside projects.
pub const LXD_MODEL: &str = include_str!("lxd.fga");

pub const SERVER: &str = "server:lxd";
pub const CERTIFICATE: &str =
    "certificate:eeef45f0570ce713864c86ec60c8d88f60b4844d3a8849b262c77cb18e88394d";
pub const CLUSTER_MEMBER: &str = "cluster_member:node01";
pub const CLUSTER_GROUP: &str = "cluster_group:group01";
pub const STORAGE_POOL: &str = "storage_pool:pool01";
pub const PROJECT: &str = "project:project01";
pub const IMAGE: &str = "image:image01";
pub const INSTANCE: &str = "instance:instance01";
pub const NETWORK: &str = "network:network01";
pub const NETWORK_ACL: &str = "network_acl:network_acl01";
pub const NETWORK_ZONE: &str = "network_zone:network_zone01";
pub const NETWORK_FORWARD: &str = "network_forward:network_forward01";
pub const NETWORK_LOAD_BALANCER: &str = "network_load_balancer:network_load_balancer01";
pub const NETWORK_PEER: &str = "network_peer:network_peer01";
pub const PROFILE: &str = "profile:profile01";
pub const STORAGE_POOL_VOLUME: &str = "storage_pool_volume:storage_pool_volume01";
pub const STORAGE_BUCKET: &str = "storage_bucket:storage_bucket01";

/// Objects whose parent is the project.
pub const PROJECT_CHILDREN: [&str; 11] = [
    IMAGE,
    INSTANCE,
    NETWORK,
    NETWORK_ACL,
    NETWORK_ZONE,
    NETWORK_FORWARD,
    NETWORK_LOAD_BALANCER,
    NETWORK_PEER,
    PROFILE,
    STORAGE_POOL_VOLUME,
    STORAGE_BUCKET,
];

/// Objects whose parent is the server.
pub const SERVER_CHILDREN: [&str; 5] = [CERTIFICATE, CLUSTER_MEMBER, CLUSTER_GROUP, STORAGE_POOL, PROJECT];

/// A relation check on an object and its expected outcome.
pub type Expectation<'a> = (&'a str, &'a str, bool);

/// One service instance seeded with the resource hierarchy.
pub struct Scenario {
    pub service: CheckService<MemoryDataStore>,
    pub model_id: String,
}

impl Scenario {
    /// Writes the model and the public and parent tuples every scenario shares.
    pub async fn setup() -> Result<Self> {
        Self::with_config(&ServerConfig::default()).await
    }

    pub async fn with_config(config: &ServerConfig) -> Result<Self> {
        let service = CheckService::new(MemoryDataStore::new_shared(), config);
        let model = parse(LXD_MODEL).context("parsing model")?;
        let model_id = service.models.write_model(model).await?;

        let scenario = Self { service, model_id };
        let mut seed = vec![("user:*", "user", SERVER)];
        seed.extend(SERVER_CHILDREN.iter().map(|object| (SERVER, "server", *object)));
        seed.extend(PROJECT_CHILDREN.iter().map(|object| (PROJECT, "project", *object)));
        scenario.grant(&seed).await?;
        Ok(scenario)
    }

    /// Writes `(user, relation, object)` tuples.
    pub async fn grant(&self, tuples: &[(&str, &str, &str)]) -> Result<()> {
        let writes = tuples
            .iter()
            .map(|(user, relation, object)| TupleKey::new(*user, *relation, *object))
            .collect();
        self.service.writes.write(&WriteRequest::writes(writes)).await?;
        Ok(())
    }

    /// Deletes `(user, relation, object)` tuples.
    pub async fn revoke(&self, tuples: &[(&str, &str, &str)]) -> Result<()> {
        let deletes = tuples
            .iter()
            .map(|(user, relation, object)| TupleKey::new(*user, *relation, *object))
            .collect();
        self.service.writes.write(&WriteRequest::deletes(deletes)).await?;
        Ok(())
    }

    pub async fn check(&self, user: &str, relation: &str, object: &str) -> Result<bool> {
        let query = CheckQuery::new(user, relation, object).with_model_id(self.model_id.as_str());
        Ok(self.service.checks.check(&query).await?.allowed)
    }

    /// Runs every expectation as a single check and again through batch
    /// checks, reporting all mismatches at once.
    pub async fn assert_checks(&self, user: &str, expected: &[Expectation<'_>]) -> Result<()> {
        let mut mismatches = Vec::new();
        for (relation, object, allowed) in expected {
            let got = self.check(user, relation, object).await?;
            if got != *allowed {
                mismatches.push(format!("{object}#{relation}@{user}: expected {allowed}, got {got}"));
            }
        }

        for chunk in expected.chunks(MAX_BATCH_SIZE) {
            let request = BatchCheckRequest {
                checks: chunk
                    .iter()
                    .map(|(relation, object, _)| BatchCheckItem::new(user, *relation, *object))
                    .collect(),
                authorization_model_id: Some(self.model_id.clone()),
            };
            let response = self.service.batch.check(&request).await?;
            for ((relation, object, allowed), result) in chunk.iter().zip(&response.results) {
                ensure!(result.error.is_none(), "batch item failed: {:?}", result.error);
                if result.allowed != *allowed {
                    mismatches.push(format!(
                        "batch {object}#{relation}@{user}: expected {allowed}, got {}",
                        result.allowed
                    ));
                }
            }
        }

        ensure!(
            mismatches.is_empty(),
            "{} check(s) disagreed:\n{}",
            mismatches.len(),
            mismatches.join("\n")
        );
        Ok(())
    }
}

/// Shared handle for tests that fan out checks across tasks.
pub async fn shared_scenario() -> Result<Arc<Scenario>> {
    Ok(Arc::new(Scenario::setup().await?))
}
