use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::model::{AdminConfig, SourcePolicy, SourcePolicyRepository};
use crate::database::RedisDatabase;

/// config held in memory, loaded from a json file on startup (or built directly in tests)
pub struct StaticSourcePolicyRepository {
    config: RwLock<AdminConfig>,
}

impl StaticSourcePolicyRepository {
    pub fn new(config: AdminConfig) -> Self {
        Self {
            config: RwLock::new(config),
        }
    }

    pub async fn from_file(path: &Path) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read source config {}", path.display()))?;

        let config = AdminConfig::from_json(&raw)
            .with_context(|| format!("failed to parse source config {}", path.display()))?;

        info!(
            "loaded {} sources from {}",
            config.source_config.len(),
            path.display()
        );

        Ok(Self::new(config))
    }

    /// swap the whole table, lookups after this see the new config
    pub async fn replace(&self, config: AdminConfig) {
        *self.config.write().await = config;
    }
}

#[async_trait::async_trait]
impl SourcePolicyRepository for StaticSourcePolicyRepository {
    async fn lookup_source_policy(&self, source_key: &str) -> Result<Option<SourcePolicy>> {
        Ok(self.config.read().await.find(source_key))
    }

    async fn health_check(&self) -> Result<f64> {
        Ok(0.0)
    }

    fn backend_name(&self) -> &'static str {
        "static"
    }
}

/// reads the admin config straight out of redis on every lookup, the aggregator ui can flip
/// proxy mode at any point and it should apply to the very next request
pub struct RedisSourcePolicyRepository {
    redis: Arc<RedisDatabase>,
    config_key: String,
}

impl RedisSourcePolicyRepository {
    pub fn new(redis: Arc<RedisDatabase>, config_key: String) -> Self {
        Self { redis, config_key }
    }
}

#[async_trait::async_trait]
impl SourcePolicyRepository for RedisSourcePolicyRepository {
    async fn lookup_source_policy(&self, source_key: &str) -> Result<Option<SourcePolicy>> {
        let Some(raw) = self.redis.get_string(&self.config_key).await? else {
            debug!("no admin config under {}, nothing is proxied", self.config_key);
            return Ok(None);
        };

        let config = AdminConfig::from_json(&raw)
            .with_context(|| format!("admin config under {} is not valid json", self.config_key))?;

        Ok(config.find(source_key))
    }

    async fn health_check(&self) -> Result<f64> {
        self.redis.health_check().await
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}
