use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use crate::{
    config::AppConfig,
    database::{
        AdminConfig, DynSourcePolicyRepository, RedisDatabase, RedisSourcePolicyRepository,
        StaticSourcePolicyRepository,
    },
};

use super::{
    authorization_services::AuthorizationGate,
    origin_services::{DynOriginFetcher, OriginFetcher},
};

/// everything a relay handler needs, cloned into every request through an `Extension`
#[derive(Clone)]
pub struct RelayServices {
    pub gate: AuthorizationGate,
    pub origin: DynOriginFetcher,
    pub sources: DynSourcePolicyRepository,
    pub config: Arc<AppConfig>,
}

impl RelayServices {
    pub fn new(
        config: Arc<AppConfig>,
        sources: DynSourcePolicyRepository,
        origin: DynOriginFetcher,
    ) -> Self {
        Self {
            gate: AuthorizationGate::new(sources.clone()),
            origin,
            sources,
            config,
        }
    }

    /// wires up the real collaborators from config: redis if there's a url, otherwise the
    /// sources file, otherwise an empty table (every source is a 404)
    pub async fn from_config(config: Arc<AppConfig>) -> anyhow::Result<Self> {
        let sources: DynSourcePolicyRepository = match (&config.redis_url, &config.sources_file) {
            (Some(redis_url), _) => {
                info!("reading source config from redis key {}", config.source_config_key);
                let redis = RedisDatabase::connect(redis_url)
                    .await
                    .context("redis connection for source config failed")?;
                Arc::new(RedisSourcePolicyRepository::new(
                    Arc::new(redis),
                    config.source_config_key.clone(),
                ))
            }
            (None, Some(path)) => Arc::new(StaticSourcePolicyRepository::from_file(path).await?),
            (None, None) => {
                info!("no redis url or sources file, every source will be rejected");
                Arc::new(StaticSourcePolicyRepository::new(AdminConfig::default()))
            }
        };

        let origin = Arc::new(OriginFetcher::new(
            config.upstream_user_agent.clone(),
            config.upstream_timeout(),
        )) as DynOriginFetcher;

        info!("relay services ok");
        Ok(Self::new(config, sources, origin))
    }
}
