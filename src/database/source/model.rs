use anyhow::Result;
use mockall::automock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// one entry of the `SourceConfig` array in the admin config. the aggregator writes a lot more
/// than this into each entry, only `key` and `proxyMode` matter for relaying
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceEntry {
    pub key: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub api: Option<String>,
    #[serde(rename = "proxyMode", default)]
    pub proxy_mode: bool,
    #[serde(default)]
    pub disabled: bool,
}

/// the admin config document, everything that isn't the source list is ignored
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminConfig {
    #[serde(rename = "SourceConfig", default)]
    pub source_config: Vec<SourceEntry>,
}

impl AdminConfig {
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// first match wins if a key shows up twice
    pub fn find(&self, source_key: &str) -> Option<SourcePolicy> {
        self.source_config
            .iter()
            .find(|entry| entry.key == source_key)
            .map(SourcePolicy::from)
    }
}

/// read-only view of a source as far as the relay cares
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePolicy {
    pub source_key: String,
    pub proxy_enabled: bool,
}

impl From<&SourceEntry> for SourcePolicy {
    fn from(entry: &SourceEntry) -> Self {
        Self {
            source_key: entry.key.clone(),
            proxy_enabled: entry.proxy_mode,
        }
    }
}

pub type DynSourcePolicyRepository = Arc<dyn SourcePolicyRepository + Send + Sync>;

#[automock]
#[async_trait::async_trait]
pub trait SourcePolicyRepository {
    /// `Ok(None)` means the source isn't configured at all
    async fn lookup_source_policy(&self, source_key: &str) -> Result<Option<SourcePolicy>>;

    /// round trip to the backing store in milliseconds
    async fn health_check(&self) -> Result<f64>;

    fn backend_name(&self) -> &'static str;
}
