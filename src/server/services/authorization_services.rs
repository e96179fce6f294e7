use tracing::{debug, error};

use crate::database::DynSourcePolicyRepository;
use crate::server::error::{AppResult, Error};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    MissingParameter,
    SourceNotFound,
    ProxyDisabled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Allowed,
    Rejected(Rejection),
}

impl From<Rejection> for Error {
    fn from(rejection: Rejection) -> Self {
        match rejection {
            Rejection::MissingParameter => Error::MissingParameter("source"),
            Rejection::SourceNotFound => Error::SourceNotFound,
            Rejection::ProxyDisabled => Error::ProxyDisabled,
        }
    }
}

/// decides whether a source is allowed to go through the relay. asks the repository every
/// time, the admin ui can flip proxy mode whenever it wants so nothing is cached here
#[derive(Clone)]
pub struct AuthorizationGate {
    sources: DynSourcePolicyRepository,
}

impl AuthorizationGate {
    pub fn new(sources: DynSourcePolicyRepository) -> Self {
        Self { sources }
    }

    /// `Err` only when the repository itself failed, every "no" is a [`GateDecision::Rejected`]
    pub async fn authorize(&self, source_key: &str) -> AppResult<GateDecision> {
        if source_key.is_empty() {
            return Ok(GateDecision::Rejected(Rejection::MissingParameter));
        }

        let policy = self
            .sources
            .lookup_source_policy(source_key)
            .await
            .map_err(|e| {
                error!("source policy lookup failed for {}: {:#}", source_key, e);
                Error::InternalServerErrorWithContext(format!("source policy lookup failed: {}", e))
            })?;

        let decision = match policy {
            None => GateDecision::Rejected(Rejection::SourceNotFound),
            Some(policy) if !policy.proxy_enabled => GateDecision::Rejected(Rejection::ProxyDisabled),
            Some(_) => GateDecision::Allowed,
        };

        debug!("source {}: {:?}", source_key, decision);
        Ok(decision)
    }
}
