pub mod authorization_services;
pub mod origin_services;
pub mod relay_services;

pub use authorization_services::{AuthorizationGate, GateDecision, Rejection};
pub use origin_services::{DynOriginFetcher, FetchError, OpenStream, OriginFetcher, OriginFetcherTrait};
pub use relay_services::RelayServices;
