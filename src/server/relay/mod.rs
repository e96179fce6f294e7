//! Key/segment relay: translating origin headers and pumping the origin body to the client
//! with one chunk in flight at a time.

mod engine;
mod headers;
mod session;
mod sink;
mod upstream;
mod variant;

pub use engine::*;
pub use headers::*;
pub use session::*;
pub use sink::*;
pub use upstream::*;
pub use variant::*;
