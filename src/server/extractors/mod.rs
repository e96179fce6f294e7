mod relay_request_extractor;

pub use relay_request_extractor::*;
