pub mod redis_connection;
pub mod source;

pub use redis_connection::*;
pub use source::*;
