pub mod health_controller;
pub mod vod_proxy_controller;

pub use vod_proxy_controller::VodProxyController;
