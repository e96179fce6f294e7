use std::path::PathBuf;

/// browser-like UA sent to every origin, a lot of cdns 403 anything that looks like a bot
pub const DEFAULT_UPSTREAM_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(clap::ValueEnum, Clone, Debug, Copy)]
pub enum CargoEnv {
    Development,
    Production,
}

#[derive(clap::Parser, Debug)]
pub struct AppConfig {
    // production or development
    #[clap(long, env, value_enum)]
    pub cargo_env: CargoEnv,

    // port that the app will bind to
    #[clap(long, env, default_value = "5000")]
    pub port: u16,

    // optional redis url, when it's set the source config is read from redis on every request
    #[clap(long, env)]
    pub redis_url: Option<String>,

    // key the admin config json lives under in redis
    #[clap(long, env, default_value = "admin:config")]
    pub source_config_key: String,

    // json file with the same shape as the admin config, used when there's no redis
    #[clap(long, env)]
    pub sources_file: Option<PathBuf>,

    // connect + response head timeout for the origin, the body itself is never timed out
    #[clap(long, env, default_value = "10")]
    pub upstream_timeout_secs: u64,

    #[clap(long, env, default_value = DEFAULT_UPSTREAM_USER_AGENT)]
    pub upstream_user_agent: String,

    // caps how many key/segment requests can be opening origin connections at once
    #[clap(long, env, default_value = "512")]
    pub max_concurrent_relays: usize,

    // prometheus scrape port, metrics are just dropped if this isn't set
    #[clap(long, env)]
    pub metrics_port: Option<u16>,

    // where the production rolling logs go
    #[clap(long, env, default_value = "logs")]
    pub log_dir: PathBuf,

    // optional sentry integration
    #[clap(long, env)]
    pub sentry_dsn: Option<String>,
}

impl AppConfig {
    pub fn upstream_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.upstream_timeout_secs)
    }
}

impl Default for AppConfig {
    // mostly used by tests, the real values come from clap
    fn default() -> Self {
        Self {
            cargo_env: CargoEnv::Development,
            port: 5000,
            redis_url: None,
            source_config_key: "admin:config".to_string(),
            sources_file: None,
            upstream_timeout_secs: 10,
            upstream_user_agent: DEFAULT_UPSTREAM_USER_AGENT.to_string(),
            max_concurrent_relays: 512,
            metrics_port: None,
            log_dir: PathBuf::from("logs"),
            sentry_dsn: None,
        }
    }
}
