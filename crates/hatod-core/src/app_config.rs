use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub routing_base_url: String,
    pub routing_api_key: Option<String>,
    pub routing_request_timeout_secs: u64,
    pub routing_selftest_timeout_secs: u64,
    pub routing_max_concurrent_batches: usize,
    pub routing_max_retries: u32,
    pub routing_retry_backoff_base_ms: u64,
    pub default_radius_meters: f64,
    pub max_radius_meters: f64,
    pub checkout_radius_meters: f64,
    pub candidate_overfetch_factor: i64,
    pub candidate_fetch_cap: i64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("routing_base_url", &self.routing_base_url)
            .field(
                "routing_api_key",
                &self.routing_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "routing_request_timeout_secs",
                &self.routing_request_timeout_secs,
            )
            .field(
                "routing_selftest_timeout_secs",
                &self.routing_selftest_timeout_secs,
            )
            .field(
                "routing_max_concurrent_batches",
                &self.routing_max_concurrent_batches,
            )
            .field("routing_max_retries", &self.routing_max_retries)
            .field(
                "routing_retry_backoff_base_ms",
                &self.routing_retry_backoff_base_ms,
            )
            .field("default_radius_meters", &self.default_radius_meters)
            .field("max_radius_meters", &self.max_radius_meters)
            .field("checkout_radius_meters", &self.checkout_radius_meters)
            .field(
                "candidate_overfetch_factor",
                &self.candidate_overfetch_factor,
            )
            .field("candidate_fetch_cap", &self.candidate_fetch_cap)
            .finish()
    }
}
