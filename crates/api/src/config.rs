use quill_engine::ModelConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Job/batch record lifetime in seconds (default: `3600`).
    pub job_ttl_secs: u64,
    /// How often the retention sweep runs, in seconds (default: `60`).
    pub sweep_interval_secs: u64,
    /// Number of background workers (default: `4`).
    pub worker_concurrency: usize,
    /// Capacity of the work queue (default: `256`).
    pub queue_capacity: usize,
    /// Base URL of the model gateway.
    pub gateway_url: String,
    /// Model identifiers per capability.
    pub models: ModelConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `JOB_TTL_SECS`         | `3600`                     |
    /// | `SWEEP_INTERVAL_SECS`  | `60`                       |
    /// | `WORKER_CONCURRENCY`   | `4`                        |
    /// | `QUEUE_CAPACITY`       | `256`                      |
    /// | `GATEWAY_URL`          | `http://localhost:8800`    |
    /// | `GATEWAY_MODEL_TEXT`   | `gateway-text-default`     |
    /// | `GATEWAY_MODEL_VISION` | `gateway-vision-default`   |
    /// | `GATEWAY_MODEL_AUDIO`  | `gateway-audio-default`    |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = env_parsed("PORT", 3000);

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let gateway_url =
            std::env::var("GATEWAY_URL").unwrap_or_else(|_| "http://localhost:8800".into());

        let defaults = ModelConfig::default();
        let models = ModelConfig {
            text: std::env::var("GATEWAY_MODEL_TEXT").unwrap_or(defaults.text),
            vision: std::env::var("GATEWAY_MODEL_VISION").unwrap_or(defaults.vision),
            audio: std::env::var("GATEWAY_MODEL_AUDIO").unwrap_or(defaults.audio),
        };

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs: env_parsed("REQUEST_TIMEOUT_SECS", 30),
            job_ttl_secs: env_parsed("JOB_TTL_SECS", 3600),
            sweep_interval_secs: env_parsed("SWEEP_INTERVAL_SECS", 60),
            worker_concurrency: env_parsed("WORKER_CONCURRENCY", 4),
            queue_capacity: env_parsed("QUEUE_CAPACITY", 256),
            gateway_url,
            models,
        }
    }
}

/// Parse an env var, panicking on malformed values (misconfiguration
/// should fail fast at startup).
fn env_parsed<T: std::str::FromStr>(name: &str, default: T) -> T
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|e| panic!("{name} must be valid: {e}")),
        Err(_) => default,
    }
}
