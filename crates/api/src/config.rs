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
    /// Age in seconds past which a pending item counts as orphaned
    /// (default: `600`).
    pub orphan_sla_secs: u64,
    /// Claim lease in seconds used by the orphan sweep; must match the
    /// workers' `TASK_LEASE_SECS` (default: `60`).
    pub task_lease_secs: u64,
    /// Queue attempt cap used by the orphan sweep; must match the
    /// workers' `TASK_MAX_ATTEMPTS` (default: `3`).
    pub task_max_attempts: i32,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                 |
    /// |------------------------|-------------------------|
    /// | `HOST`                 | `0.0.0.0`               |
    /// | `PORT`                 | `3000`                  |
    /// | `CORS_ORIGINS`         | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                    |
    /// | `ORPHAN_SLA_SECS`      | `600`                   |
    /// | `TASK_LEASE_SECS`      | `60`                    |
    /// | `TASK_MAX_ATTEMPTS`    | `3`                     |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let orphan_sla_secs: u64 = std::env::var("ORPHAN_SLA_SECS")
            .unwrap_or_else(|_| "600".into())
            .parse()
            .expect("ORPHAN_SLA_SECS must be a valid u64");

        let task_lease_secs: u64 = std::env::var("TASK_LEASE_SECS")
            .unwrap_or_else(|_| "60".into())
            .parse()
            .expect("TASK_LEASE_SECS must be a valid u64");

        let task_max_attempts: i32 = std::env::var("TASK_MAX_ATTEMPTS")
            .unwrap_or_else(|_| "3".into())
            .parse()
            .expect("TASK_MAX_ATTEMPTS must be a valid i32");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            orphan_sla_secs,
            task_lease_secs,
            task_max_attempts,
        }
    }
}
