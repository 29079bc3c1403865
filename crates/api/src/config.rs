use std::path::PathBuf;

/// Gateway settings, read once at startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Comma-separated in `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    pub request_timeout_secs: u64,
    /// JSON file listing users and backends.
    pub registry_path: PathBuf,
    /// The only user allowed to claim jobs.
    pub spooler_username: String,
}

impl ServerConfig {
    /// Missing variables fall back to local-development defaults;
    /// unparseable numbers abort startup.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `8000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:3000`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `REGISTRY_PATH`        | `./registry.json`          |
    /// | `SPOOLER_USERNAME`     | `spooler`                  |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "8000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let registry_path = std::env::var("REGISTRY_PATH")
            .unwrap_or_else(|_| "./registry.json".into())
            .into();

        let spooler_username =
            std::env::var("SPOOLER_USERNAME").unwrap_or_else(|_| "spooler".into());

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            registry_path,
            spooler_username,
        }
    }
}
