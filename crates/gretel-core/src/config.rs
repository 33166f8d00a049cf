//! Configuration for the Gretel proxy server.
//!
//! Loaded from (in priority order):
//! 1. Environment variables (`GRETEL_` prefix, `__` separator)
//! 2. Config file (`gretel.toml`)
//! 3. Defaults

use serde::Deserialize;

/// Top-level server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Google OAuth client id. When unset, all callers are accepted.
    #[serde(default)]
    pub google_client_id: Option<String>,
}

fn default_listen_addr() -> String {
    "0.0.0.0:3001".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            google_client_id: None,
        }
    }
}

impl ServerConfig {
    /// Load from `<file_prefix>.toml` (optional) and `GRETEL_` environment
    /// overrides, falling back to defaults on any load failure.
    pub fn load(file_prefix: &str) -> Self {
        let cfg = config::Config::builder()
            .add_source(config::File::with_name(file_prefix).required(false))
            .add_source(
                config::Environment::with_prefix("GRETEL")
                    .separator("__")
                    .try_parsing(true),
            )
            .build();

        match cfg.and_then(|c| c.try_deserialize()) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(error = %e, "falling back to default configuration");
                Self::default()
            }
        }
    }
}
