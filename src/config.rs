use serde::{Deserialize, Serialize};

use crate::store::Backing;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MesmerConfig {
    pub auth: AuthConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AuthConfig {
    /// Signing secret for session tokens. Provisioned externally; the
    /// process never derives one at runtime.
    pub token_secret: String,
    #[serde(default = "default_token_ttl_days")]
    pub token_ttl_days: i64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StorageConfig {
    #[serde(default)]
    pub backing: Backing,
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

fn default_token_ttl_days() -> i64 {
    7
}

fn default_db_path() -> String {
    "./data/records".to_string()
}

const DEV_TOKEN_SECRET: &str = "insecure-dev-secret-change-me";

impl Default for MesmerConfig {
    fn default() -> Self {
        Self {
            auth: AuthConfig {
                token_secret: DEV_TOKEN_SECRET.to_string(),
                token_ttl_days: default_token_ttl_days(),
            },
            storage: StorageConfig {
                backing: Backing::Memory,
                db_path: default_db_path(),
            },
        }
    }
}

impl MesmerConfig {
    pub fn load_or_default(path: &str) -> Self {
        let config = if std::path::Path::new(path).exists() {
            match std::fs::read_to_string(path) {
                Ok(s) => match toml::from_str(&s) {
                    Ok(c) => {
                        println!("Config loaded from {}", path);
                        c
                    }
                    Err(e) => {
                        eprintln!("Error parsing config: {}. Using Defaults.", e);
                        Self::default()
                    }
                },
                Err(e) => {
                    eprintln!("Error reading config: {}. Using Defaults.", e);
                    Self::default()
                }
            }
        } else {
            println!("Config file not found at '{}'. Creating default.", path);
            let config = Self::default();
            if let Ok(s) = toml::to_string_pretty(&config) {
                let _ = std::fs::write(path, s);
            }
            config
        };

        if config.auth.token_secret == DEV_TOKEN_SECRET {
            eprintln!("WARNING: running with the default token secret. Set auth.token_secret.");
        }
        config
    }
}

/// Install the process-wide log subscriber. Call once at startup; filter via
/// `RUST_LOG`.
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_applies_defaults() {
        let config: MesmerConfig = toml::from_str(
            r#"
            [auth]
            token_secret = "s3cret"

            [storage]
            "#,
        )
        .unwrap();

        assert_eq!(config.auth.token_secret, "s3cret");
        assert_eq!(config.auth.token_ttl_days, 7);
        assert_eq!(config.storage.backing, Backing::Memory);
        assert_eq!(config.storage.db_path, "./data/records");
    }

    #[test]
    fn backing_parses_lowercase() {
        let config: MesmerConfig = toml::from_str(
            r#"
            [auth]
            token_secret = "s3cret"

            [storage]
            backing = "durable"
            db_path = "/var/lib/mesmer"
            "#,
        )
        .unwrap();

        assert_eq!(config.storage.backing, Backing::Durable);
        assert_eq!(config.storage.db_path, "/var/lib/mesmer");
    }

    #[test]
    fn default_config_round_trips_through_toml() {
        let default = MesmerConfig::default();
        let rendered = toml::to_string_pretty(&default).unwrap();
        let parsed: MesmerConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.auth.token_ttl_days, default.auth.token_ttl_days);
        assert_eq!(parsed.storage.backing, default.storage.backing);
    }
}
