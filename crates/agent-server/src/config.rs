//! Server Configuration
//!
//! Everything comes from the environment (after `.env` is loaded).

use std::str::FromStr;
use thiserror::Error;

use crypto_analyst::store::DEFAULT_DATABASE_URL;
use crypto_analyst::{StoreBackend, StoreConfig};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
pub const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000,http://localhost:3001";
pub const DEFAULT_AGENT_MAX_ITERATIONS: usize = 10;

#[derive(Debug, Error)]
#[error("Invalid {key}: {reason}")]
pub struct ConfigError {
    pub key: &'static str,
    pub reason: String,
}

/// Which browser origins may call the API
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CorsOrigins {
    Any,
    List(Vec<String>),
}

impl CorsOrigins {
    pub fn parse(raw: &str) -> Self {
        let origins: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect();

        if origins.iter().any(|o| o == "*") {
            Self::Any
        } else {
            Self::List(origins)
        }
    }
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_addr: String,

    pub store: StoreConfig,

    /// Insert the demo opportunities at startup
    pub seed_demo: bool,

    pub cors_origins: CorsOrigins,

    pub agent_max_iterations: usize,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let backend = match get("STORE_BACKEND") {
            Some(raw) => StoreBackend::from_str(&raw).map_err(|e| ConfigError {
                key: "STORE_BACKEND",
                reason: e.to_string(),
            })?,
            None => StoreBackend::default(),
        };

        let seed_demo = match get("SEED_DEMO_OPPORTUNITIES") {
            Some(raw) => parse_bool(&raw).ok_or_else(|| ConfigError {
                key: "SEED_DEMO_OPPORTUNITIES",
                reason: format!("expected true or false, got '{raw}'"),
            })?,
            None => false,
        };

        let agent_max_iterations = match get("AGENT_MAX_ITERATIONS") {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError {
                        key: "AGENT_MAX_ITERATIONS",
                        reason: format!("expected a positive integer, got '{raw}'"),
                    });
                }
            },
            None => DEFAULT_AGENT_MAX_ITERATIONS,
        };

        Ok(Self {
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.into()),
            store: StoreConfig {
                backend,
                database_url: get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.into()),
            },
            seed_demo,
            cors_origins: CorsOrigins::parse(
                &get("CORS_ORIGINS").unwrap_or_else(|| DEFAULT_CORS_ORIGINS.into()),
            ),
            agent_max_iterations,
        })
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.bind_addr, "0.0.0.0:8000");
        assert_eq!(cfg.store, StoreConfig::memory());
        assert!(!cfg.seed_demo);
        assert_eq!(cfg.agent_max_iterations, 10);
        assert_eq!(
            cfg.cors_origins,
            CorsOrigins::List(vec![
                "http://localhost:3000".into(),
                "http://localhost:3001".into()
            ])
        );
    }

    #[test]
    fn test_overrides() {
        let cfg = config(&[
            ("STORE_BACKEND", "sqlite"),
            ("DATABASE_URL", "sqlite://data/opps.db"),
            ("SEED_DEMO_OPPORTUNITIES", "yes"),
            ("CORS_ORIGINS", "https://app.example.com, *"),
            ("AGENT_MAX_ITERATIONS", "4"),
        ])
        .unwrap();

        assert_eq!(cfg.store, StoreConfig::sqlite("sqlite://data/opps.db"));
        assert!(cfg.seed_demo);
        assert_eq!(cfg.cors_origins, CorsOrigins::Any);
        assert_eq!(cfg.agent_max_iterations, 4);
    }

    #[test]
    fn test_invalid_values() {
        assert_eq!(config(&[("STORE_BACKEND", "redis")]).unwrap_err().key, "STORE_BACKEND");
        assert_eq!(
            config(&[("AGENT_MAX_ITERATIONS", "0")]).unwrap_err().key,
            "AGENT_MAX_ITERATIONS"
        );
        assert_eq!(
            config(&[("SEED_DEMO_OPPORTUNITIES", "maybe")]).unwrap_err().key,
            "SEED_DEMO_OPPORTUNITIES"
        );
    }
}
