// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is read from the environment once at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `3000` |
//! | `DATA_DIR` | Directory holding `app.redb` | `./data` |
//! | `JWT_SECRET` | HMAC signing secret for bearer tokens | Required |
//! | `JWT_ISSUER` | `iss` claim of issued tokens | `pokedex_backend` |
//! | `REQUEST_TIMEOUT_SECS` | Per-request deadline | `60` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::auth::Secret;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const DATA_DIR_ENV: &str = "DATA_DIR";
pub const JWT_SECRET_ENV: &str = "JWT_SECRET";
pub const JWT_ISSUER_ENV: &str = "JWT_ISSUER";
pub const REQUEST_TIMEOUT_ENV: &str = "REQUEST_TIMEOUT_SECS";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DEFAULT_ISSUER: &str = "pokedex_backend";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

/// Name of the database file inside `DATA_DIR`.
pub const DATABASE_FILE: &str = "app.redb";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub data_dir: PathBuf,
    pub jwt_secret: Secret,
    pub jwt_issuer: String,
    pub request_timeout: Duration,
    pub log_format: LogFormat,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the config from any variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = lookup(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match lookup(PORT_ENV) {
            Some(raw) => parse(PORT_ENV, &raw)?,
            None => DEFAULT_PORT,
        };
        let bind_addr = format!("{host}:{port}")
            .parse()
            .map_err(|_| ConfigError::Invalid {
                name: HOST_ENV,
                value: host.clone(),
            })?;

        let jwt_secret = lookup(JWT_SECRET_ENV)
            .filter(|s| !s.is_empty())
            .map(|s| Secret::new(s.into_bytes()))
            .ok_or(ConfigError::Missing(JWT_SECRET_ENV))?;

        let request_timeout = match lookup(REQUEST_TIMEOUT_ENV) {
            Some(raw) => parse::<u64>(REQUEST_TIMEOUT_ENV, &raw)?,
            None => DEFAULT_REQUEST_TIMEOUT_SECS,
        };
        if request_timeout == 0 {
            return Err(ConfigError::Invalid {
                name: REQUEST_TIMEOUT_ENV,
                value: "0".to_string(),
            });
        }

        let log_format = match lookup(LOG_FORMAT_ENV).as_deref() {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: LOG_FORMAT_ENV,
                    value: other.to_string(),
                })
            }
        };

        Ok(Self {
            bind_addr,
            data_dir: PathBuf::from(lookup(DATA_DIR_ENV).unwrap_or_else(|| DEFAULT_DATA_DIR.into())),
            jwt_secret,
            jwt_issuer: lookup(JWT_ISSUER_ENV).unwrap_or_else(|| DEFAULT_ISSUER.to_string()),
            request_timeout: Duration::from_secs(request_timeout),
            log_format,
        })
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE)
    }
}

fn parse<T: std::str::FromStr>(name: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::Invalid {
        name,
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_only_secret_is_set() {
        let config = config(&[(JWT_SECRET_ENV, "s3cret")]).unwrap();

        assert_eq!(config.bind_addr.to_string(), "0.0.0.0:3000");
        assert_eq!(config.database_path(), PathBuf::from("./data").join("app.redb"));
        assert_eq!(config.jwt_issuer, "pokedex_backend");
        assert_eq!(config.request_timeout, Duration::from_secs(60));
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn missing_or_empty_secret_is_rejected() {
        assert!(matches!(config(&[]), Err(ConfigError::Missing(JWT_SECRET_ENV))));
        assert!(matches!(
            config(&[(JWT_SECRET_ENV, "")]),
            Err(ConfigError::Missing(JWT_SECRET_ENV))
        ));
    }

    #[test]
    fn overrides_are_read() {
        let config = config(&[
            (JWT_SECRET_ENV, "s3cret"),
            (HOST_ENV, "127.0.0.1"),
            (PORT_ENV, "8081"),
            (DATA_DIR_ENV, "/tmp/pokedex"),
            (JWT_ISSUER_ENV, "issuer"),
            (REQUEST_TIMEOUT_ENV, "5"),
            (LOG_FORMAT_ENV, "json"),
        ])
        .unwrap();

        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8081");
        assert_eq!(config.data_dir, PathBuf::from("/tmp/pokedex"));
        assert_eq!(config.jwt_issuer, "issuer");
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn bad_values_are_rejected() {
        for (name, value) in [
            (PORT_ENV, "eighty"),
            (HOST_ENV, "not a host"),
            (REQUEST_TIMEOUT_ENV, "0"),
            (LOG_FORMAT_ENV, "xml"),
        ] {
            let result = config(&[(JWT_SECRET_ENV, "s3cret"), (name, value)]);
            assert!(matches!(result, Err(ConfigError::Invalid { .. })), "{name}={value}");
        }
    }

    #[test]
    fn secret_is_not_printed() {
        let config = config(&[(JWT_SECRET_ENV, "hunter2")]).unwrap();
        assert!(!format!("{config:?}").contains("hunter2"));
    }
}
