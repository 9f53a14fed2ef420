use std::env;

use thiserror::Error;

const DEFAULT_HTTP_HOST: &str = "127.0.0.1";
const DEFAULT_HTTP_PORT: u16 = 8080;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} must be a valid number, got {value:?}")]
    InvalidNumber { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub http_host: String,
    pub http_port: u16,
    pub db_max_connections: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let http_host = lookup("HTTP_HOST").unwrap_or_else(|| DEFAULT_HTTP_HOST.to_string());
        let http_port = parse_or("HTTP_PORT", lookup("HTTP_PORT"), DEFAULT_HTTP_PORT)?;
        let db_max_connections = parse_or(
            "DB_MAX_CONNECTIONS",
            lookup("DB_MAX_CONNECTIONS"),
            DEFAULT_DB_MAX_CONNECTIONS,
        )?;

        Ok(Self {
            database_url,
            http_host,
            http_port,
            db_max_connections,
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    name: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { name, value }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn applies_defaults() {
        let config = Config::from_lookup(lookup(&[("DATABASE_URL", "postgres://localhost/vins")]))
            .unwrap();
        assert_eq!(config.http_host, "127.0.0.1");
        assert_eq!(config.http_port, 8080);
        assert_eq!(config.db_max_connections, 10);
    }

    #[test]
    fn database_url_is_required() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("DATABASE_URL"));
    }

    #[test]
    fn rejects_bad_port() {
        let err = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/vins"),
            ("HTTP_PORT", "eighty"),
        ]))
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidNumber {
                name: "HTTP_PORT",
                value: "eighty".to_string()
            }
        );
    }
}
