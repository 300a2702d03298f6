use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {name}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: IpAddr,
    pub port: u16,
    pub request_timeout: Duration,
    pub auth_header: String,
    pub environment: Environment,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite://todos.db".to_string(),
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 5000,
            request_timeout: Duration::from_secs(30),
            auth_header: "x-user-id".to_string(),
            environment: Environment::Development,
        }
    }
}

impl Config {
    /// Reads the process environment; call `dotenvy::dotenv()` first to pick up a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(url) = lookup("DATABASE_URL") {
            config.database_url = url;
        }
        if let Some(host) = lookup("HOST") {
            config.host = parse("HOST", host)?;
        }
        if let Some(port) = lookup("PORT") {
            config.port = parse("PORT", port)?;
        }
        if let Some(secs) = lookup("REQUEST_TIMEOUT_SECS") {
            let secs: u64 = parse("REQUEST_TIMEOUT_SECS", secs)?;
            if secs == 0 {
                return Err(ConfigError::Invalid { name: "REQUEST_TIMEOUT_SECS", value: secs.to_string() });
            }
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(header) = lookup("AUTH_HEADER") {
            if header.trim().is_empty() {
                return Err(ConfigError::Invalid { name: "AUTH_HEADER", value: header });
            }
            config.auth_header = header;
        }
        if let Some(env) = lookup("APP_ENV") {
            config.environment = match env.as_str() {
                "production" => Environment::Production,
                "development" | "test" => Environment::Development,
                _ => return Err(ConfigError::Invalid { name: "APP_ENV", value: env }),
            };
        }
        Ok(config)
    }

    pub fn bind_addr(&self) -> SocketAddr { SocketAddr::new(self.host, self.port) }

    /// Store error text only reaches clients outside production.
    pub fn expose_internal_errors(&self) -> bool { self.environment != Environment::Production }
}

fn parse<T: std::str::FromStr>(name: &'static str, value: String) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid { name, value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.bind_addr(), "127.0.0.1:5000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.database_url, "sqlite://todos.db");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert!(config.expose_internal_errors());
    }

    #[test]
    fn overrides_are_parsed() {
        let config = Config::from_lookup(lookup(&[
            ("HOST", "0.0.0.0"),
            ("PORT", "8080"),
            ("REQUEST_TIMEOUT_SECS", "5"),
            ("APP_ENV", "production"),
            ("AUTH_HEADER", "x-verified-user"),
        ]))
        .unwrap();
        assert_eq!(config.bind_addr(), "0.0.0.0:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.auth_header, "x-verified-user");
        assert!(!config.expose_internal_errors());
    }

    #[test]
    fn invalid_values_name_the_variable() {
        let err = Config::from_lookup(lookup(&[("PORT", "eighty")])).unwrap_err();
        assert_eq!(err.to_string(), "invalid value \"eighty\" for PORT");
        assert!(Config::from_lookup(lookup(&[("REQUEST_TIMEOUT_SECS", "0")])).is_err());
        assert!(Config::from_lookup(lookup(&[("APP_ENV", "staging")])).is_err());
    }
}
