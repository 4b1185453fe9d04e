use crate::auth::{DEFAULT_AUDIENCE, DEFAULT_ISSUER};
use log::LevelFilter;
use std::{env, path::PathBuf, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevocationBackend {
    Memory,
    Postgres,
}

impl FromStr for RevocationBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(RevocationBackend::Memory),
            "postgres" => Ok(RevocationBackend::Postgres),
            _ => Err(ConfigError::Invalid {
                var: "REVOCATION_STORE",
                value: s.to_owned(),
            }),
        }
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value {value:?} for {var}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_url: String,
    pub pool_size: u32,
    pub private_key_path: PathBuf,
    pub public_key_path: PathBuf,
    pub jwt_issuer: String,
    pub jwt_audience: String,
    pub revocation: RevocationBackend,
    pub log_level: LevelFilter,
}

impl Config {
    pub fn from_env() -> Result<Config, ConfigError> {
        Config::from_lookup(|var| env::var(var).ok())
    }

    /// Builds the config from any variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());
        let required = |var: &'static str| get(var).ok_or(ConfigError::Missing(var));

        let pool_size = match get("DATABASE_POOL_SIZE") {
            Some(v) => v
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or(ConfigError::Invalid {
                    var: "DATABASE_POOL_SIZE",
                    value: v,
                })?,
            None => 10,
        };
        let log_level = match get("LOG_LEVEL") {
            Some(v) => v.parse::<LevelFilter>().map_err(|_| ConfigError::Invalid {
                var: "LOG_LEVEL",
                value: v,
            })?,
            None => LevelFilter::Info,
        };
        let revocation = match get("REVOCATION_STORE") {
            Some(v) => v.parse()?,
            None => RevocationBackend::Memory,
        };

        Ok(Config {
            database_url: required("DATABASE_URL")?,
            pool_size,
            private_key_path: required("JWT_PRIVATE_KEY_PATH")?.into(),
            public_key_path: required("JWT_PUBLIC_KEY_PATH")?.into(),
            jwt_issuer: get("JWT_ISSUER").unwrap_or_else(|| DEFAULT_ISSUER.to_owned()),
            jwt_audience: get("JWT_AUDIENCE").unwrap_or_else(|| DEFAULT_AUDIENCE.to_owned()),
            revocation,
            log_level,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| vars.get(var).cloned()
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("DATABASE_URL", "postgres://localhost/conduit"),
        ("JWT_PRIVATE_KEY_PATH", "keys/private.pem"),
        ("JWT_PUBLIC_KEY_PATH", "keys/public.pem"),
    ];

    #[test]
    fn fills_defaults() {
        let config = Config::from_lookup(lookup(&REQUIRED)).unwrap();
        assert_eq!(config.pool_size, 10);
        assert_eq!(config.jwt_issuer, "http://localhost:8080");
        assert_eq!(config.jwt_audience, "api");
        assert_eq!(config.revocation, RevocationBackend::Memory);
        assert_eq!(config.log_level, LevelFilter::Info);
    }

    #[test]
    fn reports_missing_database_url() {
        let err = Config::from_lookup(lookup(&REQUIRED[1..])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("DATABASE_URL"));
    }

    #[test]
    fn parses_overrides() {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend([
            ("REVOCATION_STORE", "Postgres"),
            ("LOG_LEVEL", "debug"),
            ("DATABASE_POOL_SIZE", "4"),
        ]);
        let config = Config::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(config.revocation, RevocationBackend::Postgres);
        assert_eq!(config.log_level, LevelFilter::Debug);
        assert_eq!(config.pool_size, 4);
    }

    #[test]
    fn rejects_bad_values() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("DATABASE_POOL_SIZE", "0"));
        assert!(matches!(
            Config::from_lookup(lookup(&pairs)),
            Err(ConfigError::Invalid { var: "DATABASE_POOL_SIZE", .. })
        ));

        let mut pairs = REQUIRED.to_vec();
        pairs.push(("REVOCATION_STORE", "redis"));
        assert!(matches!(
            Config::from_lookup(lookup(&pairs)),
            Err(ConfigError::Invalid { var: "REVOCATION_STORE", .. })
        ));
    }
}
