use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use chrono::Duration;
use dotenvy::dotenv;

use crate::error::ConfigError;
use crate::voting::DEFAULT_MAX_VOTES;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_CATALOG_PATH: &str = "songs.json";
pub const DEFAULT_SESSION_TTL_SECS: u32 = 30 * 60;
/// Upper bound for `MAX_VOTES`; vote positions are stored as 32-bit integers.
pub const MAX_VOTES_LIMIT: usize = 1_000;

#[derive(Clone, Debug)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub max_votes: usize,
    pub catalog_path: PathBuf,
    /// Idle time after which an open session is discarded.
    pub session_ttl: Duration,
    /// Postgres connection string for the ballot store. Ballots stay in memory without it.
    pub database_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Config, ConfigError> {
        dotenv().ok();
        Config::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Config, ConfigError> {
        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| String::from(DEFAULT_BIND_ADDR));
        let bind_addr = bind_addr.parse::<SocketAddr>().map_err(|err| ConfigError::InvalidValue {
            key: "BIND_ADDR",
            value: bind_addr.clone(),
            reason: err.to_string(),
        })?;

        let max_votes = match lookup("MAX_VOTES") {
            None => DEFAULT_MAX_VOTES,
            Some(raw) => match raw.parse::<usize>() {
                Ok(0) => {
                    return Err(ConfigError::InvalidValue {
                        key: "MAX_VOTES",
                        value: raw,
                        reason: String::from("must be at least 1"),
                    });
                }
                Ok(n) if n > MAX_VOTES_LIMIT => {
                    return Err(ConfigError::InvalidValue {
                        key: "MAX_VOTES",
                        value: raw,
                        reason: format!("must be at most {MAX_VOTES_LIMIT}"),
                    });
                }
                Ok(n) => n,
                Err(err) => {
                    return Err(ConfigError::InvalidValue {
                        key: "MAX_VOTES",
                        reason: err.to_string(),
                        value: raw,
                    });
                }
            },
        };

        let catalog_path = lookup("CATALOG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CATALOG_PATH));
        let ttl_secs = match lookup("SESSION_TTL_SECS") {
            None => DEFAULT_SESSION_TTL_SECS,
            Some(raw) => match raw.parse::<u32>() {
                Ok(0) => {
                    return Err(ConfigError::InvalidValue {
                        key: "SESSION_TTL_SECS",
                        value: raw,
                        reason: String::from("must be at least 1"),
                    });
                }
                Ok(n) => n,
                Err(err) => {
                    return Err(ConfigError::InvalidValue {
                        key: "SESSION_TTL_SECS",
                        reason: err.to_string(),
                        value: raw,
                    });
                }
            },
        };
        let session_ttl = Duration::seconds(i64::from(ttl_secs));

        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());

        Ok(Config { bind_addr, max_votes, catalog_path, session_ttl, database_url })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR.parse::<SocketAddr>().unwrap());
        assert_eq!(config.max_votes, 20);
        assert_eq!(config.catalog_path, PathBuf::from("songs.json"));
        assert_eq!(config.session_ttl, Duration::minutes(30));
        assert_eq!(config.database_url, None);
    }

    #[test]
    fn values_are_read_from_environment() {
        let config = config_from(&[
            ("BIND_ADDR", "127.0.0.1:8080"),
            ("MAX_VOTES", "12"),
            ("CATALOG_PATH", "/srv/songs.json"),
            ("SESSION_TTL_SECS", "90"),
            ("DATABASE_URL", "postgres://localhost/votes"),
        ]).unwrap();
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.max_votes, 12);
        assert_eq!(config.catalog_path, PathBuf::from("/srv/songs.json"));
        assert_eq!(config.session_ttl, Duration::seconds(90));
        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/votes"));
    }

    #[test]
    fn zero_vote_pool_is_rejected() {
        assert!(matches!(
            config_from(&[("MAX_VOTES", "0")]),
            Err(ConfigError::InvalidValue { key: "MAX_VOTES", .. })
        ));
        assert!(config_from(&[("MAX_VOTES", "lots")]).is_err());
        assert!(config_from(&[("SESSION_TTL_SECS", "0")]).is_err());
        assert!(config_from(&[("BIND_ADDR", "nowhere")]).is_err());
    }

    #[test]
    fn vote_pool_is_capped() {
        assert!(matches!(
            config_from(&[("MAX_VOTES", "5000000000")]),
            Err(ConfigError::InvalidValue { key: "MAX_VOTES", .. })
        ));
        assert_eq!(config_from(&[("MAX_VOTES", "1000")]).unwrap().max_votes, MAX_VOTES_LIMIT);
    }

    #[test]
    fn blank_database_url_means_memory() {
        let config = config_from(&[("DATABASE_URL", "  ")]).unwrap();
        assert_eq!(config.database_url, None);
    }
}
