//! Server settings read from the environment.

use std::{path::PathBuf, time::Duration};

use safeguard_database::DEFAULT_DB_PATH;
use safeguard_notify::DEFAULT_MAPS_LINK_BASE;

/// Default per-call timeout for SMS, places and advisor requests.
pub const DEFAULT_EXTERNAL_CALL_TIMEOUT: Duration = Duration::from_secs(10);

/// Runtime settings for the HTTP server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Interface to listen on.
    pub bind_addr: String,
    /// TCP port to listen on.
    pub port: u16,
    /// `SQLite` database file.
    pub database_path: PathBuf,
    /// Upper bound on each SMS send, places category lookup and advisor
    /// call.
    pub external_call_timeout: Duration,
    /// Prefix for the map link in alert messages.
    pub maps_link_base: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".to_string(),
            port: 8080,
            database_path: PathBuf::from(DEFAULT_DB_PATH),
            external_call_timeout: DEFAULT_EXTERNAL_CALL_TIMEOUT,
            maps_link_base: DEFAULT_MAPS_LINK_BASE.to_string(),
        }
    }
}

impl ServerConfig {
    /// Reads `BIND_ADDR`, `PORT`, `DATABASE_PATH`,
    /// `EXTERNAL_CALL_TIMEOUT_SECS` and `MAPS_LINK_BASE`, falling back to
    /// the defaults for unset or unparsable values.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let port = get("PORT").map_or(defaults.port, |raw| {
            raw.trim().parse().unwrap_or_else(|_| {
                log::warn!("Ignoring invalid PORT {raw:?}");
                defaults.port
            })
        });

        let external_call_timeout = get("EXTERNAL_CALL_TIMEOUT_SECS").map_or(
            defaults.external_call_timeout,
            |raw| match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    log::warn!("Ignoring invalid EXTERNAL_CALL_TIMEOUT_SECS {raw:?}");
                    defaults.external_call_timeout
                }
            },
        );

        Self {
            bind_addr: get("BIND_ADDR").unwrap_or(defaults.bind_addr),
            port,
            database_path: get("DATABASE_PATH").map_or(defaults.database_path, PathBuf::from),
            external_call_timeout,
            maps_link_base: get("MAPS_LINK_BASE")
                .map(|base| base.trim_end_matches('/').to_string())
                .unwrap_or(defaults.maps_link_base),
        }
    }
}
