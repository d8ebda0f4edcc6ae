//! Runtime configuration, read from the environment with defaults.

use std::path::PathBuf;

use log::warn;

/// Settings of the tournament service itself.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ServiceConfig {
    /// Seed for the participant shuffle; random when unset.
    pub shuffle_seed: Option<u64>,
}

/// Settings of the web binary.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// JSON state file; state is kept in memory only when unset.
    pub state_path: Option<PathBuf>,
    pub service: ServiceConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            state_path: None,
            service: ServiceConfig::default(),
        }
    }
}

impl Config {
    /// Read `HOST`, `PORT`, `TOURNAMENT_STATE` and `TOURNAMENT_SEED`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, with variables supplied by `lookup`. Values that do not parse
    /// fall back to the default with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match non_empty("PORT") {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                warn!("Ignoring PORT={raw:?}, using {}", default_port());
                default_port()
            }),
            None => default_port(),
        };
        let shuffle_seed = non_empty("TOURNAMENT_SEED").and_then(|raw| match raw.trim().parse() {
            Ok(seed) => Some(seed),
            Err(_) => {
                warn!("Ignoring TOURNAMENT_SEED={raw:?}, shuffling randomly");
                None
            }
        });

        Self {
            host: non_empty("HOST").unwrap_or_else(default_host),
            port,
            state_path: non_empty("TOURNAMENT_STATE").map(PathBuf::from),
            service: ServiceConfig { shuffle_seed },
        }
    }
}
