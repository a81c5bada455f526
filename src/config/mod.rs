mod basic;
mod sources;

pub use basic::BasicConfig;
pub use sources::{EnvTier, SourcesConfig};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Application configuration managed by Figment.
///
/// Resolution order: struct defaults, then `config.toml` if present, then the
/// well-known environment variables (which always win, so a container can be
/// configured without a file).
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Core server configuration (see `basic` table in config.toml).
    #[serde(default)]
    pub basic: BasicConfig,

    /// Quote seed-data source selection (see `sources` table in config.toml).
    #[serde(default)]
    pub sources: SourcesConfig,
}

const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Environment variables mapped into the `basic` section.
const BASIC_ENV_KEYS: &[&str] = &["LISTEN_ADDR", "PORT", "LOGLEVEL", "DATABASE_URL"];

/// Environment variables mapped into the `sources` section.
const SOURCES_ENV_KEYS: &[&str] = &[
    "DEMO_MODE",
    "ENVIRONMENT",
    "KEY_VAULT_URL",
    "QUOTES_DATA_BASE64",
    "QUOTES_SECRET_NAME",
    "SEED_PATH",
];

impl Config {
    /// Builds a Figment merging defaults, an optional config TOML file, and
    /// the process environment.
    pub fn figment() -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));
        if PathBuf::from(DEFAULT_CONFIG_FILE).is_file() {
            figment = figment.merge(Toml::file(DEFAULT_CONFIG_FILE));
        }
        figment
            .merge(
                Env::raw()
                    .only(BASIC_ENV_KEYS)
                    .map(|key| basic_env_key(key.as_str()).into()),
            )
            .merge(
                Env::raw()
                    .only(SOURCES_ENV_KEYS)
                    .map(|key| sources_env_key(key.as_str()).into()),
            )
    }

    /// Loads configuration from defaults, `config.toml` (if present), and the
    /// environment.
    pub fn load() -> Self {
        Self::figment().extract().unwrap_or_else(|err| {
            panic!("failed to extract configuration (defaults + config.toml + env): {err}")
        })
    }
}

fn basic_env_key(key: &str) -> String {
    if key.eq_ignore_ascii_case("PORT") {
        return "basic.listen_port".to_string();
    }
    format!("basic.{}", key.to_ascii_lowercase())
}

fn sources_env_key(key: &str) -> String {
    format!("sources.{}", key.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_into_nested_sections() {
        assert_eq!(basic_env_key("PORT"), "basic.listen_port");
        assert_eq!(basic_env_key("DATABASE_URL"), "basic.database_url");
        assert_eq!(sources_env_key("KEY_VAULT_URL"), "sources.key_vault_url");
    }

    #[test]
    fn defaults_extract_cleanly() {
        let cfg: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .extract()
            .expect("default config must extract");
        assert_eq!(cfg.basic.listen_port, 8080);
        assert!(cfg.basic.database_url.is_none());
        assert!(!cfg.sources.demo_mode);
        assert_eq!(cfg.sources.environment, EnvTier::Dev);
    }
}
