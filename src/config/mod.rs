mod api;
mod basic;
mod db;

pub use api::ApiConfig;
pub use basic::BasicConfig;
pub use db::{DbConfig, LocalDbConfig, MigrationFailurePolicy, RemoteDbConfig};

use figment::{
    Figment,
    providers::{Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, sync::LazyLock};

/// Application configuration managed by Figment.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Core server configuration (see `basic` table in config.toml).
    #[serde(default)]
    pub basic: BasicConfig,

    /// Database backends and the static default mode (see `db` table in config.toml).
    #[serde(default)]
    pub db: DbConfig,

    /// Client-side API wrapper settings (see `api` table in config.toml).
    #[serde(default)]
    pub api: ApiConfig,
}

const DEFAULT_CONFIG_FILE: &str = "config.toml";

impl Config {
    /// Builds a Figment that merges defaults and a config TOML file.
    pub fn figment() -> Figment {
        Self::figment_from(DEFAULT_CONFIG_FILE)
    }

    /// Same as [`Config::figment`] but reading an explicit TOML path when it exists.
    pub fn figment_from(path: impl Into<PathBuf>) -> Figment {
        let path = path.into();
        let figment = Figment::new().merge(Serialized::defaults(Config::default()));
        if path.is_file() {
            figment.merge(Toml::file(path))
        } else {
            figment
        }
    }

    /// Loads configuration by merging defaults and `config.toml` if present.
    ///
    /// Missing backend settings are not validated here: the networked connection string is
    /// only required once that backend is first used.
    pub fn from_optional_toml() -> Self {
        Self::figment().extract().unwrap_or_else(|err| {
            panic!("failed to extract configuration (defaults + optional config.toml): {err}")
        })
    }
}

/// Global, lazily-initialized configuration instance.
pub static CONFIG: LazyLock<Config> = LazyLock::new(Config::from_optional_toml);
