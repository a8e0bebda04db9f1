//! Application configuration management.
//!
//! This module handles loading and saving the application configuration,
//! which includes the API endpoints, the token storage backend, and the
//! last used username.
//!
//! Configuration is stored at `~/.config/profilematch/config.json`.
//! `PROFILEMATCH_BASE_URL` and `PROFILEMATCH_AUTH_URL` override the file.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::storage::{FileStore, KeyValueStore, KeyringStore};

/// Application name used for config/data directory paths
const APP_NAME: &str = "profilematch";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Profile matcher API used when nothing else is configured
pub const DEFAULT_BASE_URL: &str = "https://c0su3lk7ae.execute-api.eu-central-1.amazonaws.com/dev";

pub const BASE_URL_ENV: &str = "PROFILEMATCH_BASE_URL";
pub const AUTH_URL_ENV: &str = "PROFILEMATCH_AUTH_URL";

/// Where the session token is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    File,
    Keyring,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub auth_url: Option<String>,
    #[serde(default)]
    pub storage: StorageBackend,
    #[serde(default)]
    pub last_username: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn data_dir(&self) -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    /// API base URL: environment, then config file, then the default.
    pub fn base_url(&self) -> String {
        env_non_empty(BASE_URL_ENV)
            .or_else(|| self.base_url.clone())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    }

    /// Authentication endpoint, if one is configured.
    pub fn auth_url(&self) -> Option<String> {
        env_non_empty(AUTH_URL_ENV).or_else(|| self.auth_url.clone())
    }

    /// Open the configured token storage backend.
    pub fn open_store(&self) -> Result<Arc<dyn KeyValueStore>> {
        let store: Arc<dyn KeyValueStore> = match self.storage {
            StorageBackend::File => Arc::new(FileStore::new(self.data_dir()?)),
            StorageBackend::Keyring => Arc::new(KeyringStore::new("session")),
        };
        Ok(store)
    }
}

fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
