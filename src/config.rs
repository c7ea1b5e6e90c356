use std::path::PathBuf;

use directories::ProjectDirs;

use crate::error::AppError;

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_MONGODB_URI: &str = "mongodb://localhost:27017";
pub const DEFAULT_DB_NAME: &str = "alunet";
pub const DEFAULT_COLLECTION: &str = "connections";

/// Cache key holding the known-connections JSON array.
pub const KNOWN_CONNECTIONS_KEY: &str = "known_connections";

pub fn project_dirs() -> anyhow::Result<ProjectDirs> {
    ProjectDirs::from("", "alunet", "alunet")
        .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))
}

/// Local cache database. `ALUNET_DB_PATH` overrides the platform data dir.
pub fn db_path() -> anyhow::Result<PathBuf> {
    if let Some(path) = env_var("ALUNET_DB_PATH") {
        return Ok(PathBuf::from(path));
    }
    let dirs = project_dirs()?;
    let data_dir = dirs.data_dir();
    std::fs::create_dir_all(data_dir)?;
    Ok(data_dir.join("alunet.db"))
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub token: Option<String>,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let base_url = env_var("ALUNET_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(AppError::Config(format!(
                "ALUNET_API_URL must be an http(s) URL, got '{base_url}'"
            )));
        }
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: env_var("ALUNET_API_TOKEN"),
        })
    }
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub uri: String,
    pub database: String,
    pub collection: String,
}

impl StoreConfig {
    pub fn from_env() -> Self {
        Self {
            uri: env_var("MONGODB_URI").unwrap_or_else(|| DEFAULT_MONGODB_URI.to_string()),
            database: env_var("ALUNET_DB_NAME").unwrap_or_else(|| DEFAULT_DB_NAME.to_string()),
            collection: env_var("ALUNET_COLLECTION")
                .unwrap_or_else(|| DEFAULT_COLLECTION.to_string()),
        }
    }
}

/// Unset and blank variables are treated the same.
fn env_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
