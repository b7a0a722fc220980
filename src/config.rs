use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("cannot parse config {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServiceConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub security: SecurityConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub port: u16,
    /// Prefix of every avatar reference handed out, e.g. `http://localhost:3000`.
    pub public_base_url: String,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    pub log_level: String,
}

fn default_max_upload_bytes() -> usize {
    5 * 1024 * 1024
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StorageConfig {
    pub db_path: String,
    pub uploads_dir: String,
    #[serde(default)]
    pub catalog_seed: Option<String>,
}

/// Argon2id cost parameters used when hashing credentials.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SecurityConfig {
    pub argon2_memory_kib: u32,
    pub argon2_iterations: u32,
    pub argon2_parallelism: u32,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        // argon2 crate defaults (OWASP minimum for Argon2id)
        Self {
            argon2_memory_kib: 19 * 1024,
            argon2_iterations: 2,
            argon2_parallelism: 1,
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                bind_addr: "0.0.0.0".to_string(),
                port: 3000,
                public_base_url: "http://localhost:3000".to_string(),
                max_upload_bytes: default_max_upload_bytes(),
                log_level: "info".to_string(),
            },
            storage: StorageConfig {
                db_path: "./data/accounts".to_string(),
                uploads_dir: "./uploads".to_string(),
                catalog_seed: None,
            },
            security: SecurityConfig::default(),
        }
    }
}

/// Where the effective configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOrigin {
    File,
    CreatedDefault,
    /// No file existed and writing the default one failed.
    Default(String),
}

impl ServiceConfig {
    /// Load `path`, writing a default config there when the file does not exist.
    pub fn load_or_default(path: &str) -> Result<(Self, ConfigOrigin), ConfigError> {
        if Path::new(path).exists() {
            let s = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_string(),
                source,
            })?;
            let config = Self::from_toml(&s).map_err(|source| ConfigError::Parse {
                path: path.to_string(),
                source,
            })?;
            Ok((config, ConfigOrigin::File))
        } else {
            let config = Self::default();
            let origin = match toml::to_string_pretty(&config) {
                Ok(s) => match std::fs::write(path, s) {
                    Ok(()) => ConfigOrigin::CreatedDefault,
                    Err(e) => ConfigOrigin::Default(e.to_string()),
                },
                Err(e) => ConfigOrigin::Default(e.to_string()),
            };
            Ok((config, origin))
        }
    }

    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.bind_addr, self.server.port)
    }
}
