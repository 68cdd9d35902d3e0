//! Configuration management for Verdant Server

use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub gemini: GeminiConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Largest multipart body accepted on `/analyze`
    pub max_upload_bytes: usize,
}

/// Filesystem locations used by the pipeline.
///
/// Both the staging and report directories hold request-owned files only;
/// each file is created under a unique name and removed by its owner.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub upload_dir: PathBuf,
    pub reports_dir: PathBuf,
    pub public_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    /// No timeout when unset
    pub timeout: Option<Duration>,
}

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com";

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: DEFAULT_PORT,
                max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            },
            storage: StorageConfig {
                upload_dir: PathBuf::from("upload"),
                reports_dir: PathBuf::from("reports"),
                public_dir: PathBuf::from("public"),
            },
            gemini: GeminiConfig {
                api_key: String::new(),
                model: DEFAULT_GEMINI_MODEL.to_string(),
                base_url: DEFAULT_GEMINI_URL.to_string(),
                timeout: None,
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        Ok(Config {
            server: ServerConfig {
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(DEFAULT_PORT),
                max_upload_bytes: env::var("MAX_UPLOAD_BYTES")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            },
            storage: StorageConfig {
                upload_dir: env::var("UPLOAD_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from("upload")),
                reports_dir: env::var("REPORTS_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from("reports")),
                public_dir: env::var("PUBLIC_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from("public")),
            },
            gemini: GeminiConfig {
                // Missing key is tolerated; the provider refuses calls until set
                api_key: match env::var("GEMINI_API_KEY") {
                    Ok(key) => key,
                    Err(env::VarError::NotPresent) => String::new(),
                    Err(e) => return Err(e),
                },
                model: env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_GEMINI_MODEL.to_string()),
                base_url: env::var("GEMINI_API_URL").unwrap_or_else(|_| DEFAULT_GEMINI_URL.to_string()),
                timeout: env::var("GEMINI_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .map(Duration::from_secs),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.storage.upload_dir, PathBuf::from("upload"));
        assert_eq!(config.storage.reports_dir, PathBuf::from("reports"));
        assert_eq!(config.gemini.model, "gemini-1.5-flash");
        assert!(config.gemini.timeout.is_none());
    }
}
