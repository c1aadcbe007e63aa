use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{
    media::{DEFAULT_MAX_IMAGE_BYTES, DEFAULT_MAX_VIDEO_BYTES, MediaPolicy},
    models::LikeMode,
    session::DEFAULT_SESSION_TTL_SECS,
};

pub const CONFIG_ENV_VAR: &str = "TETHER_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "tether.toml";
pub const FALLBACK_REDIS_URL: &str = "redis://127.0.0.1:6379";

/// Service configuration stored in `tether.toml`. Every field has a default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TetherConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub redis: RedisSettings,
    #[serde(default)]
    pub sessions: SessionSettings,
    #[serde(default)]
    pub media: MediaSettings,
    #[serde(default)]
    pub likes: LikeSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Origins allowed by CORS. Empty means any origin.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            allowed_origins: Vec::new(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:4000".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisSettings {
    #[serde(default = "default_redis_url")]
    pub url: String,
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

impl Default for RedisSettings {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            prefix: default_prefix(),
        }
    }
}

fn default_redis_url() -> String {
    "${REDIS_URL}".to_string()
}

fn default_prefix() -> String {
    "tether".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSettings {
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
        }
    }
}

fn default_ttl_secs() -> u64 {
    DEFAULT_SESSION_TTL_SECS
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaSettings {
    #[serde(default = "default_uploads_dir")]
    pub uploads_dir: PathBuf,
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: usize,
    #[serde(default = "default_max_video_bytes")]
    pub max_video_bytes: usize,
}

impl Default for MediaSettings {
    fn default() -> Self {
        Self {
            uploads_dir: default_uploads_dir(),
            max_image_bytes: default_max_image_bytes(),
            max_video_bytes: default_max_video_bytes(),
        }
    }
}

impl MediaSettings {
    pub fn policy(&self) -> MediaPolicy {
        MediaPolicy {
            max_image_bytes: self.max_image_bytes,
            max_video_bytes: self.max_video_bytes,
        }
    }
}

fn default_uploads_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_max_image_bytes() -> usize {
    DEFAULT_MAX_IMAGE_BYTES
}

fn default_max_video_bytes() -> usize {
    DEFAULT_MAX_VIDEO_BYTES
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LikeSettings {
    #[serde(default)]
    pub mode: LikeMode,
}

impl TetherConfig {
    /// Loads `path`, or `$TETHER_CONFIG`, or `./tether.toml`. A missing file yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => std::env::var_os(CONFIG_ENV_VAR)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE)),
        };
        if !path.exists() {
            return Ok(Self::default());
        }
        let content =
            std::fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Redis URL with `${VAR}` expanded. The default `${REDIS_URL}` falls back to a local server.
    pub fn redis_url(&self) -> Result<String> {
        let url = self.redis.url.as_str();
        if url.starts_with("${") && url.ends_with('}') {
            let var_name = &url[2..url.len() - 1];
            match std::env::var(var_name) {
                Ok(value) => Ok(value),
                Err(_) if url == default_redis_url() => Ok(FALLBACK_REDIS_URL.to_string()),
                Err(_) => anyhow::bail!("Environment variable {var_name} not set"),
            }
        } else {
            Ok(url.to_string())
        }
    }
}
