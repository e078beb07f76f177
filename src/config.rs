use std::path::PathBuf;

use crate::error::{AppErr, AppResult};

const DEFAULT_DATABASE_URL: &str = "sqlite://roomshots.db?mode=rwc";
const DEFAULT_BIND_ADDR:    &str = "0.0.0.0:3000";
const DEFAULT_MEDIA_DIR:    &str = "static/uploads";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaConfig {
    Local  { dir: PathBuf },
    Hosted { upload_url: String, preset: String, api_key: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_url: String,
    pub bind_addr:    String,
    pub media:        MediaConfig,
}

impl Config {
    /// Call after `dotenvy::dotenv()` so `.env` values are visible.
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        let var = |key: &str| get(key).filter(|v| !v.trim().is_empty());

        let media = match (var("MEDIA_UPLOAD_URL"), var("MEDIA_UPLOAD_PRESET")) {
            (Some(upload_url), Some(preset)) => MediaConfig::Hosted {
                upload_url,
                preset,
                api_key: var("MEDIA_API_KEY"),
            },
            (None, None) => MediaConfig::Local {
                dir: var("MEDIA_DIR").unwrap_or_else(|| DEFAULT_MEDIA_DIR.into()).into(),
            },
            _ => return Err(AppErr::Config(
                "MEDIA_UPLOAD_URL and MEDIA_UPLOAD_PRESET must be set together".into(),
            )),
        };

        Ok(Self {
            database_url: var("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.into()),
            bind_addr:    var("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.into()),
            media,
        })
    }
}
