//! Runtime configuration from environment variables
//!
//! `main` loads `.env` with `dotenvy` before calling [`Config::from_env`].
//! Tests build a config from a closure with [`Config::from_lookup`].

use crate::provider::DEFAULT_BASE_URL;
use std::path::PathBuf;

pub const DEFAULT_KV_LOG_KEY: &str = "model-test:logs";
pub const DEFAULT_SHEET_NAME: &str = "Sheet1";
pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_WEATHER_URL: &str = "https://api.open-meteo.com/v1/forecast";

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub openai_api_key: Option<String>,
    /// Without trailing slash
    pub openai_base_url: String,
    pub kv: Option<KvConfig>,
    /// Deployment filesystem is read-only (`VERCEL` or `NEXT_RUNTIME` set)
    pub read_only_fs: bool,
    pub sheets: SheetsConfig,
    /// `MOODLIGHT_PROFILE`
    pub profile_path: Option<PathBuf>,
    pub data_dir: PathBuf,
    pub weather_url: String,
}

/// Upstash-style KV REST endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KvConfig {
    pub url: String,
    pub token: String,
    pub log_key: String,
}

/// Google Sheets service account; any field may be missing until used
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetsConfig {
    pub client_email: Option<String>,
    /// PEM with `\n` escapes already expanded
    pub private_key: Option<String>,
    pub spreadsheet_id: Option<String>,
    pub sheet_name: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let kv = match (get("KV_REST_API_URL"), get("KV_REST_API_TOKEN")) {
            (Some(url), Some(token)) => Some(KvConfig {
                url: url.trim_end_matches('/').to_string(),
                token,
                log_key: get("KV_LOG_KEY").unwrap_or_else(|| DEFAULT_KV_LOG_KEY.to_string()),
            }),
            _ => None,
        };

        Self {
            openai_api_key: get("OPENAI_API_KEY"),
            openai_base_url: get("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            kv,
            read_only_fs: get("VERCEL").is_some() || get("NEXT_RUNTIME").is_some(),
            sheets: SheetsConfig {
                client_email: get("GOOGLE_SHEETS_CLIENT_EMAIL"),
                private_key: get("GOOGLE_SHEETS_PRIVATE_KEY").map(|k| k.replace("\\n", "\n")),
                spreadsheet_id: get("GOOGLE_SHEETS_SPREADSHEET_ID"),
                sheet_name: get("GOOGLE_SHEETS_SHEET_NAME")
                    .unwrap_or_else(|| DEFAULT_SHEET_NAME.to_string()),
            },
            profile_path: get("MOODLIGHT_PROFILE").map(PathBuf::from),
            data_dir: get("MOODLIGHT_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            weather_url: get("MOODLIGHT_WEATHER_URL")
                .unwrap_or_else(|| DEFAULT_WEATHER_URL.to_string()),
        }
    }
}
