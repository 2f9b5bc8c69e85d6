//! Run log: KV list when configured, else one JSON line per record on disk

use super::LogRecord;
use crate::config::{Config, KvConfig};
use crate::error::{MoodlightError, Result};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

pub const READ_ONLY_MESSAGE: &str = "Running on Vercel with read-only filesystem. Configure Vercel KV (KV_REST_API_URL, KV_REST_API_TOKEN) to enable persistent saves.";

const LOG_FILE: &str = "data.jsonl";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Kv { key: String },
    File { path: PathBuf },
}

impl SaveOutcome {
    /// Reply body of `/save-local`
    pub fn to_json(&self) -> Value {
        match self {
            SaveOutcome::Kv { key } => json!({"ok": true, "storage": "kv", "key": key}),
            SaveOutcome::File { path } => {
                json!({"ok": true, "storage": "file", "filePath": path.display().to_string()})
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogStore {
    client: reqwest::Client,
    kv: Option<KvConfig>,
    read_only_fs: bool,
    data_dir: PathBuf,
}

impl LogStore {
    pub fn from_config(config: &Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            kv: config.kv.clone(),
            read_only_fs: config.read_only_fs,
            data_dir: config.data_dir.clone(),
        }
    }

    pub async fn save(&self, record: &LogRecord) -> Result<SaveOutcome> {
        if let Some(kv) = &self.kv {
            self.rpush(kv, record).await?;
            return Ok(SaveOutcome::Kv {
                key: kv.log_key.clone(),
            });
        }

        if self.read_only_fs {
            return Err(MoodlightError::Storage(READ_ONLY_MESSAGE.to_string()));
        }

        let path = append_line(&self.data_dir, record).await?;
        Ok(SaveOutcome::File { path })
    }

    /// `RPUSH key <record JSON>` through the REST command endpoint
    async fn rpush(&self, kv: &KvConfig, record: &LogRecord) -> Result<()> {
        let value = serde_json::to_string(record)?;
        tracing::debug!(key = %kv.log_key, "Pushing record to KV");

        let response = self
            .client
            .post(&kv.url)
            .bearer_auth(&kv.token)
            .json(&json!(["RPUSH", kv.log_key, value]))
            .send()
            .await
            .map_err(|e| MoodlightError::Storage(format!("KV request failed: {e}")))?;

        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);
        if !status.is_success() || body.get("error").is_some() {
            let message = body["error"]
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| format!("KV error ({status})"));
            tracing::error!(status = %status, error = %message, "KV push failed");
            return Err(MoodlightError::Storage(message));
        }
        Ok(())
    }
}

async fn append_line(dir: &Path, record: &LogRecord) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(LOG_FILE);

    let mut line = serde_json::to_string(record)?;
    line.push('\n');

    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .await?;
    file.write_all(line.as_bytes()).await?;
    file.flush().await?;

    tracing::debug!(path = %path.display(), "Appended record");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SaveRequest;
    use chrono::Utc;
    use tempfile::TempDir;

    fn record(prompt: &str) -> LogRecord {
        let req = SaveRequest {
            prompt: Some(prompt.to_string()),
            ..Default::default()
        };
        LogRecord::new(&req, Utc::now())
    }

    fn store(dir: &Path, vars: &[(&str, &str)]) -> LogStore {
        let mut owned: Vec<(String, String)> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        owned.push(("MOODLIGHT_DATA_DIR".into(), dir.display().to_string()));
        let config = Config::from_lookup(|name| {
            owned.iter().find(|(k, _)| k == name).map(|(_, v)| v.clone())
        });
        LogStore::from_config(&config)
    }

    #[tokio::test]
    async fn test_appends_jsonl_lines() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("nested");
        let store = store(&dir, &[]);

        store.save(&record("first")).await.unwrap();
        let outcome = store.save(&record("second")).await.unwrap();

        let path = dir.join("data.jsonl");
        assert_eq!(outcome, SaveOutcome::File { path: path.clone() });

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        let second: Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["prompt"], "second");
    }

    #[tokio::test]
    async fn test_read_only_filesystem_refuses() {
        let tmp = TempDir::new().unwrap();
        let store = store(tmp.path(), &[("VERCEL", "1")]);

        let err = store.save(&record("x")).await.unwrap_err();
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.to_string(), READ_ONLY_MESSAGE);
        assert!(!tmp.path().join("data.jsonl").exists());
    }

    #[test]
    fn test_outcome_json() {
        let kv = SaveOutcome::Kv {
            key: "model-test:logs".into(),
        };
        assert_eq!(
            kv.to_json(),
            json!({"ok": true, "storage": "kv", "key": "model-test:logs"})
        );

        let file = SaveOutcome::File {
            path: PathBuf::from("data/data.jsonl"),
        };
        assert_eq!(file.to_json()["filePath"], "data/data.jsonl");
    }
}
