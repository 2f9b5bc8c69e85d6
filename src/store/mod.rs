//! Store Module - persistence of test runs
//!
//! Key types:
//! - `SaveRequest`: body of `/save-local` and `/save-prompt`
//! - `LogRecord`: timestamped record written to KV, a JSONL file or a sheet
//! - `LogStore`: KV list or local `data.jsonl`
//! - `SheetsClient`: Google Sheets row append with a service account

mod local;
mod sheets;

pub use local::{LogStore, SaveOutcome, READ_ONLY_MESSAGE};
pub use sheets::{sheet_row, SheetsClient, MISSING_CREDENTIALS};

use crate::error::{MoodlightError, Result};
use crate::util::{lenient_count, lenient_string, lenient_struct};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Body of a save request. Missing fields become empty strings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SaveRequest {
    #[serde(deserialize_with = "lenient_string")]
    pub label: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub model: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub system: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub prompt: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub output: Option<String>,
    #[serde(deserialize_with = "lenient_struct")]
    pub usage: Option<UsageRecord>,
}

impl SaveRequest {
    pub fn validate(&self) -> Result<()> {
        match self.prompt.as_deref() {
            Some(p) if !p.is_empty() => Ok(()),
            _ => Err(MoodlightError::bad_request(r#"Field "prompt" is required"#)),
        }
    }
}

/// Token counts as sent by the client; each may be absent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UsageRecord {
    #[serde(deserialize_with = "lenient_count")]
    pub prompt_tokens: Option<u64>,
    #[serde(deserialize_with = "lenient_count")]
    pub completion_tokens: Option<u64>,
    #[serde(deserialize_with = "lenient_count")]
    pub total_tokens: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogRecord {
    /// RFC 3339, millisecond precision, UTC
    pub timestamp: String,
    pub label: String,
    pub model: String,
    pub system: String,
    pub prompt: String,
    pub output: String,
    pub usage: UsageRecord,
}

impl LogRecord {
    pub fn new(req: &SaveRequest, now: DateTime<Utc>) -> Self {
        let text = |v: &Option<String>| v.clone().unwrap_or_default();
        Self {
            timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            label: text(&req.label),
            model: text(&req.model),
            system: text(&req.system),
            prompt: text(&req.prompt),
            output: text(&req.output),
            usage: req.usage.unwrap_or_default(),
        }
    }
}
