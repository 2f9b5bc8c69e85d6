//! Google Sheets append with a service account
//!
//! Signs an RS256 JWT assertion, trades it for an access token, then calls
//! `spreadsheets.values.append` on `{sheet}!A1`.

use super::LogRecord;
use crate::config::SheetsConfig;
use crate::error::{MoodlightError, Result};
use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const MISSING_CREDENTIALS: &str = "Missing Google Sheets credentials. Set GOOGLE_SHEETS_CLIENT_EMAIL, GOOGLE_SHEETS_PRIVATE_KEY, GOOGLE_SHEETS_SPREADSHEET_ID";

const SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const SHEETS_API: &str = "https://sheets.googleapis.com/v4";
const GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

#[derive(Debug, Serialize, Deserialize)]
struct AssertionClaims {
    iss: String,
    scope: String,
    aud: String,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

pub struct SheetsClient {
    client: reqwest::Client,
    client_email: String,
    private_key: String,
    spreadsheet_id: String,
    sheet_name: String,
    token_url: String,
    api_base: String,
}

impl std::fmt::Debug for SheetsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SheetsClient")
            .field("client_email", &self.client_email)
            .field("spreadsheet_id", &self.spreadsheet_id)
            .field("sheet_name", &self.sheet_name)
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}

impl SheetsClient {
    pub fn from_config(config: &SheetsConfig) -> Result<Self> {
        let (Some(email), Some(key), Some(id)) = (
            config.client_email.clone(),
            config.private_key.clone(),
            config.spreadsheet_id.clone(),
        ) else {
            return Err(MoodlightError::Storage(MISSING_CREDENTIALS.to_string()));
        };

        Ok(Self {
            client: reqwest::Client::new(),
            client_email: email,
            private_key: key,
            spreadsheet_id: id,
            sheet_name: config.sheet_name.clone(),
            token_url: TOKEN_URL.to_string(),
            api_base: SHEETS_API.to_string(),
        })
    }

    /// Point the token exchange and the Sheets API elsewhere
    pub fn with_endpoints(mut self, token_url: impl Into<String>, api_base: impl Into<String>) -> Self {
        self.token_url = token_url.into();
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub async fn append_record(&self, record: &LogRecord) -> Result<()> {
        self.append_row(sheet_row(record)).await
    }

    pub async fn append_row(&self, row: Vec<Value>) -> Result<()> {
        self.try_append(row).await.map_err(|e| {
            tracing::error!(error = %format!("{e:#}"), "Sheets append failed");
            MoodlightError::Storage(format!("{e:#}"))
        })
    }

    async fn try_append(&self, row: Vec<Value>) -> anyhow::Result<()> {
        let token = self.access_token().await?;
        let url = self.append_url()?;

        self.client
            .post(url)
            .bearer_auth(token)
            .json(&json!({ "values": [row] }))
            .send()
            .await
            .context("Failed to reach Google Sheets API")?
            .error_for_status()
            .context("Google Sheets rejected the append")?;

        tracing::debug!(spreadsheet = %self.spreadsheet_id, sheet = %self.sheet_name, "Row appended");
        Ok(())
    }

    fn append_url(&self) -> anyhow::Result<url::Url> {
        let range = format!("{}!A1:append", self.sheet_name);
        let mut url = url::Url::parse(&self.api_base).context("Invalid Sheets API URL")?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("Sheets API URL cannot be a base"))?
            .extend(["spreadsheets", self.spreadsheet_id.as_str(), "values", range.as_str()]);
        url.query_pairs_mut()
            .append_pair("valueInputOption", "RAW")
            .append_pair("insertDataOption", "INSERT_ROWS");
        Ok(url)
    }

    fn sign_assertion(&self, now: DateTime<Utc>) -> anyhow::Result<String> {
        let claims = AssertionClaims {
            iss: self.client_email.clone(),
            scope: SCOPE.to_string(),
            aud: self.token_url.clone(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(1)).timestamp(),
        };
        let key = EncodingKey::from_rsa_pem(self.private_key.as_bytes())
            .context("Invalid GOOGLE_SHEETS_PRIVATE_KEY")?;
        encode(&Header::new(Algorithm::RS256), &claims, &key).context("Failed to sign JWT")
    }

    async fn access_token(&self) -> anyhow::Result<String> {
        let assertion = self.sign_assertion(Utc::now())?;
        let response: TokenResponse = self
            .client
            .post(&self.token_url)
            .form(&[("grant_type", GRANT_TYPE), ("assertion", assertion.as_str())])
            .send()
            .await
            .context("Failed to reach Google token endpoint")?
            .error_for_status()
            .context("Google token exchange failed")?
            .json()
            .await
            .context("Invalid token response")?;
        Ok(response.access_token)
    }
}

/// `[timestamp, label, model, system, prompt, output, prompt_tokens, completion_tokens, total_tokens]`
pub fn sheet_row(record: &LogRecord) -> Vec<Value> {
    let count = |n: Option<u64>| n.map(Value::from).unwrap_or_else(|| Value::from(""));
    vec![
        Value::from(record.timestamp.as_str()),
        Value::from(record.label.as_str()),
        Value::from(record.model.as_str()),
        Value::from(record.system.as_str()),
        Value::from(record.prompt.as_str()),
        Value::from(record.output.as_str()),
        count(record.usage.prompt_tokens),
        count(record.usage.completion_tokens),
        count(record.usage.total_tokens),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{SaveRequest, UsageRecord};
    use jsonwebtoken::{decode, DecodingKey, Validation};

    const TEST_KEY: &str = include_str!("../../tests/fixtures/test_service_account_key.pem");
    const TEST_PUBLIC_KEY: &str = include_str!("../../tests/fixtures/test_service_account_pub.pem");

    fn config() -> SheetsConfig {
        SheetsConfig {
            client_email: Some("bot@project.iam.gserviceaccount.com".into()),
            private_key: Some(TEST_KEY.into()),
            spreadsheet_id: Some("sheet-123".into()),
            sheet_name: "Runs 2024".into(),
        }
    }

    #[test]
    fn test_missing_credentials() {
        let mut cfg = config();
        cfg.spreadsheet_id = None;
        let err = SheetsClient::from_config(&cfg).unwrap_err();
        assert_eq!(err.to_string(), MISSING_CREDENTIALS);
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn test_append_url() {
        let client = SheetsClient::from_config(&config()).unwrap();
        let url = client.append_url().unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/sheet-123/values/Runs%202024!A1:append?valueInputOption=RAW&insertDataOption=INSERT_ROWS"
        );
    }

    #[test]
    fn test_assertion_is_rs256_signed() {
        let client = SheetsClient::from_config(&config()).unwrap();
        let token = client.sign_assertion(Utc::now()).unwrap();

        let header = jsonwebtoken::decode_header(&token).unwrap();
        assert_eq!(header.alg, Algorithm::RS256);

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[TOKEN_URL]);
        let public = DecodingKey::from_rsa_pem(TEST_PUBLIC_KEY.as_bytes()).unwrap();
        let claims = decode::<AssertionClaims>(&token, &public, &validation)
            .unwrap()
            .claims;
        assert_eq!(claims.iss, "bot@project.iam.gserviceaccount.com");
        assert_eq!(claims.scope, SCOPE);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_bad_private_key() {
        let mut cfg = config();
        cfg.private_key = Some("not a key".into());
        let client = SheetsClient::from_config(&cfg).unwrap();
        assert!(client.sign_assertion(Utc::now()).is_err());
    }

    #[test]
    fn test_sheet_row() {
        let req = SaveRequest {
            prompt: Some("p".into()),
            usage: Some(UsageRecord {
                prompt_tokens: Some(3),
                completion_tokens: None,
                total_tokens: Some(3),
            }),
            ..Default::default()
        };
        let row = sheet_row(&LogRecord::new(&req, Utc::now()));
        assert_eq!(row.len(), 9);
        assert_eq!(row[4], "p");
        assert_eq!(row[6], 3);
        assert_eq!(row[7], "");
    }
}
