use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use super::ServerState;
use crate::error::{MoodlightError, Result};
use crate::generate::{GenerateRequest, GenerateResponse};
use crate::store::{LogRecord, SaveRequest, MISSING_CREDENTIALS};
use crate::weather::WeatherReport;

/// A body that is not a JSON object is treated as empty, so validation
/// reports the missing fields. Field types are forgiven by the request
/// structs themselves.
fn parse_body<T: DeserializeOwned + Default>(body: &Bytes) -> T {
    serde_json::from_slice(body).unwrap_or_default()
}

pub(super) async fn generate(
    State(state): State<ServerState>,
    body: Bytes,
) -> Result<Json<GenerateResponse>> {
    let generator = state
        .generator
        .as_ref()
        .ok_or_else(|| MoodlightError::missing_config("OPENAI_API_KEY"))?;

    let req: GenerateRequest = parse_body(&body);
    Ok(Json(generator.generate(&req).await?))
}

pub(super) async fn save_local(
    State(state): State<ServerState>,
    body: Bytes,
) -> Result<Json<Value>> {
    let req: SaveRequest = parse_body(&body);
    req.validate()?;

    let record = LogRecord::new(&req, Utc::now());
    let outcome = state.log_store.save(&record).await?;
    Ok(Json(outcome.to_json()))
}

pub(super) async fn save_prompt(
    State(state): State<ServerState>,
    body: Bytes,
) -> Result<Json<Value>> {
    let sheets = state
        .sheets
        .as_ref()
        .ok_or_else(|| MoodlightError::Storage(MISSING_CREDENTIALS.to_string()))?;

    let req: SaveRequest = parse_body(&body);
    req.validate()?;

    sheets.append_record(&LogRecord::new(&req, Utc::now())).await?;
    Ok(Json(json!({"ok": true})))
}

pub(super) async fn weather(State(state): State<ServerState>) -> Result<Json<WeatherReport>> {
    Ok(Json(state.weather.current().await?))
}

pub(super) async fn not_found() -> (StatusCode, Json<Value>) {
    (StatusCode::NOT_FOUND, Json(json!({"message": "Not Found"})))
}
