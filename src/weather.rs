//! Current Seoul temperature from Open-Meteo

use crate::error::{MoodlightError, Result};
use serde::Serialize;
use serde_json::Value;

pub const SEOUL_LATITUDE: f64 = 37.5665;
pub const SEOUL_LONGITUDE: f64 = 126.978;
pub const TIMEZONE: &str = "Asia/Seoul";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherReport {
    pub temperature: f64,
    pub time: Option<String>,
    pub unit: &'static str,
}

impl WeatherReport {
    /// System-message context line handed to the model
    pub fn context_line(&self) -> String {
        format!(
            "Context: As of {} ({}), current temperature in Seoul is {}°C.",
            self.time.as_deref().unwrap_or("now"),
            TIMEZONE,
            self.temperature
        )
    }
}

#[derive(Debug, Clone)]
pub struct WeatherClient {
    client: reqwest::Client,
    base_url: String,
}

impl WeatherClient {
    /// `base_url` is the forecast endpoint, e.g. `https://api.open-meteo.com/v1/forecast`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    pub fn request_url(&self) -> Result<url::Url> {
        let mut url = url::Url::parse(&self.base_url)
            .map_err(|e| MoodlightError::Transport(format!("Invalid weather URL: {e}")))?;
        url.query_pairs_mut()
            .append_pair("latitude", &SEOUL_LATITUDE.to_string())
            .append_pair("longitude", &SEOUL_LONGITUDE.to_string())
            .append_pair("current_weather", "true")
            .append_pair("timezone", TIMEZONE);
        Ok(url)
    }

    pub async fn current(&self) -> Result<WeatherReport> {
        let url = self.request_url()?;
        tracing::debug!(url = %url, "Fetching Seoul weather");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| MoodlightError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = %status, "Weather upstream error");
            return Err(MoodlightError::WeatherUpstream {
                status: status.as_u16(),
            });
        }

        let data: Value = response
            .json()
            .await
            .map_err(|_| MoodlightError::InvalidWeather)?;
        parse_report(&data)
    }
}

fn parse_report(data: &Value) -> Result<WeatherReport> {
    let current = &data["current_weather"];
    let temperature = current["temperature"]
        .as_f64()
        .ok_or(MoodlightError::InvalidWeather)?;
    Ok(WeatherReport {
        temperature,
        time: current["time"].as_str().map(str::to_string),
        unit: "°C",
    })
}

/// The prompt names Seoul and asks about weather or temperature.
pub fn wants_seoul_weather(text: &str) -> bool {
    let lower = text.to_lowercase();
    let seoul = lower.contains("seoul") || text.contains("서울");
    seoul
        && (lower.contains("weather")
            || lower.contains("temperature")
            || ["기온", "온도", "날씨"].iter().any(|k| text.contains(k)))
}
