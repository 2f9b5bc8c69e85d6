//! HTTP API
//!
//! | Route | Method | Purpose |
//! |-------|--------|---------|
//! | `/generate` | POST | Completion + normalization |
//! | `/save-local` | POST | Append a run to KV or `data.jsonl` |
//! | `/save-prompt` | POST | Append a run to Google Sheets |
//! | `/weather` | GET | Current Seoul temperature |
//!
//! Every error body is `{"message": "..."}`. Other methods on a known route
//! get 405 with an `Allow` header.

mod handlers;

use crate::config::Config;
use crate::error::{MoodlightError, Result};
use crate::generate::Generator;
use crate::normalize::Normalizer;
use crate::provider::{OpenAIProvider, Provider};
use crate::store::{LogStore, SheetsClient};
use crate::weather::WeatherClient;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, MethodRouter};
use axum::{Json, Router};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared state handed to every handler
#[derive(Clone)]
struct ServerState {
    /// `None` when no API key is configured
    generator: Option<Generator>,
    log_store: LogStore,
    sheets: Option<Arc<SheetsClient>>,
    weather: WeatherClient,
}

pub struct Server {
    normalizer: Arc<Normalizer>,
    provider: Option<Arc<dyn Provider>>,
    log_store: LogStore,
    sheets: Option<Arc<SheetsClient>>,
    weather: WeatherClient,
}

impl Server {
    /// Wire everything from configuration. A missing API key or missing
    /// Sheets credentials only fail the routes that need them.
    pub fn new(config: &Config, normalizer: Normalizer) -> Self {
        let provider = OpenAIProvider::from_config(config)
            .ok()
            .map(|p| Arc::new(p) as Arc<dyn Provider>);
        let sheets = SheetsClient::from_config(&config.sheets).ok().map(Arc::new);

        Self {
            normalizer: Arc::new(normalizer),
            provider,
            log_store: LogStore::from_config(config),
            sheets,
            weather: WeatherClient::new(config.weather_url.clone()),
        }
    }

    /// Replace the completion backend
    pub fn with_provider(mut self, provider: Arc<dyn Provider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn with_sheets(mut self, sheets: SheetsClient) -> Self {
        self.sheets = Some(Arc::new(sheets));
        self
    }

    pub fn router(&self) -> Router {
        let generator = self.provider.clone().map(|provider| {
            Generator::new(provider, self.normalizer.clone()).with_weather(self.weather.clone())
        });

        let state = ServerState {
            generator,
            log_store: self.log_store.clone(),
            sheets: self.sheets.clone(),
            weather: self.weather.clone(),
        };

        Router::new()
            .route("/generate", only("POST", post(handlers::generate)))
            .route("/save-local", only("POST", post(handlers::save_local)))
            .route("/save-prompt", only("POST", post(handlers::save_prompt)))
            .route("/weather", only("GET", get(handlers::weather)))
            .fallback(handlers::not_found)
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .with_state(state)
    }

    /// Bind and serve until the process is stopped
    pub async fn run(self, addr: &str) -> Result<()> {
        let app = self.router();
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!(addr = %addr, "Server listening");
        axum::serve(listener, app).await?;
        Ok(())
    }
}

/// Answer any other method with 405 and `Allow: {allow}`
fn only(allow: &'static str, route: MethodRouter<ServerState>) -> MethodRouter<ServerState> {
    route.fallback(move || async move { method_not_allowed(allow) })
}

fn method_not_allowed(allow: &'static str) -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, allow)],
        Json(json!({"message": "Method Not Allowed"})),
    )
        .into_response()
}

impl IntoResponse for MoodlightError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!(status = %status, error = %self, "Request failed");
        } else {
            tracing::debug!(status = %status, error = %self, "Request rejected");
        }
        (status, Json(json!({"message": self.to_string()}))).into_response()
    }
}
