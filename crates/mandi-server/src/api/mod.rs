mod market;
mod weather;

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use mandi_core::{AppConfig, DEFAULT_FETCH_LIMIT, DEFAULT_PAGE_SIZE, INDIAN_STATES};
use mandi_market::{MarketClient, MarketError};
use mandi_weather::{WeatherClient, WeatherError};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{enforce_upstream_quota, request_id, RequestId, Upstream, UpstreamQuota};

/// Upstream clients are absent when their API key is not configured; the
/// affected routes then answer 503 `configuration_error`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub market: Option<Arc<MarketClient>>,
    pub weather: Option<Arc<WeatherClient>>,
}

impl AppState {
    /// Builds the upstream clients whose keys are configured.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured client cannot be constructed (for
    /// example an unparseable base URL).
    pub fn from_config(config: Arc<AppConfig>) -> anyhow::Result<Self> {
        let market = match MarketClient::from_config(&config) {
            Ok(client) => Some(Arc::new(client)),
            Err(MarketError::MissingApiKey) => {
                tracing::warn!("DATA_GOV_API_KEY not set; market routes will return 503");
                None
            }
            Err(e) => return Err(e.into()),
        };
        let weather = match WeatherClient::from_config(&config) {
            Ok(client) => Some(Arc::new(client)),
            Err(WeatherError::MissingApiKey) => {
                tracing::warn!("OPENWEATHER_API_KEY not set; weather route will return 503");
                None
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            config,
            market,
            weather,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    market: &'static str,
    weather: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub(super) fn new(request_id: String, data: T) -> Self {
        Self {
            data,
            meta: ResponseMeta::new(request_id),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "validation_error" => StatusCode::BAD_REQUEST,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            "upstream_error" => StatusCode::BAD_GATEWAY,
            "configuration_error" => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

/// Page size for market routes: `default` when absent, clamped to 1..=500.
pub(super) fn normalize_limit(limit: Option<i64>, default: u32) -> u32 {
    let clamped = limit
        .unwrap_or(i64::from(default))
        .clamp(1, i64::from(DEFAULT_FETCH_LIMIT));
    u32::try_from(clamped).unwrap_or(DEFAULT_PAGE_SIZE)
}

pub(super) fn normalize_offset(offset: Option<i64>) -> u32 {
    u32::try_from(offset.unwrap_or(0).max(0)).unwrap_or(u32::MAX)
}

pub(super) fn map_market_error(request_id: String, error: &MarketError) -> ApiError {
    match error {
        MarketError::MissingApiKey => missing_key(request_id, "DATA_GOV_API_KEY"),
        _ => {
            tracing::error!(error = %error, "price records request failed");
            ApiError::new(
                request_id,
                "upstream_error",
                "could not load market prices; please retry",
            )
        }
    }
}

pub(super) fn map_weather_error(request_id: String, error: &WeatherError) -> ApiError {
    match error {
        WeatherError::MissingApiKey => missing_key(request_id, "OPENWEATHER_API_KEY"),
        WeatherError::InvalidLocation { .. } => {
            ApiError::new(request_id, "validation_error", error.to_string())
        }
        _ => {
            tracing::error!(error = %error, "weather request failed");
            ApiError::new(
                request_id,
                "upstream_error",
                "could not load weather; please retry",
            )
        }
    }
}

pub(super) fn missing_key(request_id: String, var: &str) -> ApiError {
    ApiError::new(
        request_id,
        "configuration_error",
        format!("{var} is not configured on the server"),
    )
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static("x-request-id")])
}

fn market_router(quota: &UpstreamQuota) -> Router<AppState> {
    Router::new()
        .route("/api/v1/market/records", get(market::list_records))
        .route("/api/v1/market/options", get(market::list_options))
        .route("/api/v1/market/trend", get(market::price_trend))
        .route("/api/v1/market/insight", get(market::price_insight))
        .route("/api/v1/market/dashboard", get(market::dashboard))
        .layer(axum::middleware::from_fn_with_state(
            quota.guard(Upstream::DataGov),
            enforce_upstream_quota,
        ))
}

fn weather_router(quota: &UpstreamQuota) -> Router<AppState> {
    Router::new()
        .route("/api/v1/weather", get(weather::weather_report))
        .layer(axum::middleware::from_fn_with_state(
            quota.guard(Upstream::OpenWeather),
            enforce_upstream_quota,
        ))
}

pub fn build_app(state: AppState, quota: &UpstreamQuota) -> Router {
    let public_routes = Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/states", get(list_states));

    Router::new()
        .merge(public_routes)
        .merge(market_router(quota))
        .merge(weather_router(quota))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let configured = |present: bool| if present { "configured" } else { "missing_api_key" };
    let data = HealthData {
        status: "ok",
        market: configured(state.market.is_some()),
        weather: configured(state.weather.is_some()),
    };
    Json(ApiResponse::new(req_id.0, data))
}

async fn list_states(
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<&'static [&'static str]>> {
    Json(ApiResponse::new(req_id.0, INDIAN_STATES))
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use mandi_core::config::build_app_config;
    use tower::ServiceExt;

    /// Config with no keys and default URLs.
    pub fn bare_config() -> AppConfig {
        build_app_config(|_| Err(std::env::VarError::NotPresent)).expect("default config")
    }

    pub fn state_with(market: Option<MarketClient>, weather: Option<WeatherClient>) -> AppState {
        AppState {
            config: Arc::new(bare_config()),
            market: market.map(Arc::new),
            weather: weather.map(Arc::new),
        }
    }

    pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).expect("request"))
            .await
            .expect("response");
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json = serde_json::from_slice(&body).expect("json parse");
        (status, json)
    }
}
