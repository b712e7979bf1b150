//! Request tagging and upstream call budgeting.
//!
//! Every data route ends up calling data.gov.in or `OpenWeatherMap`, both of
//! which enforce per-key quotas. The server spends its own budget per
//! upstream before forwarding, so one noisy client cannot burn the key for
//! everyone else.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::sync::Mutex;
use tracing::Instrument;
use uuid::Uuid;

use crate::api::ApiError;

const REQUEST_ID_HEADER: &str = "x-request-id";
const MAX_REQUEST_ID_LEN: usize = 128;

/// Request ID carried as a request extension and echoed in response meta.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// The external API a route spends calls on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upstream {
    DataGov,
    OpenWeather,
}

impl Upstream {
    fn label(self) -> &'static str {
        match self {
            Self::DataGov => "data.gov.in",
            Self::OpenWeather => "OpenWeatherMap",
        }
    }

    /// Upstream calls one inbound request costs. A weather report fetches
    /// current conditions and the forecast.
    fn calls_per_request(self) -> usize {
        match self {
            Self::DataGov => 1,
            Self::OpenWeather => 2,
        }
    }
}

#[derive(Debug)]
struct Window {
    started_at: Instant,
    spent: usize,
}

impl Window {
    fn fresh() -> Arc<Mutex<Self>> {
        Arc::new(Mutex::new(Self {
            started_at: Instant::now(),
            spent: 0,
        }))
    }
}

/// Fixed-window call budget, tracked separately for each upstream.
#[derive(Debug, Clone)]
pub struct UpstreamQuota {
    calls_per_window: usize,
    window: Duration,
    data_gov: Arc<Mutex<Window>>,
    open_weather: Arc<Mutex<Window>>,
}

impl UpstreamQuota {
    /// `calls_per_window` is raised to at least the cost of the most
    /// expensive request, otherwise the weather route could never succeed.
    #[must_use]
    pub fn new(calls_per_window: usize, window: Duration) -> Self {
        Self {
            calls_per_window: calls_per_window.max(Upstream::OpenWeather.calls_per_request()),
            window,
            data_gov: Window::fresh(),
            open_weather: Window::fresh(),
        }
    }

    #[must_use]
    pub fn per_minute(calls: usize) -> Self {
        Self::new(calls, Duration::from_secs(60))
    }

    /// Middleware state that charges `upstream` for each request.
    #[must_use]
    pub fn guard(&self, upstream: Upstream) -> QuotaGuard {
        QuotaGuard {
            quota: self.clone(),
            upstream,
        }
    }

    /// Spends one request's worth of calls, or returns the time until the
    /// window resets. Rejected requests spend nothing.
    async fn try_spend(&self, upstream: Upstream) -> Result<(), Duration> {
        let slot = match upstream {
            Upstream::DataGov => &self.data_gov,
            Upstream::OpenWeather => &self.open_weather,
        };
        let mut window = slot.lock().await;

        let elapsed = window.started_at.elapsed();
        if elapsed >= self.window {
            window.started_at = Instant::now();
            window.spent = 0;
        }

        let cost = upstream.calls_per_request();
        if window.spent + cost > self.calls_per_window {
            return Err(self.window.saturating_sub(window.started_at.elapsed()));
        }
        window.spent += cost;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct QuotaGuard {
    quota: UpstreamQuota,
    upstream: Upstream,
}

/// Extracts or mints the request ID and runs the request inside a span
/// carrying it.
///
/// An incoming `x-request-id` is honoured when it is non-empty and at most
/// 128 bytes; otherwise a `UUIDv4` is generated. The ID is echoed on the
/// response header.
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty() && v.len() <= MAX_REQUEST_ID_LEN)
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    let span = tracing::info_span!(
        "api_request",
        request_id = %id,
        method = %req.method(),
        path = %req.uri().path(),
    );
    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).instrument(span).await;

    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert(REQUEST_ID_HEADER, val);
    }

    res
}

/// Rejects the request with 429 `rate_limited` when the route's upstream
/// budget is spent for the current window.
pub async fn enforce_upstream_quota(
    State(guard): State<QuotaGuard>,
    req: Request,
    next: Next,
) -> Response {
    let Err(retry_in) = guard.quota.try_spend(guard.upstream).await else {
        return next.run(req).await;
    };

    let req_id = req
        .extensions()
        .get::<RequestId>()
        .map(|r| r.0.clone())
        .unwrap_or_default();
    let retry_secs = retry_in.as_secs().max(1);
    tracing::warn!(
        upstream = guard.upstream.label(),
        retry_secs,
        "upstream call budget exhausted"
    );

    let mut res = ApiError::new(
        req_id,
        "rate_limited",
        format!(
            "{} call budget exhausted; retry in {retry_secs}s",
            guard.upstream.label()
        ),
    )
    .into_response();
    if let Ok(val) = HeaderValue::from_str(&retry_secs.to_string()) {
        res.headers_mut().insert(header::RETRY_AFTER, val);
    }
    res
}
