use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use mandi_core::{
    analyze, build_series, derive_options, narrow, summarize, Coordinates, FilterOptions,
    FilterSelection, MarketRecord, PriceInsight, PricePoint,
};
use mandi_market::{DashboardSnapshot, MarketClient, MarketSession};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{
    map_market_error, missing_key, normalize_limit, normalize_offset, ApiError, ApiResponse,
    AppState,
};

/// Filters, pagination, and optional radius shared by every market route.
#[derive(Debug, Default, Deserialize)]
pub(super) struct MarketQuery {
    pub state: Option<String>,
    pub district: Option<String>,
    pub market: Option<String>,
    pub commodity: Option<String>,
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub radius_km: Option<f64>,
}

impl MarketQuery {
    /// A query string states every level at once, so fields are assigned
    /// directly rather than through the cascading `select`.
    fn selection(&self, default_page_size: u32) -> FilterSelection {
        let clean = |v: Option<&str>| v.map(str::trim).unwrap_or_default().to_string();
        FilterSelection {
            state: clean(self.state.as_deref()),
            district: clean(self.district.as_deref()),
            market: clean(self.market.as_deref()),
            commodity: clean(self.commodity.as_deref()),
            search: clean(self.search.as_deref()),
            limit: normalize_limit(self.limit, default_page_size),
            offset: normalize_offset(self.offset),
        }
    }

    fn location(&self, request_id: &str) -> Result<Option<Coordinates>, ApiError> {
        let geo = match (self.lat, self.lon) {
            (None, None) => return Ok(None),
            (Some(lat), Some(lon)) => Coordinates {
                latitude: lat,
                longitude: lon,
                radius_km: self.radius_km,
            },
            _ => {
                return Err(ApiError::new(
                    request_id,
                    "validation_error",
                    "lat and lon must be given together",
                ))
            }
        };

        let radius_ok = geo.radius_km.is_none_or(|r| r.is_finite() && r > 0.0);
        if !geo.is_valid() || !radius_ok {
            return Err(ApiError::new(
                request_id,
                "validation_error",
                "lat must be in [-90, 90], lon in [-180, 180], radius_km positive",
            ));
        }
        Ok(Some(geo))
    }
}

#[derive(Debug, Serialize)]
pub(super) struct InsightData {
    text: String,
    insight: Option<PriceInsight>,
}

fn market_client(state: &AppState, request_id: &str) -> Result<Arc<MarketClient>, ApiError> {
    state
        .market
        .clone()
        .ok_or_else(|| missing_key(request_id.to_string(), "DATA_GOV_API_KEY"))
}

/// Fetches the requested page and narrows it by search text and radius.
async fn fetch_page(
    state: &AppState,
    request_id: &str,
    query: &MarketQuery,
) -> Result<(FilterSelection, Vec<MarketRecord>), ApiError> {
    let geo = query.location(request_id)?;
    let selection = query.selection(state.config.page_size);
    let client = market_client(state, request_id)?;

    let raw = client
        .try_fetch_records(&selection.to_query())
        .await
        .map_err(|e| map_market_error(request_id.to_string(), &e))?;

    let records = narrow(&raw, selection.search_query(), geo.as_ref());
    tracing::debug!(
        fetched = raw.len(),
        kept = records.len(),
        "market page narrowed"
    );
    Ok((selection, records))
}

pub(super) async fn list_records(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<MarketQuery>,
) -> Result<Json<ApiResponse<Vec<MarketRecord>>>, ApiError> {
    let (_, records) = fetch_page(&state, &req_id.0, &query).await?;
    Ok(Json(ApiResponse::new(req_id.0, records)))
}

pub(super) async fn list_options(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<MarketQuery>,
) -> Result<Json<ApiResponse<FilterOptions>>, ApiError> {
    let (selection, records) = fetch_page(&state, &req_id.0, &query).await?;
    let options = derive_options(&records, &selection);
    Ok(Json(ApiResponse::new(req_id.0, options)))
}

pub(super) async fn price_trend(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<MarketQuery>,
) -> Result<Json<ApiResponse<Vec<PricePoint>>>, ApiError> {
    let (selection, records) = fetch_page(&state, &req_id.0, &query).await?;
    let series = build_series(
        &records,
        Some(selection.market.as_str()),
        Some(selection.commodity.as_str()),
    );
    Ok(Json(ApiResponse::new(req_id.0, series)))
}

pub(super) async fn price_insight(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<MarketQuery>,
) -> Result<Json<ApiResponse<InsightData>>, ApiError> {
    let (selection, records) = fetch_page(&state, &req_id.0, &query).await?;
    let data = InsightData {
        text: summarize(
            &records,
            Some(selection.commodity.as_str()),
            Some(selection.state.as_str()),
        ),
        insight: analyze(&records),
    };
    Ok(Json(ApiResponse::new(req_id.0, data)))
}

pub(super) async fn dashboard(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<MarketQuery>,
) -> Result<Json<ApiResponse<DashboardSnapshot>>, ApiError> {
    let geo = query.location(&req_id.0)?;
    let client = market_client(&state, &req_id.0)?;

    let mut session =
        MarketSession::new(query.selection(state.config.page_size)).with_location(geo);
    let pending = session.begin_fetch();
    let records = client
        .try_fetch_records(pending.query())
        .await
        .map_err(|e| map_market_error(req_id.0.clone(), &e))?;
    session.complete(pending, Ok(records));

    Ok(Json(ApiResponse::new(req_id.0, session.snapshot())))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{get_json, state_with};
    use super::*;
    use crate::api::build_app;
    use crate::middleware::UpstreamQuota;
    use axum::http::StatusCode;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn app_with_upstream(server: &MockServer) -> axum::Router {
        let client = MarketClient::with_base_url("test-key", 5, "mandi-test/0.1", &server.uri())
            .expect("client");
        build_app(state_with(Some(client), None), &UpstreamQuota::per_minute(100))
    }

    fn bihar_records() -> serde_json::Value {
        serde_json::json!({
            "records": [
                { "state": "Bihar", "district": "Patna", "market": "Patna", "commodity": "Wheat",
                  "modal_price": "2000", "arrival_date": "2024-03-01" },
                { "state": "Bihar", "district": "Patna", "market": "Danapur", "commodity": "Wheat",
                  "modal_price": "2600", "arrival_date": "2024-03-02" },
                { "state": "Bihar", "district": "Gaya", "market": "Gaya", "commodity": "Rice",
                  "modal_price": "1000", "arrival_date": "2024-03-03" }
            ]
        })
    }

    async fn mount_bihar(server: &MockServer) {
        Mock::given(method("GET"))
            .and(query_param("filters[state]", "Bihar"))
            .respond_with(ResponseTemplate::new(200).set_body_json(bihar_records()))
            .mount(server)
            .await;
    }

    #[test]
    fn query_selection_keeps_every_level() {
        let query = MarketQuery {
            state: Some("Bihar".into()),
            district: Some("Patna".into()),
            commodity: Some("  Wheat ".into()),
            limit: Some(1_000),
            offset: Some(40),
            ..MarketQuery::default()
        };
        let selection = query.selection(20);
        assert_eq!(selection.state, "Bihar");
        assert_eq!(selection.district, "Patna");
        assert_eq!(selection.commodity, "Wheat");
        assert_eq!(selection.limit, 500);
        assert_eq!(selection.offset, 40);
    }

    #[test]
    fn location_requires_both_coordinates() {
        let query = MarketQuery {
            lat: Some(25.0),
            ..MarketQuery::default()
        };
        assert!(query.location("r").is_err());

        let query = MarketQuery {
            lat: Some(25.0),
            lon: Some(85.0),
            ..MarketQuery::default()
        };
        assert!(query.location("r").expect("valid").is_some());
    }

    #[tokio::test]
    async fn records_route_forwards_filters_and_pagination() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("filters[state]", "Kerala"))
            .and(query_param("limit", "10"))
            .and(query_param("offset", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "records": [{ "state": "Kerala", "market": "Aluva" }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let app = app_with_upstream(&server);
        let (status, json) =
            get_json(app, "/api/v1/market/records?state=Kerala&limit=10&offset=0").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"][0]["market"], "Aluva");
    }

    #[tokio::test]
    async fn upstream_failure_is_a_bad_gateway() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let app = app_with_upstream(&server);
        let (status, json) = get_json(app, "/api/v1/market/records?state=Kerala").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(json["error"]["code"], "upstream_error");
    }

    #[tokio::test]
    async fn empty_upstream_is_an_empty_list() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "records": [] })),
            )
            .mount(&server)
            .await;

        let app = app_with_upstream(&server);
        let (status, json) = get_json(app, "/api/v1/market/records").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn search_narrows_records() {
        let server = MockServer::start().await;
        mount_bihar(&server).await;

        let app = app_with_upstream(&server);
        let (_, json) = get_json(app, "/api/v1/market/records?state=Bihar&search=gaya").await;
        let rows = json["data"].as_array().expect("data array");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["commodity"], "Rice");
    }

    #[tokio::test]
    async fn options_cascade_from_state() {
        let server = MockServer::start().await;
        mount_bihar(&server).await;

        let app = app_with_upstream(&server);
        let (status, json) = get_json(app, "/api/v1/market/options?state=Bihar").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["districts"], serde_json::json!(["Gaya", "Patna"]));
        assert_eq!(
            json["data"]["markets"],
            serde_json::json!(["Danapur", "Gaya", "Patna"])
        );
    }

    #[tokio::test]
    async fn trend_is_ordered_by_date() {
        let server = MockServer::start().await;
        mount_bihar(&server).await;

        let app = app_with_upstream(&server);
        let (_, json) = get_json(app, "/api/v1/market/trend?state=Bihar").await;
        let dates: Vec<&str> = json["data"]
            .as_array()
            .expect("data array")
            .iter()
            .filter_map(|p| p["date"].as_str())
            .collect();
        assert_eq!(dates, vec!["2024-03-01", "2024-03-02", "2024-03-03"]);
    }

    #[tokio::test]
    async fn insight_describes_filtered_prices() {
        let server = MockServer::start().await;
        mount_bihar(&server).await;

        let app = app_with_upstream(&server);
        let (_, json) = get_json(app, "/api/v1/market/insight?state=Bihar").await;
        let text = json["data"]["text"].as_str().expect("text");
        assert!(text.starts_with("Average modal price in Bihar is around"));
        assert_eq!(json["data"]["insight"]["sample_size"], 3);
    }

    #[tokio::test]
    async fn dashboard_combines_everything() {
        let server = MockServer::start().await;
        mount_bihar(&server).await;

        let app = app_with_upstream(&server);
        let (status, json) = get_json(app, "/api/v1/market/dashboard?state=Bihar&limit=3").await;
        assert_eq!(status, StatusCode::OK);
        let data = &json["data"];
        assert_eq!(data["records"].as_array().map(Vec::len), Some(3));
        assert_eq!(data["page"], 1);
        assert_eq!(data["can_go_prev"], false);
        assert_eq!(data["can_go_next"], true);
        assert_eq!(data["status"]["state"], "ready");
        assert!(data["insight_text"].is_string());
    }

    #[tokio::test]
    async fn half_given_location_is_rejected() {
        let server = MockServer::start().await;
        let app = app_with_upstream(&server);
        let (status, json) = get_json(app, "/api/v1/market/records?lat=25.6").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "validation_error");
    }
}
