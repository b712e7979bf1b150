use axum::{
    extract::{Query, State},
    Extension, Json,
};
use mandi_core::Coordinates;
use mandi_weather::WeatherReport;
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{map_weather_error, missing_key, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct WeatherQuery {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

pub(super) async fn weather_report(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<WeatherQuery>,
) -> Result<Json<ApiResponse<WeatherReport>>, ApiError> {
    let (Some(lat), Some(lon)) = (query.lat, query.lon) else {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "lat and lon are required",
        ));
    };

    let Some(client) = state.weather.clone() else {
        return Err(missing_key(req_id.0, "OPENWEATHER_API_KEY"));
    };

    let report = client
        .report(&Coordinates::new(lat, lon))
        .await
        .map_err(|e| map_weather_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(req_id.0, report)))
}
