use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError};
use std::time::Instant;

use crate::location::{resolve_or_fallback, Coordinate, PlaceInfo};

use super::state::AppState;

// ─── Error response ──────────────────────────────────────────────

#[derive(Serialize)]
struct ApiErrorBody {
    error: String,
    code: u16,
}

pub struct ApiError(StatusCode, String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            error: self.1,
            code: self.0.as_u16(),
        };
        (self.0, Json(body)).into_response()
    }
}

fn api_error(status: StatusCode, msg: impl Into<String>) -> ApiError {
    ApiError(status, msg.into())
}

// ─── GET /api/reverse ────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ReverseQuery {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub locale: Option<String>,
}

pub async fn reverse(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ReverseQuery>,
) -> Result<Json<PlaceInfo>, ApiError> {
    let start = Instant::now();

    let (Some(lat), Some(lon)) = (params.lat, params.lon) else {
        return Err(api_error(StatusCode::BAD_REQUEST, "Provide 'lat' and 'lon' parameters"));
    };
    let coordinate = Coordinate::new(lat, lon).map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;
    let locale = params.locale.unwrap_or_else(|| state.locale.clone());

    let geocoder = state.geocoder.clone();
    let lookup_locale = locale.clone();
    let name = tokio::task::spawn_blocking(move || resolve_or_fallback(geocoder.as_ref(), coordinate, &lookup_locale))
        .await
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    log::info!(
        "GET /api/reverse lat={} lon={} locale={} -> {} ({:.1}ms)",
        lat,
        lon,
        locale,
        name,
        start.elapsed().as_secs_f64() * 1000.0,
    );

    Ok(Json(PlaceInfo::new(name, coordinate)))
}

// ─── /api/notes/{id}/location ────────────────────────────────────

pub async fn get_location(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<PlaceInfo>, ApiError> {
    let store = state.store.lock().unwrap_or_else(PoisonError::into_inner);
    store
        .location(&id)
        .map(Json)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, format!("Note '{}' has no location", id)))
}

pub async fn put_location(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(place): Json<PlaceInfo>,
) -> Result<StatusCode, ApiError> {
    if let Err(e) = Coordinate::new(place.lat, place.lng) {
        return Err(api_error(StatusCode::BAD_REQUEST, e.to_string()));
    }
    let mut store = state.store.lock().unwrap_or_else(PoisonError::into_inner);
    store
        .set_location(&id, &place)
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    log::info!("PUT /api/notes/{}/location -> {}", id, place.name);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_location(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let mut store = state.store.lock().unwrap_or_else(PoisonError::into_inner);
    store
        .clear_location(&id)
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    log::info!("DELETE /api/notes/{}/location", id);
    Ok(StatusCode::NO_CONTENT)
}
