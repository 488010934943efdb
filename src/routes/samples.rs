use axum::extract::{RawQuery, State};
use axum::routing::get;
use axum::{Json, Router};

use crate::error::{AppError, AppResult};
// Referenced only inside #[utoipa::path] attributes; a bare name keeps the
// generated $ref as `ErrorResponse` (utoipa 4 renders full paths verbatim).
#[allow(unused_imports)]
use crate::error::ErrorResponse;
use crate::sample::Sample;
use crate::services::query::{self, RangeParams};
use crate::services::summary::{Stretch, Summary};
use crate::state::AppState;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, utoipa::ToSchema)]
pub struct DataResponse {
    pub data: Vec<Sample>,
    pub summary: Summary,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, utoipa::ToSchema)]
pub struct StretchesResponse {
    pub stretches: Vec<Stretch>,
    pub summary: Summary,
}

#[utoipa::path(
    get,
    path = "/data",
    tag = "samples",
    params(
        ("start_time" = Option<String>, Query, description = "Inclusive start (ISO-8601). Ignored unless end_time is also a valid timestamp."),
        ("end_time" = Option<String>, Query, description = "Inclusive end (ISO-8601). Ignored unless start_time is also a valid timestamp.")
    ),
    responses(
        (status = 200, description = "Samples in range with active/inactive summary", body = DataResponse),
        (status = 500, description = "Sample store unavailable", body = ErrorResponse)
    )
)]
pub(crate) async fn get_data(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
) -> AppResult<Json<DataResponse>> {
    let params = RangeParams::from_raw_query(raw.as_deref());
    let result = query::query_range(&state.store, &params)
        .await
        .map_err(|err| AppError::store(err, "Error fetching data"))?;
    Ok(Json(DataResponse {
        data: result.samples,
        summary: result.summary,
    }))
}

#[utoipa::path(
    get,
    path = "/alldata",
    tag = "samples",
    responses(
        (status = 200, description = "Every stored sample", body = Vec<Sample>),
        (status = 500, description = "Sample store unavailable", body = ErrorResponse)
    )
)]
pub(crate) async fn get_all_data(State(state): State<AppState>) -> AppResult<Json<Vec<Sample>>> {
    let samples = query::query_all(&state.store)
        .await
        .map_err(|err| AppError::store(err, "Error fetching all data"))?;
    Ok(Json(samples))
}

#[utoipa::path(
    get,
    path = "/data/stretches",
    tag = "samples",
    params(
        ("start_time" = Option<String>, Query, description = "Inclusive start (ISO-8601)"),
        ("end_time" = Option<String>, Query, description = "Inclusive end (ISO-8601)")
    ),
    responses(
        (status = 200, description = "Continuous same-status stretches in range", body = StretchesResponse),
        (status = 500, description = "Sample store unavailable", body = ErrorResponse)
    )
)]
pub(crate) async fn get_stretches(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
) -> AppResult<Json<StretchesResponse>> {
    let params = RangeParams::from_raw_query(raw.as_deref());
    let result = query::query_stretches(&state.store, &params)
        .await
        .map_err(|err| AppError::store(err, "Error fetching stretches"))?;
    Ok(Json(StretchesResponse {
        stretches: result.stretches,
        summary: result.summary,
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/data", get(get_data))
        .route("/data/stretches", get(get_stretches))
        .route("/alldata", get(get_all_data))
}
