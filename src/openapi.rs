use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "telemetry-viewer-rs",
        description = "Machine status / vibration samples for the dashboard"
    ),
    paths(
        crate::routes::health::healthz_handler,
        crate::routes::samples::get_data,
        crate::routes::samples::get_all_data,
        crate::routes::samples::get_stretches,
    ),
    components(schemas(
        crate::routes::health::HealthResponse,
        crate::routes::samples::DataResponse,
        crate::routes::samples::StretchesResponse,
        crate::sample::Sample,
        crate::services::summary::Summary,
        crate::services::summary::Stretch,
        crate::error::ErrorResponse,
    )),
    tags(
        (name = "samples", description = "Range queries over stored samples"),
        (name = "health", description = "Liveness")
    )
)]
pub struct ApiDoc;

pub fn openapi_json() -> serde_json::Value {
    match serde_json::to_value(ApiDoc::openapi()) {
        Ok(value) => value,
        Err(err) => {
            tracing::error!(error = %err, "failed to serialize openapi document");
            serde_json::Value::Null
        }
    }
}

async fn openapi_handler() -> Json<serde_json::Value> {
    Json(openapi_json())
}

pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_handler))
}
