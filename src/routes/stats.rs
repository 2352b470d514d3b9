use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;

use crate::{app::api::AppContext, models::responses::ApiResponse};

#[utoipa::path(
    get,
    path = "/stats/auth",
    tag = "Stats",
    responses(
        (status = 200, description = "Session and gate outcome counters", body = ApiResponse),
    )
)]
pub async fn auth_stats(State(context): State<AppContext>) -> impl IntoResponse {
    let data = json!({
        "counters": context.state.telemetry.snapshot(),
        "session_max_age_secs": context.config.session.max_age_secs,
    });

    (
        StatusCode::OK,
        Json(ApiResponse::success("Auth stats fetched.", data)),
    )
}
