//! Portal pages. Rendering lives elsewhere; these return the data a page
//! would be built from, read straight off the gate's trust headers.

use axum::{
    Extension, Json,
    extract::Path,
    http::{StatusCode, Uri},
    response::IntoResponse,
};
use serde_json::json;

use crate::{
    config::PortalConfig, middleware::access_gate::AuthenticatedSubject,
    models::responses::ApiResponse,
};

pub async fn login_page(uri: Uri) -> impl IntoResponse {
    let data = json!({ "login_path": uri.path() });

    (
        StatusCode::OK,
        Json(ApiResponse::success("Sign in to continue.", data)),
    )
}

pub async fn landing(
    Extension(portal): Extension<PortalConfig>,
    subject: AuthenticatedSubject,
) -> impl IntoResponse {
    let home = portal.subject_path(&subject.subject_id);
    let data = json!({
        "subject_id": subject.subject_id,
        "subject_email": subject.subject_email,
        "home": home,
    });

    (StatusCode::OK, Json(ApiResponse::success("Signed in.", data)))
}

pub async fn subject_home(
    Path(subject_id): Path<String>,
    subject: AuthenticatedSubject,
) -> impl IntoResponse {
    let data = json!({
        "subject_id": subject_id,
        "subject_email": subject.subject_email,
    });

    (StatusCode::OK, Json(ApiResponse::success("Dashboard.", data)))
}

pub async fn subject_properties(
    Path(subject_id): Path<String>,
    subject: AuthenticatedSubject,
) -> impl IntoResponse {
    let data = json!({
        "subject_id": subject_id,
        "requested_by": subject.subject_email,
        "properties": [],
    });

    (
        StatusCode::OK,
        Json(ApiResponse::success("Properties fetched.", data)),
    )
}
