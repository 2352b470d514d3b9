use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Redirect, Response},
};
use serde_json::json;

use crate::{
    app::api::AppContext,
    managers::session::{CookieJarRepository, SessionStore},
    models::{requests::LoginRequest, responses::ApiResponse, session::SubjectKind},
    services::auth::authenticate,
    telemetry::AuthEvent,
};

#[utoipa::path(
    post,
    path = "/api/{kind}/login",
    tag = "Session",
    params(("kind" = String, Path, description = "Portal kind: admin or owner")),
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session created, transport cookie set", body = ApiResponse),
        (status = 401, description = "Invalid credentials", body = ApiResponse),
        (status = 403, description = "Account inactive", body = ApiResponse),
        (status = 404, description = "Unknown portal", body = ApiResponse),
        (status = 429, description = "Too many login attempts", body = ApiResponse)
    )
)]
pub async fn login(
    State(context): State<AppContext>,
    Path(kind): Path<String>,
    Json(req): Json<LoginRequest>,
) -> Response {
    let Some(kind) = SubjectKind::parse(&kind) else {
        return unknown_portal();
    };

    let identity = match authenticate(
        context.state.verifier.as_ref(),
        context.state.lookup.as_ref(),
        kind,
        &req,
    )
    .await
    {
        Ok(identity) => identity,
        Err(e) => {
            let status = StatusCode::from_u16(e.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            tracing::info!(kind = %kind, identifier = %req.identifier, error = %e, "Login rejected");
            context.state.telemetry.record(AuthEvent::LoginRejected {
                kind,
                status: status.as_u16(),
            });
            return (
                status,
                Json(ApiResponse::failure(e.to_string(), status.as_u16() as u32)),
            )
                .into_response();
        }
    };

    let portal = context.config.portal(kind);
    let jar = cookie_jar(&context, kind);
    let store = SessionStore::for_portal(
        portal,
        jar.clone(),
        context.state.codec.clone(),
        context.config.session.max_age(),
    );

    let session = store.create_session(
        &identity.subject_id,
        &identity.email,
        &identity.display_name,
    );
    context.state.telemetry.record(AuthEvent::SessionIssued {
        kind,
        subject_id: session.subject_id.clone(),
    });

    let data = json!({
        "session": session,
        "expires_at": session.expires_at(store.max_age()),
        "redirect_to": portal.subject_path(&session.subject_id),
    });

    with_cookies(
        (StatusCode::OK, Json(ApiResponse::success("Session created.", data))).into_response(),
        &jar,
    )
}

#[utoipa::path(
    post,
    path = "/api/{kind}/logout",
    tag = "Session",
    params(("kind" = String, Path, description = "Portal kind: admin or owner")),
    responses(
        (status = 303, description = "Session cleared, redirect to the login entry point"),
        (status = 404, description = "Unknown portal", body = ApiResponse)
    )
)]
pub async fn logout(State(context): State<AppContext>, Path(kind): Path<String>) -> Response {
    let Some(kind) = SubjectKind::parse(&kind) else {
        return unknown_portal();
    };

    let jar = cookie_jar(&context, kind);
    let store = SessionStore::for_portal(
        context.config.portal(kind),
        jar.clone(),
        context.state.codec.clone(),
        context.config.session.max_age(),
    );

    let login_path = store.logout();
    context.state.telemetry.record(AuthEvent::SessionEnded { kind });

    with_cookies(Redirect::to(&login_path).into_response(), &jar)
}

fn cookie_jar(context: &AppContext, kind: SubjectKind) -> Arc<CookieJarRepository> {
    Arc::new(CookieJarRepository::new(
        kind.cookie_name(),
        context.config.session.max_age_secs,
        context.config.session.cookie_secure,
    ))
}

fn with_cookies(mut response: Response, jar: &CookieJarRepository) -> Response {
    for cookie in jar.set_cookie_headers() {
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to build session cookie header");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ApiResponse::failure("Failed to set session cookie", 500)),
                )
                    .into_response();
            }
        }
    }

    response
}

fn unknown_portal() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::failure("Unknown portal", 404)),
    )
        .into_response()
}
