use std::net::SocketAddr;

use axum::{
    Json,
    extract::ConnectInfo,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::{models::responses::ApiResponse, utils::rate_limiter::RateLimiter};

pub async fn rate_limit_middleware(req: Request<axum::body::Body>, next: Next) -> Response {
    let Some(rate_limiter) = req.extensions().get::<RateLimiter>() else {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };

    let client_key = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| rate_limiter.get_client_key(addr))
        .unwrap_or_else(|| "unknown".to_string());

    if !rate_limiter.check_rate_limit(&client_key) {
        tracing::warn!(client = %client_key, path = %req.uri().path(), "Login rate limit exceeded");
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(ApiResponse::failure("Too many login attempts", 429)),
        )
            .into_response();
    }

    next.run(req).await
}
