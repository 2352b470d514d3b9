use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    app::state::AppState,
    config::{GlobalConfig, PortalConfig},
    middleware::{
        access_gate::{GateContext, access_gate_middleware, strip_trust_headers},
        rate_limiter::rate_limit_middleware,
    },
    routes::{
        health::{health_check, not_found},
        portal::{landing, login_page, subject_home, subject_properties},
        session::{login, logout},
        stats::auth_stats,
    },
    utils::rate_limiter::RateLimiter,
};

#[derive(Clone)]
pub struct AppContext {
    pub state: AppState,
    pub config: GlobalConfig,
    pub rate_limiter: RateLimiter,
}

impl AppContext {
    pub fn new(state: AppState, config: GlobalConfig) -> Self {
        let rate_limiter = RateLimiter::per_minute(config.rate_limit.login_attempts_per_minute);
        Self {
            state,
            config,
            rate_limiter,
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(title = "Stayportal Gateway API", version = "1.0.0"),
    paths(
        crate::routes::health::health_check,
        crate::routes::session::login,
        crate::routes::session::logout,
        crate::routes::stats::auth_stats,
    ),
    components(schemas(
        crate::models::responses::ApiResponse,
        crate::models::requests::LoginRequest,
        crate::models::session::Session,
        crate::models::session::SubjectKind,
    ))
)]
struct ApiDoc;

pub fn create_api_router(context: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(
            context
                .config
                .server
                .cors_allowed_origins
                .iter()
                .filter_map(|origin| origin.parse().ok())
                .collect::<Vec<_>>(),
        )
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::COOKIE,
            axum::http::header::CACHE_CONTROL,
        ])
        .allow_credentials(true);

    let login_routes = Router::new()
        .route("/api/{kind}/login", post(login))
        .route_layer(axum::middleware::from_fn(rate_limit_middleware))
        .route_layer(axum::Extension(context.rate_limiter.clone()));

    let admin = context.config.admin_portal.clone();
    let owner = context.config.owner_portal.clone();
    let gate_contexts: Vec<GateContext> = [&admin, &owner]
        .into_iter()
        .filter(|portal| portal.gated)
        .map(|portal| GateContext {
            portal: portal.clone(),
            codec: context.state.codec.clone(),
            max_age: context.config.session.max_age(),
            telemetry: context.state.telemetry.clone(),
        })
        .collect();

    let mut app = Router::new()
        .route("/api/{kind}/logout", post(logout))
        .route("/health", get(health_check))
        .route("/stats/auth", get(auth_stats))
        .merge(login_routes)
        .merge(portal_routes(&admin))
        .merge(portal_routes(&owner))
        .merge(SwaggerUi::new("/swagger-ui").url("/docs/openapi.json", ApiDoc::openapi()))
        .fallback(not_found)
        .with_state(context);

    for gate in gate_contexts {
        app = app.layer(axum::middleware::from_fn_with_state(gate, access_gate_middleware));
    }

    app.layer(axum::middleware::from_fn(strip_trust_headers))
        .layer(cors)
}

/// Page routes for one portal. Ungated portals only expose their login entry.
fn portal_routes(portal: &PortalConfig) -> Router<AppContext> {
    let router = Router::new().route(&portal.login_path, get(login_page));

    if !portal.gated {
        return router;
    }

    router
        .route(&portal.root, get(landing))
        .route(&format!("{}/{{subject_id}}", portal.root), get(subject_home))
        .route(
            &format!("{}/{{subject_id}}/properties", portal.root),
            get(subject_properties),
        )
        .route_layer(axum::Extension(portal.clone()))
}
