use axum::Router;
use tokio::net::TcpListener;

use stayportal_gateway::{
    app::{
        api::{AppContext, create_api_router},
        state::AppState,
    },
    config::GlobalConfig,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    tracing::info!("Starting Stayportal gateway");

    let config = GlobalConfig::from_env()?;
    let state = AppState::from_config(&config);

    if config.directory.is_empty() {
        tracing::warn!("DIRECTORY_SEED is empty, every login will be rejected");
    }
    if !config.owner_portal.gated {
        tracing::warn!(
            root = %config.owner_portal.root,
            "Owner portal has no server-side gate; set OWNER_PORTAL_GATED=true to enforce it"
        );
    }

    let context = AppContext::new(state, config.clone());
    let app: Router = create_api_router(context);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", addr, e))?;

    tracing::info!("Gateway running on http://{}", addr);
    tracing::info!(
        "Admin portal {} (login {}), session max age {}s",
        config.admin_portal.root,
        config.admin_portal.login_path,
        config.session.max_age_secs
    );

    axum::serve(listener, app.into_make_service_with_connect_info::<std::net::SocketAddr>())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}
