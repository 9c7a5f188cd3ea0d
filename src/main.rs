use flock_admin::{app, config};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up PORTAL_BACKEND_URL, SECURITY_JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = config::config();
    tracing::info!("Starting Flock portal in {:?} mode", config.environment);
    if flock_admin::is_development!() {
        tracing::warn!("Development mode: using built-in JWT secret unless SECURITY_JWT_SECRET is set");
    }
    if config.security.jwt_secret.is_empty() {
        anyhow::bail!("SECURITY_JWT_SECRET must be set outside development");
    }

    let state = app::AppState::from_config(config)?;
    let router = app::router(state, config);

    let bind_addr = format!("0.0.0.0:{}", config.portal.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    tracing::info!(
        backend = %config.portal.backend_url,
        "Flock portal listening on http://{}",
        bind_addr
    );

    axum::serve(listener, router).await?;
    Ok(())
}
