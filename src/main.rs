use pickwise::{
    config::Config,
    routes::{create_router, AppState},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("pickwise=info,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Configuration, including the credential, is read exactly once
    let config = Config::from_env()?;
    let state = AppState::from_config(&config);

    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, model = %config.gemini_model, "Server running");
    axum::serve(listener, app).await?;

    Ok(())
}
