use grammar_quiz::{build_state, config::AppConfig, routes::build_router};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = AppConfig::from_env()?;
    let state = build_state(&config).await?;
    let app = build_router(state, &config.cors_origins);

    let addr = config.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("grammar quiz listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
