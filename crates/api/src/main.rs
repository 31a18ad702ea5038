use anyhow::Context as _;

use membership_api::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("invalid configuration")?;
    membership_observability::init(&config.log);

    if config.auth.jwt_secret == "dev-secret" {
        tracing::warn!("auth.jwt_secret not set; using insecure dev default");
    }

    let app = membership_api::app::build_app(&config).await;

    let address = config.server.address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
