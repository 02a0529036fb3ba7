use atrium_api::config::ApiConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    atrium_observability::init();

    let config = ApiConfig::from_env()?;
    let app = atrium_api::app::build_app(&config).await?;

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
