#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tienda_observability::init();

    let config = tienda_api::config::ApiConfig::from_env();
    let services = tienda_api::app::services::build_services(&config).await?;
    let app = tienda_api::app::build_app(services);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
