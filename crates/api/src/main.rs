use anyhow::Context as _;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    bazaar_observability::init();

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| {
        tracing::warn!("BIND_ADDR not set; using 0.0.0.0:8080");
        "0.0.0.0:8080".to_string()
    });

    let app = build_router().await?;

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(feature = "postgres")]
async fn build_router() -> anyhow::Result<axum::Router> {
    if let Ok(url) = std::env::var("DATABASE_URL") {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(10)
            .connect(&url)
            .await
            .context("failed to connect to postgres")?;
        let store = bazaar_infra::PostgresStore::new(pool);
        return Ok(bazaar_api::app::app_with_store(store));
    }

    tracing::warn!("DATABASE_URL not set; using the in-memory store");
    Ok(bazaar_api::app::build_app())
}

#[cfg(not(feature = "postgres"))]
async fn build_router() -> anyhow::Result<axum::Router> {
    Ok(bazaar_api::app::build_app())
}
