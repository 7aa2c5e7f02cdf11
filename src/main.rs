use anyhow::Context;
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{error, info};

use foodgram_rs::{
    create_app,
    handlers::{admin, api},
    init_observability,
    observability::{BusinessTracingMiddleware, Metrics},
    repositories::{Repositories, TableManager},
    shutdown_observability, Config,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logging is not up yet, configuration errors go to stderr via anyhow
    let config = Config::from_environment()
        .await
        .context("failed to load configuration")?;

    init_observability(&config.observability).context("failed to initialize observability")?;

    info!("Starting foodgram-rs service");
    info!(
        "Service: {} v{}",
        config.observability.service_name, config.observability.service_version
    );
    info!("Region: {}", config.aws.region);
    info!(
        "DynamoDB Tables: recipes={}, ingredients={}, tags={}, users={}, user_lists={}",
        config.database.recipes_table_name,
        config.database.ingredients_table_name,
        config.database.tags_table_name,
        config.database.users_table_name,
        config.database.user_lists_table_name,
    );

    let metrics = Arc::new(Metrics::new()?);
    let tracing = Arc::new(BusinessTracingMiddleware::new(metrics.clone()));
    info!("Metrics initialized successfully");

    let dynamodb_client = Arc::new(config.aws.dynamodb_client.clone());
    let table_manager = Arc::new(TableManager::new(dynamodb_client.clone()));
    let repositories = Repositories::dynamodb(dynamodb_client, &config.database);
    info!("Repositories initialized successfully");

    let api_state = api::ApiState::new(&repositories, tracing, &config.database.media_cdn_url);
    let admin_router = admin::create_admin_router(
        api_state.catalog_service.clone(),
        table_manager,
        config.database.clone(),
    );
    info!("Services initialized successfully");

    let app = create_app(metrics, api_state, admin_router, &config.server);

    let addr: SocketAddr = config
        .server
        .bind_address()
        .parse()
        .with_context(|| format!("invalid bind address {}", config.server.bind_address()))?;
    let listener = TcpListener::bind(addr).await?;
    info!("Server listening on {}", addr);

    let shutdown_signal = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", err);
        }
        info!("Shutdown signal received");
        shutdown_observability().await;
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
