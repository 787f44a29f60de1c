use actix_web::{middleware, web, App, HttpServer};
use anyhow::Context;
use content_moderation_service::{
    config::Config, db::PipelineStores, handlers, services::build_classifier, spawn_worker,
    ModerationPipeline,
};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    tracing::info!("Starting content moderation service...");

    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(
        service = %config.service_name,
        environment = %config.environment,
        http_port = config.http_port,
        classifier = ?config.classifier,
        "Configuration loaded"
    );

    let classifier = build_classifier(&config).context("Failed to initialize classifier")?;
    let pipeline = Arc::new(
        ModerationPipeline::new(
            config.moderation.clone(),
            PipelineStores::in_memory(),
            classifier,
        )
        .context("Failed to initialize moderation pipeline")?,
    );

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let worker = spawn_worker(
        pipeline.clone(),
        config.worker_poll_interval(),
        shutdown_rx,
    );

    let addr = format!("0.0.0.0:{}", config.http_port);
    tracing::info!("Starting HTTP server on {}", addr);

    let app_pipeline = pipeline.clone();
    // actix-web handles ctrl-c itself and stops the server gracefully
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(app_pipeline.clone()))
            .wrap(middleware::Logger::default())
            .configure(handlers::register_routes)
    })
    .bind(&addr)
    .with_context(|| format!("Failed to bind {}", addr))?
    .run()
    .await?;

    tracing::info!("HTTP server stopped, shutting down moderation worker");
    if shutdown_tx.send(()).is_err() {
        tracing::warn!("Moderation worker already stopped");
    }
    if let Err(e) = worker.await {
        tracing::error!(error = %e, "Moderation worker task panicked");
    }

    tracing::info!(
        pending = pipeline.queue_depth().await,
        "Content moderation service stopped"
    );
    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,actix_web=info".into());

    let json = std::env::var("LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .init();
    }
}
