/// HTTP handlers for the moderation API
pub mod submissions;
pub mod verifications;

use actix_web::{web, HttpResponse};
use std::sync::Arc;

use crate::metrics;
use crate::services::ModerationPipeline;

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

/// Readiness including the current review backlog
pub async fn ready(pipeline: web::Data<Arc<ModerationPipeline>>) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ready",
        "queue_depth": pipeline.queue_depth().await,
    }))
}

pub async fn serve_metrics() -> HttpResponse {
    match metrics::render() {
        Ok(body) => HttpResponse::Ok()
            .content_type("text/plain; version=0.0.4")
            .body(body),
        Err(err) => HttpResponse::InternalServerError().body(err.to_string()),
    }
}

/// Register every route. Expects `web::Data<Arc<ModerationPipeline>>`.
pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .route("/ready", web::get().to(ready))
        .route("/metrics", web::get().to(serve_metrics))
        .service(
            web::scope("/api/v1")
                .configure(submissions::register_routes)
                .configure(verifications::register_routes),
        );
}
