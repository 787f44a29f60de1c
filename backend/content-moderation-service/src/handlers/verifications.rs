/// Creator age verification handlers
use actix_web::{web, HttpResponse};
use std::sync::Arc;

use crate::error::Result;
use crate::models::AgeVerificationRequest;
use crate::services::ModerationPipeline;

/// POST /api/v1/age-verifications
pub async fn submit_age_verification(
    pipeline: web::Data<Arc<ModerationPipeline>>,
    req: web::Json<AgeVerificationRequest>,
) -> Result<HttpResponse> {
    let request = req.into_inner();
    let user_id = request.user_id.clone();
    let status = pipeline.submit_age_verification(request).await?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "user_id": user_id,
        "status": status,
    })))
}

/// GET /api/v1/age-verifications/{creator_id}
pub async fn get_age_verification(
    pipeline: web::Data<Arc<ModerationPipeline>>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    match pipeline.get_age_verification(&path.into_inner()).await? {
        Some(record) => Ok(HttpResponse::Ok().json(record)),
        None => Ok(HttpResponse::NotFound().finish()),
    }
}

/// Mounted under `/api/v1`
pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/age-verifications", web::post().to(submit_age_verification))
        .route(
            "/age-verifications/{creator_id}",
            web::get().to(get_age_verification),
        );
}
