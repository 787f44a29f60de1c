/// Submission intake, review, reports, appeals and flag resolution
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{ModerationError, Result};
use crate::models::{
    AppealRequest, ContentStatus, FlagSeverity, HumanReviewRequest, ModerationCategory,
    ReportContentRequest, ResolveFlagRequest, ReviewDecision, SubmitContentRequest,
};
use crate::services::ModerationPipeline;

#[derive(Debug, Deserialize)]
pub struct ReviewPayload {
    pub reviewer_id: String,
    pub decision: ReviewDecision,
    #[serde(default)]
    pub categories: Vec<ModerationCategory>,
    pub notes: Option<String>,
    pub confidence: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct ReportPayload {
    pub reporter_id: String,
    pub category: ModerationCategory,
    pub reason: String,
    pub severity: FlagSeverity,
}

#[derive(Debug, Deserialize)]
pub struct AppealPayload {
    pub user_id: String,
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub struct ResolvePayload {
    pub resolved_by: String,
    pub resolution: String,
}

#[derive(Debug, Deserialize)]
pub struct SubmissionFilter {
    pub status: Option<ContentStatus>,
}

/// POST /api/v1/submissions
pub async fn submit_content(
    pipeline: web::Data<Arc<ModerationPipeline>>,
    req: web::Json<SubmitContentRequest>,
) -> Result<HttpResponse> {
    let submission = pipeline.submit_content(req.into_inner()).await?;
    Ok(HttpResponse::Accepted().json(submission.sanitized()))
}

/// GET /api/v1/submissions/{id}
pub async fn get_submission(
    pipeline: web::Data<Arc<ModerationPipeline>>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let id = path.into_inner();
    let submission = pipeline
        .get_submission(id)
        .await?
        .ok_or(ModerationError::SubmissionNotFound(id))?;
    Ok(HttpResponse::Ok().json(submission))
}

/// GET /api/v1/users/{user_id}/submissions?status=
pub async fn get_user_submissions(
    pipeline: web::Data<Arc<ModerationPipeline>>,
    path: web::Path<String>,
    query: web::Query<SubmissionFilter>,
) -> Result<HttpResponse> {
    let submissions = pipeline
        .get_user_submissions(&path.into_inner(), query.status)
        .await?;
    Ok(HttpResponse::Ok().json(submissions))
}

/// POST /api/v1/submissions/{id}/review
pub async fn submit_review(
    pipeline: web::Data<Arc<ModerationPipeline>>,
    path: web::Path<Uuid>,
    req: web::Json<ReviewPayload>,
) -> Result<HttpResponse> {
    let payload = req.into_inner();
    let submission_id = path.into_inner();

    pipeline
        .submit_human_review(HumanReviewRequest {
            submission_id,
            reviewer_id: payload.reviewer_id,
            decision: payload.decision,
            categories: payload.categories,
            notes: payload.notes,
            confidence: payload.confidence,
        })
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "submission_id": submission_id,
        "decision": payload.decision.as_str(),
    })))
}

/// POST /api/v1/submissions/{id}/reports
pub async fn report_content(
    pipeline: web::Data<Arc<ModerationPipeline>>,
    path: web::Path<Uuid>,
    req: web::Json<ReportPayload>,
) -> Result<HttpResponse> {
    let payload = req.into_inner();
    let flag_id = pipeline
        .report_content(ReportContentRequest {
            content_id: path.into_inner(),
            reporter_id: payload.reporter_id,
            category: payload.category,
            reason: payload.reason,
            severity: payload.severity,
        })
        .await?;

    Ok(HttpResponse::Created().json(serde_json::json!({ "flag_id": flag_id })))
}

/// POST /api/v1/submissions/{id}/appeal
pub async fn appeal_submission(
    pipeline: web::Data<Arc<ModerationPipeline>>,
    path: web::Path<Uuid>,
    req: web::Json<AppealPayload>,
) -> Result<HttpResponse> {
    let payload = req.into_inner();
    let submission = pipeline
        .appeal_submission(AppealRequest {
            submission_id: path.into_inner(),
            user_id: payload.user_id,
            reason: payload.reason,
        })
        .await?;

    Ok(HttpResponse::Ok().json(submission))
}

/// POST /api/v1/submissions/{id}/flags/{flag_id}/resolve
pub async fn resolve_flag(
    pipeline: web::Data<Arc<ModerationPipeline>>,
    path: web::Path<(Uuid, Uuid)>,
    req: web::Json<ResolvePayload>,
) -> Result<HttpResponse> {
    let (submission_id, flag_id) = path.into_inner();
    let payload = req.into_inner();

    let flag = pipeline
        .resolve_flag(ResolveFlagRequest {
            submission_id,
            flag_id,
            resolved_by: payload.resolved_by,
            resolution: payload.resolution,
        })
        .await?;

    Ok(HttpResponse::Ok().json(flag))
}

/// GET /api/v1/stats
pub async fn get_stats(pipeline: web::Data<Arc<ModerationPipeline>>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(pipeline.get_moderation_stats().await?))
}

/// Mounted under `/api/v1`
pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/submissions", web::post().to(submit_content))
        .route("/submissions/{id}", web::get().to(get_submission))
        .route("/submissions/{id}/review", web::post().to(submit_review))
        .route("/submissions/{id}/reports", web::post().to(report_content))
        .route("/submissions/{id}/appeal", web::post().to(appeal_submission))
        .route(
            "/submissions/{id}/flags/{flag_id}/resolve",
            web::post().to(resolve_flag),
        )
        .route(
            "/users/{user_id}/submissions",
            web::get().to(get_user_submissions),
        )
        .route("/stats", web::get().to(get_stats));
}
