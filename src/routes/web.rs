use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, Json},
    routing::get,
    Router,
};
use serde_json::{json, Value};

use crate::auth::RequestContext;
use crate::views;
use crate::{AppError, AppState, Result};

const HOME_QUESTION_LIMIT: u32 = 10;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/health", get(health_check))
}

async fn home(State(app_state): State<AppState>, ctx: RequestContext) -> Result<Html<String>> {
    let recent = app_state.question_service.recent_questions(HOME_QUESTION_LIMIT).await?;
    Ok(Html(views::questions::home_page(&ctx, &recent)))
}

async fn health_check(State(app_state): State<AppState>) -> (StatusCode, Json<Value>) {
    let backend = app_state.db.backend_name();
    match app_state.db.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "healthy",
                "service": "nap_overflow",
                "version": env!("CARGO_PKG_VERSION"),
                "database": { "backend": backend, "status": "up" }
            })),
        ),
        Err(e) => {
            tracing::error!("❌ HEALTH: {} store check failed: {}", backend, e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "service": "nap_overflow",
                    "version": env!("CARGO_PKG_VERSION"),
                    "database": { "backend": backend, "status": "down" }
                })),
            )
        }
    }
}

/// Unknown paths render the same 404 page as unknown ids
pub async fn not_found() -> AppError {
    AppError::NotFound("Page not found".to_string())
}
