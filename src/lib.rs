// Library modules for the Nap Overflow Q&A site
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod validation;
pub mod views;

use std::sync::Arc;

use axum::{middleware, Router};
use tower_http::{services::ServeDir, trace::TraceLayer};

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{AppError, Result};

// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub db: db::DatabaseClient,
    pub auth_service: Arc<auth::AuthService>,
    pub user_service: Arc<services::UserService>,
    pub question_service: Arc<services::QuestionService>,
    pub answer_service: Arc<services::AnswerService>,
    pub vote_service: Arc<services::VoteService>,
}

impl AppState {
    pub async fn new(config: AppConfig) -> Result<Self> {
        let db = db::DatabaseClient::new(&config).await?;
        Ok(Self::from_database(config, db))
    }

    /// Wires the services over an already-connected store
    pub fn from_database(config: AppConfig, db: db::DatabaseClient) -> Self {
        let auth_service = Arc::new(auth::AuthService::new(&config));
        let user_service = Arc::new(services::UserService::new(db.user_repo.clone(), auth_service.clone()));
        let question_service = Arc::new(services::QuestionService::new(
            db.question_repo.clone(),
            db.answer_repo.clone(),
        ));
        let answer_service = Arc::new(services::AnswerService::new(
            db.answer_repo.clone(),
            db.question_repo.clone(),
        ));
        let vote_service = Arc::new(services::VoteService::new(db.vote_repo.clone(), db.answer_repo.clone()));

        Self {
            config,
            db,
            auth_service,
            user_service,
            question_service,
            answer_service,
            vote_service,
        }
    }
}

/// The full application: routes behind the session middleware, plus static assets
pub fn build_app(app_state: AppState) -> Router {
    routes::create_routes()
        .layer(middleware::from_fn_with_state(
            app_state.clone(),
            auth::middleware::session_middleware,
        ))
        .nest_service("/static", ServeDir::new("static"))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
