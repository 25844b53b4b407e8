pub mod postgres;
pub mod repository;

// Database connection and state management
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::Result;
use postgres::PostgresDatabase;
use repository::{AnswerRepository, MemoryDatabase, QuestionRepository, UserRepository, VoteRepository};

const CONNECT_ATTEMPTS: u32 = 5;
const INITIAL_BACKOFF: Duration = Duration::from_millis(250);
const MAX_BACKOFF: Duration = Duration::from_secs(5);

/// Startup connect loop: doubles the pause after each failure, capped at `MAX_BACKOFF`.
/// Request handlers never retry.
async fn connect_with_backoff<F, Fut, T>(attempts: u32, initial: Duration, mut connect: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut pause = initial;
    let mut attempt = 1;
    loop {
        match connect().await {
            Ok(connected) => return Ok(connected),
            Err(e) if attempt >= attempts => {
                tracing::error!("❌ DATABASE: giving up after {} connection attempts: {}", attempt, e);
                return Err(e);
            }
            Err(e) => {
                tracing::warn!("⚠️ DATABASE: connection attempt {} failed ({}), next try in {:?}", attempt, e, pause);
                tokio::time::sleep(pause).await;
                pause = (pause * 2).min(MAX_BACKOFF);
                attempt += 1;
            }
        }
    }
}

#[derive(Clone)]
enum Backend {
    Postgres(Arc<PostgresDatabase>),
    Memory,
}

#[derive(Clone)]
pub struct DatabaseClient {
    backend: Backend,
    pub user_repo: Arc<dyn UserRepository>,
    pub question_repo: Arc<dyn QuestionRepository>,
    pub answer_repo: Arc<dyn AnswerRepository>,
    pub vote_repo: Arc<dyn VoteRepository>,
}

impl DatabaseClient {
    /// Connects to PostgreSQL when `DATABASE_URL` is set, otherwise uses the in-memory store
    pub async fn new(config: &AppConfig) -> Result<Self> {
        match &config.database_url {
            Some(url) => {
                let max_connections = config.database_max_connections;
                let database = connect_with_backoff(CONNECT_ATTEMPTS, INITIAL_BACKOFF, || {
                    PostgresDatabase::new(url, max_connections)
                })
                .await?;
                database.migrate().await?;
                Ok(Self::postgres(database))
            }
            None => {
                tracing::warn!("⚠️ DATABASE: DATABASE_URL not set, using the in-memory store. Data will not survive a restart.");
                Ok(Self::in_memory(MemoryDatabase::new()))
            }
        }
    }

    pub fn postgres(database: PostgresDatabase) -> Self {
        Self {
            user_repo: Arc::new(database.user_repo()),
            question_repo: Arc::new(database.question_repo()),
            answer_repo: Arc::new(database.answer_repo()),
            vote_repo: Arc::new(database.vote_repo()),
            backend: Backend::Postgres(Arc::new(database)),
        }
    }

    pub fn in_memory(database: MemoryDatabase) -> Self {
        Self {
            user_repo: Arc::new(database.user_repo()),
            question_repo: Arc::new(database.question_repo()),
            answer_repo: Arc::new(database.answer_repo()),
            vote_repo: Arc::new(database.vote_repo()),
            backend: Backend::Memory,
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self.backend {
            Backend::Postgres(_) => "postgres",
            Backend::Memory => "memory",
        }
    }

    pub async fn health_check(&self) -> Result<()> {
        match &self.backend {
            Backend::Postgres(database) => database.health_check().await,
            Backend::Memory => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AppError;

    #[tokio::test]
    async fn connect_succeeds_after_transient_failures() {
        let mut calls = 0;
        let connected = connect_with_backoff(3, Duration::from_millis(1), || {
            calls += 1;
            let outcome = if calls < 3 {
                Err(AppError::DatabaseError("connection refused".to_string()))
            } else {
                Ok(calls)
            };
            async move { outcome }
        })
        .await;
        assert_eq!(connected.unwrap(), 3);
    }

    #[tokio::test]
    async fn connect_returns_the_last_error() {
        let mut calls = 0;
        let connected: Result<()> = connect_with_backoff(2, Duration::from_millis(1), || {
            calls += 1;
            let message = format!("attempt {} refused", calls);
            async move { Err(AppError::DatabaseError(message)) }
        })
        .await;
        assert!(matches!(connected, Err(AppError::DatabaseError(msg)) if msg == "attempt 2 refused"));
        assert_eq!(calls, 2);
    }

    #[tokio::test]
    async fn missing_url_selects_the_memory_store() {
        let client = DatabaseClient::new(&AppConfig::default()).await.unwrap();
        assert_eq!(client.backend_name(), "memory");
        assert!(client.health_check().await.is_ok());
    }
}
