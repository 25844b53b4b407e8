// PostgreSQL repository implementations using sqlx
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::db::repository::{AnswerRepository, QuestionRepository, UserRepository, VoteRepository};
use crate::models::answer::NewAnswer;
use crate::models::question::NewQuestion;
use crate::models::user::NewUser;
use crate::models::{Answer, AnswerWithVotes, Question, QuestionWithAuthor, ScoringAnswer, User};
use crate::{AppError, Result};

const UNIQUE_VIOLATION: &str = "23505";

/// Maps a sqlx error, turning unique-constraint violations into `Conflict`
fn db_error(context: &str, error: sqlx::Error) -> AppError {
    if let Some(db_err) = error.as_database_error() {
        if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
            let constraint = db_err.constraint().unwrap_or("unique").to_string();
            return AppError::Conflict(constraint);
        }
    }
    AppError::DatabaseError(format!("{}: {}", context, error))
}

// PostgreSQL connection pool wrapper
pub struct PostgresDatabase {
    pub pool: Arc<PgPool>,
}

impl PostgresDatabase {
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        tracing::info!("🔗 DATABASE: Configuring connection pool");
        tracing::info!("   📊 Max connections: {}", max_connections);

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(3600))
            .acquire_timeout(Duration::from_secs(30))
            .connect(database_url)
            .await
            .map_err(|e| {
                tracing::error!("❌ DATABASE: Failed to create connection pool: {}", e);
                AppError::DatabaseError(format!("Failed to connect to PostgreSQL: {}", e))
            })?;

        tracing::info!("✅ DATABASE: Connection pool configured successfully");

        Ok(Self { pool: Arc::new(pool) })
    }

    /// Applies the embedded schema migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&*self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to run migrations: {}", e)))?;
        tracing::info!("✅ DATABASE: Schema migrations applied");
        Ok(())
    }

    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&*self.pool)
            .await
            .map_err(|e| db_error("Health check failed", e))?;
        Ok(())
    }

    pub fn user_repo(&self) -> PostgresUserRepository {
        PostgresUserRepository { pool: self.pool.clone() }
    }

    pub fn question_repo(&self) -> PostgresQuestionRepository {
        PostgresQuestionRepository { pool: self.pool.clone() }
    }

    pub fn answer_repo(&self) -> PostgresAnswerRepository {
        PostgresAnswerRepository { pool: self.pool.clone() }
    }

    pub fn vote_repo(&self) -> PostgresVoteRepository {
        PostgresVoteRepository { pool: self.pool.clone() }
    }
}

// PostgreSQL User Repository
pub struct PostgresUserRepository {
    pool: Arc<PgPool>,
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create_user(&self, user: &NewUser) -> Result<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (display_name, email, hashed_password)
            VALUES ($1, $2, $3)
            RETURNING id, display_name, email, hashed_password, created_at, updated_at
            "#,
        )
        .bind(&user.display_name)
        .bind(&user.email)
        .bind(&user.hashed_password)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| db_error("Failed to create user", e))
    }

    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>> {
        sqlx::query_as::<_, User>(
            "SELECT id, display_name, email, hashed_password, created_at, updated_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| db_error("Failed to get user by id", e))
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        sqlx::query_as::<_, User>(
            "SELECT id, display_name, email, hashed_password, created_at, updated_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| db_error("Failed to get user by email", e))
    }

    async fn email_exists(&self, email: &str) -> Result<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| db_error("Failed to check email", e))
    }
}

// PostgreSQL Question Repository
pub struct PostgresQuestionRepository {
    pool: Arc<PgPool>,
}

const QUESTION_WITH_AUTHOR: &str = r#"
    SELECT q.id, q.title, q.content, q.user_id, q.created_at, q.updated_at,
           u.display_name AS author_name
    FROM questions q
    JOIN users u ON u.id = q.user_id
"#;

#[async_trait]
impl QuestionRepository for PostgresQuestionRepository {
    async fn create_question(&self, question: &NewQuestion) -> Result<Question> {
        sqlx::query_as::<_, Question>(
            r#"
            INSERT INTO questions (title, content, user_id)
            VALUES ($1, $2, $3)
            RETURNING id, title, content, user_id, created_at, updated_at
            "#,
        )
        .bind(&question.title)
        .bind(&question.content)
        .bind(question.user_id)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| db_error("Failed to create question", e))
    }

    async fn get_question_with_author(&self, id: i64) -> Result<Option<QuestionWithAuthor>> {
        sqlx::query_as::<_, QuestionWithAuthor>(&format!("{} WHERE q.id = $1", QUESTION_WITH_AUTHOR))
            .bind(id)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| db_error("Failed to get question", e))
    }

    async fn list_questions_with_authors(&self, limit: Option<u32>) -> Result<Vec<QuestionWithAuthor>> {
        // LIMIT NULL means no limit in PostgreSQL
        sqlx::query_as::<_, QuestionWithAuthor>(&format!(
            "{} ORDER BY q.updated_at DESC, q.id DESC LIMIT $1",
            QUESTION_WITH_AUTHOR
        ))
        .bind(limit.map(i64::from))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| db_error("Failed to list questions", e))
    }

    async fn title_exists(&self, title: &str) -> Result<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM questions WHERE title = $1)")
            .bind(title)
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| db_error("Failed to check title", e))
    }

    async fn touch_question(&self, id: i64) -> Result<()> {
        sqlx::query("UPDATE questions SET updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&*self.pool)
            .await
            .map_err(|e| db_error("Failed to touch question", e))?;
        Ok(())
    }

    async fn delete_question(&self, id: i64) -> Result<bool> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("Failed to begin delete transaction", e))?;

        sqlx::query(
            "DELETE FROM scoring_answers WHERE answer_id IN (SELECT id FROM answers WHERE question_id = $1)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| db_error("Failed to delete votes", e))?;

        sqlx::query("DELETE FROM answers WHERE question_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| db_error("Failed to delete answers", e))?;

        let deleted = sqlx::query("DELETE FROM questions WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| db_error("Failed to delete question", e))?
            .rows_affected();

        tx.commit()
            .await
            .map_err(|e| db_error("Failed to commit delete transaction", e))?;

        Ok(deleted > 0)
    }
}

// PostgreSQL Answer Repository
pub struct PostgresAnswerRepository {
    pool: Arc<PgPool>,
}

#[derive(sqlx::FromRow)]
struct AnswerRow {
    #[sqlx(flatten)]
    answer: Answer,
    author_name: String,
}

#[async_trait]
impl AnswerRepository for PostgresAnswerRepository {
    async fn create_answer(&self, answer: &NewAnswer) -> Result<Answer> {
        sqlx::query_as::<_, Answer>(
            r#"
            INSERT INTO answers (content, user_id, question_id)
            VALUES ($1, $2, $3)
            RETURNING id, content, user_id, question_id, created_at, updated_at
            "#,
        )
        .bind(&answer.content)
        .bind(answer.user_id)
        .bind(answer.question_id)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| db_error("Failed to create answer", e))
    }

    async fn get_answer_by_id(&self, id: i64) -> Result<Option<Answer>> {
        sqlx::query_as::<_, Answer>(
            "SELECT id, content, user_id, question_id, created_at, updated_at FROM answers WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| db_error("Failed to get answer", e))
    }

    async fn get_answers_with_votes(&self, question_id: i64) -> Result<Vec<AnswerWithVotes>> {
        let rows = sqlx::query_as::<_, AnswerRow>(
            r#"
            SELECT a.id, a.content, a.user_id, a.question_id, a.created_at, a.updated_at,
                   u.display_name AS author_name
            FROM answers a
            JOIN users u ON u.id = a.user_id
            WHERE a.question_id = $1
            ORDER BY a.created_at, a.id
            "#,
        )
        .bind(question_id)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| db_error("Failed to get answers", e))?;

        let votes = sqlx::query_as::<_, ScoringAnswer>(
            r#"
            SELECT v.id, v.answer_id, v.user_id, v.vote, v.created_at, v.updated_at
            FROM scoring_answers v
            JOIN answers a ON a.id = v.answer_id
            WHERE a.question_id = $1
            ORDER BY v.id
            "#,
        )
        .bind(question_id)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| db_error("Failed to get votes", e))?;

        let mut votes_by_answer: HashMap<i64, Vec<ScoringAnswer>> = HashMap::new();
        for vote in votes {
            votes_by_answer.entry(vote.answer_id).or_default().push(vote);
        }

        Ok(rows
            .into_iter()
            .map(|row| AnswerWithVotes {
                votes: votes_by_answer.remove(&row.answer.id).unwrap_or_default(),
                answer: row.answer,
                author_name: row.author_name,
            })
            .collect())
    }
}

// PostgreSQL Vote Repository
pub struct PostgresVoteRepository {
    pool: Arc<PgPool>,
}

#[async_trait]
impl VoteRepository for PostgresVoteRepository {
    async fn get_user_vote(&self, answer_id: i64, user_id: i64) -> Result<Option<ScoringAnswer>> {
        sqlx::query_as::<_, ScoringAnswer>(
            r#"
            SELECT id, answer_id, user_id, vote, created_at, updated_at
            FROM scoring_answers
            WHERE answer_id = $1 AND user_id = $2
            "#,
        )
        .bind(answer_id)
        .bind(user_id)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| db_error("Failed to get user vote", e))
    }

    async fn cast_vote(&self, answer_id: i64, user_id: i64, vote: i32) -> Result<ScoringAnswer> {
        sqlx::query_as::<_, ScoringAnswer>(
            r#"
            INSERT INTO scoring_answers (answer_id, user_id, vote)
            VALUES ($1, $2, $3)
            ON CONFLICT (answer_id, user_id)
            DO UPDATE SET vote = EXCLUDED.vote, updated_at = NOW()
            RETURNING id, answer_id, user_id, vote, created_at, updated_at
            "#,
        )
        .bind(answer_id)
        .bind(user_id)
        .bind(vote)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| db_error("Failed to cast vote", e))
    }

    async fn remove_vote(&self, answer_id: i64, user_id: i64) -> Result<()> {
        sqlx::query("DELETE FROM scoring_answers WHERE answer_id = $1 AND user_id = $2")
            .bind(answer_id)
            .bind(user_id)
            .execute(&*self.pool)
            .await
            .map_err(|e| db_error("Failed to remove vote", e))?;
        Ok(())
    }
}
