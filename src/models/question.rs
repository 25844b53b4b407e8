use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{AnswerWithVotes, VoteMap};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Question {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewQuestion {
    pub title: String,
    pub content: String,
    pub user_id: i64,
}

/// A question joined with its author's display name
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct QuestionWithAuthor {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub question: Question,
    pub author_name: String,
}

/// Everything the question page shows
#[derive(Debug, Clone, Serialize)]
pub struct QuestionDetail {
    pub question: QuestionWithAuthor,
    pub answers: Vec<AnswerWithVotes>,
    /// The caller's prior vote per answer id
    pub user_votes: VoteMap,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuestionForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, rename = "_csrf")]
    pub csrf: String,
}
