use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::ScoringAnswer;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Answer {
    pub id: i64,
    pub content: String,
    pub user_id: i64,
    pub question_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAnswer {
    pub content: String,
    pub user_id: i64,
    pub question_id: i64,
}

/// An answer with its author's display name and every vote cast on it
#[derive(Debug, Clone, Serialize)]
pub struct AnswerWithVotes {
    pub answer: Answer,
    pub author_name: String,
    pub votes: Vec<ScoringAnswer>,
}

impl AnswerWithVotes {
    /// Sum of all signed votes on the answer
    pub fn score(&self) -> i64 {
        self.votes.iter().map(|v| v.vote as i64).sum()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnswerForm {
    #[serde(default, rename = "answerContents")]
    pub content: String,
    #[serde(default, rename = "_csrf")]
    pub csrf: String,
}
