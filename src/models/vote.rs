use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A user's signed vote on an answer. At most one exists per (answer, user).
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ScoringAnswer {
    pub id: i64,
    pub answer_id: i64,
    pub user_id: i64,
    /// +1 or -1
    pub vote: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Answer id -> the current user's vote on it
pub type VoteMap = HashMap<i64, i32>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteDirection {
    Up,
    Down,
}

impl VoteDirection {
    pub fn value(self) -> i32 {
        match self {
            VoteDirection::Up => 1,
            VoteDirection::Down => -1,
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "1" | "+1" | "up" => Some(VoteDirection::Up),
            "-1" | "down" => Some(VoteDirection::Down),
            _ => None,
        }
    }
}

/// Outcome of casting a vote
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoteOutcome {
    Recorded(i32),
    /// The same vote was cast twice, so it was withdrawn
    Removed,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VoteForm {
    #[serde(default)]
    pub vote: String,
    #[serde(default, rename = "_csrf")]
    pub csrf: String,
}
