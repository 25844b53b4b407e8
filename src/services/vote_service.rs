use std::sync::Arc;

use crate::db::repository::{AnswerRepository, VoteRepository};
use crate::models::vote::{VoteDirection, VoteOutcome};
use crate::models::{AnswerWithVotes, VoteMap};
use crate::{AppError, Result};

/// Answer id -> the viewer's vote, built from already-loaded answers.
///
/// Only votes cast by `viewer_id` count; answers the viewer has not voted on
/// are absent. An anonymous viewer gets an empty map.
pub fn user_vote_map(answers: &[AnswerWithVotes], viewer_id: Option<i64>) -> VoteMap {
    let Some(viewer_id) = viewer_id else {
        return VoteMap::new();
    };

    answers
        .iter()
        .flat_map(|answer| answer.votes.iter())
        .filter(|vote| vote.user_id == viewer_id)
        .map(|vote| (vote.answer_id, vote.vote))
        .collect()
}

/// Service for casting votes on answers
pub struct VoteService {
    vote_repo: Arc<dyn VoteRepository>,
    answer_repo: Arc<dyn AnswerRepository>,
}

impl VoteService {
    pub fn new(vote_repo: Arc<dyn VoteRepository>, answer_repo: Arc<dyn AnswerRepository>) -> Self {
        Self { vote_repo, answer_repo }
    }

    /// Casts or updates a vote; repeating the same vote withdraws it
    pub async fn cast_vote(&self, question_id: i64, answer_id: i64, user_id: i64, raw_vote: &str) -> Result<VoteOutcome> {
        let direction = VoteDirection::parse(raw_vote)
            .ok_or_else(|| AppError::ValidationError("Vote must be 1 or -1".to_string()))?;

        let answer = self
            .answer_repo
            .get_answer_by_id(answer_id)
            .await?
            .filter(|answer| answer.question_id == question_id)
            .ok_or_else(|| AppError::NotFound("Answer not found".to_string()))?;

        let existing = self.vote_repo.get_user_vote(answer.id, user_id).await?;
        if existing.map(|v| v.vote) == Some(direction.value()) {
            self.vote_repo.remove_vote(answer.id, user_id).await?;
            tracing::debug!("🗳️ VOTE: user {} withdrew vote on answer {}", user_id, answer.id);
            return Ok(VoteOutcome::Removed);
        }

        let vote = self.vote_repo.cast_vote(answer.id, user_id, direction.value()).await?;
        tracing::debug!("🗳️ VOTE: user {} voted {} on answer {}", user_id, vote.vote, answer.id);
        Ok(VoteOutcome::Recorded(vote.vote))
    }
}
