pub mod user;
pub mod question;
pub mod answer;
pub mod vote;

// Re-export models for convenience
pub use user::{CurrentUser, User};
pub use question::{Question, QuestionDetail, QuestionWithAuthor};
pub use answer::{Answer, AnswerWithVotes};
pub use vote::{ScoringAnswer, VoteMap};
