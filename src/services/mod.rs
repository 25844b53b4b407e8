pub mod user_service;
pub mod question_service;
pub mod answer_service;
pub mod vote_service;

// Re-export services for convenience
pub use user_service::UserService;
pub use question_service::QuestionService;
pub use answer_service::AnswerService;
pub use vote_service::VoteService;
