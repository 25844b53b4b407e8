use std::sync::Arc;

use crate::db::repository::{AnswerRepository, QuestionRepository};
use crate::models::question::{NewQuestion, QuestionForm};
use crate::models::{CurrentUser, Question, QuestionDetail, QuestionWithAuthor};
use crate::services::vote_service::user_vote_map;
use crate::validation::{FieldChain, Submission, ValidationErrors};
use crate::{AppError, Result};

pub const TITLE_TAKEN: &str = "This question has already been asked, search for the thread";

pub struct QuestionService {
    question_repo: Arc<dyn QuestionRepository>,
    answer_repo: Arc<dyn AnswerRepository>,
}

impl QuestionService {
    pub fn new(question_repo: Arc<dyn QuestionRepository>, answer_repo: Arc<dyn AnswerRepository>) -> Self {
        Self { question_repo, answer_repo }
    }

    /// All questions with their authors, most recently updated first
    pub async fn list_questions(&self) -> Result<Vec<QuestionWithAuthor>> {
        self.question_repo.list_questions_with_authors(None).await
    }

    pub async fn recent_questions(&self, limit: u32) -> Result<Vec<QuestionWithAuthor>> {
        self.question_repo.list_questions_with_authors(Some(limit)).await
    }

    async fn validate(&self, form: &QuestionForm) -> Result<ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.push(
            FieldChain::new("title", &form.title)
                .required("Please provide a title for your question")
                .max_length(255, "Title cannot be longer than 255 characters")
                .unique(|title| self.question_repo.title_exists(title), TITLE_TAKEN)
                .await?,
        );
        errors.push(FieldChain::new("content", &form.content).required("Please provide content for your question"));
        Ok(errors)
    }

    pub async fn create_question(&self, form: &QuestionForm, author: &CurrentUser) -> Result<Submission<Question>> {
        let errors = self.validate(form).await?;
        if !errors.is_empty() {
            return Ok(Submission::Rejected(errors));
        }

        let new_question = NewQuestion {
            title: form.title.clone(),
            content: form.content.clone(),
            user_id: author.id,
        };

        match self.question_repo.create_question(&new_question).await {
            Ok(question) => {
                tracing::info!("✅ QUESTION: user {} asked question {}", author.id, question.id);
                Ok(Submission::Accepted(question))
            }
            // The pre-check is advisory; the store's unique constraint decides
            Err(AppError::Conflict(_)) => {
                let mut errors = ValidationErrors::new();
                errors.add("title", TITLE_TAKEN);
                Ok(Submission::Rejected(errors))
            }
            Err(e) => Err(e),
        }
    }

    /// The question, its answers with votes, and the viewer's prior votes
    pub async fn get_question_detail(&self, question_id: i64, viewer_id: Option<i64>) -> Result<QuestionDetail> {
        let question = self
            .question_repo
            .get_question_with_author(question_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Question not found".to_string()))?;
        let answers = self.answer_repo.get_answers_with_votes(question_id).await?;
        let user_votes = user_vote_map(&answers, viewer_id);

        Ok(QuestionDetail {
            question,
            answers,
            user_votes,
        })
    }

    /// Owner-only cascade delete of the question, its answers and their votes
    pub async fn delete_question(&self, question_id: i64, requester: &CurrentUser) -> Result<()> {
        let question = self
            .question_repo
            .get_question_with_author(question_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Question not found".to_string()))?;

        if question.question.user_id != requester.id {
            tracing::warn!(
                "🚫 QUESTION: user {} tried to delete question {} owned by user {}",
                requester.id, question_id, question.question.user_id
            );
            return Err(AppError::Forbidden("Only the author can delete this question".to_string()));
        }

        if !self.question_repo.delete_question(question_id).await? {
            return Err(AppError::NotFound("Question not found".to_string()));
        }

        tracing::info!("🗑️ QUESTION: user {} deleted question {}", requester.id, question_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::{MemoryDatabase, UserRepository, VoteRepository};
    use crate::models::answer::NewAnswer;
    use crate::models::user::NewUser;

    async fn user(db: &MemoryDatabase, email: &str) -> CurrentUser {
        let user = db
            .user_repo()
            .create_user(&NewUser {
                display_name: email.split('@').next().unwrap_or_default().to_string(),
                email: email.to_string(),
                hashed_password: "$argon2id$stub".to_string(),
            })
            .await
            .unwrap();
        CurrentUser::from(&user)
    }

    fn service(db: &MemoryDatabase) -> QuestionService {
        QuestionService::new(Arc::new(db.question_repo()), Arc::new(db.answer_repo()))
    }

    fn form(title: &str, content: &str) -> QuestionForm {
        QuestionForm {
            title: title.to_string(),
            content: content.to_string(),
            csrf: String::new(),
        }
    }

    async fn ask(service: &QuestionService, author: &CurrentUser, title: &str) -> Question {
        match service.create_question(&form(title, "How long is ideal?"), author).await.unwrap() {
            Submission::Accepted(question) => question,
            Submission::Rejected(errors) => panic!("unexpected errors: {:?}", errors.messages()),
        }
    }

    #[tokio::test]
    async fn existing_title_is_rejected() {
        let db = MemoryDatabase::new();
        let questions = service(&db);
        let author = user(&db, "a@nap.io").await;
        ask(&questions, &author, "Power nap length?").await;

        match questions.create_question(&form("Power nap length?", "again"), &author).await.unwrap() {
            Submission::Rejected(errors) => assert_eq!(errors.messages(), vec![TITLE_TAKEN.to_string()]),
            Submission::Accepted(_) => panic!("duplicate title accepted"),
        }
        assert_eq!(questions.list_questions().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn missing_fields_report_both_messages() {
        let db = MemoryDatabase::new();
        let author = user(&db, "a@nap.io").await;
        match service(&db).create_question(&form("", ""), &author).await.unwrap() {
            Submission::Rejected(errors) => assert_eq!(
                errors.messages(),
                vec![
                    "Please provide a title for your question".to_string(),
                    "Please provide content for your question".to_string(),
                ]
            ),
            Submission::Accepted(_) => panic!("empty form accepted"),
        }
    }

    #[tokio::test]
    async fn delete_cascades_to_answers_and_votes() {
        let db = MemoryDatabase::new();
        let questions = service(&db);
        let owner = user(&db, "owner@nap.io").await;
        let voter = user(&db, "voter@nap.io").await;
        let question = ask(&questions, &owner, "Nap before exams?").await;
        let keep = ask(&questions, &owner, "Nap after lunch?").await;

        let answer = db
            .answer_repo()
            .create_answer(&NewAnswer { content: "Yes".into(), user_id: voter.id, question_id: question.id })
            .await
            .unwrap();
        let other_answer = db
            .answer_repo()
            .create_answer(&NewAnswer { content: "Always".into(), user_id: voter.id, question_id: keep.id })
            .await
            .unwrap();
        db.vote_repo().cast_vote(answer.id, owner.id, 1).await.unwrap();
        db.vote_repo().cast_vote(answer.id, voter.id, -1).await.unwrap();
        db.vote_repo().cast_vote(other_answer.id, owner.id, 1).await.unwrap();

        questions.delete_question(question.id, &owner).await.unwrap();

        assert!(matches!(
            questions.get_question_detail(question.id, None).await,
            Err(AppError::NotFound(_))
        ));
        assert!(db.answer_repo().get_answer_by_id(answer.id).await.unwrap().is_none());
        assert!(db.vote_repo().get_user_vote(answer.id, owner.id).await.unwrap().is_none());
        assert!(db.vote_repo().get_user_vote(answer.id, voter.id).await.unwrap().is_none());

        // Unrelated rows survive
        assert!(db.answer_repo().get_answer_by_id(other_answer.id).await.unwrap().is_some());
        assert!(db.vote_repo().get_user_vote(other_answer.id, owner.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn only_the_owner_may_delete() {
        let db = MemoryDatabase::new();
        let questions = service(&db);
        let owner = user(&db, "owner@nap.io").await;
        let other = user(&db, "other@nap.io").await;
        let question = ask(&questions, &owner, "Is napping lazy?").await;

        assert!(matches!(
            questions.delete_question(question.id, &other).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(questions.get_question_detail(question.id, None).await.is_ok());
        assert!(matches!(
            questions.delete_question(999, &owner).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn detail_includes_viewer_votes_only() {
        let db = MemoryDatabase::new();
        let questions = service(&db);
        let a = user(&db, "a@nap.io").await;
        let b = user(&db, "b@nap.io").await;
        let question = ask(&questions, &a, "Best nap spot?").await;
        let answer = db
            .answer_repo()
            .create_answer(&NewAnswer { content: "Hammock".into(), user_id: b.id, question_id: question.id })
            .await
            .unwrap();
        db.vote_repo().cast_vote(answer.id, a.id, 1).await.unwrap();
        db.vote_repo().cast_vote(answer.id, b.id, -1).await.unwrap();

        let detail = questions.get_question_detail(question.id, Some(a.id)).await.unwrap();
        assert_eq!(detail.question.author_name, "a");
        assert_eq!(detail.answers.len(), 1);
        assert_eq!(detail.answers[0].author_name, "b");
        assert_eq!(detail.user_votes.get(&answer.id), Some(&1));
        assert_eq!(detail.user_votes.len(), 1);

        let anonymous = questions.get_question_detail(question.id, None).await.unwrap();
        assert!(anonymous.user_votes.is_empty());
    }
}
