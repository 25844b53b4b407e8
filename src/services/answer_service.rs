use std::sync::Arc;

use crate::db::repository::{AnswerRepository, QuestionRepository};
use crate::models::answer::{AnswerForm, NewAnswer};
use crate::models::{Answer, CurrentUser};
use crate::validation::{FieldChain, Submission, ValidationErrors};
use crate::{AppError, Result};

pub struct AnswerService {
    answer_repo: Arc<dyn AnswerRepository>,
    question_repo: Arc<dyn QuestionRepository>,
}

impl AnswerService {
    pub fn new(answer_repo: Arc<dyn AnswerRepository>, question_repo: Arc<dyn QuestionRepository>) -> Self {
        Self { answer_repo, question_repo }
    }

    /// Posts an answer and bumps the question to the top of the list
    pub async fn create_answer(&self, question_id: i64, form: &AnswerForm, author: &CurrentUser) -> Result<Submission<Answer>> {
        if self.question_repo.get_question_with_author(question_id).await?.is_none() {
            return Err(AppError::NotFound("Question not found".to_string()));
        }

        let mut errors = ValidationErrors::new();
        errors.push(FieldChain::new("answerContents", &form.content).required("Please provide content for your answer"));
        if !errors.is_empty() {
            return Ok(Submission::Rejected(errors));
        }

        let answer = self
            .answer_repo
            .create_answer(&NewAnswer {
                content: form.content.clone(),
                user_id: author.id,
                question_id,
            })
            .await?;
        self.question_repo.touch_question(question_id).await?;

        tracing::info!("✅ ANSWER: user {} answered question {}", author.id, question_id);
        Ok(Submission::Accepted(answer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::{MemoryDatabase, UserRepository};
    use crate::models::question::NewQuestion;
    use crate::models::user::NewUser;

    #[tokio::test]
    async fn answers_require_content_and_an_existing_question() {
        let db = MemoryDatabase::new();
        let user = db
            .user_repo()
            .create_user(&NewUser {
                display_name: "Snoozer".into(),
                email: "s@nap.io".into(),
                hashed_password: "$argon2id$stub".into(),
            })
            .await
            .unwrap();
        let author = CurrentUser::from(&user);
        let question = db
            .question_repo()
            .create_question(&NewQuestion { title: "Q".into(), content: "C".into(), user_id: user.id })
            .await
            .unwrap();
        let answers = AnswerService::new(Arc::new(db.answer_repo()), Arc::new(db.question_repo()));

        let empty = AnswerForm::default();
        match answers.create_answer(question.id, &empty, &author).await.unwrap() {
            Submission::Rejected(errors) => {
                assert_eq!(errors.messages(), vec!["Please provide content for your answer".to_string()])
            }
            Submission::Accepted(_) => panic!("empty answer accepted"),
        }

        let form = AnswerForm { content: "Under 30 minutes".into(), csrf: String::new() };
        assert!(answers.create_answer(question.id, &form, &author).await.unwrap().is_accepted());
        assert!(matches!(
            answers.create_answer(question.id + 1, &form, &author).await,
            Err(AppError::NotFound(_))
        ));
    }
}
