// Repository trait abstractions for database operations
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::models::answer::NewAnswer;
use crate::models::question::NewQuestion;
use crate::models::user::NewUser;
use crate::models::{Answer, AnswerWithVotes, Question, QuestionWithAuthor, ScoringAnswer, User};
use crate::{AppError, Result};

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `Conflict` when the email is already registered
    async fn create_user(&self, user: &NewUser) -> Result<User>;
    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn email_exists(&self, email: &str) -> Result<bool>;
}

#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Fails with `Conflict` when the title is already taken
    async fn create_question(&self, question: &NewQuestion) -> Result<Question>;
    async fn get_question_with_author(&self, id: i64) -> Result<Option<QuestionWithAuthor>>;
    /// Most recently updated first
    async fn list_questions_with_authors(&self, limit: Option<u32>) -> Result<Vec<QuestionWithAuthor>>;
    async fn title_exists(&self, title: &str) -> Result<bool>;
    async fn touch_question(&self, id: i64) -> Result<()>;
    /// Deletes votes, then answers, then the question. Returns false if it did not exist.
    async fn delete_question(&self, id: i64) -> Result<bool>;
}

#[async_trait]
pub trait AnswerRepository: Send + Sync {
    async fn create_answer(&self, answer: &NewAnswer) -> Result<Answer>;
    async fn get_answer_by_id(&self, id: i64) -> Result<Option<Answer>>;
    /// Answers in creation order, each with its author and votes
    async fn get_answers_with_votes(&self, question_id: i64) -> Result<Vec<AnswerWithVotes>>;
}

#[async_trait]
pub trait VoteRepository: Send + Sync {
    async fn get_user_vote(&self, answer_id: i64, user_id: i64) -> Result<Option<ScoringAnswer>>;
    /// Inserts or replaces the user's vote on the answer
    async fn cast_vote(&self, answer_id: i64, user_id: i64, vote: i32) -> Result<ScoringAnswer>;
    async fn remove_vote(&self, answer_id: i64, user_id: i64) -> Result<()>;
}

// In-memory storage, used when no DATABASE_URL is configured and in tests.
// Enforces the same unique constraints as the PostgreSQL schema.

#[derive(Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    questions: BTreeMap<i64, Question>,
    answers: BTreeMap<i64, Answer>,
    votes: BTreeMap<i64, ScoringAnswer>,
    next_user_id: i64,
    next_question_id: i64,
    next_answer_id: i64,
    next_vote_id: i64,
}

fn next_id(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

#[derive(Clone, Default)]
pub struct MemoryDatabase {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| AppError::InternalError("In-memory store lock poisoned".to_string()))
    }

    pub fn user_repo(&self) -> MemoryUserRepository {
        MemoryUserRepository { db: self.clone() }
    }

    pub fn question_repo(&self) -> MemoryQuestionRepository {
        MemoryQuestionRepository { db: self.clone() }
    }

    pub fn answer_repo(&self) -> MemoryAnswerRepository {
        MemoryAnswerRepository { db: self.clone() }
    }

    pub fn vote_repo(&self) -> MemoryVoteRepository {
        MemoryVoteRepository { db: self.clone() }
    }
}

fn author_name(tables: &Tables, user_id: i64) -> String {
    tables
        .users
        .get(&user_id)
        .map(|u| u.display_name.clone())
        .unwrap_or_default()
}

pub struct MemoryUserRepository {
    db: MemoryDatabase,
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn create_user(&self, user: &NewUser) -> Result<User> {
        let mut tables = self.db.lock()?;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(AppError::Conflict("users.email".to_string()));
        }

        let now = Utc::now();
        let created = User {
            id: next_id(&mut tables.next_user_id),
            display_name: user.display_name.clone(),
            email: user.email.clone(),
            hashed_password: user.hashed_password.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>> {
        Ok(self.db.lock()?.users.get(&id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self.db.lock()?.users.values().find(|u| u.email == email).cloned())
    }

    async fn email_exists(&self, email: &str) -> Result<bool> {
        Ok(self.db.lock()?.users.values().any(|u| u.email == email))
    }
}

pub struct MemoryQuestionRepository {
    db: MemoryDatabase,
}

#[async_trait]
impl QuestionRepository for MemoryQuestionRepository {
    async fn create_question(&self, question: &NewQuestion) -> Result<Question> {
        let mut tables = self.db.lock()?;
        if tables.questions.values().any(|q| q.title == question.title) {
            return Err(AppError::Conflict("questions.title".to_string()));
        }
        if !tables.users.contains_key(&question.user_id) {
            return Err(AppError::DatabaseError(format!("User {} does not exist", question.user_id)));
        }

        let now = Utc::now();
        let created = Question {
            id: next_id(&mut tables.next_question_id),
            title: question.title.clone(),
            content: question.content.clone(),
            user_id: question.user_id,
            created_at: now,
            updated_at: now,
        };
        tables.questions.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_question_with_author(&self, id: i64) -> Result<Option<QuestionWithAuthor>> {
        let tables = self.db.lock()?;
        Ok(tables.questions.get(&id).map(|q| QuestionWithAuthor {
            question: q.clone(),
            author_name: author_name(&tables, q.user_id),
        }))
    }

    async fn list_questions_with_authors(&self, limit: Option<u32>) -> Result<Vec<QuestionWithAuthor>> {
        let tables = self.db.lock()?;
        let mut questions: Vec<&Question> = tables.questions.values().collect();
        questions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(b.id.cmp(&a.id)));

        Ok(questions
            .into_iter()
            .take(limit.map(|l| l as usize).unwrap_or(usize::MAX))
            .map(|q| QuestionWithAuthor {
                question: q.clone(),
                author_name: author_name(&tables, q.user_id),
            })
            .collect())
    }

    async fn title_exists(&self, title: &str) -> Result<bool> {
        Ok(self.db.lock()?.questions.values().any(|q| q.title == title))
    }

    async fn touch_question(&self, id: i64) -> Result<()> {
        if let Some(question) = self.db.lock()?.questions.get_mut(&id) {
            question.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn delete_question(&self, id: i64) -> Result<bool> {
        let mut tables = self.db.lock()?;
        if !tables.questions.contains_key(&id) {
            return Ok(false);
        }

        let answer_ids: Vec<i64> = tables
            .answers
            .values()
            .filter(|a| a.question_id == id)
            .map(|a| a.id)
            .collect();
        tables.votes.retain(|_, v| !answer_ids.contains(&v.answer_id));
        tables.answers.retain(|_, a| a.question_id != id);
        tables.questions.remove(&id);
        Ok(true)
    }
}

pub struct MemoryAnswerRepository {
    db: MemoryDatabase,
}

#[async_trait]
impl AnswerRepository for MemoryAnswerRepository {
    async fn create_answer(&self, answer: &NewAnswer) -> Result<Answer> {
        let mut tables = self.db.lock()?;
        if !tables.questions.contains_key(&answer.question_id) {
            return Err(AppError::DatabaseError(format!("Question {} does not exist", answer.question_id)));
        }

        let now = Utc::now();
        let created = Answer {
            id: next_id(&mut tables.next_answer_id),
            content: answer.content.clone(),
            user_id: answer.user_id,
            question_id: answer.question_id,
            created_at: now,
            updated_at: now,
        };
        tables.answers.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_answer_by_id(&self, id: i64) -> Result<Option<Answer>> {
        Ok(self.db.lock()?.answers.get(&id).cloned())
    }

    async fn get_answers_with_votes(&self, question_id: i64) -> Result<Vec<AnswerWithVotes>> {
        let tables = self.db.lock()?;
        // BTreeMap iteration is id order, which is creation order
        Ok(tables
            .answers
            .values()
            .filter(|a| a.question_id == question_id)
            .map(|a| AnswerWithVotes {
                answer: a.clone(),
                author_name: author_name(&tables, a.user_id),
                votes: tables.votes.values().filter(|v| v.answer_id == a.id).cloned().collect(),
            })
            .collect())
    }
}

pub struct MemoryVoteRepository {
    db: MemoryDatabase,
}

#[async_trait]
impl VoteRepository for MemoryVoteRepository {
    async fn get_user_vote(&self, answer_id: i64, user_id: i64) -> Result<Option<ScoringAnswer>> {
        Ok(self
            .db
            .lock()?
            .votes
            .values()
            .find(|v| v.answer_id == answer_id && v.user_id == user_id)
            .cloned())
    }

    async fn cast_vote(&self, answer_id: i64, user_id: i64, vote: i32) -> Result<ScoringAnswer> {
        let mut tables = self.db.lock()?;
        if !tables.answers.contains_key(&answer_id) {
            return Err(AppError::DatabaseError(format!("Answer {} does not exist", answer_id)));
        }

        let now = Utc::now();
        if let Some(existing) = tables
            .votes
            .values_mut()
            .find(|v| v.answer_id == answer_id && v.user_id == user_id)
        {
            existing.vote = vote;
            existing.updated_at = now;
            return Ok(existing.clone());
        }

        let created = ScoringAnswer {
            id: next_id(&mut tables.next_vote_id),
            answer_id,
            user_id,
            vote,
            created_at: now,
            updated_at: now,
        };
        tables.votes.insert(created.id, created.clone());
        Ok(created)
    }

    async fn remove_vote(&self, answer_id: i64, user_id: i64) -> Result<()> {
        self.db
            .lock()?
            .votes
            .retain(|_, v| !(v.answer_id == answer_id && v.user_id == user_id));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            display_name: "Sleepy".to_string(),
            email: email.to_string(),
            hashed_password: "$argon2id$stub".to_string(),
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let db = MemoryDatabase::new();
        let users = db.user_repo();
        users.create_user(&new_user("a@nap.io")).await.unwrap();
        let err = users.create_user(&new_user("a@nap.io")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn vote_upsert_keeps_one_row_per_user() {
        let db = MemoryDatabase::new();
        let user = db.user_repo().create_user(&new_user("a@nap.io")).await.unwrap();
        let question = db
            .question_repo()
            .create_question(&NewQuestion { title: "t".into(), content: "c".into(), user_id: user.id })
            .await
            .unwrap();
        let answer = db
            .answer_repo()
            .create_answer(&NewAnswer { content: "a".into(), user_id: user.id, question_id: question.id })
            .await
            .unwrap();

        let votes = db.vote_repo();
        let first = votes.cast_vote(answer.id, user.id, 1).await.unwrap();
        let second = votes.cast_vote(answer.id, user.id, -1).await.unwrap();
        assert_eq!(first.id, second.id);

        let answers = db.answer_repo().get_answers_with_votes(question.id).await.unwrap();
        assert_eq!(answers[0].votes.len(), 1);
        assert_eq!(answers[0].votes[0].vote, -1);
    }

    #[tokio::test]
    async fn list_orders_by_most_recent_update() {
        let db = MemoryDatabase::new();
        let user = db.user_repo().create_user(&new_user("a@nap.io")).await.unwrap();
        let questions = db.question_repo();
        let first = questions
            .create_question(&NewQuestion { title: "first".into(), content: "c".into(), user_id: user.id })
            .await
            .unwrap();
        questions
            .create_question(&NewQuestion { title: "second".into(), content: "c".into(), user_id: user.id })
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        questions.touch_question(first.id).await.unwrap();

        let listed = questions.list_questions_with_authors(None).await.unwrap();
        assert_eq!(listed[0].question.title, "first");
        assert_eq!(listed[0].author_name, "Sleepy");
        assert_eq!(questions.list_questions_with_authors(Some(1)).await.unwrap().len(), 1);
    }
}
