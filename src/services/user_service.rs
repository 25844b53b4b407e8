use std::sync::Arc;

use crate::auth::AuthService;
use crate::db::repository::UserRepository;
use crate::models::user::{LoginForm, NewUser, SignUpForm};
use crate::models::User;
use crate::validation::{FieldChain, Submission, ValidationErrors};
use crate::{AppError, Result};

pub const EMAIL_TAKEN: &str = "The provided email is already in use by another account";
pub const PASSWORD_COMPLEXITY: &str =
    "Password must contain at least 1 lowercase letter, uppercase letter, number, and special character (i.e. '!@#$%^&*')";
pub const LOGIN_FAILED: &str = "Login failed for the given email address and password";

pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    auth_service: Arc<AuthService>,
}

impl UserService {
    pub fn new(user_repo: Arc<dyn UserRepository>, auth_service: Arc<AuthService>) -> Self {
        Self { user_repo, auth_service }
    }

    pub async fn get_user(&self, user_id: i64) -> Result<Option<User>> {
        self.user_repo.get_user_by_id(user_id).await
    }

    async fn validate_sign_up(&self, form: &SignUpForm) -> Result<ValidationErrors> {
        let mut errors = ValidationErrors::new();

        errors.push(
            FieldChain::new("displayName", &form.display_name)
                .required("Please provide a value for Display Name")
                .max_length(50, "Display Name must not be more than 50 characters long"),
        );
        errors.push(
            FieldChain::new("email", &form.email)
                .required("Please provide a value for Email")
                .max_length(255, "Email must not be more than 255 characters long")
                .email("Email provided is not a valid email address")
                .unique(|email| self.user_repo.email_exists(email), EMAIL_TAKEN)
                .await?,
        );
        errors.push(
            FieldChain::new("password", &form.password)
                .required("Please provide a password")
                .password_complexity(PASSWORD_COMPLEXITY),
        );
        errors.push(
            FieldChain::new("confirmPassword", &form.confirm_password)
                .required("Please provide value for Confirm password")
                .equals(&form.password, "Confirm Password does not match Password"),
        );

        Ok(errors)
    }

    /// Validates the form, then stores the user with a hashed password
    pub async fn sign_up(&self, form: &SignUpForm) -> Result<Submission<User>> {
        let errors = self.validate_sign_up(form).await?;
        if !errors.is_empty() {
            tracing::debug!("📝 SIGN_UP: rejected with {} field errors", errors.len());
            return Ok(Submission::Rejected(errors));
        }

        let hashed_password = self.auth_service.hash_password(&form.password).await?;
        let new_user = NewUser {
            display_name: form.display_name.clone(),
            email: form.email.clone(),
            hashed_password,
        };

        match self.user_repo.create_user(&new_user).await {
            Ok(user) => {
                tracing::info!("✅ SIGN_UP: created user {}", user.id);
                Ok(Submission::Accepted(user))
            }
            // Lost the race against a concurrent sign-up with the same email
            Err(AppError::Conflict(_)) => {
                let mut errors = ValidationErrors::new();
                errors.add("email", EMAIL_TAKEN);
                Ok(Submission::Rejected(errors))
            }
            Err(e) => Err(e),
        }
    }

    /// Checks credentials. Unknown email and wrong password produce the same message.
    pub async fn authenticate(&self, form: &LoginForm) -> Result<Submission<User>> {
        let mut errors = ValidationErrors::new();
        errors.push(FieldChain::new("emailAddress", &form.email_address).required("Provide a Valid Email Address"));
        errors.push(FieldChain::new("password", &form.password).required("Please provide a value for Password"));
        if !errors.is_empty() {
            return Ok(Submission::Rejected(errors));
        }

        match self.user_repo.get_user_by_email(&form.email_address).await? {
            Some(user) => {
                if self.auth_service.verify_password(&form.password, &user.hashed_password).await? {
                    return Ok(Submission::Accepted(user));
                }
            }
            None => {
                self.auth_service.verify_dummy_password(&form.password).await?;
            }
        }

        tracing::info!("🔐 AUTH: failed login attempt");
        let mut errors = ValidationErrors::new();
        errors.add("credentials", LOGIN_FAILED);
        Ok(Submission::Rejected(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::db::repository::MemoryDatabase;

    fn service(db: &MemoryDatabase) -> UserService {
        UserService::new(
            Arc::new(db.user_repo()),
            Arc::new(AuthService::new(&AppConfig::default())),
        )
    }

    fn sign_up_form(email: &str, password: &str) -> SignUpForm {
        SignUpForm {
            display_name: "Dozy".to_string(),
            email: email.to_string(),
            password: password.to_string(),
            confirm_password: password.to_string(),
            csrf: String::new(),
        }
    }

    fn rejected<T>(submission: Submission<T>) -> ValidationErrors {
        match submission {
            Submission::Rejected(errors) => errors,
            Submission::Accepted(_) => panic!("expected the submission to be rejected"),
        }
    }

    #[tokio::test]
    async fn sign_up_stores_verifiable_hash() {
        let db = MemoryDatabase::new();
        let users = service(&db);
        let user = match users.sign_up(&sign_up_form("dozy@nap.io", "Abc123!x")).await.unwrap() {
            Submission::Accepted(user) => user,
            Submission::Rejected(errors) => panic!("unexpected errors: {:?}", errors.messages()),
        };

        assert_ne!(user.hashed_password, "Abc123!x");
        let auth = AuthService::new(&AppConfig::default());
        assert!(auth.verify_password("Abc123!x", &user.hashed_password).await.unwrap());
    }

    #[tokio::test]
    async fn weak_password_gets_complexity_message() {
        let db = MemoryDatabase::new();
        let errors = rejected(service(&db).sign_up(&sign_up_form("dozy@nap.io", "abcdefg")).await.unwrap());
        assert_eq!(errors.messages(), vec![PASSWORD_COMPLEXITY.to_string()]);
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected_without_new_user() {
        let db = MemoryDatabase::new();
        let users = service(&db);
        assert!(users.sign_up(&sign_up_form("dozy@nap.io", "Abc123!x")).await.unwrap().is_accepted());

        let errors = rejected(users.sign_up(&sign_up_form("dozy@nap.io", "Xyz789$q")).await.unwrap());
        assert_eq!(errors.messages(), vec![EMAIL_TAKEN.to_string()]);
        assert!(users.get_user(2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn every_field_reports_its_first_failure() {
        let db = MemoryDatabase::new();
        let form = SignUpForm {
            display_name: "x".repeat(51),
            email: "not-an-email".to_string(),
            password: String::new(),
            confirm_password: "something".to_string(),
            csrf: String::new(),
        };
        let errors = rejected(service(&db).sign_up(&form).await.unwrap());
        assert_eq!(
            errors.messages(),
            vec![
                "Display Name must not be more than 50 characters long".to_string(),
                "Email provided is not a valid email address".to_string(),
                "Please provide a password".to_string(),
                "Confirm Password does not match Password".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn login_failure_message_does_not_reveal_which_part_was_wrong() {
        let db = MemoryDatabase::new();
        let users = service(&db);
        users.sign_up(&sign_up_form("dozy@nap.io", "Abc123!x")).await.unwrap();

        let wrong_password = rejected(
            users
                .authenticate(&LoginForm {
                    email_address: "dozy@nap.io".to_string(),
                    password: "Abc123!y".to_string(),
                    csrf: String::new(),
                })
                .await
                .unwrap(),
        );
        let unknown_email = rejected(
            users
                .authenticate(&LoginForm {
                    email_address: "nobody@nap.io".to_string(),
                    password: "Abc123!x".to_string(),
                    csrf: String::new(),
                })
                .await
                .unwrap(),
        );
        assert_eq!(wrong_password.messages(), unknown_email.messages());
        assert_eq!(wrong_password.messages(), vec![LOGIN_FAILED.to_string()]);
    }

    #[tokio::test]
    async fn unknown_email_still_runs_a_password_verification() {
        let db = MemoryDatabase::new();
        let auth = Arc::new(AuthService::new(&AppConfig::default()));
        let users = UserService::new(Arc::new(db.user_repo()), auth.clone());

        let errors = rejected(
            users
                .authenticate(&LoginForm {
                    email_address: "nobody@nap.io".to_string(),
                    password: "Abc123!x".to_string(),
                    csrf: String::new(),
                })
                .await
                .unwrap(),
        );
        assert_eq!(errors.messages(), vec![LOGIN_FAILED.to_string()]);
        assert!(auth.dummy_hash_ready());
    }

    #[tokio::test]
    async fn login_requires_both_fields() {
        let db = MemoryDatabase::new();
        let errors = rejected(service(&db).authenticate(&LoginForm::default()).await.unwrap());
        assert_eq!(
            errors.messages(),
            vec![
                "Provide a Valid Email Address".to_string(),
                "Please provide a value for Password".to_string(),
            ]
        );
    }
}
