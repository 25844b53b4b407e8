//! Per-field validation chains.
//!
//! Each field runs its rules in order and keeps only the first failure, so a
//! form reports at most one message per field. Checks against the store are
//! advisory: the unique constraints in the store still decide the outcome.

use regex::Regex;
use std::future::Future;

use crate::Result;

const PASSWORD_CLASSES: [&str; 4] = [r"[a-z]", r"[A-Z]", r"[0-9]", r"[!@#$%^&*]"];

/// Shape check used for sign-up emails: alphabetic TLD of two or more
/// letters, no empty dot segments, no domain label starting or ending in `-`
pub fn is_valid_email(email: &str) -> bool {
    let shape = Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
        .is_ok_and(|re| re.is_match(email));
    if !shape || email.contains("..") {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.starts_with('.')
        && !local.ends_with('.')
        && domain
            .split('.')
            .all(|label| !label.is_empty() && !label.starts_with('-') && !label.ends_with('-'))
}

/// At least one lowercase letter, uppercase letter, digit and one of `!@#$%^&*`
pub fn meets_password_complexity(password: &str) -> bool {
    PASSWORD_CLASSES
        .iter()
        .all(|class| Regex::new(class).is_ok_and(|re| re.is_match(password)))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Ordered rule chain for one field. Once a rule fails, later rules are skipped.
#[derive(Debug)]
pub struct FieldChain<'v> {
    field: &'static str,
    value: &'v str,
    error: Option<String>,
}

impl<'v> FieldChain<'v> {
    pub fn new(field: &'static str, value: &'v str) -> Self {
        Self { field, value, error: None }
    }

    fn check(mut self, passes: impl FnOnce(&str) -> bool, message: &str) -> Self {
        if self.error.is_none() && !passes(self.value) {
            self.error = Some(message.to_string());
        }
        self
    }

    /// Fails on an empty value. Whitespace counts as present.
    pub fn required(self, message: &str) -> Self {
        self.check(|v| !v.is_empty(), message)
    }

    pub fn max_length(self, max: usize, message: &str) -> Self {
        self.check(|v| v.chars().count() <= max, message)
    }

    pub fn email(self, message: &str) -> Self {
        self.check(is_valid_email, message)
    }

    pub fn password_complexity(self, message: &str) -> Self {
        self.check(meets_password_complexity, message)
    }

    pub fn equals(self, other: &str, message: &str) -> Self {
        self.check(|v| v == other, message)
    }

    /// Runs `taken` only when every earlier rule passed
    pub async fn unique<F, Fut>(mut self, taken: F, message: &str) -> Result<Self>
    where
        F: FnOnce(&'v str) -> Fut,
        Fut: Future<Output = Result<bool>>,
    {
        if self.error.is_none() && taken(self.value).await? {
            self.error = Some(message.to_string());
        }
        Ok(self)
    }

    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }

    pub fn into_error(self) -> Option<FieldError> {
        let field = self.field;
        self.error.map(|message| FieldError { field, message })
    }
}

/// All field failures of one form submission, in field order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chain: FieldChain<'_>) {
        if let Some(error) = chain.into_error() {
            self.errors.push(error);
        }
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError { field, message: message.into() });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(|e| e.message.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }
}

/// Result of a validated write: either the saved record or the errors to re-render
#[derive(Debug)]
pub enum Submission<T> {
    Accepted(T),
    Rejected(ValidationErrors),
}

impl<T> Submission<T> {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Submission::Accepted(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AppError;

    #[test]
    fn first_failing_rule_wins() {
        let long = "x".repeat(300);
        let chain = FieldChain::new("title", "")
            .required("missing")
            .max_length(255, "too long");
        assert_eq!(chain.into_error().map(|e| e.message), Some("missing".to_string()));

        let chain = FieldChain::new("title", &long)
            .required("missing")
            .max_length(255, "too long");
        assert_eq!(chain.into_error().map(|e| e.message), Some("too long".to_string()));
    }

    #[test]
    fn whitespace_counts_as_present() {
        assert!(FieldChain::new("content", "   ").required("missing").is_valid());
    }

    #[test]
    fn max_length_counts_characters() {
        let name = "é".repeat(50);
        assert!(FieldChain::new("displayName", &name).max_length(50, "too long").is_valid());
    }

    #[test]
    fn password_complexity_examples() {
        assert!(meets_password_complexity("Abc123!x"));
        assert!(!meets_password_complexity("abcdefg"));
        assert!(!meets_password_complexity("ABCdef123"));
        assert!(!meets_password_complexity("abc123!x"));
    }

    #[test]
    fn email_shape() {
        assert!(is_valid_email("nap@overflow.dev"));
        assert!(!is_valid_email("nap@overflow"));
        assert!(!is_valid_email("nap overflow@x.io"));
        assert!(!is_valid_email("@overflow.dev"));
        assert!(is_valid_email("dozy.nap+tag@sleep-lab.co.uk"));
    }

    #[test]
    fn email_rejects_loose_shapes() {
        for email in ["a@b.c", "<x>@nap.io", "a..b@nap.io", "a@nap.123", "a@-nap.io", "a@nap-.io", ".a@nap.io", "a.@nap.io"] {
            assert!(!is_valid_email(email), "{} should be rejected", email);
        }
    }

    #[test]
    fn confirm_must_equal() {
        let chain = FieldChain::new("confirmPassword", "Abc123!y")
            .required("missing")
            .equals("Abc123!x", "mismatch");
        assert_eq!(chain.into_error().map(|e| e.message), Some("mismatch".to_string()));
    }

    #[tokio::test]
    async fn unique_check_skipped_after_earlier_failure() {
        let chain = FieldChain::new("email", "not-an-email")
            .email("bad shape")
            .unique(|_| async { Err::<bool, _>(AppError::DatabaseError("must not run".into())) }, "taken")
            .await
            .unwrap();
        assert_eq!(chain.into_error().map(|e| e.message), Some("bad shape".to_string()));
    }

    #[tokio::test]
    async fn unique_check_reports_taken_values() {
        let chain = FieldChain::new("title", "Why nap?")
            .required("missing")
            .unique(|title| async move { Ok(title == "Why nap?") }, "taken")
            .await
            .unwrap();
        assert_eq!(chain.into_error().map(|e| e.message), Some("taken".to_string()));
    }

    #[test]
    fn errors_keep_field_order() {
        let mut errors = ValidationErrors::new();
        errors.push(FieldChain::new("title", "").required("title missing"));
        errors.push(FieldChain::new("content", "ok").required("content missing"));
        errors.push(FieldChain::new("other", "").required("other missing"));
        assert_eq!(errors.messages(), vec!["title missing", "other missing"]);
        assert!(errors.has_field("other"));
        assert!(!errors.has_field("content"));
    }
}
