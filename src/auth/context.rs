//! Request-scoped identity.
//!
//! The session middleware resolves the cookie once per request and stores a
//! [`RequestContext`] in the request extensions. Handlers take it (or
//! [`AuthUser`] for protected routes) as an extractor.

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};

use crate::models::CurrentUser;
use crate::{AppError, Result};

pub const LOGIN_PATH: &str = "/users/login";

#[derive(Debug, Clone)]
pub struct RequestContext {
    pub user: Option<CurrentUser>,
    pub csrf_token: String,
}

impl RequestContext {
    pub fn anonymous(csrf_token: String) -> Self {
        Self { user: None, csrf_token }
    }

    pub fn user_id(&self) -> Option<i64> {
        self.user.as_ref().map(|u| u.id)
    }

    /// Rejects a submitted anti-forgery token that does not match the session's
    pub fn verify_csrf(&self, submitted: &str) -> Result<()> {
        if constant_time_eq(self.csrf_token.as_bytes(), submitted.as_bytes()) {
            Ok(())
        } else {
            tracing::warn!("🛡️ CSRF: rejected form submission with a mismatched token");
            Err(AppError::Forbidden("Invalid or missing form token. Reload the page and try again.".to_string()))
        }
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Guard for protected routes: anonymous callers go to the login page
pub fn require_auth(ctx: &RequestContext) -> std::result::Result<CurrentUser, Redirect> {
    ctx.user.clone().ok_or_else(|| Redirect::to(LOGIN_PATH))
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> std::result::Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .ok_or_else(|| AppError::InternalError("Session middleware is not installed".to_string()))
    }
}

/// The logged-in caller of a protected route
#[derive(Debug, Clone)]
pub struct AuthUser(pub CurrentUser);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> std::result::Result<Self, Self::Rejection> {
        let ctx = RequestContext::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;
        require_auth(&ctx)
            .map(AuthUser)
            .map_err(IntoResponse::into_response)
    }
}
