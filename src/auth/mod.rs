pub mod context;
pub mod jwt;
pub mod middleware;

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::http::HeaderValue;
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::models::User;
use crate::{AppError, Result};
use jwt::JwtService;

pub use context::{AuthUser, RequestContext};

pub const SESSION_COOKIE_NAME: &str = "nap_session";

// Fails the sign-up complexity rules, so no account can hold it
const DUMMY_PASSWORD: &str = "                ";

/// Claims carried by the signed session cookie
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Logged-in user, if any
    pub uid: Option<i64>,
    /// Anti-forgery secret echoed back by every form
    pub csrf: String,
    pub iat: usize,
    pub exp: usize,
}

pub struct AuthService {
    jwt: JwtService,
    session_ttl_seconds: u64,
    cookie_secure: bool,
    /// Throwaway hash verified against when a login names no known user
    dummy_hash: OnceCell<String>,
}

impl AuthService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            jwt: JwtService::new(config.session_secret.clone()),
            session_ttl_seconds: config.session_ttl_seconds,
            cookie_secure: config.session_cookie_secure,
            dummy_hash: OnceCell::new(),
        }
    }

    /// Salted Argon2id hash in PHC string form
    pub async fn hash_password(&self, password: &str) -> Result<String> {
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || {
            let salt = SaltString::generate(&mut OsRng);
            Argon2::default()
                .hash_password(password.as_bytes(), &salt)
                .map(|hash| hash.to_string())
                .map_err(|e| AppError::InternalError(format!("Failed to hash password: {}", e)))
        })
        .await
        .map_err(|e| AppError::InternalError(format!("Password hashing task failed: {}", e)))?
    }

    /// Constant-time check of `password` against a stored PHC hash
    pub async fn verify_password(&self, password: &str, hash: &str) -> Result<bool> {
        let password = password.to_owned();
        let hash = hash.to_owned();
        tokio::task::spawn_blocking(move || {
            let parsed = PasswordHash::new(&hash)
                .map_err(|e| AppError::InternalError(format!("Stored password hash is malformed: {}", e)))?;
            Ok(Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
        })
        .await
        .map_err(|e| AppError::InternalError(format!("Password verification task failed: {}", e)))?
    }

    /// Full Argon2 verification that always fails, so a login for an unknown
    /// email costs the same as one with a wrong password
    pub async fn verify_dummy_password(&self, password: &str) -> Result<bool> {
        let hash = self
            .dummy_hash
            .get_or_try_init(|| self.hash_password(DUMMY_PASSWORD))
            .await?;
        self.verify_password(password, hash).await?;
        Ok(false)
    }

    pub fn dummy_hash_ready(&self) -> bool {
        self.dummy_hash.initialized()
    }

    /// Fresh claims with a new anti-forgery secret
    pub fn new_session(&self, user_id: Option<i64>) -> SessionClaims {
        let now = chrono::Utc::now().timestamp().max(0) as usize;
        SessionClaims {
            uid: user_id,
            csrf: Uuid::new_v4().simple().to_string(),
            iat: now,
            exp: now + self.session_ttl_seconds as usize,
        }
    }

    pub fn generate_token(&self, claims: &SessionClaims) -> Result<String> {
        self.jwt.encode_token(claims)
    }

    pub fn verify_token(&self, token: &str) -> Result<SessionClaims> {
        self.jwt.decode_token(token)
    }

    /// `Set-Cookie` value carrying `claims`
    pub fn session_cookie(&self, claims: &SessionClaims) -> Result<HeaderValue> {
        let token = self.generate_token(claims)?;
        let mut cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            SESSION_COOKIE_NAME, token, self.session_ttl_seconds
        );
        if self.cookie_secure {
            cookie.push_str("; Secure");
        }
        HeaderValue::from_str(&cookie)
            .map_err(|e| AppError::InternalError(format!("Invalid session cookie: {}", e)))
    }

    /// Binds `user` to a new session and rotates the anti-forgery secret
    pub fn login_user(&self, user: &User) -> Result<HeaderValue> {
        tracing::info!("🔐 AUTH: user {} logged in", user.id);
        self.session_cookie(&self.new_session(Some(user.id)))
    }

    /// Replaces the session with an anonymous one
    pub fn logout_user(&self, ctx: &RequestContext) -> Result<HeaderValue> {
        if let Some(user) = &ctx.user {
            tracing::info!("🔓 AUTH: user {} logged out", user.id);
        }
        self.session_cookie(&self.new_session(None))
    }
}
