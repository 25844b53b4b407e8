// Session middleware: resolves the session cookie into a RequestContext
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::auth::{RequestContext, SESSION_COOKIE_NAME};
use crate::models::CurrentUser;
use crate::{AppError, AppState};

/// Value of cookie `name`, if the request carries it
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

pub async fn session_middleware(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let existing = read_cookie(request.headers(), SESSION_COOKIE_NAME)
        .and_then(|token| match app_state.auth_service.verify_token(&token) {
            Ok(claims) => Some(claims),
            Err(e) => {
                tracing::debug!("🍪 SESSION: discarding cookie: {}", e);
                None
            }
        });

    let (claims, is_new) = match existing {
        Some(claims) => (claims, false),
        None => (app_state.auth_service.new_session(None), true),
    };

    // A session naming a deleted user is treated as anonymous
    let user = match claims.uid {
        Some(user_id) => app_state
            .user_service
            .get_user(user_id)
            .await?
            .map(|user| CurrentUser::from(&user)),
        None => None,
    };

    request.extensions_mut().insert(RequestContext {
        user,
        csrf_token: claims.csrf.clone(),
    });

    let mut response = next.run(request).await;

    // Handlers that log in or out set their own cookie
    if is_new && !response.headers().contains_key(header::SET_COOKIE) {
        let cookie = app_state.auth_service.session_cookie(&claims)?;
        response.headers_mut().insert(header::SET_COOKIE, cookie);
    }

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn reads_named_cookie_among_many() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark; nap_session=abc.def.ghi; lang=en"));
        assert_eq!(read_cookie(&headers, "nap_session").as_deref(), Some("abc.def.ghi"));
        assert_eq!(read_cookie(&headers, "missing"), None);
    }
}
