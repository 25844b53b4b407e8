use axum::{
    extract::State,
    http::header,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};

use crate::auth::RequestContext;
use crate::models::user::{CsrfForm, LoginForm};
use crate::validation::{Submission, ValidationErrors};
use crate::views;
use crate::{AppState, Result};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users/login", get(login_form).post(login))
        .route("/users/logout", post(logout))
}

async fn login_form(ctx: RequestContext) -> Html<String> {
    Html(views::users::login_page(&ctx, "", &ValidationErrors::new()))
}

async fn login(
    State(app_state): State<AppState>,
    ctx: RequestContext,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    ctx.verify_csrf(&form.csrf)?;

    match app_state.user_service.authenticate(&form).await? {
        Submission::Accepted(user) => {
            let cookie = app_state.auth_service.login_user(&user)?;
            Ok(([(header::SET_COOKIE, cookie)], Redirect::to("/")).into_response())
        }
        Submission::Rejected(errors) => {
            Ok(Html(views::users::login_page(&ctx, &form.email_address, &errors)).into_response())
        }
    }
}

async fn logout(
    State(app_state): State<AppState>,
    ctx: RequestContext,
    Form(form): Form<CsrfForm>,
) -> Result<Response> {
    ctx.verify_csrf(&form.csrf)?;

    let cookie = app_state.auth_service.logout_user(&ctx)?;
    Ok(([(header::SET_COOKIE, cookie)], Redirect::to("/")).into_response())
}
