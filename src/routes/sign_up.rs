use axum::{
    extract::State,
    http::header,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Form, Router,
};

use crate::auth::RequestContext;
use crate::models::user::SignUpForm;
use crate::validation::{Submission, ValidationErrors};
use crate::views;
use crate::{AppState, Result};

pub fn routes() -> Router<AppState> {
    Router::new().route("/sign-up", get(sign_up_form).post(sign_up))
}

async fn sign_up_form(ctx: RequestContext) -> Html<String> {
    Html(views::users::sign_up_page(&ctx, "", "", &ValidationErrors::new()))
}

/// Creates the account and logs the new user straight in
async fn sign_up(
    State(app_state): State<AppState>,
    ctx: RequestContext,
    Form(form): Form<SignUpForm>,
) -> Result<Response> {
    ctx.verify_csrf(&form.csrf)?;

    match app_state.user_service.sign_up(&form).await? {
        Submission::Accepted(user) => {
            let cookie = app_state.auth_service.login_user(&user)?;
            Ok(([(header::SET_COOKIE, cookie)], Redirect::to("/")).into_response())
        }
        Submission::Rejected(errors) => Ok(Html(views::users::sign_up_page(
            &ctx,
            &form.display_name,
            &form.email,
            &errors,
        ))
        .into_response()),
    }
}
