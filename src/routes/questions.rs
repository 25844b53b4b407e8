use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};

use crate::auth::{AuthUser, RequestContext};
use crate::models::answer::AnswerForm;
use crate::models::question::QuestionForm;
use crate::models::user::CsrfForm;
use crate::models::vote::VoteForm;
use crate::validation::{Submission, ValidationErrors};
use crate::views;
use crate::{AppError, AppState, Result};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/questions", get(list_questions).post(create_question))
        .route("/questions/new", get(new_question_form))
        .route("/questions/:id", get(show_question))
        .route("/questions/:id/delete", post(delete_question))
        .route("/questions/:id/answers", post(create_answer))
        .route("/questions/:id/answers/:answer_id/vote", post(cast_vote))
}

/// Ids arrive as raw path segments; anything that is not an integer is a 404
fn parse_id(raw: &str) -> Result<i64> {
    raw.parse::<i64>()
        .map_err(|_| AppError::NotFound(format!("No question or answer with id '{}'", raw)))
}

fn question_path(question_id: i64) -> String {
    format!("/questions/{}", question_id)
}

async fn list_questions(
    State(app_state): State<AppState>,
    ctx: RequestContext,
) -> Result<Html<String>> {
    let questions = app_state.question_service.list_questions().await?;
    Ok(Html(views::questions::list_page(&ctx, &questions)))
}

async fn new_question_form(AuthUser(_user): AuthUser, ctx: RequestContext) -> Html<String> {
    Html(views::questions::new_question_page(&ctx, "", "", &ValidationErrors::new()))
}

async fn create_question(
    State(app_state): State<AppState>,
    AuthUser(user): AuthUser,
    ctx: RequestContext,
    Form(form): Form<QuestionForm>,
) -> Result<Response> {
    ctx.verify_csrf(&form.csrf)?;

    match app_state.question_service.create_question(&form, &user).await? {
        Submission::Accepted(question) => Ok(Redirect::to(&question_path(question.id)).into_response()),
        Submission::Rejected(errors) => Ok(Html(views::questions::new_question_page(
            &ctx,
            &form.title,
            &form.content,
            &errors,
        ))
        .into_response()),
    }
}

async fn show_question(
    State(app_state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> Result<Html<String>> {
    let question_id = parse_id(&id)?;
    let detail = app_state
        .question_service
        .get_question_detail(question_id, ctx.user_id())
        .await?;
    Ok(Html(views::questions::detail_page(&ctx, &detail, "", &ValidationErrors::new())))
}

async fn delete_question(
    State(app_state): State<AppState>,
    AuthUser(user): AuthUser,
    ctx: RequestContext,
    Path(id): Path<String>,
    Form(form): Form<CsrfForm>,
) -> Result<Redirect> {
    ctx.verify_csrf(&form.csrf)?;
    let question_id = parse_id(&id)?;

    app_state.question_service.delete_question(question_id, &user).await?;
    Ok(Redirect::to("/questions"))
}

async fn create_answer(
    State(app_state): State<AppState>,
    AuthUser(user): AuthUser,
    ctx: RequestContext,
    Path(id): Path<String>,
    Form(form): Form<AnswerForm>,
) -> Result<Response> {
    ctx.verify_csrf(&form.csrf)?;
    let question_id = parse_id(&id)?;

    match app_state.answer_service.create_answer(question_id, &form, &user).await? {
        Submission::Accepted(_) => Ok(Redirect::to(&question_path(question_id)).into_response()),
        Submission::Rejected(errors) => {
            let detail = app_state
                .question_service
                .get_question_detail(question_id, Some(user.id))
                .await?;
            Ok(Html(views::questions::detail_page(&ctx, &detail, &form.content, &errors)).into_response())
        }
    }
}

async fn cast_vote(
    State(app_state): State<AppState>,
    AuthUser(user): AuthUser,
    ctx: RequestContext,
    Path((id, answer_id)): Path<(String, String)>,
    Form(form): Form<VoteForm>,
) -> Result<Redirect> {
    ctx.verify_csrf(&form.csrf)?;
    let question_id = parse_id(&id)?;
    let answer_id = parse_id(&answer_id)?;

    app_state
        .vote_service
        .cast_vote(question_id, answer_id, user.id, &form.vote)
        .await?;
    Ok(Redirect::to(&format!("{}#answer-{}", question_path(question_id), answer_id)))
}
