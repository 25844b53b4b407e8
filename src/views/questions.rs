use chrono::{DateTime, Utc};

use super::{csrf_field, error_list, escape, layout};
use crate::auth::RequestContext;
use crate::models::{AnswerWithVotes, QuestionDetail, QuestionWithAuthor, VoteMap};
use crate::validation::ValidationErrors;

fn timestamp(at: &DateTime<Utc>) -> String {
    at.format("%b %-d, %Y %H:%M").to_string()
}

fn question_rows(questions: &[QuestionWithAuthor]) -> String {
    if questions.is_empty() {
        return r#"<p class="empty">No questions yet. Be the first to ask!</p>"#.to_string();
    }

    let rows: String = questions
        .iter()
        .map(|q| {
            format!(
                r#"<li class="question-row">
            <a href="/questions/{id}">{title}</a>
            <span class="meta">asked by {author} · updated {updated}</span>
        </li>"#,
                id = q.question.id,
                title = escape(&q.question.title),
                author = escape(&q.author_name),
                updated = timestamp(&q.question.updated_at),
            )
        })
        .collect();
    format!(r#"<ul class="questions">{}</ul>"#, rows)
}

pub fn home_page(ctx: &RequestContext, recent: &[QuestionWithAuthor]) -> String {
    let body = format!(
        r#"<section class="hero">
        <h1>Nap Overflow</h1>
        <p>Questions and answers about the fine art of napping.</p>
    </section>
    <h2>Recently active</h2>
    {rows}
    <p><a href="/questions">All questions →</a></p>"#,
        rows = question_rows(recent),
    );
    layout("Home", Some(ctx), &body)
}

pub fn list_page(ctx: &RequestContext, questions: &[QuestionWithAuthor]) -> String {
    let body = format!(
        r#"<header class="page-header">
        <h1>All questions</h1>
        <a class="button" href="/questions/new">Ask a question</a>
    </header>
    {rows}"#,
        rows = question_rows(questions),
    );
    layout("Questions", Some(ctx), &body)
}

/// Question form, pre-filled with whatever was submitted last
pub fn new_question_page(ctx: &RequestContext, title: &str, content: &str, errors: &ValidationErrors) -> String {
    let body = format!(
        r#"<h1>Ask a question</h1>
    {errors}
    <form method="post" action="/questions" class="stacked">
        {csrf}
        <label for="title">Title</label>
        <input id="title" name="title" type="text" maxlength="255" value="{title}">
        <label for="content">Question</label>
        <textarea id="content" name="content" rows="8">{content}</textarea>
        <button type="submit">Post question</button>
    </form>"#,
        errors = error_list(errors),
        csrf = csrf_field(ctx),
        title = escape(title),
        content = escape(content),
    );
    layout("Ask a question", Some(ctx), &body)
}

fn vote_button(ctx: &RequestContext, question_id: i64, answer_id: i64, value: i32, current: Option<i32>) -> String {
    let (label, class) = if value > 0 { ("▲", "up") } else { ("▼", "down") };
    let active = if current == Some(value) { " active" } else { "" };
    format!(
        r#"<form method="post" action="/questions/{question_id}/answers/{answer_id}/vote" class="inline">
                {csrf}
                <input type="hidden" name="vote" value="{value}">
                <button type="submit" class="vote {class}{active}">{label}</button>
            </form>"#,
        question_id = question_id,
        answer_id = answer_id,
        csrf = csrf_field(ctx),
        value = value,
        class = class,
        active = active,
        label = label,
    )
}

fn answer_item(ctx: &RequestContext, question_id: i64, answer: &AnswerWithVotes, user_votes: &VoteMap) -> String {
    let current = user_votes.get(&answer.answer.id).copied();
    let voting = if ctx.user.is_some() {
        format!(
            "{}{}",
            vote_button(ctx, question_id, answer.answer.id, 1, current),
            vote_button(ctx, question_id, answer.answer.id, -1, current),
        )
    } else {
        String::new()
    };

    format!(
        r#"<li class="answer" id="answer-{id}">
        <div class="votes">
            <span class="score">{score}</span>
            {voting}
        </div>
        <div class="answer-body">
            <p>{content}</p>
            <span class="meta">answered by {author} · {created}</span>
        </div>
    </li>"#,
        id = answer.answer.id,
        score = answer.score(),
        voting = voting,
        content = escape(&answer.answer.content),
        author = escape(&answer.author_name),
        created = timestamp(&answer.answer.created_at),
    )
}

/// A question, its answers with scores and the viewer's votes, and the answer form
pub fn detail_page(ctx: &RequestContext, detail: &QuestionDetail, answer_draft: &str, errors: &ValidationErrors) -> String {
    let question = &detail.question.question;

    let delete = if ctx.user_id() == Some(question.user_id) {
        format!(
            r#"<form method="post" action="/questions/{id}/delete" class="inline">
            {csrf}
            <button type="submit" class="danger">Delete question</button>
        </form>"#,
            id = question.id,
            csrf = csrf_field(ctx),
        )
    } else {
        String::new()
    };

    let answers: String = detail
        .answers
        .iter()
        .map(|answer| answer_item(ctx, question.id, answer, &detail.user_votes))
        .collect();

    let answer_form = if ctx.user.is_some() {
        format!(
            r#"<form method="post" action="/questions/{id}/answers" class="stacked">
        {csrf}
        <label for="answerContents">Your answer</label>
        <textarea id="answerContents" name="answerContents" rows="6">{draft}</textarea>
        <button type="submit">Post answer</button>
    </form>"#,
            id = question.id,
            csrf = csrf_field(ctx),
            draft = escape(answer_draft),
        )
    } else {
        r#"<p><a href="/users/login">Log in</a> to answer or vote.</p>"#.to_string()
    };

    let body = format!(
        r#"<article class="question">
        <h1>{title}</h1>
        <p class="meta">asked by {author} · {created}</p>
        <div class="content">{content}</div>
        {delete}
    </article>
    <h2>{count} answer{plural}</h2>
    <ul class="answers">{answers}</ul>
    <h2>Answer this question</h2>
    {errors}
    {answer_form}"#,
        title = escape(&question.title),
        author = escape(&detail.question.author_name),
        created = timestamp(&question.created_at),
        content = escape(&question.content),
        delete = delete,
        count = detail.answers.len(),
        plural = if detail.answers.len() == 1 { "" } else { "s" },
        answers = answers,
        errors = error_list(errors),
        answer_form = answer_form,
    );
    layout(&question.title, Some(ctx), &body)
}
