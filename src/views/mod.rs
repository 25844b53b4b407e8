//! Server-rendered HTML pages.
//!
//! Every page goes through [`layout`], which draws the navigation bar for the
//! current [`RequestContext`]. All user-supplied text must pass through
//! [`escape`] before it is interpolated.

pub mod questions;
pub mod users;

use axum::http::StatusCode;

use crate::auth::RequestContext;
use crate::validation::ValidationErrors;

pub const SITE_NAME: &str = "Nap Overflow";

/// HTML-escapes text for element content and quoted attribute values
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Hidden anti-forgery field for a form
pub fn csrf_field(ctx: &RequestContext) -> String {
    format!(r#"<input type="hidden" name="_csrf" value="{}">"#, escape(&ctx.csrf_token))
}

/// Bulleted list of validation messages, or nothing when there are none
pub fn error_list(errors: &ValidationErrors) -> String {
    if errors.is_empty() {
        return String::new();
    }
    let items: String = errors
        .iter()
        .map(|e| format!("<li>{}</li>", escape(&e.message)))
        .collect();
    format!(r#"<ul class="errors">{}</ul>"#, items)
}

fn nav(ctx: Option<&RequestContext>) -> String {
    let account = match ctx {
        Some(RequestContext { user: Some(user), .. }) => format!(
            r#"<span class="greeting">Hello, {name}</span>
            <a href="/questions/new">Ask a question</a>
            <form method="post" action="/users/logout" class="inline">{csrf}<button type="submit" class="link">Log out</button></form>"#,
            name = escape(&user.display_name),
            csrf = ctx.map(csrf_field).unwrap_or_default(),
        ),
        Some(_) => r#"<a href="/users/login">Log in</a> <a href="/sign-up">Sign up</a>"#.to_string(),
        None => String::new(),
    };

    format!(
        r#"<nav>
        <a href="/" class="brand">😴 {site}</a>
        <a href="/questions">Questions</a>
        <span class="spacer"></span>
        {account}
    </nav>"#,
        site = SITE_NAME,
        account = account,
    )
}

/// Wraps `body` in the site chrome
pub fn layout(title: &str, ctx: Option<&RequestContext>, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} - {site}</title>
    <link rel="stylesheet" href="/static/style.css">
</head>
<body>
    {nav}
    <main>
{body}
    </main>
</body>
</html>"#,
        title = escape(title),
        site = SITE_NAME,
        nav = nav(ctx),
        body = body,
    )
}

/// Standalone error page. Rendered without the session, so the nav is minimal.
pub fn error_page(status: StatusCode, message: &str) -> String {
    let heading = status.canonical_reason().unwrap_or("Error");
    let body = format!(
        r#"<section class="error-page">
        <h1>{code} {heading}</h1>
        <p>{message}</p>
        <p><a href="/questions">Back to questions</a></p>
    </section>"#,
        code = status.as_u16(),
        heading = heading,
        message = escape(message),
    );
    layout(heading, None, &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CurrentUser;

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape(r#"<script>alert("x")</script> & 'y'"#),
            "&lt;script&gt;alert(&quot;x&quot;)&lt;/script&gt; &amp; &#39;y&#39;"
        );
    }

    #[test]
    fn nav_reflects_login_state() {
        let anonymous = RequestContext::anonymous("tok".to_string());
        let page = layout("Home", Some(&anonymous), "");
        assert!(page.contains("/users/login"));
        assert!(!page.contains("/users/logout"));

        let logged_in = RequestContext {
            user: Some(CurrentUser { id: 1, display_name: "<Dozy>".to_string() }),
            csrf_token: "tok".to_string(),
        };
        let page = layout("Home", Some(&logged_in), "");
        assert!(page.contains("Hello, &lt;Dozy&gt;"));
        assert!(page.contains(r#"name="_csrf" value="tok""#));
    }

    #[test]
    fn error_page_shows_status() {
        let page = error_page(StatusCode::NOT_FOUND, "Question not found");
        assert!(page.contains("404 Not Found"));
        assert!(page.contains("Question not found"));
    }
}
