use super::{csrf_field, error_list, escape, layout};
use crate::auth::RequestContext;
use crate::validation::ValidationErrors;

// Passwords are never echoed back into either form

pub fn sign_up_page(ctx: &RequestContext, display_name: &str, email: &str, errors: &ValidationErrors) -> String {
    let body = format!(
        r#"<h1>Sign up</h1>
    {errors}
    <form method="post" action="/sign-up" class="stacked">
        {csrf}
        <label for="displayName">Display Name</label>
        <input id="displayName" name="displayName" type="text" maxlength="50" value="{display_name}">
        <label for="email">Email</label>
        <input id="email" name="email" type="email" maxlength="255" value="{email}">
        <label for="password">Password</label>
        <input id="password" name="password" type="password">
        <label for="confirmPassword">Confirm Password</label>
        <input id="confirmPassword" name="confirmPassword" type="password">
        <button type="submit">Create account</button>
    </form>
    <p>Already have an account? <a href="/users/login">Log in</a></p>"#,
        errors = error_list(errors),
        csrf = csrf_field(ctx),
        display_name = escape(display_name),
        email = escape(email),
    );
    layout("Sign up", Some(ctx), &body)
}

pub fn login_page(ctx: &RequestContext, email_address: &str, errors: &ValidationErrors) -> String {
    let body = format!(
        r#"<h1>Log in</h1>
    {errors}
    <form method="post" action="/users/login" class="stacked">
        {csrf}
        <label for="emailAddress">Email Address</label>
        <input id="emailAddress" name="emailAddress" type="email" value="{email}">
        <label for="password">Password</label>
        <input id="password" name="password" type="password">
        <button type="submit">Log in</button>
    </form>
    <p>New here? <a href="/sign-up">Create an account</a></p>"#,
        errors = error_list(errors),
        csrf = csrf_field(ctx),
        email = escape(email_address),
    );
    layout("Log in", Some(ctx), &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_form_echoes_email_only() {
        let ctx = RequestContext::anonymous("tok".to_string());
        let mut errors = ValidationErrors::new();
        errors.add("credentials", "Login failed for the given email address and password");

        let page = login_page(&ctx, "dozy@nap.io", &errors);
        assert!(page.contains(r#"value="dozy@nap.io""#));
        assert!(page.contains("Login failed for the given email address and password"));
        assert!(page.contains(r#"name="password" type="password">"#));
    }
}
