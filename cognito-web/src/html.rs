//! Minimal inline pages.

use crate::state::CurrentUser;

const STYLE: &str = r#"
        body { font-family: system-ui, -apple-system, sans-serif; max-width: 640px; margin: 40px auto; padding: 0 20px; }
        h1 { color: #333; }
        .error { color: #a94442; background: #f2dede; border-radius: 4px; padding: 8px 12px; }
        .meta { color: #666; font-size: 0.9em; }
        label { display: block; margin: 12px 0 4px; }
        input { padding: 6px; width: 100%; box-sizing: border-box; }
        button { margin-top: 16px; padding: 8px 16px; border: none; border-radius: 4px; background: #337ab7; color: white; cursor: pointer; }
        table { border-collapse: collapse; margin-top: 16px; }
        td { border-bottom: 1px solid #eee; padding: 4px 12px 4px 0; }
"#;

/// Escape text for HTML element content and quoted attribute values.
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn page(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>{title}</title>
    <style>{STYLE}</style>
</head>
<body>
{body}
</body>
</html>"#
    )
}

pub fn home_page(user: &CurrentUser) -> String {
    let mut body = format!(
        r#"    <h1>Welcome, {}</h1>
    <div class="meta">Subject: {}</div>"#,
        escape(&user.username),
        escape(&user.sub),
    );

    if let Some(email) = &user.email {
        body.push_str(&format!(
            r#"
    <div class="meta">Email: {}</div>"#,
            escape(email)
        ));
    }

    if !user.attributes.is_empty() {
        body.push_str("\n    <table>");
        for (name, value) in &user.attributes {
            body.push_str(&format!(
                "<tr><td>{}</td><td>{}</td></tr>",
                escape(name),
                escape(value)
            ));
        }
        body.push_str("</table>");
    }

    body.push_str("\n    <p><a href=\"/auth/logout\">Log out</a></p>");
    page("Home", &body)
}

pub fn login_page(error: Option<&str>, hosted_login_url: &str) -> String {
    let error = error
        .map(|e| format!(r#"<p class="error">{}</p>"#, escape(e)))
        .unwrap_or_default();

    let body = format!(
        r#"    <h1>Sign in</h1>
    {error}
    <form method="post" action="/auth/login">
        <label for="username">Username</label>
        <input id="username" name="username" autocomplete="username" required>
        <label for="password">Password</label>
        <input id="password" name="password" type="password" autocomplete="current-password" required>
        <button type="submit">Sign in</button>
    </form>
    <p class="meta"><a href="{}">Use the hosted sign-in page</a></p>"#,
        escape(hosted_login_url)
    );
    page("Sign in", &body)
}

pub fn login_failed_page() -> String {
    page(
        "Login failed",
        r#"    <h1>Login failed</h1>
    <p>We could not sign you in. <a href="/auth/login">Try again</a>.</p>"#,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_escape() {
        assert_eq!(
            escape(r#"<script>alert("x")</script> & 'y'"#),
            "&lt;script&gt;alert(&quot;x&quot;)&lt;/script&gt; &amp; &#x27;y&#x27;"
        );
        assert_eq!(escape("plain"), "plain");
    }

    #[test]
    fn test_home_page_escapes_user_values() {
        let mut attributes = BTreeMap::new();
        attributes.insert("custom:team".to_string(), "<b>ops</b>".to_string());

        let user = CurrentUser {
            sub: "sub-1".into(),
            username: "<img src=x>".into(),
            email: Some("a@example.com".into()),
            attributes,
        };

        let html = home_page(&user);
        assert!(html.contains("Welcome, &lt;img src=x&gt;"));
        assert!(html.contains("&lt;b&gt;ops&lt;/b&gt;"));
        assert!(html.contains("a@example.com"));
        assert!(!html.contains("<img src=x>"));
    }

    #[test]
    fn test_login_page_shows_error() {
        let html = login_page(Some("Invalid credentials"), "https://auth.example.com/login?a=1&b=2");
        assert!(html.contains("Invalid credentials"));
        assert!(html.contains("a=1&amp;b=2"));

        let html = login_page(None, "https://auth.example.com/login");
        assert!(!html.contains("class=\"error\""));
    }
}
