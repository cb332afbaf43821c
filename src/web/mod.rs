//! Server-rendered HTML pages.
//!
//! Pages are assembled with `format!` against a shared layout. Every
//! user-supplied value passes through [`escape`] before it reaches markup.

pub mod admin;
pub mod auth;
pub mod dashboard;
pub mod items;
pub mod reports;
pub mod settings;
pub mod stock;
pub mod suppliers;

use serde::Deserialize;

use crate::services::session::SessionUser;
use crate::models::Role;

const STYLE: &str = r#"
    * { box-sizing: border-box; }
    body { margin: 0; font-family: -apple-system, 'Segoe UI', Roboto, sans-serif; background: #f4f5f7; color: #1f2933; }
    nav { display: flex; align-items: center; gap: 1rem; padding: 0.6rem 1.5rem; background: #243b53; color: #f0f4f8; }
    nav .brand { font-weight: 700; font-size: 1.1rem; margin-right: 1rem; }
    nav a { color: #d9e2ec; text-decoration: none; }
    nav a:hover { color: #fff; }
    nav .spacer { flex: 1; }
    nav .who { color: #9fb3c8; font-size: 0.9rem; }
    main { max-width: 960px; margin: 1.5rem auto; padding: 0 1rem; }
    h1 { font-size: 1.4rem; }
    table { width: 100%; border-collapse: collapse; background: #fff; }
    th, td { text-align: left; padding: 0.5rem 0.75rem; border-bottom: 1px solid #e4e7eb; }
    th { background: #f0f4f8; font-size: 0.85rem; text-transform: uppercase; letter-spacing: 0.03em; }
    form.inline { display: inline; }
    fieldset { border: 1px solid #cbd2d9; background: #fff; padding: 1rem; margin: 1rem 0; }
    legend { font-weight: 600; }
    label { display: block; margin: 0.5rem 0 0.15rem; font-size: 0.9rem; }
    input, select { padding: 0.35rem 0.5rem; border: 1px solid #9aa5b1; border-radius: 3px; }
    button { padding: 0.4rem 0.9rem; border: none; border-radius: 3px; background: #2680c2; color: #fff; cursor: pointer; }
    button:hover { background: #186faf; }
    button.danger { background: #ba2525; }
    button.danger:hover { background: #a61b1b; }
    .notice { background: #e3f9e5; border: 1px solid #57ae5b; padding: 0.6rem 1rem; margin: 1rem 0; }
    .error { background: #facdcd; border: 1px solid #ba2525; padding: 0.6rem 1rem; margin: 1rem 0; }
    .low { color: #ba2525; font-weight: 600; }
    .cards { display: flex; gap: 1rem; flex-wrap: wrap; margin: 1rem 0; }
    .card { background: #fff; border: 1px solid #e4e7eb; padding: 1rem 1.5rem; min-width: 10rem; }
    .card .value { font-size: 1.8rem; font-weight: 700; }
    .card .label { color: #616e7c; font-size: 0.85rem; }
    .actions { white-space: nowrap; }
"#;

/// Escape a value for interpolation into HTML text or attributes.
pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
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

/// Treat absent and empty form fields alike: HTML forms submit cleared
/// inputs as empty strings.
pub(crate) fn empty_string_as_none<'de, D, T>(de: D) -> Result<Option<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let opt = Option::<String>::deserialize(de)?;
    match opt.as_deref() {
        None | Some("") => Ok(None),
        Some(s) => s.parse::<T>().map(Some).map_err(serde::de::Error::custom),
    }
}

fn nav(user: Option<&SessionUser>) -> String {
    match user {
        Some(user) => {
            let admin_links = if user.role == Role::Admin {
                r#"<a href="/users">Users</a> <a href="/logs">Logs</a>"#
            } else {
                ""
            };
            format!(
                concat!(
                    r#"<nav><span class="brand">Stockroom</span>"#,
                    r#"<a href="/dashboard">Dashboard</a>"#,
                    r#"<a href="/items">Items</a>"#,
                    r#"<a href="/stock">Stock</a>"#,
                    r#"<a href="/suppliers">Suppliers</a>"#,
                    r#"<a href="/reports">Reports</a>"#,
                    "{admin_links}",
                    r#"<span class="spacer"></span>"#,
                    r#"<span class="who">{username} ({role})</span>"#,
                    r#"<a href="/settings">Settings</a>"#,
                    r#"<a href="/logout">Log out</a></nav>"#
                ),
                admin_links = admin_links,
                username = escape(&user.username),
                role = user.role.as_str(),
            )
        }
        None => concat!(
            r#"<nav><span class="brand">Stockroom</span>"#,
            r#"<span class="spacer"></span>"#,
            r#"<a href="/login">Log in</a>"#,
            r#"<a href="/register">Register</a></nav>"#
        )
        .to_string(),
    }
}

/// Wrap page content in the shared chrome.
pub fn layout(title: &str, user: Option<&SessionUser>, body: &str) -> String {
    format!(
        concat!(
            "<!DOCTYPE html>\n",
            r#"<html lang="en"><head><meta charset="utf-8">"#,
            r#"<meta name="viewport" content="width=device-width, initial-scale=1">"#,
            "<title>{title} - Stockroom</title>",
            "<style>{style}</style></head><body>",
            "{nav}<main>{body}</main></body></html>"
        ),
        title = escape(title),
        style = STYLE,
        nav = nav(user),
        body = body,
    )
}

pub fn notice(message: &str) -> String {
    format!(r#"<div class="notice">{}</div>"#, escape(message))
}

pub fn error_banner(message: &str) -> String {
    format!(r#"<div class="error">{}</div>"#, escape(message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_neutralizes_markup() {
        assert_eq!(
            escape(r#"<script>alert("hi") & 'bye'</script>"#),
            "&lt;script&gt;alert(&quot;hi&quot;) &amp; &#39;bye&#39;&lt;/script&gt;"
        );
    }

    #[test]
    fn escape_leaves_plain_text_alone() {
        assert_eq!(escape("Arabica beans 5kg"), "Arabica beans 5kg");
    }
}
