//! Browser-style Redmine session.
//!
//! The child-project listing (`/projects/{id}/children`) is served to logged-in users
//! only, so the client logs in through the HTML form and keeps the session cookie.

use anyhow::{Context, Result};
use regex::Regex;
use serde_json::Value;
use tracing::debug;

/// Cookie-carrying HTTP client for session-only endpoints.
#[derive(Debug, Clone)]
pub(crate) struct Session {
    http: reqwest::Client,
}

impl Session {
    /// Log in through `{base_url}/login`.
    ///
    /// Returns `Ok(None)` when the server rejects the credentials or the login page
    /// carries no `authenticity_token`. Transport failures are errors.
    pub(crate) async fn login(base_url: &str, username: &str, password: &str) -> Result<Option<Self>> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .context("Failed to build session HTTP client")?;
        let login_url = format!("{base_url}/login");

        let page = http
            .get(&login_url)
            .send()
            .await
            .with_context(|| format!("Failed to load {login_url}"))?;
        if !page.status().is_success() {
            debug!("Login page answered HTTP {}", page.status());
            return Ok(None);
        }
        let html = page.text().await.context("Failed to read login page")?;

        let Some(token) = extract_authenticity_token(&html) else {
            debug!("Login page carries no authenticity_token");
            return Ok(None);
        };

        let response = http
            .post(&login_url)
            .form(&[
                ("username", username),
                ("password", password),
                ("authenticity_token", token.as_str()),
            ])
            .send()
            .await
            .with_context(|| format!("Failed to post credentials to {login_url}"))?;

        // A rejected login re-renders the form at /login with HTTP 200
        let landed_on_login = response.url().path().trim_end_matches('/').ends_with("/login");
        if response.status().is_success() && !landed_on_login {
            Ok(Some(Self {
                http,
            }))
        } else {
            debug!("Login rejected (HTTP {}, url {})", response.status(), response.url());
            Ok(None)
        }
    }

    /// GET a JSON document with the session cookie.
    ///
    /// Non-success statuses yield `Ok(None)`.
    pub(crate) async fn get_json(&self, url: &str) -> Result<Option<Value>> {
        let response =
            self.http.get(url).send().await.with_context(|| format!("Failed to fetch {url}"))?;
        if !response.status().is_success() {
            debug!("{url} answered HTTP {}", response.status());
            return Ok(None);
        }
        let value = response.json().await.with_context(|| format!("Invalid JSON from {url}"))?;
        Ok(Some(value))
    }
}

/// Value of the `authenticity_token` hidden input of an HTML form.
pub(crate) fn extract_authenticity_token(html: &str) -> Option<String> {
    let input = Regex::new(r"(?is)<input\b[^>]*>").ok()?;
    let name = Regex::new(r#"(?i)\bname\s*=\s*["']authenticity_token["']"#).ok()?;
    let value = Regex::new(r#"(?i)\bvalue\s*=\s*["']([^"']*)["']"#).ok()?;

    input
        .find_iter(html)
        .map(|tag| tag.as_str())
        .filter(|tag| name.is_match(tag))
        .find_map(|tag| value.captures(tag).map(|c| c[1].to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_token_any_attribute_order() {
        let html = r#"
            <form action="/login" method="post">
              <input type="hidden" name="authenticity_token" value="abc+123==" />
              <input type="text" name="username" value="" />
            </form>"#;
        assert_eq!(extract_authenticity_token(html).as_deref(), Some("abc+123=="));

        let html = r#"<input value="tok" type="hidden" name="authenticity_token">"#;
        assert_eq!(extract_authenticity_token(html).as_deref(), Some("tok"));
    }

    #[test]
    fn test_extract_token_missing() {
        let html = r#"<meta name="csrf-token" content="nope" /><input name="username" value="x">"#;
        assert!(extract_authenticity_token(html).is_none());
    }
}
