//! Bookmark sinks: where new entries are delivered.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::debug;

/// Instapaper's simple "add URL" endpoint.
pub const INSTAPAPER_ADD_URL: &str = "https://www.instapaper.com/api/add";

#[derive(Debug, Error)]
pub enum BookmarkError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {body}")]
    Api { status: u16, body: String },
}

/// A read-later service entries are delivered to.
#[async_trait]
pub trait BookmarkSink: Send + Sync {
    async fn add(&self, link: &str, title: &str) -> Result<(), BookmarkError>;

    /// Human-readable name of the service, used in logs.
    fn name(&self) -> &str;
}

/// Adds links to an Instapaper account.
pub struct InstapaperClient {
    client: Client,
    username: String,
    password: String,
    api_url: String,
}

impl InstapaperClient {
    pub fn new(username: String, password: String, timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_else(|_| Client::new()),
            username,
            password,
            api_url: INSTAPAPER_ADD_URL.to_string(),
        }
    }

    /// Point the client at a different endpoint.
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    fn form<'a>(&'a self, link: &'a str, title: &'a str) -> Vec<(&'static str, &'a str)> {
        let mut form = vec![
            ("username", self.username.as_str()),
            ("password", self.password.as_str()),
            ("url", link),
        ];
        if !title.is_empty() {
            form.push(("title", title));
        }
        form
    }
}

impl std::fmt::Debug for InstapaperClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstapaperClient")
            .field("username", &self.username)
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl BookmarkSink for InstapaperClient {
    async fn add(&self, link: &str, title: &str) -> Result<(), BookmarkError> {
        let response = self
            .client
            .post(&self.api_url)
            .form(&self.form(link, title))
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK && status != StatusCode::CREATED {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(BookmarkError::Api {
                status: status.as_u16(),
                body,
            });
        }

        debug!(link, %status, "bookmark added");
        Ok(())
    }

    fn name(&self) -> &str {
        "instapaper"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> InstapaperClient {
        InstapaperClient::new(
            "me@example.com".to_string(),
            "hunter2".to_string(),
            Duration::from_secs(5),
        )
    }

    #[test]
    fn form_includes_title_when_present() {
        let client = client();
        let form = client.form("http://example.com/1", "Article 1");
        assert_eq!(
            form,
            vec![
                ("username", "me@example.com"),
                ("password", "hunter2"),
                ("url", "http://example.com/1"),
                ("title", "Article 1"),
            ]
        );
    }

    #[test]
    fn form_omits_empty_title() {
        let client = client();
        let form = client.form("http://example.com/1", "");
        assert!(form.iter().all(|(key, _)| *key != "title"));
    }

    #[test]
    fn debug_hides_password() {
        let rendered = format!("{:?}", client());
        assert!(rendered.contains("me@example.com"));
        assert!(!rendered.contains("hunter2"));
    }
}
