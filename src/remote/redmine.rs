//! Redmine REST client.
//!
//! Implements [`RecordSource`], [`RecordFetcher`] and [`ProjectTreeSource`] over
//! Redmine's JSON API:
//!
//! | Operation | Request |
//! |-----------|---------|
//! | time-entry page | `GET /time_entries.json?offset&limit&from&to` |
//! | full record | `GET /{projects,users,issues,time_entries}/{id}.json` |
//! | current user | `GET /users/current.json` |
//! | project lookup | `GET /projects/{id-or-identifier}.json` |
//! | child projects | `GET /projects/{id}/children` (session only) |
//!
//! Requests authenticate with the `X-Redmine-API-Key` header when a key is configured
//! and with HTTP basic authentication otherwise. Response parsing is kept in free
//! functions so it can be tested without a server.

use super::session::Session;
use super::{Page, ProjectTreeSource, RecordFetcher, RecordSource, RemoteRecord, RemoteRef};
use crate::config::{GlobalConfig, ReportPeriod};
use crate::core::{ReportError, ResourceKind};
use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, info, warn};

const API_KEY_HEADER: &str = "X-Redmine-API-Key";

/// Authentication material for the Redmine server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    /// REST API key; takes precedence over username/password.
    pub key: Option<String>,
    /// Login name.
    pub username: Option<String>,
    /// Password.
    pub password: Option<String>,
}

impl Credentials {
    /// Credentials configured in `config`, ignoring empty strings.
    #[must_use]
    pub fn from_config(config: &GlobalConfig) -> Self {
        let non_empty = |value: &Option<String>| value.clone().filter(|v| !v.is_empty());
        Self {
            key: non_empty(&config.key),
            username: non_empty(&config.username),
            password: non_empty(&config.password),
        }
    }
}

/// Client for one Redmine server.
#[derive(Debug)]
pub struct RedmineClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Credentials,
    session: Option<Session>,
}

impl RedmineClient {
    /// Create a client for the server at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is empty or the HTTP client cannot be built.
    pub fn new(base_url: &str, credentials: Credentials) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ReportError::ConfigError {
                message: "No Redmine URL configured; set `url` or pass --url".to_string(),
            }
            .into());
        }

        let http = reqwest::Client::builder()
            .user_agent(concat!("worktable/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url,
            credentials,
            session: None,
        })
    }

    /// Base URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Try to open a logged-in session for the child-project endpoint.
    ///
    /// Only attempted when no API key is configured and a username is known. Returns
    /// whether a session is now available. Failures are logged, never raised.
    pub async fn open_session(&mut self) -> bool {
        if self.has_session() {
            return true;
        }
        if self.credentials.key.is_some() {
            warn!("Using an API key; project scoping is unavailable without a login session");
            return false;
        }
        let Some(username) = self.credentials.username.as_deref() else {
            warn!("No username configured; project scoping is unavailable");
            return false;
        };
        let password = self.credentials.password.as_deref().unwrap_or_default();

        match Session::login(&self.base_url, username, password).await {
            Ok(Some(session)) => {
                info!("Logged in to {} as {username}", self.base_url);
                self.session = Some(session);
                true
            }
            Ok(None) => {
                warn!("Login failed; project scoping is unavailable");
                false
            }
            Err(e) => {
                warn!("Login failed: {e:#}; project scoping is unavailable");
                false
            }
        }
    }

    /// Whether [`open_session`](Self::open_session) succeeded.
    #[must_use]
    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    /// The account the credentials belong to.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failures or an unexpected status.
    pub async fn current_user(&self) -> Result<Option<RemoteRecord>> {
        let value = self.get_json("/users/current.json", &[], "fetch current user").await?;
        Ok(value.as_ref().and_then(|v| unwrap_envelope(ResourceKind::User, v)))
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match (&self.credentials.key, &self.credentials.username) {
            (Some(key), _) => request.header(API_KEY_HEADER, key),
            (None, Some(username)) => {
                request.basic_auth(username, self.credentials.password.as_deref())
            }
            (None, None) => request,
        }
    }

    /// GET `path` as JSON. `404` yields `Ok(None)`; other failures are errors.
    async fn get_json(
        &self,
        path: &str,
        query: &[(&str, String)],
        operation: &str,
    ) -> Result<Option<Value>> {
        let url = format!("{}{path}", self.base_url);
        debug!("GET {url} {query:?}");

        let response =
            self.authorize(self.http.get(&url).query(query)).send().await.map_err(|e| {
                ReportError::NetworkError {
                    operation: operation.to_string(),
                    reason: e.to_string(),
                }
            })?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = check_response(response, operation)?;

        let value = response.json::<Value>().await.map_err(|e| ReportError::NetworkError {
            operation: operation.to_string(),
            reason: format!("invalid JSON response: {e}"),
        })?;
        Ok(Some(value))
    }
}

impl RecordSource for RedmineClient {
    async fn fetch_page(
        &self,
        offset: usize,
        limit: usize,
        period: &ReportPeriod,
    ) -> Result<Page> {
        let query = [
            ("offset", offset.to_string()),
            ("limit", limit.to_string()),
            ("from", period.from_date().to_string()),
            ("to", period.to_date().to_string()),
        ];
        let operation = "fetch time entries";
        let value = self.get_json("/time_entries.json", &query, operation).await?.ok_or_else(
            || ReportError::RemoteStatus {
                operation: operation.to_string(),
                status: StatusCode::NOT_FOUND.as_u16(),
            },
        )?;
        parse_page(&value)
    }
}

impl RecordFetcher for RedmineClient {
    async fn fetch_full(&self, kind: ResourceKind, id: u64) -> Result<Option<RemoteRecord>> {
        let path = format!("/{}/{id}.json", kind.collection());
        let operation = format!("fetch {kind} {id}");
        let value = match self.get_json(&path, &[], &operation).await {
            Ok(value) => value,
            // Records hidden from the current account resolve to nothing
            Err(e) if is_forbidden(&e) => {
                debug!("{operation} is forbidden for the current account");
                None
            }
            Err(e) => return Err(e),
        };
        Ok(value.as_ref().and_then(|v| unwrap_envelope(kind, v)))
    }
}

impl ProjectTreeSource for RedmineClient {
    async fn find_project(&self, identifier: &str) -> Result<Option<RemoteRef>> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Ok(None);
        }
        let path = format!("/projects/{identifier}.json");
        let value = self.get_json(&path, &[], "look up project").await?;
        Ok(value
            .as_ref()
            .and_then(|v| unwrap_envelope(ResourceKind::Project, v))
            .map(|record| record.to_ref()))
    }

    async fn children(&self, project_id: u64) -> Result<Vec<RemoteRef>> {
        let Some(session) = &self.session else {
            warn!("No login session; project {project_id} is treated as having no children");
            return Ok(Vec::new());
        };
        let url = format!("{}/projects/{project_id}/children", self.base_url);
        Ok(session.get_json(&url).await?.as_ref().map(parse_children).unwrap_or_default())
    }
}

/// Turn non-success statuses into [`ReportError::RemoteStatus`].
fn check_response(
    response: reqwest::Response,
    operation: &str,
) -> Result<reqwest::Response, ReportError> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(ReportError::RemoteStatus {
            operation: operation.to_string(),
            status: response.status().as_u16(),
        })
    }
}

fn is_forbidden(error: &anyhow::Error) -> bool {
    matches!(
        error.downcast_ref::<ReportError>(),
        Some(ReportError::RemoteStatus { status: 403, .. })
    )
}

/// Parse a `{time_entries: [...], total_count}` response.
pub(crate) fn parse_page(value: &Value) -> Result<Page> {
    let entries = value.get("time_entries").and_then(Value::as_array).ok_or_else(|| {
        ReportError::NetworkError {
            operation: "fetch time entries".to_string(),
            reason: "response has no `time_entries` array".to_string(),
        }
    })?;

    let records: Vec<RemoteRecord> = entries.iter().filter_map(RemoteRecord::from_value).collect();
    if records.len() != entries.len() {
        warn!("Skipped {} time entries without an id", entries.len() - records.len());
    }

    let total_count = value
        .get("total_count")
        .and_then(Value::as_u64)
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(records.len());

    Ok(Page {
        records,
        total_count,
    })
}

/// Extract the record wrapped in a single-item response (`{"issue": {...}}`).
pub(crate) fn unwrap_envelope(kind: ResourceKind, value: &Value) -> Option<RemoteRecord> {
    value.get(kind.envelope()).and_then(RemoteRecord::from_value)
}

/// Parse a `{children: [{id, name}]}` response; entries without an id are dropped.
pub(crate) fn parse_children(value: &Value) -> Vec<RemoteRef> {
    let items = value.get("children").or(Some(value)).and_then(Value::as_array);
    items
        .map(|items| {
            items
                .iter()
                .filter_map(|item| serde_json::from_value::<RemoteRef>(item.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_page() {
        let value = json!({
            "time_entries": [
                {"id": 1, "hours": 2.5, "project": {"id": 10, "name": "Alpha"}, "user": {"id": 3, "name": "Li Lei"}},
                {"id": 2, "hours": 1.0, "project": {"id": 10, "name": "Alpha"}, "user": {"id": 4, "name": "Han Mei"}}
            ],
            "total_count": 57,
            "offset": 0,
            "limit": 2
        });

        let page = parse_page(&value).unwrap();
        assert_eq!(page.records.len(), 2);
        assert_eq!(page.total_count, 57);
        assert_eq!(page.records[0].nested("user").unwrap().name(), Some("Li Lei"));
    }

    #[test]
    fn test_parse_page_rejects_unexpected_shape() {
        let err = parse_page(&json!({"issues": []})).unwrap_err();
        assert!(matches!(err.downcast_ref::<ReportError>(), Some(ReportError::NetworkError { .. })));
    }

    #[test]
    fn test_parse_page_missing_total_uses_length() {
        let page = parse_page(&json!({"time_entries": [{"id": 5}]})).unwrap();
        assert_eq!(page.total_count, 1);
    }

    #[test]
    fn test_unwrap_envelope() {
        let value = json!({"issue": {"id": 42, "subject": "Fix", "parent": {"id": 40}}});
        let record = unwrap_envelope(ResourceKind::Task, &value).unwrap();
        assert_eq!(record.id, 42);
        assert_eq!(record.nested("parent").unwrap().id, 40);

        assert!(unwrap_envelope(ResourceKind::Project, &value).is_none());
    }

    #[test]
    fn test_parse_children() {
        let value = json!({"children": [{"id": 2, "name": "Child"}, {"name": "broken"}]});
        let children = parse_children(&value);
        assert_eq!(
            children,
            vec![RemoteRef {
                id: 2,
                name: Some("Child".to_string())
            }]
        );

        assert!(parse_children(&json!({"children": null})).is_empty());
    }

    #[test]
    fn test_new_rejects_empty_url() {
        assert!(RedmineClient::new("  ", Credentials::default()).is_err());

        let client = RedmineClient::new("https://redmine.example.com/", Credentials::default())
            .unwrap();
        assert_eq!(client.base_url(), "https://redmine.example.com");
        assert!(!client.has_session());
    }

    #[test]
    fn test_credentials_ignore_empty_strings() {
        let config = GlobalConfig {
            key: Some(String::new()),
            username: Some("admin".to_string()),
            ..GlobalConfig::default()
        };
        let credentials = Credentials::from_config(&config);
        assert!(credentials.key.is_none());
        assert_eq!(credentials.username.as_deref(), Some("admin"));
    }

    #[tokio::test]
    async fn test_open_session_skipped_with_api_key() {
        let mut client = RedmineClient::new(
            "http://127.0.0.1:9",
            Credentials {
                key: Some("k".to_string()),
                ..Credentials::default()
            },
        )
        .unwrap();
        assert!(!client.open_session().await);
        assert!(!client.has_session());
    }
}
