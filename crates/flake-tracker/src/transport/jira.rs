//! Jira REST v2 transport
//!
//! Endpoints used:
//! - `GET  /rest/api/2/serverInfo` to verify a connection
//! - `GET  /rest/api/2/search` with a JQL query
//! - `POST /rest/api/2/issue/{key}/comment`
//! - `POST /rest/api/2/issue`

use crate::error::TransportError;
use crate::transport::{Connector, TrackerConnection};
use crate::types::{Issue, IssueFields, SearchCriteria};
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;
use std::time::Duration;

/// Page size for searches; only the oldest match is used
const SEARCH_PAGE_SIZE: u32 = 50;

/// Credentials sent with every request
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JiraAuth {
    /// HTTP basic auth
    Basic {
        /// Account name
        user: String,
        /// Account password or API token
        password: String,
    },
    /// Personal access token
    Bearer {
        /// Token value
        token: String,
    },
}

impl JiraAuth {
    /// Basic auth credentials
    pub fn basic(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic {
            user: user.into(),
            password: password.into(),
        }
    }

    /// Bearer token credentials
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Bearer {
            token: token.into(),
        }
    }

    fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        match self {
            Self::Basic { user, password } => request.basic_auth(user, Some(password)),
            Self::Bearer { token } => request.bearer_auth(token),
        }
    }
}

impl fmt::Debug for JiraAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Basic { user, .. } => f
                .debug_struct("Basic")
                .field("user", user)
                .field("password", &"***")
                .finish(),
            Self::Bearer { .. } => f.debug_struct("Bearer").field("token", &"***").finish(),
        }
    }
}

/// Opens Jira connections
#[derive(Debug, Clone)]
pub struct JiraConnector {
    server: String,
    auth: JiraAuth,
    timeout: Duration,
}

impl JiraConnector {
    /// Create connector for `server` (base URL, trailing slash optional)
    pub fn new(server: impl Into<String>, auth: JiraAuth) -> Self {
        Self {
            server: server.into().trim_end_matches('/').to_string(),
            auth,
            timeout: Duration::from_secs(30),
        }
    }

    /// With request timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Base URL without trailing slash
    #[must_use]
    pub fn server(&self) -> &str {
        &self.server
    }
}

impl Connector for JiraConnector {
    type Connection = JiraConnection;

    fn connect(&self) -> Result<JiraConnection, TransportError> {
        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| TransportError::Network(format!("failed to build HTTP client: {e}")))?;

        let connection = JiraConnection {
            client,
            server: self.server.clone(),
            auth: self.auth.clone(),
        };
        let info: ServerInfo = JiraConnection::receive(connection.get("serverInfo"))?;
        tracing::debug!(server = %self.server, version = ?info.version, "connected to jira");

        Ok(connection)
    }
}

/// Verified Jira connection
#[derive(Debug)]
pub struct JiraConnection {
    client: Client,
    server: String,
    auth: JiraAuth,
}

impl JiraConnection {
    fn url(&self, endpoint: &str) -> String {
        format!("{}/rest/api/2/{endpoint}", self.server)
    }

    fn get(&self, endpoint: &str) -> RequestBuilder {
        self.auth.apply(self.client.get(self.url(endpoint)))
    }

    fn post(&self, endpoint: &str) -> RequestBuilder {
        self.auth.apply(self.client.post(self.url(endpoint)))
    }

    fn send(request: RequestBuilder) -> Result<Response, TransportError> {
        let response = request
            .send()
            .map_err(|e| TransportError::Network(e.to_string()))?;
        match TransportError::from_status(response.status().as_u16()) {
            None => Ok(response),
            Some(err) => Err(err),
        }
    }

    fn receive<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, TransportError> {
        Self::send(request)?
            .json()
            .map_err(|e| TransportError::Malformed(e.to_string()))
    }
}

impl TrackerConnection for JiraConnection {
    fn search(&self, criteria: &SearchCriteria) -> Result<Vec<Issue>, TransportError> {
        let jql = criteria.to_jql();
        let page_size = SEARCH_PAGE_SIZE.to_string();
        let page: SearchPage = Self::receive(self.get("search").query(&[
            ("jql", jql.as_str()),
            ("startAt", "0"),
            ("maxResults", page_size.as_str()),
            ("fields", "status"),
        ]))?;

        Ok(page.issues.into_iter().map(Issue::from).collect())
    }

    fn add_comment(&self, issue_key: &str, body: &str) -> Result<(), TransportError> {
        let endpoint = format!("issue/{issue_key}/comment");
        Self::send(self.post(&endpoint).json(&json!({ "body": body })))?;
        Ok(())
    }

    fn create_issue(&self, fields: &IssueFields) -> Result<Issue, TransportError> {
        let created: CreatedIssue = Self::receive(self.post("issue").json(&issue_payload(fields)))?;
        Ok(Issue::new(created.key))
    }
}

/// Request body for `POST /rest/api/2/issue`
///
/// Extra fields are added only where they do not clash with the core ones.
#[must_use]
pub fn issue_payload(fields: &IssueFields) -> Value {
    let mut body = Map::new();
    body.insert("project".into(), json!({ "key": fields.project }));
    body.insert("summary".into(), json!(fields.summary));
    body.insert("description".into(), json!(fields.description));
    body.insert("issuetype".into(), json!({ "id": fields.issue_type }));
    body.insert(
        "components".into(),
        Value::Array(
            fields
                .components
                .iter()
                .map(|name| json!({ "name": name }))
                .collect(),
        ),
    );
    body.insert("labels".into(), json!(fields.labels));

    for (name, value) in &fields.extra {
        body.entry(name.clone()).or_insert_with(|| value.clone());
    }

    json!({ "fields": body })
}

#[derive(Debug, Deserialize)]
struct ServerInfo {
    #[serde(default)]
    version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchPage {
    issues: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    key: String,
    #[serde(default)]
    fields: Option<HitFields>,
}

#[derive(Debug, Deserialize)]
struct HitFields {
    #[serde(default)]
    status: Option<NamedValue>,
}

#[derive(Debug, Deserialize)]
struct NamedValue {
    name: String,
}

#[derive(Debug, Deserialize)]
struct CreatedIssue {
    key: String,
}

impl From<SearchHit> for Issue {
    fn from(hit: SearchHit) -> Self {
        Self {
            key: hit.key,
            status: hit.fields.and_then(|f| f.status).map(|s| s.name),
        }
    }
}
