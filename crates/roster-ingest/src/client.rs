//! Source API client.
//!
//! The source exposes one named query per entity. A query is a POST to
//! `<base>/<query>?page=N&pagesize=M` answering `{"record": [...]}`; the
//! `record` key is absent once the pages are exhausted. Requests carry a
//! bearer token obtained through the OAuth2 client-credentials grant.

use std::time::Duration;

use reqwest::Url;
use reqwest::blocking::{Client, Response};
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use roster_model::LoadError;
use serde_json::Value;

const USER_AGENT_VALUE: &str = concat!("roster-sync/", env!("CARGO_PKG_VERSION"));

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// One page of a source query.
pub trait SourceApi {
    /// Fetch page `page` (1-based) of `query`.
    ///
    /// Returns `None` when the response carries no `record` key.
    fn fetch_page(
        &self,
        query: &str,
        page: u32,
        page_size: u32,
    ) -> Result<Option<Vec<Value>>, LoadError>;
}

/// Connection settings for the source API.
#[derive(Debug, Clone)]
pub struct SourceCredentials {
    pub base_url: String,
    pub oauth_url: String,
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Clone)]
pub struct PowerSchoolClient {
    client: Client,
    base_url: String,
    token: String,
}

impl PowerSchoolClient {
    /// Build a client and obtain its access token.
    pub fn connect(credentials: &SourceCredentials) -> Result<Self, LoadError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| LoadError::Transport {
                url: credentials.base_url.clone(),
                message: format!("failed to create HTTP client: {e}"),
            })?;

        let token = request_token(&client, credentials)?;
        Ok(Self {
            client,
            base_url: credentials.base_url.trim_end_matches('/').to_string(),
            token,
        })
    }
}

fn request_token(client: &Client, credentials: &SourceCredentials) -> Result<String, LoadError> {
    let mut url = parse_url(&format!(
        "{}/oauth/access_token",
        credentials.oauth_url.trim_end_matches('/')
    ))?;
    url.query_pairs_mut()
        .append_pair("grant_type", "client_credentials");

    tracing::debug!(url = %url, "requesting source access token");

    let response = client
        .post(url.clone())
        .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .send()
        .map_err(|e| transport(&url, e))?;
    let body = handle_response(&url, response)?;

    body.get("access_token")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(LoadError::MissingToken)
}

impl SourceApi for PowerSchoolClient {
    fn fetch_page(
        &self,
        query: &str,
        page: u32,
        page_size: u32,
    ) -> Result<Option<Vec<Value>>, LoadError> {
        let mut url = parse_url(&format!("{}/{query}", self.base_url))?;
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("pagesize", &page_size.to_string());

        tracing::debug!(url = %url, "fetching source page");

        let response = self
            .client
            .post(url.clone())
            .bearer_auth(&self.token)
            .json(&serde_json::json!({}))
            .send()
            .map_err(|e| transport(&url, e))?;
        let body = handle_response(&url, response)?;

        match body.get("record") {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Array(records)) => Ok(Some(records.clone())),
            Some(_) => Err(LoadError::Malformed {
                entity: query.to_string(),
                message: "`record` is not an array".to_string(),
            }),
        }
    }
}

fn parse_url(raw: &str) -> Result<Url, LoadError> {
    Url::parse(raw).map_err(|e| LoadError::Transport {
        url: raw.to_string(),
        message: format!("invalid URL: {e}"),
    })
}

fn transport(url: &Url, error: reqwest::Error) -> LoadError {
    LoadError::Transport {
        url: url.to_string(),
        message: error.to_string(),
    }
}

/// Check the status, then parse the body as JSON.
fn handle_response(url: &Url, response: Response) -> Result<Value, LoadError> {
    let status = response.status();
    let text = response.text().map_err(|e| transport(url, e))?;

    if !status.is_success() {
        return Err(LoadError::Status {
            url: url.to_string(),
            status: status.as_u16(),
            body: text,
        });
    }

    serde_json::from_str(&text).map_err(|e| LoadError::Malformed {
        entity: url.path().trim_start_matches('/').to_string(),
        message: e.to_string(),
    })
}
