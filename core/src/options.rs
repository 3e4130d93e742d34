//! Per-request and transport-level options.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::{form_urlencoded, Url};

use crate::http::{HttpMethod, HttpRequest};

/// Request body variants.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Json(Value),
    Text(String),
    Form(Vec<(String, String)>),
}

/// Options for a single call: extra headers, query pairs and a body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    pub body: Option<Body>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn json(mut self, value: Value) -> Self {
        self.body = Some(Body::Json(value));
        self
    }

    pub fn text(mut self, body: impl Into<String>) -> Self {
        self.body = Some(Body::Text(body.into()));
        self
    }

    pub fn form<K, V>(mut self, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let pairs = pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        self.body = Some(Body::Form(pairs));
        self
    }

    /// Assemble the request sent to the transport.
    ///
    /// Header precedence, lowest first: client default headers, the
    /// body's content type, then headers set on these options.
    pub(crate) fn into_request(
        self,
        method: HttpMethod,
        mut url: Url,
        client: &ClientOptions,
    ) -> HttpRequest {
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&self.query);
        }

        let mut headers = client.default_headers();
        let body = self.body.map(|body| {
            let (content_type, encoded) = match body {
                Body::Json(value) => ("application/json", value.to_string()),
                Body::Text(text) => ("text/plain; charset=utf-8", text),
                Body::Form(pairs) => (
                    "application/x-www-form-urlencoded",
                    form_urlencoded::Serializer::new(String::new())
                        .extend_pairs(&pairs)
                        .finish(),
                ),
            };
            set_header(&mut headers, "content-type", content_type);
            encoded
        });
        for (name, value) in self.headers {
            set_header(&mut headers, &name, &value);
        }

        HttpRequest {
            method,
            url: url.into(),
            headers,
            body,
        }
    }
}

fn set_header(headers: &mut Vec<(String, String)>, name: &str, value: &str) {
    headers.retain(|(key, _)| !key.eq_ignore_ascii_case(name));
    headers.push((name.to_string(), value.to_string()));
}

/// Transport-level options applied when a transport is constructed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientOptions {
    /// Whole-request timeout. `None` leaves the transport default.
    pub timeout_secs: Option<u64>,
    /// Headers sent with every request.
    pub headers: Vec<(String, String)>,
    pub user_agent: Option<String>,
    /// Whether HTTP error statuses raise. Always cleared by `merged`.
    pub http_errors: bool,
}

impl ClientOptions {
    /// Copy of these options with HTTP error statuses routed through the
    /// normal response path.
    pub fn merged(&self) -> Self {
        if self.http_errors {
            tracing::debug!("http_errors option overridden; error statuses are normalized instead");
        }
        Self {
            http_errors: false,
            ..self.clone()
        }
    }

    fn default_headers(&self) -> Vec<(String, String)> {
        let mut headers = Vec::with_capacity(self.headers.len() + 1);
        if let Some(agent) = &self.user_agent {
            headers.push(("user-agent".to_string(), agent.clone()));
        }
        for (name, value) in &self.headers {
            set_header(&mut headers, name, value);
        }
        headers
    }
}
