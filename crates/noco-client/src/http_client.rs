//! HTTP plumbing.
//!
//! Everything above this module talks to the service through [`Transport`],
//! which takes an [`ApiRequest`] and returns the decoded JSON body. The
//! production implementation is [`HttpTransport`]; tests swap in a recorder.

use std::{fmt, time::Duration};

use noco_batch::BatchKind;
use noco_config::{config::default_user_agent, Config};
use serde_json::Value;
use tracing::{debug, trace};
use ureq::{
    http::{HeaderMap, HeaderName, HeaderValue},
    Agent, Body, Proxy, RequestBuilder,
};
use url::Url;

use crate::error::{ClientError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Patch,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => f.write_str("GET"),
            Method::Post => f.write_str("POST"),
            Method::Patch => f.write_str("PATCH"),
            Method::Delete => f.write_str("DELETE"),
        }
    }
}

impl From<BatchKind> for Method {
    fn from(kind: BatchKind) -> Self {
        match kind {
            BatchKind::Insert => Method::Post,
            BatchKind::Update => Method::Patch,
            BatchKind::Delete => Method::Delete,
        }
    }
}

/// One call against the service. `path` is relative to the base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Post, path).with_body(body)
    }

    pub fn patch(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Patch, path).with_body(body)
    }

    pub fn delete(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Delete, path).with_body(body)
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Value of the first query parameter named `key`.
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

pub trait Transport {
    /// Sends `request` and returns the decoded response body.
    ///
    /// An empty success body decodes to [`Value::Null`].
    fn request(&self, request: ApiRequest) -> Result<Value>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn request(&self, request: ApiRequest) -> Result<Value> {
        (**self).request(request)
    }
}

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub user_agent: Option<String>,
    pub headers: Option<HeaderMap>,
    pub proxy: Option<Proxy>,
    pub timeout: Option<Duration>,
    pub max_redirects: Option<u32>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: Some(default_user_agent()),
            headers: None,
            proxy: None,
            timeout: None,
            max_redirects: None,
        }
    }
}

impl ClientConfig {
    /// Takes the HTTP settings of a resolved [`Config`].
    pub fn from_config(config: &Config) -> Result<Self> {
        let headers = config
            .headers
            .as_ref()
            .map(|headers| {
                headers
                    .iter()
                    .map(|(name, value)| parse_header(name, value))
                    .collect::<Result<HeaderMap>>()
            })
            .transpose()?;

        Ok(Self {
            user_agent: config.user_agent.clone(),
            headers,
            proxy: None,
            timeout: config.timeout_duration()?,
            max_redirects: config.max_redirects,
        })
    }

    /// Builds an `Agent` that hands every status code back to the caller.
    pub fn build(&self) -> Agent {
        let mut config = Agent::config_builder()
            .http_status_as_error(false)
            .proxy(self.proxy.clone())
            .timeout_global(self.timeout);

        if let Some(user_agent) = &self.user_agent {
            config = config.user_agent(user_agent);
        }
        if let Some(max_redirects) = self.max_redirects {
            config = config.max_redirects(max_redirects);
        }

        config.build().into()
    }
}

fn parse_header(name: &str, value: &str) -> Result<(HeaderName, HeaderValue)> {
    let header_name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|_| ClientError::InvalidHeader(name.to_string()))?;
    let header_value =
        HeaderValue::from_str(value).map_err(|_| ClientError::InvalidHeader(name.to_string()))?;
    Ok((header_name, header_value))
}

/// [`Transport`] over a `ureq` agent.
pub struct HttpTransport {
    agent: Agent,
    base_url: String,
    headers: Option<HeaderMap>,
}

impl HttpTransport {
    pub fn new(base_url: &str, config: &ClientConfig) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();
        Url::parse(&base_url).map_err(|source| {
            ClientError::InvalidUrl {
                url: base_url.clone(),
                source,
            }
        })?;

        Ok(Self {
            agent: config.build(),
            base_url,
            headers: config.headers.clone(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.base_url, &ClientConfig::from_config(config)?)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn prepare<B>(&self, mut req: RequestBuilder<B>, request: &ApiRequest) -> RequestBuilder<B> {
        for (key, value) in &request.query {
            req = req.query(key, value);
        }
        apply_headers(req, &self.headers)
    }
}

impl Transport for HttpTransport {
    fn request(&self, request: ApiRequest) -> Result<Value> {
        let url = self.endpoint(&request.path);
        debug!(method = %request.method, path = %request.path, "sending request");

        let response = match request.method {
            Method::Get => self.prepare(self.agent.get(&url), &request).call(),
            Method::Post => send(self.prepare(self.agent.post(&url), &request), &request),
            Method::Patch => send(self.prepare(self.agent.patch(&url), &request), &request),
            Method::Delete => {
                let req = self.agent.delete(&url).force_send_body();
                send(self.prepare(req, &request), &request)
            }
        }?;

        read_response(response, &url)
    }
}

fn send(
    req: RequestBuilder<ureq::typestate::WithBody>,
    request: &ApiRequest,
) -> std::result::Result<ureq::http::Response<Body>, ureq::Error> {
    match &request.body {
        Some(body) => req.send_json(body),
        None => req.send_empty(),
    }
}

fn apply_headers<B>(mut req: RequestBuilder<B>, headers: &Option<HeaderMap>) -> RequestBuilder<B> {
    if let Some(headers) = headers {
        for (key, value) in headers.iter() {
            req = req.header(key, value);
        }
    }
    req
}

fn read_response(mut response: ureq::http::Response<Body>, url: &str) -> Result<Value> {
    let status = response.status().as_u16();
    let text = response.body_mut().read_to_string()?;
    trace!(status, body = %text, "received response");

    if status >= 400 {
        return Err(error_from_body(status, url, &text));
    }
    decode_body(&text)
}

/// Decodes a success body. An empty body is `null`.
pub(crate) fn decode_body(text: &str) -> Result<Value> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(text).map_err(|e| ClientError::InvalidResponse(e.to_string()))
}

/// Maps an error response to a [`ClientError`].
///
/// The service reports failures as `{"error": "<CODE>", "message": "..."}`;
/// `RECORD_NOT_FOUND` gets its own variant. A body with only a `message`
/// keeps the status as its code. Anything else is a bare HTTP error.
pub fn error_from_body(status: u16, url: &str, body: &str) -> ClientError {
    let Ok(Value::Object(info)) = serde_json::from_str::<Value>(body) else {
        return ClientError::Http {
            status,
            url: url.to_string(),
        };
    };

    let message = info.get("message").and_then(Value::as_str);
    match (info.get("error").and_then(Value::as_str), message) {
        (Some("RECORD_NOT_FOUND"), Some(message)) => {
            ClientError::RecordNotFound {
                message: message.to_string(),
            }
        }
        (Some(code), Some(message)) => {
            ClientError::Api {
                code: code.to_string(),
                message: message.to_string(),
            }
        }
        (None, Some(message)) => {
            ClientError::Api {
                code: format!("HTTP_{status}"),
                message: message.to_string(),
            }
        }
        _ => {
            ClientError::Http {
                status,
                url: url.to_string(),
            }
        }
    }
}
