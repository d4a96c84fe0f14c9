//! HTTP boundary
//!
//! Every request of the login flow and the API reads goes through the
//! [`HttpTransport`] trait. The production transport wraps a cookie-keeping
//! reqwest client; tests script responses without a network.
//!
//! # Design principles
//! - **Status codes are data, not errors** - the transport only fails when no
//!   response was received; callers classify statuses themselves
//! - **Redirects are never followed** - the login flow reads the `Location`
//!   header of the credential submission
//! - **One request, one attempt** - there is no retry layer

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::LOCATION;
use reqwest::redirect::Policy;
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{ClientError, Result};
use crate::utils::log_sanitizer::truncate_for_log;

/// Default connect timeout (seconds)
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
/// Default request timeout (seconds)
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// HTTP method used by the portal endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

/// Request description handed to a [`HttpTransport`].
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    /// Full URL, query string included.
    pub url: Url,
    pub headers: Vec<(String, String)>,
    /// `application/x-www-form-urlencoded` body.
    pub form: Option<Vec<(String, String)>>,
    /// Response body carries secrets and is never logged.
    pub redact_response: bool,
}

impl HttpRequest {
    pub fn get(url: Url) -> Self {
        Self {
            method: HttpMethod::Get,
            url,
            headers: Vec::new(),
            form: None,
            redact_response: false,
        }
    }

    pub fn post_form<K, V>(url: Url, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            method: HttpMethod::Post,
            url,
            headers: Vec::new(),
            form: Some(
                fields
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
            redact_response: false,
        }
    }

    /// Append a query parameter to the URL.
    #[must_use]
    pub fn query(mut self, key: &str, value: &str) -> Self {
        self.url.query_pairs_mut().append_pair(key, value);
        self
    }

    /// Keep the response body out of the logs.
    #[must_use]
    pub fn redact_response(mut self) -> Self {
        self.redact_response = true;
        self
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Value of a header set on this request (case-insensitive).
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Value of a form field set on this request.
    pub fn form_value(&self, name: &str) -> Option<&str> {
        self.form
            .as_ref()?
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Value of a query parameter of the URL.
    pub fn query_value(&self, name: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
    }

    /// URL without query string, for logs and errors.
    pub fn display_url(&self) -> String {
        let mut url = self.url.clone();
        url.set_query(None);
        url.set_fragment(None);
        url.to_string()
    }
}

/// Response as seen by the login flow and the API readers.
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    pub status: u16,
    /// `Location` header, if any.
    pub location: Option<String>,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            location: None,
            body: body.into(),
        }
    }

    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends one request and returns whatever the server answered.
///
/// Implementations keep per-session state (cookies) between calls.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Fails only when no response was received
    /// ([`ClientError::NetworkError`] / [`ClientError::Timeout`]).
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// reqwest-backed transport with its own cookie jar.
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Create a transport with a fresh cookie store, timeouts and redirects disabled.
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .cookie_store(true)
            .redirect(Policy::none())
            .connect_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| ClientError::NetworkError {
                detail: format!("Failed to create HTTP client: {e}"),
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(request.url.clone()),
            HttpMethod::Post => self.client.post(request.url.clone()),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(form) = &request.form {
            builder = builder.form(form);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ClientError::Timeout {
                    detail: e.to_string(),
                }
            } else {
                ClientError::NetworkError {
                    detail: e.to_string(),
                }
            }
        })?;

        let status = response.status().as_u16();
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response
            .text()
            .await
            .map_err(|e| ClientError::NetworkError {
                detail: format!("Failed to read response body: {e}"),
            })?;

        Ok(HttpResponse {
            status,
            location,
            body,
        })
    }
}

/// HTTP tool function set
pub struct HttpUtils;

impl HttpUtils {
    /// Send a request through a transport with uniform logging.
    ///
    /// # Arguments
    /// * `transport` - session transport
    /// * `request` - request to send
    /// * `component` - component name (for logging)
    pub async fn execute(
        transport: &dyn HttpTransport,
        request: HttpRequest,
        component: &str,
    ) -> Result<HttpResponse> {
        let method = request.method.as_str();
        let url = request.display_url();
        let redact = request.redact_response;
        log::debug!("[{component}] {method} {url}");

        let response = transport.send(request).await.map_err(|e| {
            log::debug!("[{component}] {method} {url} failed: {e}");
            e
        })?;

        log::debug!("[{component}] Response Status: {}", response.status);
        if redact {
            log::debug!(
                "[{component}] Response Body: <redacted, {} bytes>",
                response.body.len()
            );
        } else {
            log::debug!(
                "[{component}] Response Body: {}",
                truncate_for_log(&response.body)
            );
        }

        Ok(response)
    }

    /// Parse JSON response
    ///
    /// # Returns
    /// * `Ok(T)` - successfully parsed
    /// * `Err(ClientError::ParseError)` - parsing failed
    pub fn parse_json<T>(response_text: &str, component: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        serde_json::from_str(response_text).map_err(|e| {
            log::error!("[{component}] JSON parse failed: {e}");
            log::error!(
                "[{component}] Raw response: {}",
                truncate_for_log(response_text)
            );
            ClientError::ParseError {
                detail: e.to_string(),
            }
        })
    }

    /// Parse a JSON response holding secrets.
    ///
    /// Same as [`parse_json`](Self::parse_json) but the raw body is never
    /// logged. serde_json error messages carry only a position.
    pub fn parse_json_redacted<T>(response_text: &str, component: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        serde_json::from_str(response_text).map_err(|e| {
            log::error!(
                "[{component}] JSON parse failed: {e} (body of {} bytes withheld)",
                response_text.len()
            );
            ClientError::ParseError {
                detail: e.to_string(),
            }
        })
    }

    /// Parse an endpoint URL built from configuration values.
    pub fn parse_url(raw: &str) -> Result<Url> {
        Url::parse(raw).map_err(|e| ClientError::ParseError {
            detail: format!("invalid URL '{raw}': {e}"),
        })
    }

    /// Require a 2xx status, otherwise [`ClientError::UnexpectedStatus`].
    pub fn ensure_success(
        response: HttpResponse,
        url: &str,
        component: &str,
    ) -> Result<HttpResponse> {
        if response.is_success() {
            return Ok(response);
        }
        log::error!("[{component}] HTTP {} from {url}", response.status);
        Err(ClientError::UnexpectedStatus {
            url: url.to_string(),
            status: response.status,
        })
    }
}
