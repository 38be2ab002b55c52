//! HTTP backend used by the transports
//!
//! Transports describe what they want to send as an [`HttpRequest`]; an
//! [`HttpBackend`] performs it and hands back the response body. The reqwest
//! implementation talks to the real relay, while
//! [`MockBackend`](super::mock::MockBackend) answers in-process.
//!
//! # Example
//!
//! ```ignore
//! use locrelay::mt::{HttpBackend, HttpRequest, ReqwestBackend};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = ReqwestBackend::new(std::time::Duration::from_secs(30))?;
//!     let body = backend
//!         .execute(HttpRequest::post_form(
//!             "https://script.google.com/macros/s/XXXX/exec",
//!             vec![("action", "Translate"), ("list", "en:fr=Hello")],
//!         ))
//!         .await?;
//!     println!("{}", body);
//!     Ok(())
//! }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use url::{Url, form_urlencoded};

use super::error::{MtError, MtResult};

/// A single request issued by a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpRequest {
    /// GET with URL query parameters
    Get {
        url: String,
        query: Vec<(String, String)>,
    },
    /// POST with an `application/x-www-form-urlencoded` body
    PostForm {
        url: String,
        form: Vec<(String, String)>,
    },
}

fn owned_pairs(pairs: Vec<(&str, &str)>) -> Vec<(String, String)> {
    pairs
        .into_iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

impl HttpRequest {
    pub fn get(url: &str, query: Vec<(&str, &str)>) -> Self {
        HttpRequest::Get {
            url: url.to_string(),
            query: owned_pairs(query),
        }
    }

    pub fn post_form(url: &str, form: Vec<(&str, &str)>) -> Self {
        HttpRequest::PostForm {
            url: url.to_string(),
            form: owned_pairs(form),
        }
    }

    pub fn url(&self) -> &str {
        match self {
            HttpRequest::Get { url, .. } | HttpRequest::PostForm { url, .. } => url,
        }
    }

    /// Value of a query or form parameter
    pub fn param(&self, name: &str) -> Option<&str> {
        let pairs = match self {
            HttpRequest::Get { query, .. } => query,
            HttpRequest::PostForm { form, .. } => form,
        };
        pairs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Performs transport requests
///
/// Implementations must be cheap to share: each in-flight call holds an
/// `Arc` to the backend on a runtime task.
#[async_trait]
pub trait HttpBackend: Send + Sync {
    /// Send the request and return the response body.
    ///
    /// Non-success statuses are reported as [`MtError::NetworkError`].
    async fn execute(&self, request: HttpRequest) -> MtResult<String>;

    /// Name used in log output
    fn backend_name(&self) -> &str;
}

/// Backend performing real HTTP calls through reqwest
#[derive(Clone, Debug)]
pub struct ReqwestBackend {
    client: reqwest::Client,
}

impl ReqwestBackend {
    /// Create a backend whose requests time out after `timeout`
    ///
    /// # Returns
    ///
    /// * `Ok(Self)` - New backend
    /// * `Err(MtError)` - If the timeout is zero or the HTTP client cannot be built
    pub fn new(timeout: Duration) -> MtResult<Self> {
        if timeout.is_zero() {
            return Err(MtError::ConfigError(
                "Request timeout must be greater than zero".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MtError::NetworkError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    fn parse_url(url: &str) -> MtResult<Url> {
        Url::parse(url).map_err(|e| MtError::ConfigError(format!("Invalid URL '{}': {}", url, e)))
    }
}

#[async_trait]
impl HttpBackend for ReqwestBackend {
    async fn execute(&self, request: HttpRequest) -> MtResult<String> {
        let response = match request {
            HttpRequest::Get { url, query } => {
                let mut url = Self::parse_url(&url)?;
                url.query_pairs_mut().extend_pairs(query);
                self.client.get(url).send().await?
            }
            HttpRequest::PostForm { url, form } => {
                let url = Self::parse_url(&url)?;
                let body = form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(form)
                    .finish();
                self.client
                    .post(url)
                    .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(body)
                    .send()
                    .await?
            }
        };

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(MtError::NetworkError(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        Ok(response.text().await?)
    }

    fn backend_name(&self) -> &str {
        "reqwest"
    }
}
