//! Mock relay backend for testing
//!
//! [`MockBackend`] answers transport requests in-process, speaking the same
//! wire format as the real relay and scrape endpoint. It records every request
//! so tests can assert on what was sent and how often.
//!
//! # Example
//!
//! ```ignore
//! use locrelay::mt::{HttpBackend, HttpRequest, MockBackend, MockMode};
//!
//! #[tokio::test]
//! async fn test_relay() {
//!     let mock = MockBackend::new(MockMode::Suffix);
//!     let body = mock
//!         .execute(HttpRequest::post_form("https://relay", vec![("list", "en:fr,de=hello")]))
//!         .await
//!         .unwrap();
//!     assert_eq!(body, "hello_fr<i2>hello_de");
//! }
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::backend::{HttpBackend, HttpRequest};
use super::codec::{QUERY_DELIMITER, RESULT_DELIMITER};
use super::error::{MtError, MtResult};
use super::transport::TransportKind;

/// How the mock answers
#[derive(Debug, Clone)]
pub enum MockMode {
    /// Append the target code: "hello" → "hello_fr"
    /// Sentinels pass through untouched
    Suffix,

    /// (text, target) → translation, falling back to `Suffix`
    Mappings(HashMap<(String, String), String>),

    /// Reverse word order, as a word-order-changing language would
    Reorder,

    /// Return this body verbatim (error pages, throttling messages)
    Raw(String),

    /// Fail every call with this error
    Error(MtError),
}

/// In-process stand-in for the relay and scrape endpoints
#[derive(Debug, Clone)]
pub struct MockBackend {
    mode: MockMode,
    overrides: HashMap<TransportKind, MockMode>,
    delay: Duration,
    requests: Arc<Mutex<Vec<HttpRequest>>>,
}

impl MockBackend {
    /// Create a mock answering every transport with `mode`
    pub fn new(mode: MockMode) -> Self {
        Self {
            mode,
            overrides: HashMap::new(),
            delay: Duration::ZERO,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Answer requests of one transport differently
    ///
    /// # Example
    ///
    /// ```ignore
    /// let mock = MockBackend::new(MockMode::Suffix)
    ///     .with_transport(TransportKind::Post, MockMode::Error(MtError::NetworkError("down".into())));
    /// ```
    pub fn with_transport(mut self, kind: TransportKind, mode: MockMode) -> Self {
        self.overrides.insert(kind, mode);
        self
    }

    /// Simulated network delay applied to every request
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Requests received so far, in arrival order
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    pub fn call_count(&self) -> usize {
        self.requests().len()
    }

    /// Number of requests received for one transport
    pub fn calls_for(&self, kind: TransportKind) -> usize {
        self.requests()
            .iter()
            .filter(|request| request_kind(request) == kind)
            .count()
    }

    fn record(&self, request: &HttpRequest) {
        let mut requests = self
            .requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        requests.push(request.clone());
    }

    fn mode_for(&self, kind: TransportKind) -> &MockMode {
        self.overrides.get(&kind).unwrap_or(&self.mode)
    }
}

/// Which transport a request belongs to
fn request_kind(request: &HttpRequest) -> TransportKind {
    match request {
        HttpRequest::PostForm { .. } => TransportKind::Post,
        HttpRequest::Get { .. } if request.param("list").is_some() => TransportKind::Get,
        HttpRequest::Get { .. } => TransportKind::Scrape,
    }
}

fn translate_text(mode: &MockMode, text: &str, target: &str) -> String {
    match mode {
        MockMode::Mappings(map) => map
            .get(&(text.to_string(), target.to_string()))
            .cloned()
            .unwrap_or_else(|| format!("{}_{}", text, target)),
        MockMode::Reorder => text.split_whitespace().rev().collect::<Vec<_>>().join(" "),
        _ => format!("{}_{}", text, target),
    }
}

/// Answer a relay `list` the way the relay does
fn relay_response(mode: &MockMode, list: &str) -> MtResult<String> {
    let segments: MtResult<Vec<String>> = list
        .split(QUERY_DELIMITER)
        .map(|entry| {
            let (_, rest) = entry
                .split_once(':')
                .ok_or_else(|| MtError::Other(format!("Entry without source: {}", entry)))?;
            let (targets, text) = rest
                .split_once('=')
                .ok_or_else(|| MtError::Other(format!("Entry without text: {}", entry)))?;
            Ok(targets
                .split(',')
                .map(|target| translate_text(mode, text, target))
                .collect::<Vec<_>>()
                .join(RESULT_DELIMITER))
        })
        .collect();

    Ok(segments?.join(QUERY_DELIMITER))
}

fn scrape_response(mode: &MockMode, text: &str, target: &str) -> String {
    let translated = translate_text(mode, text, target)
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;");
    format!(
        "<html><body><div class=\"result-container\">{}</div></body></html>",
        translated
    )
}

#[async_trait]
impl HttpBackend for MockBackend {
    async fn execute(&self, request: HttpRequest) -> MtResult<String> {
        self.record(&request);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let kind = request_kind(&request);
        let mode = self.mode_for(kind);
        match mode {
            MockMode::Raw(body) => return Ok(body.clone()),
            MockMode::Error(err) => return Err(err.clone()),
            _ => {}
        }

        match kind {
            TransportKind::Scrape => {
                let text = request.param("q").unwrap_or_default();
                let target = request.param("tl").unwrap_or_default();
                Ok(scrape_response(mode, text, target))
            }
            TransportKind::Post | TransportKind::Get => {
                let list = request
                    .param("list")
                    .ok_or_else(|| MtError::Other("Relay request without list".to_string()))?;
                relay_response(mode, list)
            }
        }
    }

    fn backend_name(&self) -> &str {
        "Mock Backend"
    }
}
