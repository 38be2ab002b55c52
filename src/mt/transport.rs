//! Transports of the fallback chain
//!
//! A [`TransportAttempt`] sends every unresolved query of a store through one
//! strategy:
//!
//! - **Scrape**: one GET per query and target to the public translation page
//! - **Post**: a single form POST to the relay carrying the whole batch
//! - **Get**: the batch split into GET requests whose `list` stays under the
//!   configured payload limit
//!
//! Network calls run as tasks on a tokio runtime. Their outcome comes back
//! through a oneshot channel that is polled without blocking, so the attempt
//! can be advanced from a plain tick loop.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::oneshot::{self, error::TryRecvError};
use tokio::task::JoinHandle;

use super::backend::{HttpBackend, HttpRequest};
use super::classifier::ResponseClassifier;
use super::codec;
use super::config::RelayConfig;
use super::error::{MtError, MtResult};
use super::languages::LanguageCatalog;
use super::query::QueryStore;

/// A delivery strategy of the fallback chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportKind {
    Scrape,
    Post,
    Get,
}

impl TransportKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TransportKind::Scrape => "scrape",
            TransportKind::Post => "post",
            TransportKind::Get => "get",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a transport needs besides the store
#[derive(Clone)]
pub struct TransportContext {
    pub backend: Arc<dyn HttpBackend>,
    pub runtime: Handle,
    pub config: Arc<RelayConfig>,
    pub catalog: Arc<LanguageCatalog>,
    pub classifier: Arc<dyn ResponseClassifier>,
}

impl fmt::Debug for TransportContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportContext")
            .field("backend", &self.backend.backend_name())
            .field("config", &self.config)
            .finish()
    }
}

/// One outstanding network call
///
/// Dropping the call aborts the task if it is still running.
pub struct TransportCall {
    receiver: oneshot::Receiver<MtResult<String>>,
    handle: JoinHandle<()>,
    outcome: Option<MtResult<String>>,
}

impl TransportCall {
    /// Start `request` on the context's runtime
    pub fn spawn(context: &TransportContext, request: HttpRequest) -> Self {
        let (sender, receiver) = oneshot::channel();
        let backend = Arc::clone(&context.backend);
        let handle = context.runtime.spawn(async move {
            let result = backend.execute(request).await;
            // The receiver is gone when the call was disposed
            let _ = sender.send(result);
        });

        Self {
            receiver,
            handle,
            outcome: None,
        }
    }

    /// Check for completion without blocking
    pub fn is_done(&mut self) -> bool {
        if self.outcome.is_some() {
            return true;
        }
        match self.receiver.try_recv() {
            Ok(result) => {
                self.outcome = Some(result);
                true
            }
            Err(TryRecvError::Empty) => false,
            Err(TryRecvError::Closed) => {
                self.outcome = Some(Err(MtError::NetworkError(
                    "Transport task ended without a response".to_string(),
                )));
                true
            }
        }
    }

    pub fn error(&self) -> Option<&MtError> {
        self.outcome.as_ref().and_then(|outcome| outcome.as_ref().err())
    }

    /// Raw response body once the call succeeded
    pub fn response(&self) -> Option<&str> {
        self.outcome
            .as_ref()
            .and_then(|outcome| outcome.as_ref().ok())
            .map(String::as_str)
    }

    fn take_outcome(&mut self) -> Option<MtResult<String>> {
        self.outcome.take()
    }

    /// Abort the underlying task
    pub fn dispose(&mut self) {
        self.handle.abort();
    }
}

impl Drop for TransportCall {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// A request together with what to do with its answer
#[derive(Debug, Clone)]
enum Work {
    /// Relay request answering `keys` in order
    Relay {
        request: HttpRequest,
        keys: Vec<String>,
        expected: Vec<usize>,
    },
    /// Scrape of one target (`slot` of `slots`) of one query
    Scrape {
        request: HttpRequest,
        key: String,
        slot: usize,
        slots: usize,
    },
}

impl Work {
    fn request(&self) -> &HttpRequest {
        match self {
            Work::Relay { request, .. } | Work::Scrape { request, .. } => request,
        }
    }
}

/// Progress of an attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptStatus {
    Running,
    Succeeded,
    Failed(MtError),
}

/// One strategy sending the unresolved queries of a store
///
/// Requests are issued one at a time. Results are written to the store as
/// soon as a request is answered, so work done before a failure is kept for
/// the next strategy.
pub struct TransportAttempt {
    kind: TransportKind,
    context: TransportContext,
    work: VecDeque<Work>,
    current: Option<(Work, TransportCall)>,
    scraped: Vec<String>,
    error: Option<MtError>,
    requests_sent: usize,
}

impl TransportAttempt {
    /// Plan the requests of `kind` for every pending query of `store`
    pub fn new(kind: TransportKind, store: &QueryStore, context: TransportContext) -> Self {
        let work = match kind {
            TransportKind::Scrape => plan_scrape(store, &context),
            TransportKind::Post => plan_post(store, &context),
            TransportKind::Get => plan_get(store, &context),
        };
        tracing::debug!(transport = %kind, requests = work.len(), "planned transport attempt");

        Self {
            kind,
            context,
            work: work.into(),
            current: None,
            scraped: Vec::new(),
            error: None,
            requests_sent: 0,
        }
    }

    pub fn kind(&self) -> TransportKind {
        self.kind
    }

    pub fn requests_sent(&self) -> usize {
        self.requests_sent
    }

    /// Advance without blocking, applying finished responses to `store`
    pub fn poll(&mut self, store: &mut QueryStore) -> AttemptStatus {
        if let Some(err) = &self.error {
            return AttemptStatus::Failed(err.clone());
        }

        loop {
            if self.current.is_none() {
                let Some(next) = self.work.pop_front() else {
                    return AttemptStatus::Succeeded;
                };
                let call = TransportCall::spawn(&self.context, next.request().clone());
                self.requests_sent += 1;
                self.current = Some((next, call));
                return AttemptStatus::Running;
            }

            let done = self
                .current
                .as_mut()
                .is_some_and(|(_, call)| call.is_done());
            if !done {
                return AttemptStatus::Running;
            }

            let Some((work, mut call)) = self.current.take() else {
                return AttemptStatus::Running;
            };
            let outcome = call.take_outcome().unwrap_or_else(|| {
                Err(MtError::NetworkError("Transport call has no outcome".to_string()))
            });

            if let Err(err) = self.apply(work, outcome, store) {
                self.dispose();
                self.error = Some(err.clone());
                return AttemptStatus::Failed(err);
            }
        }
    }

    fn apply(&mut self, work: Work, outcome: MtResult<String>, store: &mut QueryStore) -> MtResult<()> {
        let raw = outcome?;
        match work {
            Work::Relay { keys, expected, .. } => {
                let results =
                    codec::parse_response(&raw, &expected, self.context.classifier.as_ref())?;
                for (key, results) in keys.iter().zip(results) {
                    store.set_results(key, results);
                }
            }
            Work::Scrape {
                key, slot, slots, ..
            } => {
                let translation = codec::extract_scraped_translation(&raw)?;
                if slot == 0 {
                    self.scraped.clear();
                }
                self.scraped.push(translation);
                if slot + 1 == slots {
                    store.set_results(&key, std::mem::take(&mut self.scraped));
                }
            }
        }
        Ok(())
    }

    /// Abort the outstanding call and drop the remaining plan
    pub fn dispose(&mut self) {
        if let Some((_, mut call)) = self.current.take() {
            call.dispose();
        }
        self.work.clear();
        self.scraped.clear();
    }
}

impl Drop for TransportAttempt {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn relay_params<'a>(config: &'a RelayConfig, list: &'a str) -> Vec<(&'a str, &'a str)> {
    let mut params = vec![("action", "Translate"), ("list", list)];
    if let Some(password) = config.password.as_deref().filter(|p| !p.is_empty()) {
        params.push(("password", password));
    }
    params
}

fn plan_scrape(store: &QueryStore, context: &TransportContext) -> Vec<Work> {
    let mut work = Vec::new();
    for key in store.pending() {
        let Some(query) = store.get(&key) else {
            continue;
        };
        let text = codec::outbound_text(query);
        let source = codec::service_language(&query.source_language, &context.catalog);
        let slots = query.target_languages.len();
        for (slot, target) in query.target_languages.iter().enumerate() {
            let target = codec::service_language(target, &context.catalog);
            let request = HttpRequest::get(
                &context.config.scrape_url,
                vec![("sl", source.as_str()), ("tl", target.as_str()), ("q", text.as_str())],
            );
            work.push(Work::Scrape {
                request,
                key: key.clone(),
                slot,
                slots,
            });
        }
    }
    work
}

/// Pending keys with their encoded entries and target counts
fn encode_pending(store: &QueryStore, catalog: &LanguageCatalog) -> (Vec<String>, Vec<String>, Vec<usize>) {
    let mut keys = Vec::new();
    let mut entries = Vec::new();
    let mut expected = Vec::new();
    for key in store.pending() {
        if let Some(query) = store.get(&key) {
            entries.push(codec::encode_entry(query, catalog));
            expected.push(query.target_languages.len());
            keys.push(key);
        }
    }
    (keys, entries, expected)
}

fn plan_post(store: &QueryStore, context: &TransportContext) -> Vec<Work> {
    let (keys, entries, expected) = encode_pending(store, &context.catalog);
    if keys.is_empty() {
        return Vec::new();
    }

    let list = codec::encode_batch(&entries);
    let request = HttpRequest::post_form(
        &context.config.relay_url,
        relay_params(&context.config, &list),
    );
    vec![Work::Relay {
        request,
        keys,
        expected,
    }]
}

fn plan_get(store: &QueryStore, context: &TransportContext) -> Vec<Work> {
    let (keys, entries, expected) = encode_pending(store, &context.catalog);

    codec::get_batches(&entries, context.config.max_get_payload)
        .into_iter()
        .map(|range| {
            let list = codec::encode_batch(&entries[range.clone()]);
            tracing::debug!(
                queries = range.len(),
                payload = codec::encoded_len(&list),
                "GET batch"
            );
            let request = HttpRequest::get(
                &context.config.relay_url,
                relay_params(&context.config, &list),
            );
            Work::Relay {
                request,
                keys: keys[range.clone()].to_vec(),
                expected: expected[range].to_vec(),
            }
        })
        .collect()
}
