//! Translation jobs: one flush of a query store through the fallback chain
//!
//! A job owns its store until it finishes. It starts with the first strategy,
//! moves to the next one whenever the current attempt fails with a transient
//! error, and hands the store back through its completion callback exactly
//! once: with no error on success, with the last transport error after every
//! strategy failed, or right away with a non-transient error such as an
//! unusable URL.

use std::fmt;

use super::error::MtError;
use super::query::QueryStore;
use super::transport::{AttemptStatus, TransportAttempt, TransportContext, TransportKind};

/// Called once with the store and the terminal error, if any
pub type CompletionCallback = Box<dyn FnOnce(QueryStore, Option<MtError>) + Send>;

/// Lifecycle of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Running,
    Succeeded,
    Failed,
}

pub struct TranslationJob {
    store: Option<QueryStore>,
    strategies: Vec<TransportKind>,
    next_strategy: usize,
    attempt: Option<TransportAttempt>,
    context: TransportContext,
    callback: Option<CompletionCallback>,
    state: JobState,
    last_error: Option<MtError>,
}

impl fmt::Debug for TranslationJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranslationJob")
            .field("state", &self.state)
            .field("strategies", &self.strategies)
            .field("next_strategy", &self.next_strategy)
            .field("last_error", &self.last_error)
            .finish()
    }
}

impl TranslationJob {
    pub fn new(
        store: QueryStore,
        strategies: Vec<TransportKind>,
        context: TransportContext,
        callback: CompletionCallback,
    ) -> Self {
        Self {
            store: Some(store),
            strategies,
            next_strategy: 0,
            attempt: None,
            context,
            callback: Some(callback),
            state: JobState::Running,
            last_error: None,
        }
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == JobState::Running
    }

    /// Strategy currently being tried
    pub fn current_transport(&self) -> Option<TransportKind> {
        self.attempt.as_ref().map(TransportAttempt::kind)
    }

    pub fn last_error(&self) -> Option<&MtError> {
        self.last_error.as_ref()
    }

    /// Advance the job without blocking.
    ///
    /// Moves to the next strategy as soon as an attempt fails, and fires the
    /// callback when the job reaches a terminal state.
    pub fn poll(&mut self) -> JobState {
        if self.state != JobState::Running {
            return self.state;
        }
        let Some(store) = self.store.as_mut() else {
            self.state = JobState::Failed;
            return self.state;
        };

        loop {
            if self.attempt.is_none() {
                let Some(&kind) = self.strategies.get(self.next_strategy) else {
                    let error = self.last_error.clone().unwrap_or_else(|| {
                        MtError::ConfigError("No transport strategy configured".to_string())
                    });
                    tracing::error!(error = %error, "all transports failed");
                    self.finish(JobState::Failed, Some(error));
                    return self.state;
                };
                self.next_strategy += 1;
                tracing::info!(transport = %kind, queries = store.pending().len(), "starting transport");
                self.attempt = Some(TransportAttempt::new(kind, store, self.context.clone()));
            }

            let Some(attempt) = self.attempt.as_mut() else {
                continue;
            };
            match attempt.poll(store) {
                AttemptStatus::Running => return JobState::Running,
                AttemptStatus::Succeeded => {
                    tracing::info!(
                        transport = %attempt.kind(),
                        queries = store.len(),
                        "translation job succeeded"
                    );
                    self.attempt = None;
                    self.finish(JobState::Succeeded, None);
                    return self.state;
                }
                AttemptStatus::Failed(error) => {
                    let kind = attempt.kind();
                    self.attempt = None;
                    if !error.is_transient() {
                        tracing::error!(transport = %kind, error = %error, "transport failed permanently");
                        self.finish(JobState::Failed, Some(error));
                        return self.state;
                    }
                    tracing::warn!(transport = %kind, error = %error, "transport failed, falling back");
                    self.last_error = Some(error);
                }
            }
        }
    }

    fn finish(&mut self, state: JobState, error: Option<MtError>) {
        self.state = state;
        self.last_error = error.clone().or(self.last_error.take());
        if let (Some(callback), Some(store)) = (self.callback.take(), self.store.take()) {
            callback(store, error);
        }
    }

    /// Abort the running attempt and drop the store without calling back
    pub fn cancel(&mut self) {
        if let Some(mut attempt) = self.attempt.take() {
            attempt.dispose();
        }
        self.callback = None;
        self.store = None;
        if self.state == JobState::Running {
            self.state = JobState::Failed;
            self.last_error = Some(MtError::Cancelled);
        }
    }
}
