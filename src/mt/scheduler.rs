//! Cooperative, tick-driven registry of running translation jobs
//!
//! The host calls [`Scheduler::tick`] periodically (a frame loop, a timer, the
//! CLI's interval). Each tick polls every job once; jobs that finished have
//! already fired their callbacks and are dropped from the registry. Nothing in
//! here blocks except [`Scheduler::force`], which spins on a single job for
//! hosts without a tick source.

use super::job::{JobState, TranslationJob};

/// Identifier handed out by [`Scheduler::add`]
pub type JobId = u64;

#[derive(Debug, Default)]
pub struct Scheduler {
    jobs: Vec<(JobId, TranslationJob)>,
    next_id: JobId,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a job; it is first polled on the next tick
    pub fn add(&mut self, job: TranslationJob) -> JobId {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        self.jobs.push((id, job));
        id
    }

    /// Poll every job once and drop the finished ones.
    ///
    /// Returns the number of jobs that finished during this tick.
    pub fn tick(&mut self) -> usize {
        let before = self.jobs.len();
        self.jobs
            .retain_mut(|(_, job)| job.poll() == JobState::Running);
        before - self.jobs.len()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Whether any job is still waiting for the service
    pub fn is_translating(&self) -> bool {
        !self.jobs.is_empty()
    }

    /// Cancel one job; its callback never fires
    pub fn cancel(&mut self, id: JobId) -> bool {
        let Some(position) = self.jobs.iter().position(|(job_id, _)| *job_id == id) else {
            return false;
        };
        let (_, mut job) = self.jobs.remove(position);
        job.cancel();
        true
    }

    /// Cancel every job and empty the registry; no callback fires
    pub fn cancel_all(&mut self) {
        if !self.jobs.is_empty() {
            tracing::info!(jobs = self.jobs.len(), "cancelling translation jobs");
        }
        for (_, job) in self.jobs.iter_mut() {
            job.cancel();
        }
        self.jobs.clear();
    }

    /// Drive `job` to completion on the calling thread.
    ///
    /// The job's network calls still run on its runtime, so that runtime must
    /// have worker threads other than the caller's.
    pub fn force(mut job: TranslationJob) -> JobState {
        loop {
            let state = job.poll();
            if state != JobState::Running {
                return state;
            }
            std::thread::yield_now();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mt::classifier::PatternClassifier;
    use crate::mt::config::RelayConfig;
    use crate::mt::error::MtError;
    use crate::mt::job::CompletionCallback;
    use crate::mt::languages::LanguageCatalog;
    use crate::mt::mock::{MockBackend, MockMode};
    use crate::mt::query::QueryStore;
    use crate::mt::transport::{TransportContext, TransportKind};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn job(mock: &MockBackend, text: &str, calls: &Arc<AtomicUsize>) -> TranslationJob {
        let context = TransportContext {
            backend: Arc::new(mock.clone()),
            runtime: tokio::runtime::Handle::current(),
            config: Arc::new(RelayConfig::new("https://relay")),
            catalog: Arc::new(LanguageCatalog::new()),
            classifier: Arc::new(PatternClassifier::default()),
        };
        let mut store = QueryStore::new();
        store.add(text, "en", "fr");

        let calls = Arc::clone(calls);
        let callback: CompletionCallback = Box::new(move |_, _| {
            calls.fetch_add(1, Ordering::SeqCst);
        });
        TranslationJob::new(store, vec![TransportKind::Post, TransportKind::Get], context, callback)
    }

    #[tokio::test]
    async fn test_tick_until_idle() {
        let mock = MockBackend::new(MockMode::Suffix);
        let calls = Arc::new(AtomicUsize::new(0));
        let mut scheduler = Scheduler::new();

        let first = scheduler.add(job(&mock, "Yes", &calls));
        let second = scheduler.add(job(&mock, "No", &calls));
        assert_ne!(first, second);
        assert!(scheduler.is_translating());

        let mut finished = 0;
        while scheduler.is_translating() {
            finished += scheduler.tick();
            tokio::time::sleep(Duration::from_millis(1)).await;
        }

        assert_eq!(finished, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(scheduler.is_empty());
    }

    #[tokio::test]
    async fn test_cancel_all_fires_no_callbacks() {
        let mock = MockBackend::new(MockMode::Suffix).with_delay(Duration::from_secs(5));
        let calls = Arc::new(AtomicUsize::new(0));
        let mut scheduler = Scheduler::new();
        scheduler.add(job(&mock, "Yes", &calls));
        scheduler.add(job(&mock, "No", &calls));

        assert_eq!(scheduler.tick(), 0);
        scheduler.cancel_all();

        assert!(!scheduler.is_translating());
        assert_eq!(scheduler.tick(), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cancel_single_job() {
        let mock = MockBackend::new(MockMode::Suffix).with_delay(Duration::from_secs(5));
        let calls = Arc::new(AtomicUsize::new(0));
        let mut scheduler = Scheduler::new();
        let id = scheduler.add(job(&mock, "Yes", &calls));
        scheduler.add(job(&mock, "No", &calls));

        assert!(scheduler.cancel(id));
        assert!(!scheduler.cancel(id));
        assert_eq!(scheduler.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_force_spins_to_completion() {
        let mock = MockBackend::new(MockMode::Suffix)
            .with_transport(
                TransportKind::Post,
                MockMode::Error(MtError::NetworkError("down".to_string())),
            )
            .with_delay(Duration::from_millis(5));
        let calls = Arc::new(AtomicUsize::new(0));

        let state = Scheduler::force(job(&mock, "Yes", &calls));
        assert_eq!(state, JobState::Succeeded);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(mock.call_count(), 2);
    }
}
