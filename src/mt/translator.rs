//! Caller-facing translation API
//!
//! [`Translator`] ties the pipeline together: it expands and tokenizes texts
//! into a [`QueryStore`], hands stores to jobs registered with its
//! [`Scheduler`], and rebuilds structured results when a job calls back.
//! Nothing here blocks except [`Translator::force_translate`]; the host drives
//! progress by calling [`Translator::tick`].
//!
//! # Example
//!
//! ```ignore
//! use locrelay::mt::{RelayConfig, Translator};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut translator = Translator::from_config(RelayConfig::from_env()?)?;
//!
//!     translator.translate("Hello {[name]}", "en", "fr", |result| {
//!         println!("{:?}", result); // Ok("Bonjour {[name]}")
//!     });
//!
//!     while translator.is_translating() {
//!         translator.tick();
//!         tokio::time::sleep(std::time::Duration::from_millis(50)).await;
//!     }
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use tokio::runtime::{Handle, Runtime};

use super::backend::{HttpBackend, ReqwestBackend};
use super::classifier::{PatternClassifier, ResponseClassifier};
use super::config::RelayConfig;
use super::error::{MtError, MtResult};
use super::job::TranslationJob;
use super::languages::{AUTO_DETECT, LanguageCatalog};
use super::query::{self, QueryStore};
use super::rebuild;
use super::scheduler::{JobId, Scheduler};
use super::transport::TransportContext;

/// Validate that a locale code is in acceptable format
///
/// Accepts ASCII letters, digits, hyphens and underscores.
///
/// # Example
///
/// ```ignore
/// validate_locale("en")?; // OK
/// validate_locale("zh-CN")?; // OK
/// validate_locale("invalid@code").unwrap_err(); // Error
/// ```
pub fn validate_locale(locale: &str) -> MtResult<()> {
    if locale.is_empty() {
        return Err(MtError::InvalidLocale("Locale code is empty".to_string()));
    }

    if !locale
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(MtError::InvalidLocale(format!(
            "Invalid characters in locale code: {}",
            locale
        )));
    }

    Ok(())
}

fn source_or_auto(source_language: &str) -> &str {
    if source_language.is_empty() {
        AUTO_DETECT
    } else {
        source_language
    }
}

/// Entry point of the translation pipeline
pub struct Translator {
    context: TransportContext,
    scheduler: Scheduler,
    // Keeps the runtime behind `context.runtime` alive when we created it
    _runtime: Option<Runtime>,
}

impl std::fmt::Debug for Translator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Translator")
            .field("context", &self.context)
            .field("jobs", &self.scheduler.len())
            .finish()
    }
}

impl Translator {
    /// Create a translator running network calls on `runtime`
    pub fn with_handle(config: RelayConfig, backend: Arc<dyn HttpBackend>, runtime: Handle) -> Self {
        Self {
            context: TransportContext {
                backend,
                runtime,
                config: Arc::new(config),
                catalog: Arc::new(LanguageCatalog::new()),
                classifier: Arc::new(PatternClassifier::default()),
            },
            scheduler: Scheduler::new(),
            _runtime: None,
        }
    }

    /// Create a translator on the tokio runtime of the calling context
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when called outside a tokio runtime
    pub fn new(config: RelayConfig, backend: Arc<dyn HttpBackend>) -> MtResult<Self> {
        let runtime = Handle::try_current().map_err(|e| {
            MtError::ConfigError(format!("No tokio runtime available: {}", e))
        })?;
        Ok(Self::with_handle(config, backend, runtime))
    }

    /// Create a translator with a private multi-threaded runtime.
    ///
    /// Meant for synchronous hosts. The translator must be dropped outside of
    /// any async context.
    pub fn with_own_runtime(config: RelayConfig, backend: Arc<dyn HttpBackend>) -> MtResult<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("locrelay-transport")
            .enable_all()
            .build()
            .map_err(|e| MtError::Other(format!("Failed to start runtime: {}", e)))?;

        let mut translator = Self::with_handle(config, backend, runtime.handle().clone());
        translator._runtime = Some(runtime);
        Ok(translator)
    }

    /// Create a translator talking to the configured relay over HTTP
    pub fn from_config(config: RelayConfig) -> MtResult<Self> {
        let backend = ReqwestBackend::new(config.timeout())?;
        Self::new(config, Arc::new(backend))
    }

    pub fn with_catalog(mut self, catalog: LanguageCatalog) -> Self {
        self.context.catalog = Arc::new(catalog);
        self
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn ResponseClassifier>) -> Self {
        self.context.classifier = classifier;
        self
    }

    pub fn config(&self) -> &RelayConfig {
        &self.context.config
    }

    pub fn catalog(&self) -> &LanguageCatalog {
        &self.context.catalog
    }

    /// Check that the relay is configured well enough to attempt a transport
    pub fn can_translate(&self) -> MtResult<()> {
        self.context.config.validate()
    }

    /// Result available without contacting the service, if any.
    ///
    /// Same source and target yields the text itself; a target the service
    /// cannot translate yields an empty string.
    pub fn immediate_result(&self, text: &str, source_language: &str, target_language: &str) -> Option<String> {
        if source_language.eq_ignore_ascii_case(target_language) {
            return Some(text.to_string());
        }
        if self.context.catalog.service_code(target_language).is_none() {
            tracing::debug!(target = target_language, "target language is not supported by the service");
            return Some(String::new());
        }
        None
    }

    /// Expand `text` and add its queries for `target_language` to `store`
    pub fn create_queries(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
        store: &mut QueryStore,
    ) -> usize {
        query::create_queries(
            text,
            source_or_auto(source_language),
            target_language,
            &self.context.catalog,
            store,
        )
    }

    /// Rebuild the translation of `text` from a completed store
    pub fn rebuild(&self, text: &str, store: &QueryStore, target_language: &str) -> String {
        rebuild::rebuild_translation(text, store, target_language, &self.context.catalog)
    }

    /// Translate a single text; `on_complete` fires once, from a later tick
    /// unless the result is known immediately.
    pub fn translate<F>(&mut self, text: &str, source_language: &str, target_language: &str, on_complete: F)
    where
        F: FnOnce(MtResult<String>) + Send + 'static,
    {
        if let Err(err) = validate_locale(target_language) {
            on_complete(Err(err));
            return;
        }
        if let Some(result) = self.immediate_result(text, source_language, target_language) {
            on_complete(Ok(result));
            return;
        }
        if let Err(err) = self.can_translate() {
            on_complete(Err(err));
            return;
        }

        let mut store = QueryStore::new();
        self.create_queries(text, source_language, target_language, &mut store);
        if store.is_empty() {
            on_complete(Ok(self.rebuild(text, &store, target_language)));
            return;
        }

        let catalog = Arc::clone(&self.context.catalog);
        let text = text.to_string();
        let target = target_language.to_string();
        self.translate_batch(store, move |store, error| match error {
            Some(err) => on_complete(Err(err)),
            None => on_complete(Ok(rebuild::rebuild_translation(&text, &store, &target, &catalog))),
        });
    }

    /// Send a prepared store through the fallback chain.
    ///
    /// `on_complete` receives the store back together with the terminal error,
    /// if any. Configuration errors are reported right away and start no job.
    pub fn translate_batch<F>(&mut self, store: QueryStore, on_complete: F) -> Option<JobId>
    where
        F: FnOnce(QueryStore, Option<MtError>) + Send + 'static,
    {
        if let Err(err) = self.can_translate() {
            tracing::error!(error = %err, "relay is not configured");
            on_complete(store, Some(err));
            return None;
        }

        tracing::info!(queries = store.len(), "queueing translation job");
        let job = TranslationJob::new(
            store,
            self.context.config.strategies(),
            self.context.clone(),
            Box::new(on_complete),
        );
        Some(self.scheduler.add(job))
    }

    /// Send a prepared store and wait for the outcome on the calling thread.
    ///
    /// Must not be called from a thread that drives a current-thread runtime:
    /// the spawned calls would never run.
    pub fn force_translate(&self, store: QueryStore) -> MtResult<QueryStore> {
        self.can_translate()?;

        let (sender, receiver) = std::sync::mpsc::channel();
        let job = TranslationJob::new(
            store,
            self.context.config.strategies(),
            self.context.clone(),
            Box::new(move |store, error| {
                let _ = sender.send((store, error));
            }),
        );

        let state = Scheduler::force(job);
        match receiver.try_recv() {
            Ok((store, None)) => Ok(store),
            Ok((_, Some(err))) => Err(err),
            Err(_) => Err(MtError::Other(format!(
                "Translation job ended in state {:?} without a result",
                state
            ))),
        }
    }

    /// Advance every running job; returns how many finished
    pub fn tick(&mut self) -> usize {
        self.scheduler.tick()
    }

    pub fn is_translating(&self) -> bool {
        self.scheduler.is_translating()
    }

    pub fn cancel(&mut self, id: JobId) -> bool {
        self.scheduler.cancel(id)
    }

    /// Cancel every running job; their callbacks never fire
    pub fn cancel_all(&mut self) {
        self.scheduler.cancel_all();
    }
}
