//! End-to-End Tests for the Translation Relay Pipeline
//!
//! These tests run whole translations through [`Translator`] against the
//! in-process mock backend: expansion, deduplication, the transport fallback
//! chain, tick-driven completion and rebuilding.
//!
//! # Running Against a Live Relay
//!
//! ```bash
//! export LOCRELAY_URL=https://script.google.com/macros/s/XXXX/exec
//! cargo test --lib mt::integration_tests -- --ignored --nocapture
//! ```

#[cfg(test)]
mod tests {
    use super::super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    type Outcome = Arc<Mutex<Vec<MtResult<String>>>>;

    fn relay_only() -> RelayConfig {
        RelayConfig {
            enable_scrape: false,
            ..RelayConfig::new("https://relay")
        }
    }

    fn translator(mock: &MockBackend, config: RelayConfig) -> Translator {
        Translator::new(config, Arc::new(mock.clone())).unwrap()
    }

    /// Start a translation whose outcomes are collected in the returned list
    fn start(translator: &mut Translator, text: &str, source: &str, target: &str) -> Outcome {
        let outcome: Outcome = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&outcome);
        translator.translate(text, source, target, move |result| {
            sink.lock().unwrap().push(result);
        });
        outcome
    }

    async fn drive(translator: &mut Translator) {
        while translator.is_translating() {
            translator.tick();
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }

    fn single(outcome: &Outcome) -> MtResult<String> {
        let outcome = outcome.lock().unwrap();
        assert_eq!(outcome.len(), 1, "callback must fire exactly once");
        outcome[0].clone()
    }

    fn down() -> MockMode {
        MockMode::Error(MtError::NetworkError("connection refused".to_string()))
    }

    // ========== Single Text Tests ==========

    #[tokio::test]
    async fn test_tags_survive_translation() {
        let mock = MockBackend::new(MockMode::Suffix);
        let mut translator = translator(&mock, RelayConfig::new("https://relay"));

        let outcome = start(&mut translator, "Press [b]{[key]}[/b] to jump", "en", "fr");
        drive(&mut translator).await;

        assert_eq!(single(&outcome), Ok("Press [b]{[key]}[/b] to jump_fr".to_string()));
        // The service never saw the markup
        let sent = mock.requests()[0].param("q").unwrap_or_default().to_string();
        assert_eq!(sent, "Press + ++ +++  to jump");
    }

    #[tokio::test]
    async fn test_reordered_sentinels_keep_their_tags() {
        let mock = MockBackend::new(MockMode::Reorder);
        let mut translator = translator(&mock, relay_only());

        let outcome = start(&mut translator, "Hello [b]world[/b]", "en", "ja");
        drive(&mut translator).await;

        assert_eq!(single(&outcome), Ok("world[/b][b]Hello".to_string()));
    }

    #[tokio::test]
    async fn test_no_translate_region_is_not_sent() {
        let mock = MockBackend::new(MockMode::Suffix);
        let mut translator = translator(&mock, relay_only());

        let outcome = start(&mut translator, "Welcome to [i2nt]Castle Rock[/i2nt]", "en", "de");
        drive(&mut translator).await;

        assert_eq!(single(&outcome), Ok("Welcome to [i2nt]Castle Rock[/i2nt]_de".to_string()));
        let list = mock.requests()[0].param("list").unwrap_or_default().to_string();
        assert!(!list.contains("Castle"));
    }

    #[tokio::test]
    async fn test_title_case_is_sent_lowercase_and_repaired() {
        let mut map = HashMap::new();
        map.insert(
            ("new game".to_string(), "fr".to_string()),
            "nouvelle partie".to_string(),
        );
        let mock = MockBackend::new(MockMode::Mappings(map));
        let mut translator = translator(&mock, relay_only());

        let outcome = start(&mut translator, "New Game", "en", "fr");
        drive(&mut translator).await;

        assert_eq!(single(&outcome), Ok("Nouvelle Partie".to_string()));
        assert_eq!(mock.requests()[0].param("list"), Some("en:fr=new game"));
    }

    // ========== Plural and Specialization Tests ==========

    #[tokio::test]
    async fn test_plural_round_trip() {
        let mock = MockBackend::new(MockMode::Suffix);
        let mut translator = translator(&mock, relay_only());

        let outcome = start(&mut translator, "{[#n]} files[i2p_One]{[#n]} file", "en", "fr");
        drive(&mut translator).await;

        // Zero translates like the default form and is dropped
        assert_eq!(
            single(&outcome),
            Ok("{[#n]} files_fr[i2p_One]{[#n]} file_fr".to_string())
        );
        let list = mock.requests()[0].param("list").unwrap_or_default().to_string();
        assert_eq!(list, "en:fr=0 files<I2Loc>en:fr=1 file<I2Loc>en:fr=936 files");
    }

    #[tokio::test]
    async fn test_specializations_round_trip() {
        let mock = MockBackend::new(MockMode::Suffix);
        let mut translator = translator(&mock, relay_only());

        let outcome = start(&mut translator, "Click to start[i2s_Touch]Tap to start", "en", "it");
        drive(&mut translator).await;

        assert_eq!(
            single(&outcome),
            Ok("Click to start_it[i2s_Touch]Tap to start_it".to_string())
        );
        assert_eq!(mock.call_count(), 1);
    }

    // ========== Batch Tests ==========

    #[tokio::test]
    async fn test_one_query_serves_every_target() {
        let mock = MockBackend::new(MockMode::Suffix);
        let mut translator = translator(&mock, relay_only());

        let mut store = QueryStore::new();
        for target in ["fr", "de", "ja"] {
            translator.create_queries("Start game", "en", target, &mut store);
        }
        assert_eq!(store.len(), 1);

        let done: Arc<Mutex<Option<QueryStore>>> = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&done);
        translator.translate_batch(store, move |store, error| {
            assert!(error.is_none());
            *sink.lock().unwrap() = Some(store);
        });
        drive(&mut translator).await;

        assert_eq!(mock.call_count(), 1);
        assert_eq!(mock.requests()[0].param("list"), Some("en:fr,de,ja=Start game"));

        let store = done.lock().unwrap().take().unwrap();
        assert_eq!(translator.rebuild("Start game", &store, "de"), "Start game_de");
        assert_eq!(translator.rebuild("Start game", &store, "ja"), "Start game_ja");
    }

    #[tokio::test]
    async fn test_get_fallback_respects_payload_limit() {
        let mock = MockBackend::new(MockMode::Suffix).with_transport(TransportKind::Post, down());
        let config = RelayConfig {
            max_get_payload: 30,
            ..relay_only()
        };
        let mut translator = translator(&mock, config);

        let mut store = QueryStore::new();
        for text in ["alpha", "bravo", "delta"] {
            translator.create_queries(text, "en", "fr", &mut store);
        }

        let done: Arc<Mutex<Option<QueryStore>>> = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&done);
        translator.translate_batch(store, move |store, _| {
            *sink.lock().unwrap() = Some(store);
        });
        drive(&mut translator).await;

        // "en%3Afr%3Dalpha" is 15 bytes, two entries and a delimiter exceed 30
        assert_eq!(mock.calls_for(TransportKind::Post), 1);
        assert_eq!(mock.calls_for(TransportKind::Get), 3);

        let store = done.lock().unwrap().take().unwrap();
        assert!(store.pending().is_empty());
        assert_eq!(translator.rebuild("delta", &store, "fr"), "delta_fr");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_batch_skips_unsupported_target() {
        let mock = MockBackend::new(MockMode::Suffix);
        let translator = translator(&mock, relay_only());

        let mut store = QueryStore::new();
        for target in ["fr", "ab"] {
            translator.create_queries("Hello", "en", target, &mut store);
        }

        let store = translator.force_translate(store).unwrap();

        assert_eq!(mock.requests()[0].param("list"), Some("en:fr=Hello"));
        assert_eq!(translator.rebuild("Hello", &store, "fr"), "Hello_fr");
        assert_eq!(translator.rebuild("Hello", &store, "ab"), "");
    }

    #[tokio::test]
    async fn test_literal_plus_survives_translation() {
        let mock = MockBackend::new(MockMode::Suffix);
        let mut translator = translator(&mock, relay_only());

        let outcome = start(&mut translator, "+5 Strength for {[hero]}", "en", "fr");
        drive(&mut translator).await;

        assert_eq!(single(&outcome), Ok("+5 Strength for {[hero]}_fr".to_string()));
        assert_eq!(mock.requests()[0].param("list"), Some("en:fr=+5 Strength for ^ "));
    }

    // ========== Failure Tests ==========

    #[tokio::test]
    async fn test_exhausted_chain_reports_once() {
        let mock = MockBackend::new(MockMode::Suffix)
            .with_transport(TransportKind::Scrape, down())
            .with_transport(TransportKind::Post, MockMode::Raw("<!DOCTYPE html><html></html>".to_string()))
            .with_transport(
                TransportKind::Get,
                MockMode::Raw("Service invoked too many times in a short time".to_string()),
            );
        let mut translator = translator(&mock, RelayConfig::new("https://relay"));

        let outcome = start(&mut translator, "Continue", "en", "fr");
        drive(&mut translator).await;

        assert!(matches!(single(&outcome), Err(MtError::RateLimited(_))));
        assert_eq!(mock.call_count(), 3);
        assert_eq!(translator.tick(), 0);
    }

    #[tokio::test]
    async fn test_missing_relay_url_makes_no_requests() {
        let mock = MockBackend::new(MockMode::Suffix);
        let mut translator = translator(&mock, RelayConfig::default());

        let mut store = QueryStore::new();
        translator.create_queries("Continue", "en", "fr", &mut store);

        let errors: Arc<Mutex<Vec<Option<MtError>>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&errors);
        let id = translator.translate_batch(store, move |_, error| {
            sink.lock().unwrap().push(error);
        });

        assert!(id.is_none());
        assert!(!translator.is_translating());
        assert!(matches!(errors.lock().unwrap().as_slice(), [Some(MtError::ConfigError(_))]));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_cancel_all_running_jobs() {
        let mock = MockBackend::new(MockMode::Suffix).with_delay(Duration::from_secs(5));
        let mut translator = translator(&mock, relay_only());

        let first = start(&mut translator, "Yes", "en", "fr");
        let second = start(&mut translator, "No", "en", "de");
        translator.tick();
        assert!(translator.is_translating());

        translator.cancel_all();
        assert!(!translator.is_translating());
        assert_eq!(translator.tick(), 0);
        assert!(first.lock().unwrap().is_empty());
        assert!(second.lock().unwrap().is_empty());
    }

    // ========== Force Tests ==========

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_force_translate_with_fallback() {
        let mock = MockBackend::new(MockMode::Suffix)
            .with_transport(TransportKind::Scrape, down())
            .with_delay(Duration::from_millis(2));
        let translator = translator(&mock, RelayConfig::new("https://relay"));

        let mut store = QueryStore::new();
        translator.create_queries("Loading {[percent]}%", "en", "pt", &mut store);
        let store = translator.force_translate(store).unwrap();

        assert_eq!(
            translator.rebuild("Loading {[percent]}%", &store, "pt"),
            "Loading {[percent]}%_pt"
        );
        assert_eq!(mock.calls_for(TransportKind::Scrape), 1);
        assert_eq!(mock.calls_for(TransportKind::Post), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_force_translate_reports_failure() {
        let mock = MockBackend::new(down());
        let translator = translator(&mock, relay_only());

        let mut store = QueryStore::new();
        translator.create_queries("Retry", "en", "fr", &mut store);
        let result = translator.force_translate(store);

        assert!(matches!(result, Err(MtError::NetworkError(_))));
        assert_eq!(mock.call_count(), 2);
    }

    // ========== Live Relay Tests ==========

    #[tokio::test]
    #[ignore]
    async fn test_live_relay_translation() {
        let Ok(config) = RelayConfig::from_env() else {
            return;
        };
        if config.validate().is_err() {
            eprintln!("⚠️  Skipping: LOCRELAY_URL not set");
            return;
        }

        let mut translator = Translator::from_config(config).unwrap();
        let outcome = start(&mut translator, "Hello [b]{[name]}[/b]!", "en", "fr");
        drive(&mut translator).await;

        let translated = single(&outcome).unwrap();
        println!("🌍 fr: {}", translated);
        assert!(translated.contains("[b]{[name]}[/b]"));
    }
}
