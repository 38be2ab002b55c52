//! Translation queries and the deduplicating query store
//!
//! Every sub-text produced by the expander is tokenized when it enters the
//! store, and the detagged text becomes the key. Requests for the same
//! detagged text in several target languages collapse into one query whose
//! target list grows, so each distinct text is sent to the service once.

use std::collections::HashMap;

use super::expansion;
use super::languages::LanguageCatalog;
use super::tokenizer::{self, TokenizedText};

/// A deduplicated unit of work sent to the translation service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationQuery {
    /// Detagged text as sent to the service; also the store key
    pub original_text: String,
    /// Text before tokenization
    pub source_text: String,
    /// Source language code, or [`AUTO_DETECT`](super::languages::AUTO_DETECT)
    pub source_language: String,
    /// Distinct target codes in request order
    pub target_languages: Vec<String>,
    /// Extracted spans, `tags[k]` matching the k-th sentinel
    pub tags: Vec<String>,
    /// Character the sentinels are built from
    pub marker: char,
    /// Raw service output parallel to `target_languages`, sentinels included
    pub results: Option<Vec<String>>,
}

impl TranslationQuery {
    pub fn new(tokenized: TokenizedText, source_text: &str, source_language: &str) -> Self {
        Self {
            original_text: tokenized.text,
            source_text: source_text.to_string(),
            source_language: source_language.to_string(),
            target_languages: Vec::new(),
            tags: tokenized.tags,
            marker: tokenized.marker,
            results: None,
        }
    }

    /// Add a target language; returns `false` if it was already requested
    pub fn add_target_language(&mut self, language: &str) -> bool {
        if self.target_languages.iter().any(|lang| lang == language) {
            return false;
        }
        self.target_languages.push(language.to_string());
        true
    }

    pub fn is_resolved(&self) -> bool {
        self.results.is_some()
    }

    /// Raw result for `language`, if the query completed and the language was requested
    pub fn result_for(&self, language: &str) -> Option<&str> {
        let index = self
            .target_languages
            .iter()
            .position(|lang| lang == language)?;
        self.results
            .as_ref()
            .and_then(|results| results.get(index))
            .map(String::as_str)
    }

    /// Result for `language` with this query's own tags put back
    pub fn restored_result(&self, language: &str) -> Option<String> {
        self.result_for(language)
            .map(|result| tokenizer::restore(result, &self.tags, self.marker))
    }
}

/// Insertion-ordered map of queries keyed by detagged text
#[derive(Debug, Clone, Default)]
pub struct QueryStore {
    queries: Vec<TranslationQuery>,
    index: HashMap<String, usize>,
}

impl QueryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request `text` in `target_language`.
    ///
    /// Returns `true` when a new query was created. Texts that carry nothing
    /// translatable once tags are removed are not stored.
    pub fn add(&mut self, text: &str, source_language: &str, target_language: &str) -> bool {
        let tokenized = tokenizer::tokenize(text);
        if !tokenized.is_translatable() {
            return false;
        }

        if let Some(&position) = self.index.get(&tokenized.text) {
            self.queries[position].add_target_language(target_language);
            return false;
        }

        tracing::debug!(query = %tokenized.text, tags = tokenized.tags.len(), "new translation query");
        let mut query = TranslationQuery::new(tokenized, text, source_language);
        query.add_target_language(target_language);
        self.index
            .insert(query.original_text.clone(), self.queries.len());
        self.queries.push(query);
        true
    }

    /// Query stored under a detagged key
    pub fn get(&self, key: &str) -> Option<&TranslationQuery> {
        self.index
            .get(key)
            .and_then(|&position| self.queries.get(position))
    }

    /// Query a raw (tagged) text was stored under
    pub fn lookup(&self, text: &str) -> Option<&TranslationQuery> {
        self.get(&tokenizer::tokenize(text).text)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TranslationQuery> {
        self.queries.iter()
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    /// Keys of queries that have no results yet, in insertion order
    pub fn pending(&self) -> Vec<String> {
        self.queries
            .iter()
            .filter(|query| !query.is_resolved())
            .map(|query| query.original_text.clone())
            .collect()
    }

    /// Store the raw results of a query; returns `false` for unknown keys
    pub fn set_results(&mut self, key: &str, results: Vec<String>) -> bool {
        match self.index.get(key) {
            Some(&position) => {
                self.queries[position].results = Some(results);
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.queries.clear();
        self.index.clear();
    }
}

/// Expand `text` for `target_language` and add every sub-text to `store`.
///
/// Returns the number of queries that were newly created. Targets the
/// service cannot translate are not queued, so they rebuild to an empty
/// string.
pub fn create_queries(
    text: &str,
    source_language: &str,
    target_language: &str,
    catalog: &LanguageCatalog,
    store: &mut QueryStore,
) -> usize {
    if catalog.service_code(target_language).is_none() {
        tracing::debug!(target = target_language, "target language is not supported by the service");
        return 0;
    }

    expansion::expand(text, target_language, catalog)
        .into_iter()
        .filter(|expanded| store.add(&expanded.text, source_language, target_language))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========== Store Tests ==========

    #[test]
    fn test_add_creates_tokenized_query() {
        let mut store = QueryStore::new();
        assert!(store.add("Hello {[name]}", "en", "fr"));

        let query = store.get("Hello + ").unwrap();
        assert_eq!(query.source_text, "Hello {[name]}");
        assert_eq!(query.tags, vec!["{[name]}"]);
        assert_eq!(query.target_languages, vec!["fr"]);
        assert!(query.results.is_none());
    }

    #[test]
    fn test_same_text_merges_targets() {
        let mut store = QueryStore::new();
        assert!(store.add("Start game", "en", "fr"));
        assert!(!store.add("Start game", "en", "de"));
        assert!(!store.add("Start game", "en", "fr"));

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("Start game").unwrap().target_languages, vec!["fr", "de"]);
    }

    #[test]
    fn test_texts_with_same_detagged_form_share_a_query() {
        let mut store = QueryStore::new();
        store.add("Hello {[name]}", "en", "fr");
        store.add("Hello [b]", "en", "de");
        assert_eq!(store.len(), 1);
        assert_eq!(store.lookup("Hello [b]").unwrap().target_languages, vec!["fr", "de"]);
    }

    #[test]
    fn test_tag_only_text_is_not_stored() {
        let mut store = QueryStore::new();
        assert!(!store.add("{[name]}", "en", "fr"));
        assert!(!store.add("   ", "en", "fr"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_insertion_order_is_stable() {
        let mut store = QueryStore::new();
        for text in ["one", "two", "three", "two"] {
            store.add(text, "en", "es");
        }
        let keys: Vec<_> = store.iter().map(|query| query.original_text.as_str()).collect();
        assert_eq!(keys, vec!["one", "two", "three"]);
    }

    #[test]
    fn test_results_and_pending() {
        let mut store = QueryStore::new();
        store.add("Yes", "en", "fr");
        store.add("No", "en", "fr");
        store.add("No", "en", "de");

        assert!(store.set_results("No", vec!["Non".into(), "Nein".into()]));
        assert!(!store.set_results("Maybe", vec![]));
        assert_eq!(store.pending(), vec!["Yes"]);

        let no = store.get("No").unwrap();
        assert_eq!(no.result_for("de"), Some("Nein"));
        assert_eq!(no.result_for("it"), None);
    }

    #[test]
    fn test_restored_result_uses_query_tags() {
        let mut store = QueryStore::new();
        store.add("Hello {[name]}!", "en", "fr");
        store.set_results("Hello + !", vec!["Bonjour + !".into()]);
        assert_eq!(
            store.get("Hello + !").unwrap().restored_result("fr"),
            Some("Bonjour {[name]}!".to_string())
        );
    }

    #[test]
    fn test_clear() {
        let mut store = QueryStore::new();
        store.add("Yes", "en", "fr");
        store.clear();
        assert!(store.is_empty());
        assert!(store.get("Yes").is_none());
    }

    // ========== create_queries Tests ==========

    #[test]
    fn test_create_queries_for_plural_text() {
        let catalog = LanguageCatalog::new();
        let mut store = QueryStore::new();
        let text = "{[#count]} item[i2p_Few]{[#count]} items";

        assert_eq!(create_queries(text, "en", "ru", &catalog, &mut store), 4);
        // English reuses "0 item", "1 item" and "936 item"
        assert_eq!(create_queries(text, "en", "en", &catalog, &mut store), 0);
        assert_eq!(store.get("936 item").unwrap().target_languages, vec!["ru", "en"]);
        assert_eq!(store.get("3 items").unwrap().target_languages, vec!["ru"]);
    }

    #[test]
    fn test_create_queries_skips_unsupported_target() {
        let catalog = LanguageCatalog::new();
        let mut store = QueryStore::new();

        assert_eq!(create_queries("Hello", "en", "ab", &catalog, &mut store), 0);
        assert!(store.is_empty());

        create_queries("Hello", "en", "fr", &catalog, &mut store);
        create_queries("Hello", "en", "ab", &catalog, &mut store);
        assert_eq!(store.get("Hello").unwrap().target_languages, vec!["fr"]);
    }

    #[test]
    fn test_literal_marker_character_in_query() {
        let mut store = QueryStore::new();
        store.add("+5 Strength for {[hero]}", "en", "fr");

        let query = store.lookup("+5 Strength for {[hero]}").unwrap();
        assert_eq!(query.original_text, "+5 Strength for ^ ");
        store.set_results("+5 Strength for ^ ", vec!["+5 de force pour ^ ".into()]);
        assert_eq!(
            store.get("+5 Strength for ^ ").unwrap().restored_result("fr"),
            Some("+5 de force pour {[hero]}".to_string())
        );
    }
}
