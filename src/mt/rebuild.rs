//! Rebuilding structured translations from per-query results
//!
//! The caller's text is expanded again exactly as it was when the queries were
//! created, so every sub-text finds its query in the store. Results are
//! restored with the caller's own tags, plural test numbers are turned back
//! into the parameter, and the pieces are merged with the same marker grammar
//! the source used. Categories whose translation equals the default `Plural`
//! form are left out.
//!
//! # Example
//!
//! ```ignore
//! // Few → "3 articles", Plural → "936 articles", One → "1 article"
//! let text = rebuild_translation("{[#n]} item[i2p_Few]{[#n]} items", &store, "fr", &catalog);
//! assert_eq!(text, "{[#n]} articles[i2p_One]{[#n]} article");
//! ```

use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::expansion::{self, PLURAL_PARAMETER_PREFIX};
use super::languages::LanguageCatalog;
use super::plural::{self, PluralCategory};
use super::query::QueryStore;
use super::specialization::{self, Specializations};
use super::tokenizer;

static NUMBER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+").expect("number pattern is valid"));

/// Replace whole-number occurrences of `value` by `token`; digits inside
/// other numbers are left alone.
fn restore_parameter(text: &str, value: &str, token: &str) -> String {
    NUMBER_PATTERN
        .replace_all(text, |caps: &Captures| {
            if &caps[0] == value {
                token.to_string()
            } else {
                caps[0].to_string()
            }
        })
        .into_owned()
}

/// Whether `text` reads like a Title Case phrase: at least two words that
/// start with a letter, each capitalized with no further capitals.
pub fn is_title_case(text: &str) -> bool {
    let words: Vec<&str> = text
        .split_whitespace()
        .filter(|word| word.chars().next().is_some_and(char::is_alphabetic))
        .collect();

    words.len() >= 2
        && words.iter().all(|word| {
            let mut chars = word.chars();
            chars.next().is_some_and(char::is_uppercase) && chars.all(|c| !c.is_uppercase())
        })
}

/// Capitalize the first character of every word and lowercase the rest
pub fn title_case(text: &str) -> String {
    let mut titled = String::with_capacity(text.len());
    let mut word_start = true;
    for c in text.chars() {
        if c.is_whitespace() {
            word_start = true;
            titled.push(c);
        } else if word_start {
            titled.extend(c.to_uppercase());
            word_start = false;
        } else {
            titled.extend(c.to_lowercase());
        }
    }
    titled
}

/// Translation of a plain (already expanded) text.
///
/// Returns the text itself when nothing in it is translatable, and `None`
/// when the store holds no result for it in `target_language`.
pub fn get_translation(text: &str, store: &QueryStore, target_language: &str) -> Option<String> {
    let tokenized = tokenizer::tokenize(text);
    if !tokenized.is_translatable() {
        return Some(text.to_string());
    }

    let raw = store.get(&tokenized.text)?.result_for(target_language)?;
    let repaired = if is_title_case(&tokenized.text) {
        title_case(raw)
    } else {
        raw.to_string()
    };
    Some(tokenizer::restore(&repaired, &tokenized.tags, tokenized.marker))
}

/// Rebuild one specialization variant, expanding plural blocks if present
pub fn rebuild_plural(
    text: &str,
    store: &QueryStore,
    target_language: &str,
    catalog: &LanguageCatalog,
) -> Option<String> {
    if !expansion::is_plural_bearing(text) {
        return get_translation(text, store, target_language);
    }

    let tagged_only = text.contains(PLURAL_PARAMETER_PREFIX);
    let mut rebuilt = String::new();
    let mut default_form: Option<String> = None;

    for category in PluralCategory::ALL.into_iter().rev() {
        if !plural::language_has_category(catalog, target_language, category) {
            continue;
        }

        let sub_text = expansion::plural_text(text, category);
        let parameter = expansion::plural_parameter(sub_text, tagged_only);
        let test_value = plural::test_number(catalog, target_language, category).to_string();
        let sent = match parameter {
            Some(token) => sub_text.replace(token, &test_value),
            None => sub_text.to_string(),
        };

        let Some(mut translated) = get_translation(&sent, store, target_language) else {
            if category == PluralCategory::Plural {
                return None;
            }
            tracing::debug!(category = %category, "no result for plural category");
            continue;
        };
        if let Some(token) = parameter {
            translated = restore_parameter(&translated, &test_value, token);
        }

        if category == PluralCategory::Plural {
            rebuilt.push_str(&translated);
            default_form = Some(translated);
        } else if default_form.as_deref() != Some(translated.as_str()) {
            rebuilt.push_str(&category.marker());
            rebuilt.push_str(&translated);
        }
    }

    Some(rebuilt)
}

/// Rebuild the translation of a caller's text into `target_language`.
///
/// Texts whose queries are missing or unanswered rebuild to an empty string.
pub fn rebuild_translation(
    text: &str,
    store: &QueryStore,
    target_language: &str,
    catalog: &LanguageCatalog,
) -> String {
    if !specialization::has_specializations(text) {
        return rebuild_plural(text, store, target_language, catalog).unwrap_or_default();
    }

    let mut rebuilt = Specializations::default();
    for (name, variant) in specialization::split_specializations(text).iter() {
        let translated = if variant.is_empty() {
            String::new()
        } else {
            rebuild_plural(variant, store, target_language, catalog).unwrap_or_default()
        };
        rebuilt.set(name, translated);
    }
    specialization::merge_specializations(&rebuilt)
}
