//! Template expansion for plural and specialization variants
//!
//! A source text can carry two template grammars at once:
//!
//! - specialization blocks: `Click[i2s_Touch]Tap`
//! - plural blocks: `{[#count]} item[i2p_Few]{[#count]} items`
//!
//! Expansion turns one such text into the concrete sub-texts that are sent to
//! the translation service. Specializations are split first; every variant is
//! then expanded into one sub-text per plural category the *target* language
//! distinguishes, with the plural parameter replaced by a number that selects
//! that category. The service only chooses the right grammatical form when it
//! sees a concrete number.
//!
//! # Example
//!
//! ```ignore
//! let catalog = LanguageCatalog::new();
//! let expanded = expand("{[#count]} item[i2p_Few]{[#count]} items", "ru", &catalog);
//! // Zero → "0 item", One → "1 item", Few → "3 items", Plural → "936 item"
//! assert_eq!(expanded.len(), 4);
//! ```

use regex::Regex;
use std::sync::LazyLock;

use super::languages::LanguageCatalog;
use super::plural::{self, PLURAL_MARKER_PREFIX, PluralCategory};
use super::specialization::{self, DEFAULT_SPECIALIZATION};

static PARAMETER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\[[^\]]*\]\}").expect("parameter pattern is valid"));

/// Prefix of a dedicated plural parameter, e.g. `{[#count]}`
pub const PLURAL_PARAMETER_PREFIX: &str = "{[#";

/// One concrete sub-text produced by [`expand`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandedQuery {
    /// Text to hand to the query store
    pub text: String,
    /// Specialization variant this text belongs to (`Any` when there are none)
    pub specialization: String,
    /// Plural category, `None` for texts that are not plural-bearing
    pub category: Option<PluralCategory>,
    /// Parameter token that was replaced, e.g. `{[#count]}`
    pub parameter: Option<String>,
    /// Number substituted for `parameter`
    pub test_value: Option<u32>,
}

/// Whether `text` contains at least one `{[...]}` parameter
pub fn has_parameters(text: &str) -> bool {
    PARAMETER_PATTERN.is_match(text)
}

/// A text is plural-bearing when it has a parameter and either a category
/// marker or a dedicated `{[#name]}` plural parameter.
pub fn is_plural_bearing(text: &str) -> bool {
    has_parameters(text)
        && (text.contains(PLURAL_MARKER_PREFIX) || text.contains(PLURAL_PARAMETER_PREFIX))
}

/// Sub-text of `category` inside a plural block.
///
/// Returns the text following `[i2p_<category>]` up to the next category
/// marker. When the category has no block, the text before the first marker
/// (the default form) is returned instead.
pub fn plural_text(text: &str, category: PluralCategory) -> &str {
    let marker = category.marker();
    if let Some(pos) = text.find(&marker) {
        let start = pos + marker.len();
        let end = text[start..]
            .find(PLURAL_MARKER_PREFIX)
            .map(|offset| start + offset)
            .unwrap_or(text.len());
        return &text[start..end];
    }

    match text.find(PLURAL_MARKER_PREFIX) {
        Some(pos) => &text[..pos],
        None => text,
    }
}

/// Parameter that drives the plural form of `text`.
///
/// A `{[#name]}` parameter wins over plain ones. With `tagged_only` set (the
/// full template contains a `#` parameter somewhere) plain parameters never
/// qualify, so a category block that omits the number is left untouched.
pub fn plural_parameter(text: &str, tagged_only: bool) -> Option<&str> {
    let mut first = None;
    for found in PARAMETER_PATTERN.find_iter(text) {
        let token = found.as_str();
        if token.starts_with(PLURAL_PARAMETER_PREFIX) {
            return Some(token);
        }
        if first.is_none() {
            first = Some(token);
        }
    }

    if tagged_only { None } else { first }
}

/// Expand `text` into the sub-texts needed to translate it into `target_language`.
///
/// Empty specialization variants are skipped. A text with neither grammar
/// yields exactly one query equal to the input.
pub fn expand(text: &str, target_language: &str, catalog: &LanguageCatalog) -> Vec<ExpandedQuery> {
    if !specialization::has_specializations(text) {
        return expand_plurals(text, DEFAULT_SPECIALIZATION, target_language, catalog);
    }

    specialization::split_specializations(text)
        .iter()
        .filter(|(_, variant)| !variant.is_empty())
        .flat_map(|(name, variant)| expand_plurals(variant, name, target_language, catalog))
        .collect()
}

fn expand_plurals(
    text: &str,
    specialization: &str,
    target_language: &str,
    catalog: &LanguageCatalog,
) -> Vec<ExpandedQuery> {
    if !is_plural_bearing(text) {
        return vec![ExpandedQuery {
            text: text.to_string(),
            specialization: specialization.to_string(),
            category: None,
            parameter: None,
            test_value: None,
        }];
    }

    let tagged_only = text.contains(PLURAL_PARAMETER_PREFIX);
    plural::plural_forms_for_language(catalog, target_language)
        .into_iter()
        .map(|form| {
            let sub_text = plural_text(text, form.category);
            let parameter = plural_parameter(sub_text, tagged_only);
            let expanded = match parameter {
                Some(token) => sub_text.replace(token, &form.test_value.to_string()),
                None => sub_text.to_string(),
            };
            ExpandedQuery {
                text: expanded,
                specialization: specialization.to_string(),
                category: Some(form.category),
                parameter: parameter.map(str::to_string),
                test_value: parameter.map(|_| form.test_value),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(expanded: &[ExpandedQuery]) -> Vec<&str> {
        expanded.iter().map(|query| query.text.as_str()).collect()
    }

    // ========== Detection Tests ==========

    #[test]
    fn test_plural_bearing_requires_parameter() {
        assert!(is_plural_bearing("{[#n]} apples"));
        assert!(is_plural_bearing("{[n]} apple[i2p_Plural]{[n]} apples"));
        assert!(!is_plural_bearing("apple[i2p_Plural]apples"));
        assert!(!is_plural_bearing("Hello {[name]}"));
        assert!(!is_plural_bearing("Hello"));
    }

    #[test]
    fn test_plural_text_blocks() {
        let text = "{[n]} item[i2p_Few]{[n]} itemy[i2p_Many]{[n]} items";
        assert_eq!(plural_text(text, PluralCategory::Few), "{[n]} itemy");
        assert_eq!(plural_text(text, PluralCategory::Many), "{[n]} items");
        assert_eq!(plural_text(text, PluralCategory::Zero), "{[n]} item");
        assert_eq!(plural_text("{[n]} item", PluralCategory::One), "{[n]} item");
    }

    #[test]
    fn test_plural_parameter_prefers_tagged() {
        assert_eq!(plural_parameter("{[name]} has {[#count]} coins", false), Some("{[#count]}"));
        assert_eq!(plural_parameter("{[name]} has {[count]} coins", false), Some("{[name]}"));
        assert_eq!(plural_parameter("{[name]} has coins", true), None);
        assert_eq!(plural_parameter("no parameters", false), None);
    }

    // ========== Expansion Tests ==========

    #[test]
    fn test_plain_text_is_single_query() {
        let expanded = expand("Hello {[name]}", "fr", &LanguageCatalog::new());
        assert_eq!(expanded.len(), 1);
        assert_eq!(expanded[0].text, "Hello {[name]}");
        assert_eq!(expanded[0].specialization, "Any");
        assert_eq!(expanded[0].category, None);
    }

    #[test]
    fn test_plural_expansion_follows_target_rules() {
        let catalog = LanguageCatalog::new();
        let text = "{[#count]} item[i2p_Few]{[#count]} items";

        let russian = expand(text, "ru", &catalog);
        assert_eq!(texts(&russian), vec!["0 item", "1 item", "3 items", "936 item"]);

        let english = expand(text, "en", &catalog);
        assert_eq!(texts(&english), vec!["0 item", "1 item", "936 item"]);
        assert_eq!(
            english.last().map(|query| query.category),
            Some(Some(PluralCategory::Plural))
        );
    }

    #[test]
    fn test_plural_expansion_records_substitution() {
        let expanded = expand("{[#n]} files", "ar", &LanguageCatalog::new());
        assert_eq!(expanded.len(), 6);
        let many = &expanded[4];
        assert_eq!(many.category, Some(PluralCategory::Many));
        assert_eq!(many.parameter.as_deref(), Some("{[#n]}"));
        assert_eq!(many.test_value, Some(13));
        assert_eq!(many.text, "13 files");
    }

    #[test]
    fn test_every_occurrence_is_substituted() {
        let expanded = expand("{[#n]} of {[#n]}", "en", &LanguageCatalog::new());
        assert_eq!(expanded[1].text, "1 of 1");
    }

    #[test]
    fn test_other_parameters_survive_expansion() {
        let expanded = expand("{[player]} found {[#n]} coins", "en", &LanguageCatalog::new());
        assert_eq!(expanded[2].text, "{[player]} found 936 coins");
    }

    #[test]
    fn test_specializations_expand_independently() {
        let catalog = LanguageCatalog::new();
        let expanded = expand("Click {[#n]} times[i2s_Touch]Tap {[#n]} times", "en", &catalog);
        assert_eq!(expanded.len(), 6);
        assert!(expanded[..3].iter().all(|query| query.specialization == "Any"));
        assert!(expanded[3..].iter().all(|query| query.specialization == "Touch"));
        assert_eq!(expanded[4].text, "Tap 1 times");
    }

    #[test]
    fn test_empty_specialization_variant_is_skipped() {
        let expanded = expand("[i2s_VR]Look around", "de", &LanguageCatalog::new());
        assert_eq!(texts(&expanded), vec!["Look around"]);
        assert_eq!(expanded[0].specialization, "VR");
    }
}
