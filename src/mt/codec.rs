//! Wire format of the translation relay
//!
//! Requests carry a `list` parameter: entries joined by `<I2Loc>`, each entry
//! written as `source:target1,target2=text` with service language codes. The
//! relay answers with one segment per entry in the same order, joined by
//! `<I2Loc>`, and every segment holds one result per target joined by `<i2>`.
//!
//! # Example
//!
//! ```ignore
//! // list=en:fr,de=Start game<I2Loc>en:fr=Quit
//! // response: Lancer la partie<i2>Spiel starten<I2Loc>Quitter
//! let results = parse_response(raw, &[2, 1], &PatternClassifier::default())?;
//! assert_eq!(results[0], vec!["Lancer la partie", "Spiel starten"]);
//! ```

use std::ops::Range;

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use url::form_urlencoded;

use super::classifier::{ResponseClass, ResponseClassifier};
use super::error::{MtError, MtResult};
use super::languages::{AUTO_DETECT, LanguageCatalog};
use super::query::TranslationQuery;
use super::rebuild;

/// Separates entries in a request and segments in a response
pub const QUERY_DELIMITER: &str = "<I2Loc>";

/// Separates per-target results inside one response segment
pub const RESULT_DELIMITER: &str = "<i2>";

/// Default limit for the URL-encoded `list` value of a GET request
pub const DEFAULT_MAX_GET_PAYLOAD: usize = 4000;

/// Text as it goes over the wire.
///
/// The service lowercases Title Case input word by word anyway, so such text
/// is sent lowercased and re-capitalized when the result is rebuilt.
pub fn outbound_text(query: &TranslationQuery) -> String {
    if rebuild::is_title_case(&query.original_text) {
        query.original_text.to_lowercase()
    } else {
        query.original_text.clone()
    }
}

/// Service code for a language, `auto` for auto-detection
pub fn service_language(code: &str, catalog: &LanguageCatalog) -> String {
    catalog
        .service_code(code)
        .unwrap_or_else(|| code.to_string())
}

/// Encode one query as `source:target1,target2=text`
pub fn encode_entry(query: &TranslationQuery, catalog: &LanguageCatalog) -> String {
    let source = if query.source_language.is_empty() {
        AUTO_DETECT.to_string()
    } else {
        service_language(&query.source_language, catalog)
    };
    let targets: Vec<String> = query
        .target_languages
        .iter()
        .map(|target| service_language(target, catalog))
        .collect();

    format!("{}:{}={}", source, targets.join(","), outbound_text(query))
}

/// Join encoded entries into a `list` value
pub fn encode_batch(entries: &[String]) -> String {
    entries.join(QUERY_DELIMITER)
}

/// Length of `text` once form-URL-encoded
pub fn encoded_len(text: &str) -> usize {
    form_urlencoded::byte_serialize(text.as_bytes())
        .map(str::len)
        .sum()
}

/// Split entries into consecutive GET batches.
///
/// A batch grows while its encoded `list` value stays within `max_payload`.
/// Entries are never split; an entry that alone exceeds the limit travels in
/// a batch of its own.
pub fn get_batches(entries: &[String], max_payload: usize) -> Vec<Range<usize>> {
    let delimiter_len = encoded_len(QUERY_DELIMITER);
    let mut batches = Vec::new();
    let mut start = 0;
    let mut size = 0;

    for (i, entry) in entries.iter().enumerate() {
        let entry_len = encoded_len(entry);
        if i == start {
            size = entry_len;
            continue;
        }
        if size + delimiter_len + entry_len > max_payload {
            batches.push(start..i);
            start = i;
            size = entry_len;
        } else {
            size += delimiter_len + entry_len;
        }
    }

    if start < entries.len() {
        batches.push(start..entries.len());
    }
    batches
}

/// Parse a relay response into per-query result lists.
///
/// `expected[i]` is the number of targets of the i-th query sent. The raw
/// payload is classified first; error pages and throttling become errors so
/// the caller can move on to the next transport.
pub fn parse_response(
    raw: &str,
    expected: &[usize],
    classifier: &dyn ResponseClassifier,
) -> MtResult<Vec<Vec<String>>> {
    match classifier.classify(raw) {
        ResponseClass::Ok => {}
        ResponseClass::ErrorPage(message) => return Err(MtError::ServiceError(message)),
        ResponseClass::RateLimited(message) => return Err(MtError::RateLimited(message)),
    }

    let segments: Vec<&str> = raw.split(QUERY_DELIMITER).collect();
    if segments.len() < expected.len() {
        return Err(MtError::MalformedResponse(format!(
            "Expected {} segments, got {}",
            expected.len(),
            segments.len()
        )));
    }
    if segments.len() > expected.len() {
        tracing::debug!(
            expected = expected.len(),
            received = segments.len(),
            "ignoring extra response segments"
        );
    }

    expected
        .iter()
        .zip(segments)
        .enumerate()
        .map(|(i, (&targets, segment))| {
            let parts: Vec<String> = segment
                .split(RESULT_DELIMITER)
                .map(|part| part.trim().to_string())
                .collect();
            if parts.len() < targets {
                return Err(MtError::MalformedResponse(format!(
                    "Segment {} has {} results for {} targets",
                    i,
                    parts.len(),
                    targets
                )));
            }
            Ok(parts.into_iter().take(targets).collect())
        })
        .collect()
}

/// Class of the element holding the translation on the scraped page
const RESULT_CONTAINER_CLASS: &str = "result-container";

fn has_class(node: &Handle, class: &str) -> bool {
    match &node.data {
        NodeData::Element { attrs, .. } => attrs.borrow().iter().any(|attr| {
            &*attr.name.local == "class" && attr.value.split_whitespace().any(|c| c == class)
        }),
        _ => false,
    }
}

/// First node, in document order, carrying `class`
fn find_by_class(node: &Handle, class: &str) -> Option<Handle> {
    if has_class(node, class) {
        return Some(node.clone());
    }
    node.children
        .borrow()
        .iter()
        .find_map(|child| find_by_class(child, class))
}

/// Concatenated text of `node` and its descendants
fn collect_text(node: &Handle, text: &mut String) {
    match &node.data {
        NodeData::Text { contents } => text.push_str(&contents.borrow()),
        NodeData::Element { name, .. } if &*name.local == "br" => text.push('\n'),
        _ => {}
    }
    for child in node.children.borrow().iter() {
        collect_text(child, text);
    }
}

/// Pull the translation out of a scraped result page.
///
/// Entities are decoded by the HTML parser; non-breaking spaces become plain
/// spaces so sentinels keep their trailing space.
pub fn extract_scraped_translation(html: &str) -> MtResult<String> {
    let dom = parse_document(RcDom::default(), Default::default()).one(html);
    let container = find_by_class(&dom.document, RESULT_CONTAINER_CLASS)
        .ok_or_else(|| MtError::MalformedResponse("No result container in page".to_string()))?;

    let mut text = String::new();
    collect_text(&container, &mut text);
    Ok(text.replace('\u{a0}', " ").trim().to_string())
}
