//! Placeholder tokenizer for protecting non-translatable spans
//!
//! Parameters (`{[name]}`), markup tags (`[b]`, `</i>`) and no-translate blocks
//! (`[i2nt]...[/i2nt]`) are cut out of a text before it reaches the translation
//! service and replaced by sentinels. A sentinel is a marker character
//! repeated `index + 1` times followed by a space, so the first tag becomes
//! `"+ "`, the second `"++ "`, and so on. The service leaves these runs alone,
//! and [`restore`] puts the original spans back afterwards.
//!
//! The marker is the first of [`SENTINEL_CANDIDATES`] that does not already
//! occur in the text, so literal characters like the `+` of `"+5 Strength"`
//! are never read back as sentinels.
//!
//! # Example
//!
//! ```ignore
//! let tokenized = tokenize("Hello [b]{[name]}[/b]!");
//! assert_eq!(tokenized.text, "Hello + ++ +++ !");
//! assert_eq!(tokenized.tags, vec!["[b]", "{[name]}", "[/b]"]);
//! assert_eq!(restore(&tokenized.text, &tokenized.tags, tokenized.marker), "Hello [b]{[name]}[/b]!");
//! ```

use regex::Regex;
use std::sync::LazyLock;

/// Characters repeated to build sentinels, in order of preference
pub const SENTINEL_CANDIDATES: [char; 5] = ['+', '^', '~', '¤', '§'];

/// Tag name of an explicit do-not-translate block
pub const NO_TRANSLATE_TAG: &str = "i2nt";

static SPAN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\[[^\]]*?\]\}|\[[^\[\]]*\]|<[^<>]*>").expect("span pattern is valid")
});

/// What a protected span is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanKind {
    /// `{[name]}`, or an opening tag with no matching close
    Parameter,
    /// Opening tag of a pair, e.g. `[b]` followed later by `[/b]`
    Open,
    /// Closing tag, e.g. `[/b]` or `</b>`
    Close,
    /// `[i2nt]...[/i2nt]`, extracted as one unit including its content
    NoTranslate,
}

/// A protected span, as a byte range into the scanned text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub kind: SpanKind,
    pub start: usize,
    pub end: usize,
}

/// Result of [`tokenize`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizedText {
    /// Text with every protected span replaced by its sentinel
    pub text: String,
    /// Extracted spans; `tags[k]` belongs to `sentinel(marker, k)`
    pub tags: Vec<String>,
    /// Character the sentinels of this text are built from
    pub marker: char,
}

impl TokenizedText {
    pub fn has_tags(&self) -> bool {
        !self.tags.is_empty()
    }

    /// Whether anything besides sentinels and whitespace is left to translate
    pub fn is_translatable(&self) -> bool {
        self.text
            .chars()
            .any(|c| !c.is_whitespace() && !(self.has_tags() && c == self.marker))
    }
}

/// Sentinel built from `marker` standing in for the tag at `index`
pub fn sentinel(marker: char, index: usize) -> String {
    let mut sentinel: String = std::iter::repeat_n(marker, index + 1).collect();
    sentinel.push(' ');
    sentinel
}

/// First sentinel candidate absent from `text`
pub fn pick_marker(text: &str) -> char {
    SENTINEL_CANDIDATES
        .into_iter()
        .find(|candidate| !text.contains(*candidate))
        .unwrap_or_else(|| {
            tracing::warn!(text, "every sentinel candidate occurs in the text");
            SENTINEL_CANDIDATES[0]
        })
}

/// Name of an opening tag: `[b]` → `b`, `<color=#fff>` → `color`
fn tag_name(tag: &str) -> &str {
    let inner = &tag[1..tag.len() - 1];
    inner
        .split(|c: char| c.is_whitespace() || c == '=')
        .next()
        .unwrap_or(inner)
}

fn closing_tag(open: &str, name: &str) -> String {
    if open.starts_with('<') {
        format!("</{}>", name)
    } else {
        format!("[/{}]", name)
    }
}

/// Locate every protected span of `text`, left to right.
pub fn scan_spans(text: &str) -> Vec<Span> {
    let matches: Vec<_> = SPAN_PATTERN.find_iter(text).collect();
    let mut spans = Vec::with_capacity(matches.len());

    let mut i = 0;
    while i < matches.len() {
        let current = matches[i];
        let tag = current.as_str();

        if tag.starts_with("{[") {
            spans.push(Span {
                kind: SpanKind::Parameter,
                start: current.start(),
                end: current.end(),
            });
            i += 1;
            continue;
        }

        if tag.starts_with("[/") || tag.starts_with("</") {
            spans.push(Span {
                kind: SpanKind::Close,
                start: current.start(),
                end: current.end(),
            });
            i += 1;
            continue;
        }

        let self_closing = tag.ends_with("/>");
        let name = tag_name(tag);
        let closer = if self_closing || name.is_empty() {
            None
        } else {
            let expected = closing_tag(tag, name);
            matches[i + 1..]
                .iter()
                .position(|m| m.as_str() == expected)
                .map(|offset| i + 1 + offset)
        };

        match closer {
            Some(close_idx) if name == NO_TRANSLATE_TAG => {
                spans.push(Span {
                    kind: SpanKind::NoTranslate,
                    start: current.start(),
                    end: matches[close_idx].end(),
                });
                i = close_idx + 1;
            }
            Some(_) => {
                spans.push(Span {
                    kind: SpanKind::Open,
                    start: current.start(),
                    end: current.end(),
                });
                i += 1;
            }
            None => {
                spans.push(Span {
                    kind: SpanKind::Parameter,
                    start: current.start(),
                    end: current.end(),
                });
                i += 1;
            }
        }
    }

    spans
}

/// Replace every protected span of `text` by its sentinel.
pub fn tokenize(text: &str) -> TokenizedText {
    let spans = scan_spans(text);
    let marker = pick_marker(text);
    if spans.is_empty() {
        return TokenizedText {
            text: text.to_string(),
            tags: Vec::new(),
            marker,
        };
    }

    let mut detagged = String::with_capacity(text.len());
    let mut tags = Vec::with_capacity(spans.len());
    let mut last = 0;
    for span in &spans {
        detagged.push_str(&text[last..span.start]);
        detagged.push_str(&sentinel(marker, tags.len()));
        tags.push(text[span.start..span.end].to_string());
        last = span.end;
    }
    detagged.push_str(&text[last..]);

    TokenizedText {
        text: detagged,
        tags,
        marker,
    }
}

/// Put the original spans back in place of their sentinels.
///
/// Each maximal run of `marker` whose length `n` names a tag is replaced by
/// `tags[n - 1]`, together with the space that follows it when the service
/// kept that space. Longer runs are therefore never mistaken for shorter
/// ones, and restored tag text is never rescanned.
pub fn restore(text: &str, tags: &[String], marker: char) -> String {
    if tags.is_empty() {
        return text.to_string();
    }

    let mut restored = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c != marker {
            restored.push(c);
            continue;
        }

        let mut run = 1;
        while chars.peek() == Some(&marker) {
            chars.next();
            run += 1;
        }

        match tags.get(run - 1) {
            Some(tag) => {
                restored.push_str(tag);
                if chars.peek() == Some(&' ') {
                    chars.next();
                }
            }
            None => restored.extend(std::iter::repeat_n(marker, run)),
        }
    }

    restored
}
