//! Specialization blocks: `Default text[i2s_Touch]Tap here[i2s_Controller]Press A`
//!
//! Text before the first marker is the `Any` variant. Each marker opens a
//! named variant that runs until the next marker.

/// Prefix of a specialization marker
pub const SPECIALIZATION_MARKER_PREFIX: &str = "[i2s_";

/// Name of the variant that applies when no specialization matches
pub const DEFAULT_SPECIALIZATION: &str = "Any";

/// Specializations a localization source usually declares
pub const KNOWN_SPECIALIZATIONS: &[&str] = &[
    "Any",
    "PC",
    "Touch",
    "Controller",
    "VR",
    "XBox",
    "PS4",
    "PS5",
    "OculusVR",
    "ViveVR",
    "GearVR",
    "Android",
    "IOS",
    "Switch",
];

/// Ordered list of `(name, text)` variants, `Any` always first
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Specializations(pub Vec<(String, String)>);

impl Specializations {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(variant, _)| variant == name)
            .map(|(_, text)| text.as_str())
    }

    /// Insert or replace a variant, keeping first-seen order
    pub fn set(&mut self, name: &str, text: String) {
        match self.0.iter_mut().find(|(variant, _)| variant == name) {
            Some(entry) => entry.1 = text,
            None => self.0.push((name.to_string(), text)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .map(|(name, text)| (name.as_str(), text.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

pub fn has_specializations(text: &str) -> bool {
    text.contains(SPECIALIZATION_MARKER_PREFIX)
}

/// Split a text into its specialization variants.
///
/// A text without markers yields a single `Any` variant. An unterminated
/// marker is treated as plain text of the current variant.
pub fn split_specializations(text: &str) -> Specializations {
    let mut variants = Specializations::default();

    let Some(first) = text.find(SPECIALIZATION_MARKER_PREFIX) else {
        variants.set(DEFAULT_SPECIALIZATION, text.to_string());
        return variants;
    };
    variants.set(DEFAULT_SPECIALIZATION, text[..first].to_string());

    let mut start = first;
    loop {
        let name_start = start + SPECIALIZATION_MARKER_PREFIX.len();
        let Some(close) = text[name_start..].find(']').map(|pos| name_start + pos) else {
            // No closing bracket: fold the rest into the last variant
            if let Some(last) = variants.0.last_mut() {
                last.1.push_str(&text[start..]);
            }
            break;
        };
        let name = &text[name_start..close];
        let body_start = close + 1;
        let next = text[body_start..]
            .find(SPECIALIZATION_MARKER_PREFIX)
            .map(|pos| body_start + pos);
        let body_end = next.unwrap_or(text.len());

        if !KNOWN_SPECIALIZATIONS.contains(&name) {
            tracing::debug!(specialization = name, "undeclared specialization marker");
        }
        variants.set(name, text[body_start..body_end].to_string());

        match next {
            Some(pos) => start = pos,
            None => break,
        }
    }

    variants
}

/// Merge variants back into a single text.
///
/// `Any` is written first without a marker; empty named variants are dropped.
pub fn merge_specializations(variants: &Specializations) -> String {
    let mut merged = variants
        .get(DEFAULT_SPECIALIZATION)
        .unwrap_or_default()
        .to_string();

    for (name, text) in variants.iter() {
        if name == DEFAULT_SPECIALIZATION || text.is_empty() {
            continue;
        }
        merged.push_str(SPECIALIZATION_MARKER_PREFIX);
        merged.push_str(name);
        merged.push(']');
        merged.push_str(text);
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_without_markers() {
        let variants = split_specializations("Press start");
        assert_eq!(variants.len(), 1);
        assert_eq!(variants.get("Any"), Some("Press start"));
    }

    #[test]
    fn test_split_with_markers() {
        let variants = split_specializations("Click here[i2s_Touch]Tap here[i2s_Controller]Press A");
        assert_eq!(
            variants.0,
            vec![
                ("Any".to_string(), "Click here".to_string()),
                ("Touch".to_string(), "Tap here".to_string()),
                ("Controller".to_string(), "Press A".to_string()),
            ]
        );
    }

    #[test]
    fn test_split_marker_at_start() {
        let variants = split_specializations("[i2s_VR]Look around");
        assert_eq!(variants.get("Any"), Some(""));
        assert_eq!(variants.get("VR"), Some("Look around"));
    }

    #[test]
    fn test_split_unterminated_marker() {
        let variants = split_specializations("Hello[i2s_Touch");
        assert_eq!(variants.len(), 1);
        assert_eq!(variants.get("Any"), Some("Hello[i2s_Touch"));
    }

    #[test]
    fn test_merge_round_trip() {
        let text = "Click here[i2s_Touch]Tap here[i2s_Controller]Press A";
        assert_eq!(merge_specializations(&split_specializations(text)), text);
    }

    #[test]
    fn test_merge_drops_empty_variants() {
        let mut variants = Specializations::default();
        variants.set("Any", "Jump".to_string());
        variants.set("Touch", String::new());
        variants.set("PC", "Press space".to_string());
        assert_eq!(merge_specializations(&variants), "Jump[i2s_PC]Press space");
    }
}
