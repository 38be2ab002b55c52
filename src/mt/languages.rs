//! Language catalog used by the relay pipeline
//!
//! Maps the language codes used by callers to the codes understood by the
//! translation service and records the plural rule family of each language.
//! The catalog is an explicit value: callers that own their own language
//! data can override plural rules and service codes per code.

use std::collections::HashMap;

/// Source language sentinel asking the service to detect the language
pub const AUTO_DETECT: &str = "auto";

/// How a language code is presented to the translation service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceCode {
    /// The service accepts the code as-is
    Same,
    /// The service only knows a close relative of this language
    Mapped(&'static str),
    /// The service cannot translate into or from this language
    Unsupported,
}

/// One row of the built-in language table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageDef {
    /// Display name, with region variants written as `Base/Region`
    pub name: &'static str,
    /// International code (e.g. `en`, `pt-BR`)
    pub code: &'static str,
    pub service_code: ServiceCode,
    /// Plural rule family id, see [`crate::mt::plural`]
    pub plural_rule: u8,
    /// Scripts written without spaces between words
    pub joined_words: bool,
}

const fn lang(name: &'static str, code: &'static str, plural_rule: u8) -> LanguageDef {
    LanguageDef {
        name,
        code,
        service_code: ServiceCode::Same,
        plural_rule,
        joined_words: false,
    }
}

const fn mapped(
    name: &'static str,
    code: &'static str,
    service: &'static str,
    plural_rule: u8,
) -> LanguageDef {
    LanguageDef {
        name,
        code,
        service_code: ServiceCode::Mapped(service),
        plural_rule,
        joined_words: false,
    }
}

const fn unsupported(name: &'static str, code: &'static str, plural_rule: u8) -> LanguageDef {
    LanguageDef {
        name,
        code,
        service_code: ServiceCode::Unsupported,
        plural_rule,
        joined_words: false,
    }
}

const fn joined(name: &'static str, code: &'static str, service_code: ServiceCode) -> LanguageDef {
    LanguageDef {
        name,
        code,
        service_code,
        plural_rule: 0,
        joined_words: true,
    }
}

/// Built-in language table
pub static LANGUAGES: &[LanguageDef] = &[
    unsupported("Abkhazian", "ab", 1),
    unsupported("Afar", "aa", 1),
    lang("Afrikaans", "af", 1),
    unsupported("Akan", "ak", 1),
    lang("Albanian", "sq", 1),
    lang("Amharic", "am", 1),
    lang("Arabic", "ar", 11),
    mapped("Arabic/Algeria", "ar-DZ", "ar", 11),
    mapped("Arabic/Bahrain", "ar-BH", "ar", 11),
    mapped("Arabic/Egypt", "ar-EG", "ar", 11),
    mapped("Arabic/Iraq", "ar-IQ", "ar", 11),
    mapped("Arabic/Jordan", "ar-JO", "ar", 11),
    mapped("Arabic/Kuwait", "ar-KW", "ar", 11),
    mapped("Arabic/Lebanon", "ar-LB", "ar", 11),
    mapped("Arabic/Morocco", "ar-MA", "ar", 11),
    mapped("Arabic/Saudi Arabia", "ar-SA", "ar", 11),
    mapped("Arabic/U.A.E.", "ar-AE", "ar", 11),
    unsupported("Aragonese", "an", 1),
    lang("Armenian", "hy", 1),
    unsupported("Assamese", "as", 1),
    lang("Azerbaijani", "az", 1),
    lang("Basque", "eu", 1),
    mapped("Basque/Spain", "eu-ES", "eu", 1),
    lang("Belarusian", "be", 6),
    lang("Bengali", "bn", 1),
    lang("Bosnian", "bs", 6),
    unsupported("Breton", "br", 1),
    lang("Bulgarian", "bg", 1),
    lang("Burmese", "my", 1),
    lang("Catalan", "ca", 1),
    lang("Chichewa", "ny", 1),
    joined("Chinese", "zh", ServiceCode::Mapped("zh-CN")),
    joined("Chinese/Hong Kong", "zh-HK", ServiceCode::Mapped("zh-TW")),
    joined("Chinese/Macau", "zh-MO", ServiceCode::Mapped("zh-CN")),
    joined("Chinese/PRC", "zh-CN", ServiceCode::Same),
    joined("Chinese/Singapore", "zh-SG", ServiceCode::Mapped("zh-CN")),
    joined("Chinese/Taiwan", "zh-TW", ServiceCode::Same),
    unsupported("Cornish", "kw", 1),
    lang("Corsican", "co", 1),
    lang("Croatian", "hr", 6),
    mapped("Croatian/Bosnia and Herzegovina", "hr-BA", "hr", 5),
    lang("Czech", "cs", 7),
    lang("Danish", "da", 1),
    unsupported("Divehi", "dv", 1),
    lang("Dutch", "nl", 1),
    mapped("Dutch/Belgium", "nl-BE", "nl", 1),
    mapped("Dutch/Netherlands", "nl-NL", "nl", 1),
    lang("English", "en", 1),
    mapped("English/Australia", "en-AU", "en", 1),
    mapped("English/Canada", "en-CA", "en", 1),
    mapped("English/Ireland", "en-IE", "en", 1),
    mapped("English/New Zealand", "en-NZ", "en", 1),
    mapped("English/South Africa", "en-ZA", "en", 1),
    mapped("English/United Kingdom", "en-GB", "en", 1),
    mapped("English/United States", "en-US", "en", 1),
    lang("Esperanto", "eo", 1),
    lang("Estonian", "et", 1),
    unsupported("Faeroese", "fo", 1),
    unsupported("Fijian", "fj", 1),
    lang("Finnish", "fi", 1),
    lang("French", "fr", 2),
    mapped("French/Belgium", "fr-BE", "fr", 2),
    mapped("French/Canada", "fr-CA", "fr", 2),
    mapped("French/France", "fr-FR", "fr", 2),
    mapped("French/Switzerland", "fr-CH", "fr", 2),
    lang("Frisian", "fy", 1),
    lang("Galician", "gl", 1),
    mapped("Galician/Spain", "gl-ES", "gl", 1),
    lang("Georgian", "ka", 0),
    lang("German", "de", 1),
    mapped("German/Austria", "de-AT", "de", 1),
    mapped("German/Germany", "de-DE", "de", 1),
    mapped("German/Switzerland", "de-CH", "de", 1),
    lang("Greek", "el", 1),
    lang("Gujarati", "gu", 1),
    lang("Haitian", "ht", 1),
    lang("Hausa", "ha", 1),
    mapped("Hebrew", "he", "iw", 1),
    lang("Hindi", "hi", 1),
    lang("Hungarian", "hu", 1),
    lang("Icelandic", "is", 14),
    lang("Igbo", "ig", 1),
    lang("Indonesian", "id", 0),
    lang("Irish", "ga", 10),
    lang("Italian", "it", 1),
    mapped("Italian/Italy", "it-IT", "it", 1),
    mapped("Italian/Switzerland", "it-CH", "it", 1),
    joined("Japanese", "ja", ServiceCode::Same),
    lang("Javanese", "jv", 1),
    lang("Kannada", "kn", 1),
    lang("Kazakh", "kk", 1),
    lang("Central Khmer", "km", 1),
    unsupported("Kinyarwanda", "rw", 1),
    lang("Kirghiz", "ky", 1),
    lang("Korean", "ko", 0),
    lang("Kurdish", "ku", 1),
    lang("Lao", "lo", 1),
    lang("Latin", "la", 1),
    lang("Latvian", "lv", 5),
    lang("Lithuanian", "lt", 5),
    lang("Luxembourgish", "lb", 1),
    lang("Macedonian", "mk", 13),
    lang("Malagasy", "mg", 1),
    lang("Malay", "ms", 0),
    mapped("Malay/Malaysia", "ms-MY", "ms", 0),
    lang("Malayalam", "ml", 1),
    lang("Maltese", "mt", 12),
    lang("Maori", "mi", 2),
    lang("Marathi", "mr", 1),
    lang("Mongolian", "mn", 1),
    lang("Nepali", "ne", 1),
    mapped("Northern Sotho", "ns", "st", 1),
    mapped("Norwegian", "nb", "no", 1),
    mapped("Norwegian/Nynorsk", "nn", "no", 1),
    unsupported("Occitan", "oc", 1),
    lang("Pashto", "ps", 1),
    lang("Persian", "fa", 0),
    lang("Polish", "pl", 8),
    lang("Portuguese", "pt", 1),
    mapped("Portuguese/Brazil", "pt-BR", "pt", 2),
    mapped("Portuguese/Portugal", "pt-PT", "pt", 1),
    lang("Punjabi", "pa", 1),
    unsupported("Quechua", "qu", 1),
    mapped("Rhaeto-Romanic", "rm", "ro", 1),
    lang("Romanian", "ro", 4),
    lang("Russian", "ru", 6),
    mapped("Russian/Republic of Moldova", "ru-MO", "ru", 6),
    lang("Samoan", "sm", 1),
    unsupported("Sanskrit", "sa", 1),
    lang("Scottish Gaelic", "gd", 1),
    lang("Serbian", "sr", 6),
    mapped("Serbian/Bosnia and Herzegovina", "sr-BA", "sr", 5),
    lang("Shona", "sn", 1),
    lang("Sindhi", "sd", 1),
    lang("Sinhala", "si", 1),
    lang("Slovak", "sk", 7),
    lang("Slovenian", "sl", 9),
    lang("Somali", "so", 1),
    lang("Southern Sotho", "st", 1),
    lang("Spanish", "es", 1),
    mapped("Spanish/Argentina", "es-AR", "es", 1),
    mapped("Spanish/Castilian", "es-ES", "es", 1),
    mapped("Spanish/Chile", "es-CL", "es", 1),
    mapped("Spanish/Colombia", "es-CO", "es", 1),
    mapped("Spanish/Mexico", "es-MX", "es", 1),
    mapped("Spanish/Latin Americas", "es-US", "es", 1),
    lang("Sundanese", "su", 1),
    lang("Swahili", "sw", 0),
    lang("Swedish", "sv", 1),
    mapped("Swedish/Finland", "sv-FI", "sv", 1),
    mapped("Swedish/Sweden", "sv-SE", "sv", 1),
    lang("Tagalog", "tl", 1),
    lang("Tajik", "tg", 1),
    lang("Tamil", "ta", 1),
    unsupported("Tatar", "tt", 0),
    lang("Telugu", "te", 1),
    joined("Thai", "th", ServiceCode::Same),
    unsupported("Tibetan", "bo", 1),
    lang("Turkish", "tr", 0),
    lang("Ukrainian", "uk", 6),
    lang("Urdu", "ur", 1),
    lang("Uzbek", "uz", 2),
    lang("Vietnamese", "vi", 1),
    lang("Welsh", "cy", 16),
    unsupported("Wolof", "wo", 1),
    lang("Xhosa", "xh", 1),
    lang("Yiddish", "yi", 1),
    lang("Yoruba", "yo", 1),
    unsupported("Zhuang", "za", 1),
    lang("Zulu", "zu", 1),
];

/// Language data consulted by the expander, the codec and the rebuilder
#[derive(Debug, Clone, Default)]
pub struct LanguageCatalog {
    plural_overrides: HashMap<String, u8>,
    service_overrides: HashMap<String, Option<String>>,
}

impl LanguageCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the plural rule family of a language code
    pub fn with_plural_rule(mut self, code: &str, rule: u8) -> Self {
        self.plural_overrides.insert(code.to_lowercase(), rule);
        self
    }

    /// Override the service code of a language; `None` marks it unsupported
    pub fn with_service_code(mut self, code: &str, service_code: Option<&str>) -> Self {
        self.service_overrides
            .insert(code.to_string(), service_code.map(str::to_string));
        self
    }

    fn find(code: &str) -> Option<&'static LanguageDef> {
        LANGUAGES.iter().find(|def| def.code == code)
    }

    /// Code understood by the translation service, or `None` when the
    /// language cannot be translated. Codes missing from the table are passed
    /// through unchanged.
    pub fn service_code(&self, code: &str) -> Option<String> {
        if code == AUTO_DETECT {
            return Some(AUTO_DETECT.to_string());
        }
        if let Some(overridden) = self.service_overrides.get(code) {
            return overridden.clone();
        }
        match Self::find(code).map(|def| def.service_code) {
            Some(ServiceCode::Unsupported) => None,
            Some(ServiceCode::Mapped(service)) => Some(service.to_string()),
            Some(ServiceCode::Same) | None => Some(code.to_string()),
        }
    }

    /// Plural rule family for a language; only the base language is consulted
    /// and unknown languages fall back to family 0 (no plural distinction).
    pub fn plural_rule(&self, code: &str) -> u8 {
        let lower = code.to_lowercase();
        if let Some(rule) = self.plural_overrides.get(&lower) {
            return *rule;
        }
        let base: String = lower.chars().take(2).collect();
        if let Some(rule) = self.plural_overrides.get(&base) {
            return *rule;
        }
        Self::find(&base).map(|def| def.plural_rule).unwrap_or(0)
    }

    /// Whether the script of this language does not separate words with spaces
    pub fn has_joined_words(&self, code: &str) -> bool {
        LANGUAGES
            .iter()
            .find(|def| {
                def.code == code
                    || matches!(def.service_code, ServiceCode::Mapped(service) if service == code)
            })
            .map(|def| def.joined_words)
            .unwrap_or(false)
    }

    /// Display name of a code, dropping the region when the exact code is unknown
    pub fn language_name(&self, code: &str) -> Option<&'static str> {
        if let Some(def) = Self::find(code) {
            return Some(def.name);
        }
        let (base, _) = code.split_once('-')?;
        Self::find(base).map(|def| def.name)
    }

    /// First code whose language name contains every word of the filter.
    ///
    /// `"Engl Unit"` matches `"English/United Kingdom"`.
    pub fn code_for_name(&self, filter: &str) -> Option<&'static str> {
        let filters: Vec<String> = filter
            .to_lowercase()
            .split(|c: char| " /(),".contains(c))
            .filter(|part| !part.is_empty())
            .map(str::to_string)
            .collect();
        if filters.is_empty() {
            return None;
        }
        LANGUAGES
            .iter()
            .find(|def| name_matches_filter(def.name, &filters))
            .map(|def| def.code)
    }
}

fn name_matches_filter(name: &str, filters: &[String]) -> bool {
    let mut remaining = name.to_lowercase();
    for filter in filters {
        match remaining.find(filter.as_str()) {
            Some(pos) => remaining.replace_range(pos..pos + filter.len(), ""),
            None => return false,
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_code_same() {
        let catalog = LanguageCatalog::new();
        assert_eq!(catalog.service_code("fr").as_deref(), Some("fr"));
        assert_eq!(catalog.service_code("ja").as_deref(), Some("ja"));
    }

    #[test]
    fn test_service_code_mapped() {
        let catalog = LanguageCatalog::new();
        assert_eq!(catalog.service_code("he").as_deref(), Some("iw"));
        assert_eq!(catalog.service_code("zh").as_deref(), Some("zh-CN"));
        assert_eq!(catalog.service_code("pt-BR").as_deref(), Some("pt"));
    }

    #[test]
    fn test_service_code_unsupported_and_unknown() {
        let catalog = LanguageCatalog::new();
        assert_eq!(catalog.service_code("ab"), None);
        assert_eq!(catalog.service_code("xx-YY").as_deref(), Some("xx-YY"));
        assert_eq!(catalog.service_code(AUTO_DETECT).as_deref(), Some("auto"));
    }

    #[test]
    fn test_service_code_override() {
        let catalog = LanguageCatalog::new()
            .with_service_code("fr", None)
            .with_service_code("ab", Some("ab"));
        assert_eq!(catalog.service_code("fr"), None);
        assert_eq!(catalog.service_code("ab").as_deref(), Some("ab"));
    }

    #[test]
    fn test_plural_rule_uses_base_language() {
        let catalog = LanguageCatalog::new();
        assert_eq!(catalog.plural_rule("en"), 1);
        assert_eq!(catalog.plural_rule("ru"), 6);
        assert_eq!(catalog.plural_rule("ar-EG"), 11);
        assert_eq!(catalog.plural_rule("FR"), 2);
        assert_eq!(catalog.plural_rule("xx"), 0);
    }

    #[test]
    fn test_plural_rule_override() {
        let catalog = LanguageCatalog::new().with_plural_rule("en", 7);
        assert_eq!(catalog.plural_rule("en"), 7);
        assert_eq!(catalog.plural_rule("en-GB"), 7);
    }

    #[test]
    fn test_joined_words() {
        let catalog = LanguageCatalog::new();
        assert!(catalog.has_joined_words("ja"));
        assert!(catalog.has_joined_words("zh-CN"));
        assert!(!catalog.has_joined_words("en"));
    }

    #[test]
    fn test_language_name() {
        let catalog = LanguageCatalog::new();
        assert_eq!(catalog.language_name("de"), Some("German"));
        assert_eq!(catalog.language_name("de-AT"), Some("German/Austria"));
        assert_eq!(catalog.language_name("de-XX"), Some("German"));
        assert_eq!(catalog.language_name("qq"), None);
    }

    #[test]
    fn test_code_for_name_filter() {
        let catalog = LanguageCatalog::new();
        assert_eq!(catalog.code_for_name("Engl Unit"), Some("en-GB"));
        assert_eq!(catalog.code_for_name("english united states"), Some("en-US"));
        assert_eq!(catalog.code_for_name("French"), Some("fr"));
        assert_eq!(catalog.code_for_name(""), None);
        assert_eq!(catalog.code_for_name("Klingon"), None);
    }
}
