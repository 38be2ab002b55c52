//! Plural categories and per-language plural rules
//!
//! Languages are grouped into rule families (see
//! <https://developer.mozilla.org/en-US/docs/Mozilla/Localization/Localization_and_Plurals>).
//! The family decides which categories a language distinguishes and which
//! category a number selects; the expander uses it to pick representative
//! test numbers that force the translation service into each grammatical form.

use std::fmt;
use std::str::FromStr;

use super::error::MtError;
use super::languages::LanguageCatalog;

/// Prefix shared by every plural category marker, e.g. `[i2p_Few]`
pub const PLURAL_MARKER_PREFIX: &str = "[i2p_";

/// Grammatical plural category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PluralCategory {
    Zero,
    One,
    Two,
    Few,
    Many,
    /// The default form, used when no other category applies
    Plural,
}

impl PluralCategory {
    /// All categories, from `Zero` to `Plural`
    pub const ALL: [PluralCategory; 6] = [
        PluralCategory::Zero,
        PluralCategory::One,
        PluralCategory::Two,
        PluralCategory::Few,
        PluralCategory::Many,
        PluralCategory::Plural,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PluralCategory::Zero => "Zero",
            PluralCategory::One => "One",
            PluralCategory::Two => "Two",
            PluralCategory::Few => "Few",
            PluralCategory::Many => "Many",
            PluralCategory::Plural => "Plural",
        }
    }

    /// Marker introducing this category's text, e.g. `[i2p_Few]`
    pub fn marker(self) -> String {
        format!("{}{}]", PLURAL_MARKER_PREFIX, self.as_str())
    }

    /// Candidate numbers tried, in order, when looking for a test value
    fn test_candidates(self) -> &'static [u32] {
        match self {
            PluralCategory::Zero => &[0],
            PluralCategory::One => &[1],
            PluralCategory::Two => &[2, 22, 102],
            PluralCategory::Few => &[3, 4, 23],
            PluralCategory::Many => &[6, 8, 13, 11, 1_000_000],
            PluralCategory::Plural => &[936, 100, 1000, 25],
        }
    }
}

impl fmt::Display for PluralCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PluralCategory {
    type Err = MtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PluralCategory::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| MtError::Other(format!("Unknown plural category '{}'", s)))
    }
}

/// A category supported by a language together with a number that selects it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PluralForm {
    pub category: PluralCategory,
    pub test_value: u32,
}

fn in_range(n: u32, min: u32, max: u32) -> bool {
    n >= min && n <= max
}

/// Category selected by the number `n` in language `lang`
pub fn category_for(catalog: &LanguageCatalog, lang: &str, n: u32) -> PluralCategory {
    use PluralCategory::*;

    if n == 0 {
        return Zero;
    }
    if n == 1 {
        return One;
    }

    match catalog.plural_rule(lang) {
        // Asian, Persian, Turkic, Thai, Lao
        0 => Plural,
        // Germanic, Finno-Ugric, most Romance languages
        1 => Plural,
        // French, Brazilian Portuguese (0 and 1 handled above)
        2 => Plural,
        // Scottish Gaelic
        3 => {
            if n == 11 {
                One
            } else if n == 2 || n == 12 {
                Two
            } else if in_range(n, 3, 10) || in_range(n, 13, 19) {
                Few
            } else {
                Plural
            }
        }
        // Romanian
        4 => {
            if in_range(n % 100, 1, 19) {
                Few
            } else {
                Plural
            }
        }
        // Latvian, Lithuanian
        5 => {
            if n % 10 == 1 && n % 100 != 11 {
                One
            } else if n % 10 >= 2 && (n % 100 < 10 || n % 100 >= 20) {
                Few
            } else {
                Plural
            }
        }
        // Belarusian, Bosnian, Croatian, Serbian, Russian, Ukrainian
        6 => {
            if n % 10 == 1 && n % 100 != 11 {
                One
            } else if in_range(n % 10, 2, 4) && !in_range(n % 100, 12, 14) {
                Few
            } else {
                Plural
            }
        }
        // Slovak, Czech
        7 => {
            if in_range(n, 2, 4) {
                Few
            } else {
                Plural
            }
        }
        // Polish
        8 => {
            if in_range(n % 10, 2, 4) && !in_range(n % 100, 12, 14) {
                Few
            } else {
                Plural
            }
        }
        // Slovenian, Sorbian
        9 => {
            if n % 100 == 1 {
                One
            } else if n % 100 == 2 {
                Two
            } else if in_range(n % 100, 3, 4) {
                Few
            } else {
                Plural
            }
        }
        // Irish
        10 => {
            if n == 2 {
                Two
            } else if in_range(n, 3, 6) {
                Few
            } else if in_range(n, 7, 10) {
                Many
            } else {
                Plural
            }
        }
        // Arabic
        11 => {
            if n == 2 {
                Two
            } else if in_range(n % 100, 3, 10) {
                Few
            } else if n % 100 >= 11 {
                Many
            } else {
                Plural
            }
        }
        // Maltese
        12 => {
            if in_range(n % 100, 1, 10) {
                Few
            } else if in_range(n % 100, 11, 19) {
                Many
            } else {
                Plural
            }
        }
        // Macedonian
        13 => {
            if n % 10 == 1 {
                One
            } else if n % 10 == 2 {
                Two
            } else {
                Plural
            }
        }
        // Icelandic
        14 => {
            if n % 10 == 1 && n % 100 != 11 {
                One
            } else {
                Plural
            }
        }
        // Breton
        15 => {
            let (m10, m100) = (n % 10, n % 100);
            if m10 == 1 && ![11, 71, 91].contains(&m100) {
                One
            } else if m10 == 2 && ![12, 72, 92].contains(&m100) {
                Two
            } else if [3, 4, 9].contains(&m10)
                && ![13, 14, 19, 73, 74, 79, 93, 94, 99].contains(&m100)
            {
                Few
            } else if n % 1_000_000 == 0 {
                Many
            } else {
                Plural
            }
        }
        // Welsh
        16 => match n {
            2 => Two,
            3 => Few,
            6 => Many,
            _ => Plural,
        },
        _ => Plural,
    }
}

/// Whether `lang` distinguishes `category`.
///
/// `Zero`, `One` and `Plural` are always available; the remaining
/// categories depend on the rule family.
pub fn language_has_category(
    catalog: &LanguageCatalog,
    lang: &str,
    category: PluralCategory,
) -> bool {
    use PluralCategory::*;

    if matches!(category, Zero | One | Plural) {
        return true;
    }

    match catalog.plural_rule(lang) {
        3 | 9 => matches!(category, Two | Few),
        4..=8 => category == Few,
        10 | 11 | 15 | 16 => matches!(category, Two | Few | Many),
        12 => matches!(category, Few | Many),
        13 => category == Two,
        _ => false,
    }
}

/// A number that selects `category` in `lang`.
///
/// Falls back to the first candidate when the language never selects the
/// category (the value is then only used for categories the caller skips).
pub fn test_number(catalog: &LanguageCatalog, lang: &str, category: PluralCategory) -> u32 {
    let candidates = category.test_candidates();
    candidates
        .iter()
        .copied()
        .find(|&n| category_for(catalog, lang, n) == category)
        .unwrap_or(candidates[0])
}

/// Every category `lang` distinguishes, from `Zero` to `Plural`, with its test value
pub fn plural_forms_for_language(catalog: &LanguageCatalog, lang: &str) -> Vec<PluralForm> {
    PluralCategory::ALL
        .into_iter()
        .filter(|&category| language_has_category(catalog, lang, category))
        .map(|category| PluralForm {
            category,
            test_value: test_number(catalog, lang, category),
        })
        .collect()
}
