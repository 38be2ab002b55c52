/// Machine Translation Relay
///
/// This module sends localization strings through a web relay for machine
/// translation while keeping their structure intact: markup, parameters and
/// no-translate regions survive the round trip, plural and specialization
/// variants are translated separately and merged back.
///
/// # Overview
///
/// The pipeline has several stages:
///
/// 1. **Tokenizer** - Swaps tags for sentinels the service leaves alone
/// 2. **Expansion** - Splits specializations and plural forms into plain sub-texts
/// 3. **Query Store** - Deduplicates sub-texts across target languages
/// 4. **Transports** - Scrape, form POST and batched GET, tried in that order
/// 5. **Scheduler** - Polls running jobs from the host's tick, or forces one
/// 6. **Rebuild** - Restores tags and merges variants back into one string
///
/// # Example
///
/// ```ignore
/// use locrelay::mt::{QueryStore, RelayConfig, Translator};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let mut translator = Translator::from_config(RelayConfig::from_env()?)?;
///
///     // One store, several languages: shared sub-texts are sent once
///     let mut store = QueryStore::new();
///     for target in ["fr", "de", "ru"] {
///         translator.create_queries("{[#n]} file[i2p_One]{[#n]} file", "en", target, &mut store);
///     }
///
///     let store = translator.force_translate(store)?;
///     println!("{}", translator.rebuild("{[#n]} file[i2p_One]{[#n]} file", &store, "ru"));
///     Ok(())
/// }
/// ```
pub mod backend;
pub mod classifier;
pub mod codec;
pub mod config;
pub mod error;
pub mod expansion;
pub mod job;
pub mod languages;
pub mod mock;
pub mod plural;
pub mod query;
pub mod rebuild;
pub mod scheduler;
pub mod specialization;
pub mod tokenizer;
pub mod translator;
pub mod transport;

#[cfg(test)]
mod integration_tests;

pub use backend::{HttpBackend, HttpRequest, ReqwestBackend};
pub use classifier::{PatternClassifier, ResponseClass, ResponseClassifier};
pub use config::RelayConfig;
pub use error::{MtError, MtResult};
pub use expansion::{ExpandedQuery, expand};
pub use job::{JobState, TranslationJob};
pub use languages::{AUTO_DETECT, LanguageCatalog};
pub use mock::{MockBackend, MockMode};
pub use plural::PluralCategory;
pub use query::{QueryStore, TranslationQuery, create_queries};
pub use rebuild::rebuild_translation;
pub use scheduler::{JobId, Scheduler};
pub use specialization::Specializations;
pub use tokenizer::{TokenizedText, restore, tokenize};
pub use translator::{Translator, validate_locale};
pub use transport::{TransportContext, TransportKind};
