//! Machine translation relay for structured localization strings.
//!
//! Localization texts carry markup, parameters, plural blocks and platform
//! specializations that a translation service would mangle. `locrelay`
//! protects that structure, sends each distinct plain sub-text once through a
//! fallback chain of web transports, and rebuilds the translated strings.
//!
//! See [`mt::Translator`] for the entry point.

pub mod mt;

pub use mt::{MtError, MtResult, QueryStore, RelayConfig, Translator};
