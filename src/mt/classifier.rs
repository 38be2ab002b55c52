//! Classification of raw relay responses
//!
//! The relay reports problems in-band: a downgraded service answers with an
//! HTML page, and throttling shows up as a sentence inside that page. What
//! counts as which is service specific, so it sits behind
//! [`ResponseClassifier`] and the default [`PatternClassifier`] keeps the known
//! signatures as plain data.

/// Outcome of inspecting a raw response before parsing it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseClass {
    /// Looks like a regular result payload
    Ok,
    /// The service answered with an error page or an error message
    ErrorPage(String),
    /// The service is throttling; the payload carries no results
    RateLimited(String),
}

/// Decides whether a raw relay response carries results
pub trait ResponseClassifier: Send + Sync {
    fn classify(&self, raw: &str) -> ResponseClass;
}

/// Signature-based classifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternClassifier {
    /// Case-insensitive prefixes of HTML error pages
    pub error_page_prefixes: Vec<String>,
    /// Substrings meaning the relay is not deployed or misconfigured
    pub error_markers: Vec<String>,
    /// Substrings meaning the relay is throttling requests
    pub rate_limit_markers: Vec<String>,
}

impl Default for PatternClassifier {
    fn default() -> Self {
        Self {
            error_page_prefixes: vec!["<!DOCTYPE html>".to_string(), "<html>".to_string()],
            error_markers: vec!["The script completed but did not return anything".to_string()],
            rate_limit_markers: vec!["Service invoked too many times in a short time".to_string()],
        }
    }
}

impl ResponseClassifier for PatternClassifier {
    fn classify(&self, raw: &str) -> ResponseClass {
        // Throttling messages arrive wrapped in an error page
        if let Some(marker) = self
            .rate_limit_markers
            .iter()
            .find(|marker| raw.contains(marker.as_str()))
        {
            return ResponseClass::RateLimited(marker.clone());
        }

        if let Some(marker) = self
            .error_markers
            .iter()
            .find(|marker| raw.contains(marker.as_str()))
        {
            return ResponseClass::ErrorPage(format!(
                "Relay is not deployed or its version is unsupported: {}",
                marker
            ));
        }

        let head = raw.trim_start();
        let is_error_page = self.error_page_prefixes.iter().any(|prefix| {
            head.get(..prefix.len())
                .is_some_and(|start| start.eq_ignore_ascii_case(prefix))
        });
        if is_error_page {
            return ResponseClass::ErrorPage("Relay returned an HTML error page".to_string());
        }

        ResponseClass::Ok
    }
}
