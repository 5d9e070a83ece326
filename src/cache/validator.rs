//! Render completeness checks.

use crate::config::ValidatorConfig;

/// Detects truncated or placeholder renders.
pub trait ContentValidator: Send + Sync {
    fn looks_properly_rendered(&self, html: &str) -> bool;
}

/// Marker-based HTML validator.
///
/// A body is accepted when it is long enough, contains every required marker
/// and none of the placeholder markers. Marker matching ignores ASCII case.
#[derive(Debug, Clone)]
pub struct HtmlValidator {
    min_body_bytes: usize,
    required_markers: Vec<String>,
    placeholder_markers: Vec<String>,
}

impl HtmlValidator {
    pub fn from_config(config: &ValidatorConfig) -> Self {
        Self {
            min_body_bytes: config.min_body_bytes,
            required_markers: lowercase_all(&config.required_markers),
            placeholder_markers: lowercase_all(&config.placeholder_markers),
        }
    }
}

fn lowercase_all(markers: &[String]) -> Vec<String> {
    markers.iter().map(|m| m.to_ascii_lowercase()).collect()
}

impl ContentValidator for HtmlValidator {
    fn looks_properly_rendered(&self, html: &str) -> bool {
        if html.trim().len() < self.min_body_bytes {
            return false;
        }

        let lowered = html.to_ascii_lowercase();
        self.required_markers.iter().all(|m| lowered.contains(m.as_str()))
            && !self.placeholder_markers.iter().any(|m| lowered.contains(m.as_str()))
    }
}
