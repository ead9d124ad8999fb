//! Widget configuration negotiated with the hosting page.

use crate::TenantCode;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Visual theme requested by the host page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// Host-supplied widget configuration.
///
/// Produced exactly once by the cross-frame handshake and immutable for the
/// page lifetime. Field names follow the cross-frame wire format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetConfig {
    pub backend_url: String,
    pub socket_io_url: String,
    pub chatbot_code: TenantCode,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub gradient1: String,
    #[serde(default)]
    pub gradient2: String,
    #[serde(default)]
    pub header_text: String,
    /// Translation table keyed by the English source phrase.
    #[serde(default)]
    pub translated_phrases: HashMap<String, String>,
    /// Expand the widget immediately after initialization.
    #[serde(default)]
    pub auto_open: bool,
    /// When false the footer tabs are disabled and the widget is pinned to
    /// the messages tab.
    #[serde(default = "default_true")]
    pub tabs_mode: bool,
}

fn default_true() -> bool {
    true
}

impl WidgetConfig {
    /// Looks up the translation for a source phrase, falling back to the
    /// phrase itself when no translation exists.
    pub fn phrase<'a>(&'a self, key: &'a str) -> &'a str {
        self.translated_phrases
            .get(key)
            .map(String::as_str)
            .unwrap_or(key)
    }
}
