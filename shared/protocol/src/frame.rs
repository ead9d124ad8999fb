//! Cross-frame protocol between the widget iframe and its hosting page.

use crate::config::WidgetConfig;
use serde::{Deserialize, Serialize};

/// Iframe dimensions requested from the host on expansion.
pub const EXPANDED_WIDTH: &str = "400px";
pub const EXPANDED_HEIGHT: &str = "629px";

/// Messages posted from the widget to the hosting page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum OutboundFrame {
    #[serde(rename = "requestChatbotConfig")]
    RequestConfig,
    #[serde(rename = "initialized")]
    Initialized,
    #[serde(rename = "chatbotExpand")]
    Expand { width: String, height: String },
    #[serde(rename = "chatbotCollapse")]
    Collapse,
}

impl OutboundFrame {
    /// Expansion request carrying the widget's fixed expanded size.
    pub fn expand() -> Self {
        Self::Expand {
            width: EXPANDED_WIDTH.to_owned(),
            height: EXPANDED_HEIGHT.to_owned(),
        }
    }
}

/// Messages posted from the hosting page to the widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum InboundFrame {
    #[serde(rename = "chatbotConfig")]
    Config { config: WidgetConfig },
}
