//! One-shot configuration handshake with the hosting page.

use crate::error::WidgetError;
use std::time::Duration;
use supportchat_protocol::config::WidgetConfig;
use supportchat_protocol::frame::{InboundFrame, OutboundFrame};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Outbound half of the cross-document message bus. Posting is fire and
/// forget, mirroring `postMessage` semantics.
pub trait HostFrame: Send + Sync {
    fn post(&self, frame: OutboundFrame);
}

/// Negotiates the widget configuration with the host page.
///
/// Sends a configuration request immediately and resolves on the first
/// matching inbound frame. The wait is bounded: after `timeout` the request
/// is re-sent once, and exhausting both attempts is a hard
/// [`WidgetError::ConfigTimeout`] instead of a silent hang. Config frames
/// arriving after resolution are ignored; re-configuration is not supported.
pub struct ConfigChannel {
    timeout: Duration,
    attempts: u32,
}

pub const CONFIG_TIMEOUT: Duration = Duration::from_secs(5);

impl ConfigChannel {
    pub fn new() -> Self {
        Self {
            timeout: CONFIG_TIMEOUT,
            attempts: 2,
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            attempts: 2,
        }
    }

    pub async fn negotiate(
        &self,
        frame: &dyn HostFrame,
        inbound: &mut mpsc::UnboundedReceiver<InboundFrame>,
    ) -> crate::Result<WidgetConfig> {
        for attempt in 1..=self.attempts {
            frame.post(OutboundFrame::RequestConfig);
            match timeout(self.timeout, inbound.recv()).await {
                Ok(Some(InboundFrame::Config { config })) => {
                    debug!("configuration received from host page");
                    return Ok(config);
                }
                Ok(None) => return Err(WidgetError::ChannelClosed),
                Err(_) => warn!(attempt, "host page did not answer configuration request"),
            }
        }
        Err(WidgetError::ConfigTimeout)
    }
}

impl Default for ConfigChannel {
    fn default() -> Self {
        Self::new()
    }
}
