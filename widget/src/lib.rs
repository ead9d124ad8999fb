//! Client-side session/view state machine for the SupportChat embeddable
//! widget.
//!
//! The widget reconciles three asynchronous input streams (the one-shot
//! cross-frame configuration handshake, REST responses and realtime push
//! events) into one consistent UI state, expressed as a typed effect stream
//! the embedding shell applies to the DOM.

pub mod api;
pub mod deeplink;
pub mod effects;
pub mod error;
pub mod handshake;
pub mod markdown;
pub mod router;
pub mod session;
pub mod storage;
pub mod stream;
pub mod transcript;
pub mod widget;

pub use error::{Result, WidgetError};
pub use widget::{SupportWidget, UserAction, WidgetDeps};
