//! View and tab routing, including the phased transition choreography.

use crate::effects::{EffectSink, UiEffect};
use crate::handshake::HostFrame;
use crate::session::SessionContext;
use std::sync::Arc;
use std::time::Duration;
use supportchat_protocol::config::WidgetConfig;
use supportchat_protocol::frame::OutboundFrame;
use tracing::debug;

/// Panels within the messages/help tabs; exactly one is visible at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Email,
    Conversations,
    Chat,
    Articles,
    ArticleContent,
}

impl View {
    pub fn name(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Conversations => "conversations",
            Self::Chat => "chat",
            Self::Articles => "articles",
            Self::ArticleContent => "articleContent",
        }
    }
}

/// Top-level sections selected by the footer tabs; orthogonal to [`View`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Home,
    Messages,
    Help,
}

impl Tab {
    pub fn name(self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Messages => "messages",
            Self::Help => "help",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "home" => Some(Self::Home),
            "messages" => Some(Self::Messages),
            "help" => Some(Self::Help),
            _ => None,
        }
    }
}

/// Slide origin of a view transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
}

/// Title/description for views whose header is content-derived.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeaderProps {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackButton {
    ToConversations,
    ToArticles,
}

/// Header content and footer visibility, derived purely from the view.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderState {
    pub title: String,
    pub subtitle: String,
    pub back: Option<BackButton>,
    pub footer_visible: bool,
}

impl HeaderState {
    pub fn for_view(view: View, config: &WidgetConfig, props: &HeaderProps) -> Self {
        let phrase = |key: &str| config.phrase(key).to_owned();
        let (title, subtitle, back) = match view {
            View::Email => (
                config.header_text.clone(),
                phrase("We're here to help!"),
                None,
            ),
            View::Conversations => (
                phrase("Your Conversations"),
                phrase("Select a chat or start new one"),
                None,
            ),
            View::Chat => (
                phrase("Live Chat"),
                phrase("Connected with support"),
                Some(BackButton::ToConversations),
            ),
            View::Articles => (
                phrase("Help & Support"),
                phrase("Find answers to common questions and get help with using our platform."),
                None,
            ),
            View::ArticleContent => (
                props.title.clone(),
                props.description.clone(),
                Some(BackButton::ToArticles),
            ),
        };
        let footer_visible = config.tabs_mode
            && matches!(view, View::Email | View::Conversations | View::Articles);
        Self {
            title,
            subtitle,
            back,
            footer_visible,
        }
    }
}

/// Time for the outgoing views to fade out and leave layout.
pub const FADE_OUT: Duration = Duration::from_millis(200);
/// Time for the mounted view to reach its steady state.
pub const FADE_IN_SETTLE: Duration = Duration::from_millis(50);
/// Additional time before the footer finishes fading in.
pub const FOOTER_FADE: Duration = Duration::from_millis(50);

/// Phases of one view transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionPhase {
    Idle,
    FadingOut,
    Switching,
    FadingIn,
    Settled,
}

/// Ticket identifying one requested transition; stale tickets are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    epoch: u64,
}

/// Next step for the transition driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Wait(Duration),
    Done,
    Superseded,
}

#[derive(Debug, Clone)]
struct PendingTransition {
    view: View,
    direction: Direction,
    header: HeaderState,
}

/// Finite-state controller over views and tabs.
pub struct ViewRouter {
    config: Arc<WidgetConfig>,
    effects: EffectSink,
    phase: TransitionPhase,
    epoch: u64,
    pending: Option<PendingTransition>,
}

impl ViewRouter {
    pub fn new(config: Arc<WidgetConfig>, effects: EffectSink) -> Self {
        Self {
            config,
            effects,
            phase: TransitionPhase::Idle,
            epoch: 0,
            pending: None,
        }
    }

    pub fn phase(&self) -> TransitionPhase {
        self.phase
    }

    /// Requests a transition and emits the fade-out of whatever is visible.
    ///
    /// A request issued while another transition is in flight supersedes it:
    /// the stale transition aborts at its next phase boundary and the latest
    /// target wins.
    pub fn request(
        &mut self,
        view: View,
        direction: Direction,
        props: HeaderProps,
    ) -> Transition {
        if self.pending.is_some() {
            debug!(view = view.name(), "coalescing view transition");
        }
        self.epoch += 1;
        let header = HeaderState::for_view(view, &self.config, &props);
        self.pending = Some(PendingTransition {
            view,
            direction,
            header,
        });
        self.phase = TransitionPhase::FadingOut;
        self.effects.emit(UiEffect::FadeOutViews { direction });
        Transition { epoch: self.epoch }
    }

    /// Advances a transition one phase after its timer elapsed.
    pub fn advance(&mut self, session: &mut SessionContext, ticket: Transition) -> Step {
        if ticket.epoch != self.epoch {
            return Step::Superseded;
        }
        match self.phase {
            TransitionPhase::Idle | TransitionPhase::Settled => Step::Done,
            TransitionPhase::FadingOut => {
                let Some(pending) = &self.pending else {
                    return Step::Done;
                };
                session.current_view = pending.view;
                self.effects.emit(UiEffect::MountView {
                    view: pending.view,
                    direction: pending.direction,
                    header: pending.header.clone(),
                });
                self.phase = TransitionPhase::Switching;
                Step::Wait(FADE_IN_SETTLE)
            }
            TransitionPhase::Switching => {
                let Some(pending) = &self.pending else {
                    return Step::Done;
                };
                self.effects.emit(UiEffect::SettleView { view: pending.view });
                self.phase = TransitionPhase::FadingIn;
                Step::Wait(FOOTER_FADE)
            }
            TransitionPhase::FadingIn => {
                if let Some(pending) = self.pending.take() {
                    if pending.header.footer_visible {
                        self.effects.emit(UiEffect::ShowFooter { view: pending.view });
                    }
                    if pending.view == View::Chat {
                        self.effects
                            .emit(UiEffect::SetInputVisible(session.input_visible));
                    }
                }
                self.phase = TransitionPhase::Settled;
                Step::Done
            }
        }
    }

    /// Runs a transition to completion on the timer cadence.
    pub async fn show(
        &mut self,
        session: &mut SessionContext,
        view: View,
        direction: Direction,
        props: HeaderProps,
    ) {
        let ticket = self.request(view, direction, props);
        let mut wait = FADE_OUT;
        loop {
            tokio::time::sleep(wait).await;
            match self.advance(session, ticket) {
                Step::Wait(next) => wait = next,
                Step::Done | Step::Superseded => break,
            }
        }
    }

    /// Widget expansion is a separate two-state machine: it notifies the
    /// host of the desired iframe size and, on collapse, forces the tab back
    /// home.
    pub fn set_expanded(
        &mut self,
        session: &mut SessionContext,
        frame: &dyn HostFrame,
        expanded: bool,
    ) {
        if session.expanded == expanded {
            return;
        }
        session.expanded = expanded;
        if expanded {
            frame.post(OutboundFrame::expand());
        } else {
            frame.post(OutboundFrame::Collapse);
            if self.config.tabs_mode {
                self.force_tab(session, Tab::Home);
            }
        }
    }

    /// Activates a tab panel without view choreography.
    pub fn force_tab(&mut self, session: &mut SessionContext, tab: Tab) {
        session.current_tab = tab;
        self.effects.emit(UiEffect::SetActiveTab(tab));
        self.effects
            .emit(UiEffect::SetHeaderVisible(tab != Tab::Home));
    }
}
