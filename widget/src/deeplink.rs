//! Deep-link resolution: drives the router and stream to an encoded target
//! state, expanding the widget first when needed.

use crate::effects::UiEffect;
use crate::router::{Direction, HeaderProps, Tab, View};
use crate::widget::SupportWidget;
use supportchat_protocol::deeplink::{DeepLink, UrlTarget};
use supportchat_protocol::{ArticleId, ConversationId};
use tracing::warn;

impl SupportWidget {
    /// Resolves an encoded deep link string.
    ///
    /// Malformed strings are logged and produce no state change. URL links
    /// are forwarded to the shell; internal triples expand the widget,
    /// switch to the target tab and resolve the view once the switch has
    /// settled.
    pub async fn handle_deep_link(&mut self, raw: &str) {
        let link = match DeepLink::parse(raw) {
            Ok(link) => link,
            Err(error) => {
                warn!(%error, "ignoring malformed deep link");
                return;
            }
        };
        match link {
            DeepLink::Url { url, target } => {
                self.effects.emit(UiEffect::OpenUrl {
                    url,
                    new_tab: target == UrlTarget::New,
                });
            }
            DeepLink::Navigate { tab, view, element } => {
                let Some(tab) = Tab::from_name(&tab) else {
                    warn!(tab = %tab, "ignoring deep link to unknown tab");
                    return;
                };
                self.navigate(tab, &view, element).await;
            }
        }
    }

    async fn navigate(&mut self, tab: Tab, view: &str, element: Option<String>) {
        if !self.session.expanded {
            if let Err(error) = self.toggle_widget().await {
                warn!(%error, "deep link could not expand the widget");
                return;
            }
        }
        if let Err(error) = self.switch_tab(tab).await {
            warn!(%error, "deep link could not switch tab");
            return;
        }

        let result = match (tab, view, element) {
            (Tab::Help, "articleContent", Some(id)) => self.open_article(&ArticleId(id)).await,
            (Tab::Messages, "chat", None) => self.start_new_chat().await,
            (Tab::Messages, "chat", Some(id)) => self.open_conversation(ConversationId(id)).await,
            (Tab::Messages, _, _) => {
                // Unhandled combination: land on the tab's default view.
                if self.session.email().is_some() {
                    self.router
                        .show(
                            &mut self.session,
                            View::Conversations,
                            Direction::Right,
                            HeaderProps::default(),
                        )
                        .await;
                } else {
                    self.router
                        .show(
                            &mut self.session,
                            View::Email,
                            Direction::Left,
                            HeaderProps::default(),
                        )
                        .await;
                }
                Ok(())
            }
            (Tab::Help, _, _) => {
                self.router
                    .show(
                        &mut self.session,
                        View::Articles,
                        Direction::Right,
                        HeaderProps::default(),
                    )
                    .await;
                Ok(())
            }
            (Tab::Home, _, _) => Ok(()),
        };
        if let Err(error) = result {
            warn!(%error, "deep link navigation failed");
        }
    }
}
