//! Conversation opening, quick replies, realtime updates and list handling.

use supportchat_contracts::{article, boot, history, summary, ScriptedApi};
use supportchat_protocol::events::{ClientEvent, Reply, Sender, ServerEvent};
use supportchat_protocol::ChatStatus;
use supportchat_widget::effects::UiEffect;
use supportchat_widget::router::{Tab, View};

#[tokio::test(start_paused = true)]
async fn scripted_typing_sequence_leaves_one_bot_entry() {
    let api = ScriptedApi::new().with_history("c1", history(ChatStatus::Open, serde_json::json!([])));
    let mut h = boot(api).await;
    h.widget.submit_email("a@b.com").await.unwrap();
    h.widget.open_conversation("c1".into()).await.unwrap();
    h.drain();

    h.widget.apply_server_event(ServerEvent::BotTypingStart);
    h.widget.apply_server_event(ServerEvent::Reply(Reply {
        sender: Sender::Bot,
        text: "Hi".into(),
        timestamp: Some(supportchat_contracts::ts(1_700_000_000)),
        options: Vec::new(),
        file_url: None,
    }));
    h.widget.apply_server_event(ServerEvent::BotTypingStop);

    assert!(!h.widget.session().typing);
    let entries = h.widget.transcript().entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].sender, Sender::Bot);
    assert_eq!(entries[0].text, "Hi");
}

#[tokio::test(start_paused = true)]
async fn unresolved_options_hide_the_input_until_answered() {
    let api = ScriptedApi::new().with_history(
        "c1",
        history(
            ChatStatus::Open,
            serde_json::json!([
                {"sender": "bot", "text": "Pick one", "options": ["Sales", "Support"]}
            ]),
        ),
    );
    let mut h = boot(api).await;
    h.widget.submit_email("a@b.com").await.unwrap();
    h.widget.open_conversation("c1".into()).await.unwrap();

    assert!(!h.widget.session().input_visible);
    let effects = h.drain();
    let last_visibility = effects
        .iter()
        .rev()
        .find_map(|effect| match effect {
            UiEffect::SetInputVisible(visible) => Some(*visible),
            _ => None,
        })
        .expect("input visibility derived");
    assert!(!last_visibility);

    h.widget.select_quick_reply("Sales").unwrap();

    assert!(h.widget.session().input_visible);
    assert!(h.emitted().iter().any(|event| matches!(
        event,
        ClientEvent::Message(message) if message.message == "Sales"
    )));
    assert!(h
        .drain()
        .iter()
        .any(|effect| matches!(effect, UiEffect::MarkOptionsReplied)));
}

#[tokio::test(start_paused = true)]
async fn replied_options_stay_resolved_after_a_reload() {
    let api = ScriptedApi::new().with_history(
        "c1",
        history(
            ChatStatus::Open,
            serde_json::json!([
                {"sender": "bot", "text": "Pick one", "options": ["Sales", "Support"]},
                {"sender": "user", "text": "Sales"}
            ]),
        ),
    );
    let mut h = boot(api).await;
    h.widget.submit_email("a@b.com").await.unwrap();
    h.widget.open_conversation("c1".into()).await.unwrap();

    assert!(h.widget.transcript().entries()[0].replied);
    assert!(h.widget.session().input_visible);
}

#[tokio::test(start_paused = true)]
async fn closed_conversations_always_hide_the_input() {
    let api = ScriptedApi::new().with_history(
        "c1",
        history(
            ChatStatus::Closed,
            serde_json::json!([{"sender": "user", "text": "Thanks, bye"}]),
        ),
    );
    let mut h = boot(api).await;
    h.widget.submit_email("a@b.com").await.unwrap();
    h.widget.open_conversation("c1".into()).await.unwrap();

    assert!(!h.widget.session().input_visible);

    // A send attempt against the closed conversation is a no-op for the
    // transcript: input is hidden, nothing is emitted beyond the join.
    let sends_before = h.emitted().len();
    let entries_before = h.widget.transcript().entries().len();
    h.widget.apply_server_event(ServerEvent::Reply(Reply {
        sender: Sender::Bot,
        text: "Reopening?".into(),
        timestamp: None,
        options: Vec::new(),
        file_url: None,
    }));
    assert_eq!(h.emitted().len(), sends_before);
    assert_eq!(h.widget.transcript().entries().len(), entries_before + 1);
}

#[tokio::test(start_paused = true)]
async fn back_navigation_clears_the_conversation_and_reloads_the_list() {
    let api = ScriptedApi::new()
        .with_history("c1", history(ChatStatus::Open, serde_json::json!([])))
        .with_chats(vec![summary("c1", ChatStatus::Open, 2_000)]);
    let mut h = boot(api).await;
    h.widget.submit_email("a@b.com").await.unwrap();
    h.widget.open_conversation("c1".into()).await.unwrap();
    h.drain();

    h.widget.back_to_conversations().await.unwrap();

    assert_eq!(h.widget.session().current_view, View::Conversations);
    assert!(h.widget.transcript().entries().is_empty());
    let effects = h.drain();
    assert!(effects
        .iter()
        .any(|effect| matches!(effect, UiEffect::ClearTranscript)));
    assert!(effects
        .iter()
        .any(|effect| matches!(effect, UiEffect::RenderConversationList(_))));
    // The list auto-selects the most recent open conversation again.
    assert_eq!(
        h.widget.session().active_chat().map(|chat| chat.as_str()),
        Some("c1")
    );
}

#[tokio::test(start_paused = true)]
async fn chat_list_is_sorted_and_auto_selects_the_latest_open_chat() {
    let api = ScriptedApi::new().with_chats(vec![
        summary("old", ChatStatus::Open, 1_000),
        summary("new", ChatStatus::Open, 2_000),
        summary("done", ChatStatus::Closed, 3_000),
    ]);
    let mut h = boot(api).await;

    h.widget.submit_email("a@b.com").await.unwrap();

    // Most recently updated first; the freshest open one becomes active
    // without navigating anywhere.
    let effects = h.drain();
    let list = effects
        .iter()
        .find_map(|effect| match effect {
            UiEffect::RenderConversationList(list) => Some(list),
            _ => None,
        })
        .expect("conversation list rendered");
    let ids: Vec<&str> = list.iter().map(|chat| chat.id.as_str()).collect();
    assert_eq!(ids, vec!["done", "new", "old"]);
    assert_eq!(
        h.widget.session().active_chat().map(|chat| chat.as_str()),
        Some("new")
    );
    assert_eq!(h.widget.session().current_view, View::Conversations);
}

#[tokio::test(start_paused = true)]
async fn chat_list_failure_renders_a_notice() {
    let api = ScriptedApi::new();
    *api.fail_chats.lock().unwrap() = true;
    let mut h = boot(api).await;
    h.drain();

    h.widget.submit_email("a@b.com").await.unwrap();

    assert!(h.drain().iter().any(|effect| matches!(
        effect,
        UiEffect::RenderMessage(msg) if msg.html == "Error loading your chats."
    )));
}

#[tokio::test(start_paused = true)]
async fn article_search_filters_title_and_description() {
    let api = ScriptedApi::new().with_articles(vec![
        article("a1", "Billing", "Invoices and receipts"),
        article("a2", "Teams", "Invite people to your workspace"),
    ]);
    let mut h = boot(api).await;
    h.widget.switch_tab(Tab::Help).await.unwrap();
    h.drain();

    h.widget.search_articles("invoice");
    let effects = h.drain();
    let filtered = effects
        .iter()
        .find_map(|effect| match effect {
            UiEffect::RenderArticleList(list) => Some(list),
            _ => None,
        })
        .expect("filtered list rendered");
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].id.as_str(), "a1");

    h.widget.search_articles("");
    let effects = h.drain();
    let all = effects
        .iter()
        .find_map(|effect| match effect {
            UiEffect::RenderArticleList(list) => Some(list),
            _ => None,
        })
        .expect("full list rendered");
    assert_eq!(all.len(), 2);
}
