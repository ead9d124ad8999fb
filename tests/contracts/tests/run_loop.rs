//! The select-driven run loop: user actions and realtime events are applied
//! on one logical task, in delivery order.

use supportchat_contracts::{boot, history, ts, ScriptedApi};
use supportchat_protocol::events::{ClientEvent, Reply, Sender, ServerEvent};
use supportchat_protocol::ChatStatus;
use supportchat_widget::effects::UiEffect;
use supportchat_widget::UserAction;
use tokio::sync::mpsc;

#[tokio::test(start_paused = true)]
async fn run_loop_drives_actions_and_realtime_events() {
    let api = ScriptedApi::new().with_history("c1", history(ChatStatus::Open, serde_json::json!([])));
    let mut h = boot(api).await;
    h.drain();

    let channel = h.channel.clone();
    let server_tx = h.server_tx.clone();
    let mut effects = h.effects;
    let (action_tx, action_rx) = mpsc::unbounded_channel();

    let driver = tokio::spawn(h.widget.run(action_rx));

    action_tx
        .send(UserAction::SubmitEmail("a@b.com".into()))
        .unwrap();
    action_tx
        .send(UserAction::OpenConversation("c1".into()))
        .unwrap();
    server_tx
        .send(ServerEvent::Reply(Reply {
            sender: Sender::Bot,
            text: "Hi".into(),
            timestamp: Some(ts(1_700_000_000)),
            options: Vec::new(),
            file_url: None,
        }))
        .unwrap();

    // Wait until the reply has been rendered, then shut the loop down.
    loop {
        let effect = effects.recv().await.expect("effect stream open");
        if matches!(&effect, UiEffect::RenderMessage(msg) if msg.html == "Hi") {
            break;
        }
    }
    drop(action_tx);
    drop(server_tx);
    driver.await.unwrap().unwrap();

    let emitted = channel.emitted.lock().unwrap();
    assert!(emitted
        .iter()
        .any(|event| matches!(event, ClientEvent::JoinChat(join) if join.chat_id.as_str() == "c1")));
}
