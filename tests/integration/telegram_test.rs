//! Telegram transport against a mocked Bot API

use assert_matches::assert_matches;
use phasebot::dispatch::ChatKind;
use phasebot::handlers::inbound_from_telegram;
use phasebot::messaging::{SendOptions, TextFormat};
use phasebot::{Messenger, OutboundMessage, PhaseBotError, TeloxideMessenger};
use serde_json::{json, Value};
use teloxide::types::Message;

use crate::helpers::*;

#[tokio::test]
async fn test_text_with_keyboard_reaches_api() {
    let mock = TelegramMockServer::new().await;
    mock.mock_send_message(MockResponseConfig::default()).await;
    let messenger = TeloxideMessenger::new(mock.bot());

    let keyboard = OutboundMessage::keyboard(
        "Pick one.",
        vec![vec!["1".to_string(), "2".to_string()]],
    );
    tokio_test::assert_ok!(messenger.deliver(test_user_id(), &keyboard).await);

    let requests = mock.requests_to("sendmessage").await;
    assert_eq!(requests.len(), 1);
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["chat_id"], json!(test_user_id()));
    assert_eq!(body["text"], json!("Pick one."));
    assert_eq!(body["parse_mode"], json!("Markdown"));
    assert_eq!(body["reply_markup"]["keyboard"][0][1]["text"], json!("2"));
    assert_eq!(body["reply_markup"]["resize_keyboard"], json!(true));
}

#[tokio::test]
async fn test_markdown_uses_legacy_mode() {
    let mock = TelegramMockServer::new().await;
    mock.mock_send_message(MockResponseConfig::default()).await;
    let messenger = TeloxideMessenger::new(mock.bot());

    tokio_test::assert_ok!(
        messenger
            .deliver(test_group_id(), &OutboundMessage::markdown("*Done!* See you (soon)."))
            .await
    );

    let requests = mock.requests_to("sendmessage").await;
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["parse_mode"], json!("Markdown"));
}

#[tokio::test]
async fn test_markdown_v2_is_passed_through() {
    let mock = TelegramMockServer::new().await;
    mock.mock_send_message(MockResponseConfig::default()).await;
    let messenger = TeloxideMessenger::new(mock.bot());

    let options = SendOptions {
        format: Some(TextFormat::MarkdownV2),
        keyboard: None,
    };
    let message = OutboundMessage::with_options("*bold* \\.", options);
    tokio_test::assert_ok!(messenger.deliver(test_group_id(), &message).await);

    let requests = mock.requests_to("sendmessage").await;
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["parse_mode"], json!("MarkdownV2"));
}

#[tokio::test]
async fn test_api_error_surfaces_as_telegram_error() {
    let mock = TelegramMockServer::new().await;
    mock.mock_send_message(MockResponseConfig {
        success: false,
        ..MockResponseConfig::default()
    })
    .await;
    let messenger = TeloxideMessenger::new(mock.bot());

    let result = messenger
        .deliver(test_user_id(), &OutboundMessage::text("hello"))
        .await;

    assert_matches!(result, Err(PhaseBotError::Telegram(_)));
    mock.verify_endpoint_called("sendmessage", 1).await;
}

#[tokio::test]
async fn test_photo_is_sent() {
    let mock = TelegramMockServer::new().await;
    mock.mock_send_photo(MockResponseConfig::default()).await;
    let messenger = TeloxideMessenger::new(mock.bot());

    let photo = OutboundMessage::photo(vec![0x89, 0x50, 0x4e, 0x47], Some("chart".to_string()));
    tokio_test::assert_ok!(messenger.deliver(test_user_id(), &photo).await);

    mock.verify_endpoint_called("sendphoto", 1).await;
}

#[tokio::test]
async fn test_malformed_message_never_hits_api() {
    let mock = TelegramMockServer::new().await;
    mock.mock_send_message(MockResponseConfig::default()).await;
    mock.mock_send_photo(MockResponseConfig::default()).await;
    let messenger = TeloxideMessenger::new(mock.bot());

    let blank = messenger.deliver(test_user_id(), &OutboundMessage::text("  ")).await;
    let empty = messenger
        .deliver(test_user_id(), &OutboundMessage::photo(Vec::new(), None))
        .await;

    assert_matches!(blank, Err(PhaseBotError::MalformedOutboundMessage(_)));
    assert_matches!(empty, Err(PhaseBotError::MalformedOutboundMessage(_)));
    mock.verify_endpoint_called("sendmessage", 0).await;
    mock.verify_endpoint_called("sendphoto", 0).await;
}

fn telegram_message(chat: Value, text: Option<&str>) -> Message {
    let mut message = json!({
        "message_id": 1,
        "from": { "id": 555, "is_bot": false, "first_name": "Ada" },
        "chat": chat,
        "date": 1640995200
    });
    if let Some(text) = text {
        message["text"] = json!(text);
    }
    serde_json::from_value(message).unwrap()
}

#[test]
fn test_inbound_from_private_chat() {
    let msg = telegram_message(
        json!({ "id": 555, "type": "private", "first_name": "Ada" }),
        Some("/help"),
    );

    let inbound = inbound_from_telegram(&msg).unwrap();

    assert_eq!(inbound.user_id(), 555);
    assert_eq!(inbound.chat.id, 555);
    assert_eq!(inbound.chat.kind, ChatKind::Private);
    assert!(inbound.is_private_chat());
    assert_eq!(inbound.text.as_deref(), Some("/help"));
}

#[test]
fn test_inbound_from_supergroup() {
    let msg = telegram_message(
        json!({ "id": test_group_id(), "type": "supergroup", "title": "Test Group" }),
        Some("hi all"),
    );

    let inbound = inbound_from_telegram(&msg).unwrap();

    assert_eq!(inbound.user_id(), 555);
    assert_eq!(inbound.chat.id, test_group_id());
    assert_eq!(inbound.chat.kind, ChatKind::Supergroup);
    assert!(!inbound.is_private_chat());
}
