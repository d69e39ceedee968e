//! Mock Telegram API server for testing
//!
//! Simulates the Bot API endpoints the messenger calls, using wiremock.

#![allow(dead_code)]

use serde_json::{json, Value};
use teloxide::Bot;
use wiremock::{
    matchers::{method, path_regex},
    Mock, MockServer, Request, ResponseTemplate,
};

/// Mock Telegram API server for testing
pub struct TelegramMockServer {
    pub server: MockServer,
}

/// Configuration for mock responses
#[derive(Debug, Clone)]
pub struct MockResponseConfig {
    pub success: bool,
    pub delay_ms: Option<u64>,
}

impl Default for MockResponseConfig {
    fn default() -> Self {
        Self {
            success: true,
            delay_ms: None,
        }
    }
}

impl TelegramMockServer {
    pub async fn new() -> Self {
        let server = MockServer::start().await;
        Self { server }
    }

    /// Bot pointed at the mock server
    pub fn bot(&self) -> Bot {
        let url = self
            .server
            .uri()
            .parse()
            .expect("mock server uri is a valid url");
        Bot::new(test_bot_token()).set_api_url(url)
    }

    /// Setup mock for the sendMessage endpoint
    pub async fn mock_send_message(&self, config: MockResponseConfig) {
        let body = if config.success {
            ok_message(json!({ "text": "Test message" }))
        } else {
            json!({
                "ok": false,
                "error_code": 400,
                "description": "Bad Request: chat not found"
            })
        };
        self.mount("sendmessage", config, body).await;
    }

    /// Setup mock for the sendPhoto endpoint
    pub async fn mock_send_photo(&self, config: MockResponseConfig) {
        let body = if config.success {
            ok_message(json!({
                "photo": [{
                    "file_id": "photo-file",
                    "file_unique_id": "photo-unique",
                    "width": 1,
                    "height": 1
                }]
            }))
        } else {
            json!({
                "ok": false,
                "error_code": 400,
                "description": "Bad Request: IMAGE_PROCESS_FAILED"
            })
        };
        self.mount("sendphoto", config, body).await;
    }

    async fn mount(&self, endpoint: &str, config: MockResponseConfig, body: Value) {
        let mut response = ResponseTemplate::new(if config.success { 200 } else { 400 })
            .set_body_json(body);

        if let Some(delay) = config.delay_ms {
            response = response.set_delay(std::time::Duration::from_millis(delay));
        }

        // method names are matched case-insensitively by the Bot API
        Mock::given(method("POST"))
            .and(path_regex(format!(r"(?i)^/bot[^/]+/{}$", endpoint)))
            .respond_with(response)
            .mount(&self.server)
            .await;
    }

    /// Requests received for an endpoint, e.g. "sendmessage"
    pub async fn requests_to(&self, endpoint: &str) -> Vec<Request> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|req| req.url.path().to_lowercase().ends_with(endpoint))
            .collect()
    }

    /// Verify that a specific endpoint was called
    pub async fn verify_endpoint_called(&self, endpoint: &str, times: usize) {
        let matching = self.requests_to(endpoint).await.len();
        assert_eq!(
            matching, times,
            "Expected {} calls to {}, but got {}",
            times, endpoint, matching
        );
    }
}

fn ok_message(content: Value) -> Value {
    let mut result = json!({
        "message_id": 123,
        "from": {
            "id": 12345,
            "is_bot": true,
            "first_name": "TestBot",
            "username": "test_bot"
        },
        "chat": {
            "id": test_user_id(),
            "first_name": "Test",
            "type": "private"
        },
        "date": 1640995200
    });
    if let (Some(result), Some(content)) = (result.as_object_mut(), content.as_object()) {
        for (key, value) in content {
            result.insert(key.clone(), value.clone());
        }
    }
    json!({ "ok": true, "result": result })
}

pub fn test_bot_token() -> String {
    "12345:test_token".to_string()
}

pub fn test_user_id() -> i64 {
    987654321
}

pub fn test_group_id() -> i64 {
    -1001234567890
}
