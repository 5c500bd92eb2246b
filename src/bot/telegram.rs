//! Telegram Bot API 클라이언트 + long polling 루프
//!
//! ref: https://core.telegram.org/bots/api

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{Messenger, SermonBot};
use crate::error::DeliveryError;

/// Bot API 기본 주소
const TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// getUpdates long polling 대기 시간 (초)
const POLL_TIMEOUT_SECS: u64 = 30;
/// 폴링 실패 후 재시도 대기
const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

const SEND_TIMEOUT: Duration = Duration::from_secs(30);
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(300);

// ============================================================================
// API Types
// ============================================================================

/// Bot API 공통 응답
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

/// 수신 업데이트
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<IncomingMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IncomingMessage {
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Serialize)]
struct GetUpdatesRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<i64>,
    timeout: u64,
    allowed_updates: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
    parse_mode: &'static str,
}

#[derive(Debug, Serialize)]
struct SendPhotoRequest<'a> {
    chat_id: i64,
    photo: &'a str,
    caption: &'a str,
    parse_mode: &'static str,
}

// ============================================================================
// TelegramClient
// ============================================================================

/// Telegram Bot API 클라이언트
#[derive(Debug, Clone)]
pub struct TelegramClient {
    client: reqwest::Client,
    /// `{api}/bot{token}`
    base_url: String,
}

impl TelegramClient {
    /// 토큰으로 생성
    pub fn new(token: &str) -> Result<Self> {
        Self::with_api_url(TELEGRAM_API_URL, token)
    }

    /// API 주소를 지정하여 생성 (테스트/프록시용)
    pub fn with_api_url(api_url: &str, token: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("sermon-finder/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            base_url: format!("{}/bot{}", api_url.trim_end_matches('/'), token),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{}", self.base_url, method)
    }

    /// 응답 본문을 확인하여 `result` 추출
    async fn parse_response<R: DeserializeOwned>(
        method: &str,
        response: reqwest::Response,
    ) -> Result<R, DeliveryError> {
        let body: ApiResponse<R> = response.json().await?;

        match (body.ok, body.result) {
            (true, Some(result)) => Ok(result),
            _ => Err(DeliveryError::Api {
                method: method.to_string(),
                description: body
                    .description
                    .unwrap_or_else(|| "unknown error".to_string()),
            }),
        }
    }

    /// JSON 본문으로 메서드 호출
    async fn call<B: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        method: &str,
        body: &B,
        timeout: Duration,
    ) -> Result<R, DeliveryError> {
        let response = self
            .client
            .post(self.method_url(method))
            .timeout(timeout)
            .json(body)
            .send()
            .await?;

        Self::parse_response(method, response).await
    }

    /// 새 업데이트 가져오기 (long polling)
    pub async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout_secs: u64,
    ) -> Result<Vec<Update>, DeliveryError> {
        let request = GetUpdatesRequest {
            offset,
            timeout: timeout_secs,
            allowed_updates: vec!["message"],
        };

        self.call(
            "getUpdates",
            &request,
            Duration::from_secs(timeout_secs) + SEND_TIMEOUT,
        )
        .await
    }
}

#[async_trait]
impl Messenger for TelegramClient {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), DeliveryError> {
        let request = SendMessageRequest {
            chat_id,
            text,
            parse_mode: "Markdown",
        };
        let _: serde_json::Value = self.call("sendMessage", &request, SEND_TIMEOUT).await?;
        Ok(())
    }

    async fn send_photo(
        &self,
        chat_id: i64,
        photo_url: &str,
        caption: &str,
    ) -> Result<(), DeliveryError> {
        let request = SendPhotoRequest {
            chat_id,
            photo: photo_url,
            caption,
            parse_mode: "Markdown",
        };
        let _: serde_json::Value = self.call("sendPhoto", &request, SEND_TIMEOUT).await?;
        Ok(())
    }

    async fn send_audio(
        &self,
        chat_id: i64,
        audio: Vec<u8>,
        title: &str,
    ) -> Result<(), DeliveryError> {
        let part = Part::bytes(audio)
            .file_name("sermon.mp3")
            .mime_str("audio/mpeg")?;

        let form = Form::new()
            .text("chat_id", chat_id.to_string())
            .text("title", title.to_string())
            .part("audio", part);

        let response = self
            .client
            .post(self.method_url("sendAudio"))
            .timeout(UPLOAD_TIMEOUT)
            .multipart(form)
            .send()
            .await?;

        let _: serde_json::Value = Self::parse_response("sendAudio", response).await?;
        Ok(())
    }
}

// ============================================================================
// Polling Loop
// ============================================================================

/// Ctrl-C 까지 업데이트를 받아 순서대로 처리
///
/// 업데이트 하나의 실패가 루프를 멈추지 않습니다.
pub async fn run_polling(bot: &SermonBot<TelegramClient>) -> Result<()> {
    tracing::info!("Starting the bot...");

    let mut offset: Option<i64> = None;

    loop {
        let updates = tokio::select! {
            result = bot.messenger().get_updates(offset, POLL_TIMEOUT_SECS) => result,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down the bot");
                return Ok(());
            }
        };

        let updates = match updates {
            Ok(updates) => updates,
            Err(e) => {
                tracing::warn!("getUpdates failed, retrying in {:?}: {}", POLL_RETRY_DELAY, e);
                tokio::time::sleep(POLL_RETRY_DELAY).await;
                continue;
            }
        };

        for update in updates {
            offset = Some(update.update_id + 1);

            let Some(message) = update.message else {
                continue;
            };
            if let Some(text) = message.text.as_deref() {
                bot.handle_message(message.chat.id, text).await;
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_updates() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/botTOKEN/getUpdates")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"ok":true,"result":[
                    {"update_id":10,"message":{"message_id":1,"chat":{"id":42,"type":"private"},"text":"/search grace"}},
                    {"update_id":11,"edited_message":{"message_id":1,"chat":{"id":42,"type":"private"}}}
                ]}"#,
            )
            .expect(1)
            .create_async()
            .await;

        let client = TelegramClient::with_api_url(&server.url(), "TOKEN").unwrap();
        let updates = client.get_updates(None, 0).await.unwrap();

        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].update_id, 10);
        let message = updates[0].message.as_ref().unwrap();
        assert_eq!(message.chat.id, 42);
        assert_eq!(message.text.as_deref(), Some("/search grace"));
        assert!(updates[1].message.is_none());

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_send_text_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/botTOKEN/sendMessage")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "chat_id": 42,
                "text": "hello",
                "parse_mode": "Markdown"
            })))
            .with_body(r#"{"ok":true,"result":{"message_id":5}}"#)
            .expect(1)
            .create_async()
            .await;

        let client = TelegramClient::with_api_url(&server.url(), "TOKEN").unwrap();
        client.send_text(42, "hello").await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_api_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/botTOKEN/sendPhoto")
            .with_status(400)
            .with_body(r#"{"ok":false,"error_code":400,"description":"Bad Request: wrong file identifier"}"#)
            .create_async()
            .await;

        let client = TelegramClient::with_api_url(&server.url(), "TOKEN").unwrap();
        let result = client.send_photo(42, "https://church.example/x.jpg", "caption").await;

        match result {
            Err(DeliveryError::Api { method, description }) => {
                assert_eq!(method, "sendPhoto");
                assert!(description.contains("wrong file identifier"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_send_audio_multipart() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/botTOKEN/sendAudio")
            .match_header(
                "content-type",
                mockito::Matcher::Regex("multipart/form-data".to_string()),
            )
            .match_body(mockito::Matcher::Regex("Amazing Grace".to_string()))
            .with_body(r#"{"ok":true,"result":{"message_id":6}}"#)
            .expect(1)
            .create_async()
            .await;

        let client = TelegramClient::with_api_url(&server.url(), "TOKEN").unwrap();
        client
            .send_audio(42, b"ID3".to_vec(), "Amazing Grace")
            .await
            .unwrap();

        mock.assert_async().await;
    }
}
