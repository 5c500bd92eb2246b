//! 봇 모듈 - 채팅 명령 처리 및 검색 결과 전송
//!
//! `/start`, `/search <query>` 두 명령만 처리합니다.
//! 사진/오디오 전송 실패는 텍스트 전송으로 낮춰서 처리하고,
//! 나머지 결과 전송은 계속합니다.

pub mod telegram;

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tempfile::NamedTempFile;

use crate::error::{get_checked, DeliveryError, FetchError};
use crate::knowledge::{search_store, Sermon, SermonStore, NO_TITLE};
use crate::scraper::{clean_description, truncate_text};

pub use telegram::{run_polling, TelegramClient};

// ============================================================================
// Replies
// ============================================================================

pub const WELCOME_TEXT: &str = "Welcome! Use /search <query> to find sermons.";
pub const USAGE_TEXT: &str = "Please provide a search query. Example: /search power";
pub const SEARCHING_TEXT: &str = "Searching for sermons...";
pub const NOT_FOUND_TEXT: &str = "No sermons found. Try different keywords.";
pub const AUDIO_FALLBACK_TEXT: &str = "Unable to send the audio file. Please use the MP3 link.";
pub const GENERIC_ERROR_TEXT: &str = "An error occurred. Please try again later.";

/// 사진 캡션 길이 제한(1024자)에 맞추기 위한 본문 최대 길이
const MAX_DESCRIPTION_CHARS: usize = 700;

// ============================================================================
// Messenger Trait
// ============================================================================

/// 채팅 전송 인터페이스
///
/// 텍스트는 Markdown 서식으로 보냅니다.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// 텍스트 메시지 전송
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), DeliveryError>;

    /// URL 이미지 + 캡션 전송
    async fn send_photo(
        &self,
        chat_id: i64,
        photo_url: &str,
        caption: &str,
    ) -> Result<(), DeliveryError>;

    /// 오디오 파일 전송
    async fn send_audio(
        &self,
        chat_id: i64,
        audio: Vec<u8>,
        title: &str,
    ) -> Result<(), DeliveryError>;
}

// ============================================================================
// Commands
// ============================================================================

/// 봇 명령
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    /// 검색어 (공백으로 합친 인자, 비어 있을 수 있음)
    Search(String),
}

impl Command {
    /// 메시지 텍스트에서 명령 파싱
    ///
    /// `/search@MyBot grace` 처럼 봇 이름이 붙은 형태도 허용합니다.
    /// 알 수 없는 명령이나 일반 텍스트는 `None`.
    pub fn parse(text: &str) -> Option<Self> {
        let mut parts = text.split_whitespace();
        let head = parts.next()?.strip_prefix('/')?;
        let name = head.split('@').next().unwrap_or(head);

        match name {
            "start" => Some(Command::Start),
            "search" => Some(Command::Search(parts.collect::<Vec<_>>().join(" "))),
            _ => None,
        }
    }
}

// ============================================================================
// SermonBot
// ============================================================================

/// 설교 검색 봇
pub struct SermonBot<M: Messenger> {
    store: SermonStore,
    messenger: M,
    http: reqwest::Client,
    /// 오디오 임시 파일 위치
    temp_dir: PathBuf,
}

impl<M: Messenger> SermonBot<M> {
    pub fn new(store: SermonStore, messenger: M, http: reqwest::Client) -> Self {
        Self {
            store,
            messenger,
            http,
            temp_dir: std::env::temp_dir(),
        }
    }

    /// 오디오 임시 파일 디렉토리 지정
    pub fn with_temp_dir(mut self, temp_dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = temp_dir.into();
        self
    }

    pub fn messenger(&self) -> &M {
        &self.messenger
    }

    /// 수신 메시지 처리
    ///
    /// 처리 중 에러는 로그로 남기고 사용자에게 일반 오류 메시지를 보냅니다.
    /// 이 함수는 실패하지 않습니다.
    pub async fn handle_message(&self, chat_id: i64, text: &str) {
        let Some(command) = Command::parse(text) else {
            tracing::debug!("Ignoring non-command message from chat {}", chat_id);
            return;
        };

        let result = match command {
            Command::Start => self
                .messenger
                .send_text(chat_id, WELCOME_TEXT)
                .await
                .context("Failed to send welcome"),
            Command::Search(query) => self.handle_search(chat_id, &query).await,
        };

        if let Err(e) = result {
            tracing::error!("Error in command handler: {:#}", e);
            if let Err(e) = self.messenger.send_text(chat_id, GENERIC_ERROR_TEXT).await {
                tracing::error!("Failed to send error reply: {}", e);
            }
        }
    }

    /// `/search` 처리
    async fn handle_search(&self, chat_id: i64, query: &str) -> Result<()> {
        let query = query.trim();
        if query.is_empty() {
            self.messenger.send_text(chat_id, USAGE_TEXT).await?;
            return Ok(());
        }

        self.messenger.send_text(chat_id, SEARCHING_TEXT).await?;

        let results = search_store(&self.store, query)?;
        tracing::info!("Search {:?}: {} results", query, results.len());

        if results.is_empty() {
            self.messenger.send_text(chat_id, NOT_FOUND_TEXT).await?;
            return Ok(());
        }

        for result in &results {
            self.deliver_sermon(chat_id, &result.sermon).await;
        }

        Ok(())
    }

    /// 설교 하나 전송 (사진 → 텍스트 폴백, 오디오 → 안내 문구 폴백)
    ///
    /// 전송 실패는 로그만 남기고 다음 결과 전송을 막지 않습니다.
    async fn deliver_sermon(&self, chat_id: i64, sermon: &Sermon) {
        let body = format_sermon(sermon);

        if let Some(image_url) = sermon.image_url.as_deref() {
            if let Err(e) = self.messenger.send_photo(chat_id, image_url, &body).await {
                tracing::error!("Failed to send image: {}", e);
                self.send_or_log(chat_id, &body).await;
            }
        } else {
            self.send_or_log(chat_id, &body).await;
        }

        if let Some(mp3_link) = sermon.mp3_link.as_deref() {
            if let Err(e) = self
                .deliver_audio(chat_id, mp3_link, sermon.display_title())
                .await
            {
                tracing::error!("Failed to send audio: {}", e);
                self.send_or_log(chat_id, AUDIO_FALLBACK_TEXT).await;
            }
        }
    }

    async fn send_or_log(&self, chat_id: i64, text: &str) {
        if let Err(e) = self.messenger.send_text(chat_id, text).await {
            tracing::error!("Failed to send message to chat {}: {}", chat_id, e);
        }
    }

    /// MP3를 임시 파일로 받아 전송
    ///
    /// 임시 파일은 이 함수를 벗어날 때 (성공/실패 모두) 삭제됩니다.
    async fn deliver_audio(
        &self,
        chat_id: i64,
        mp3_link: &str,
        title: &str,
    ) -> Result<(), DeliveryError> {
        let temp = download_to_temp(&self.http, mp3_link, &self.temp_dir).await?;
        let audio = tokio::fs::read(temp.path()).await?;
        self.messenger.send_audio(chat_id, audio, title).await
    }
}

/// URL을 `dir` 안의 임시 파일로 다운로드 (청크 단위)
///
/// 중간에 실패하면 만들던 파일은 바로 지워집니다.
pub async fn download_to_temp(
    client: &reqwest::Client,
    url: &str,
    dir: &Path,
) -> Result<NamedTempFile, FetchError> {
    let io_error = |source: std::io::Error| FetchError::Io {
        url: url.to_string(),
        source,
    };

    let mut response = get_checked(client, url).await?;
    let mut temp = tempfile::Builder::new()
        .prefix("sermon-")
        .suffix(".mp3")
        .tempfile_in(dir)
        .map_err(io_error)?;

    while let Some(chunk) = response.chunk().await.map_err(|source| FetchError::Body {
        url: url.to_string(),
        source,
    })? {
        temp.write_all(&chunk).map_err(io_error)?;
    }
    temp.flush().map_err(io_error)?;

    Ok(temp)
}

// ============================================================================
// Formatting
// ============================================================================

/// 검색 결과 본문 (Telegram 레거시 Markdown)
pub fn format_sermon(sermon: &Sermon) -> String {
    let date = sermon
        .date
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "Unknown".to_string());

    let description = truncate_text(
        &clean_description(sermon.display_description()),
        MAX_DESCRIPTION_CHARS,
    );

    let link = match sermon.mp3_link.as_deref() {
        Some(url) => format!("[MP3 Link]({})", url),
        None => escape_markdown(sermon.display_mp3_link()),
    };

    format!(
        "*{}*\n\n*Date:* {}\n*Description:*\n{}\n\n{}",
        bold_safe(sermon.display_title()),
        date,
        escape_markdown(&description),
        link
    )
}

/// 굵게(`*...*`) 안에 넣을 텍스트
///
/// 레거시 Markdown은 엔티티 안에서 이스케이프를 지원하지 않으므로
/// 엔티티를 닫는 `*` 만 제거합니다.
fn bold_safe(text: &str) -> String {
    let stripped: String = text.chars().filter(|&c| c != '*').collect();
    let stripped = stripped.trim();

    if stripped.is_empty() {
        NO_TITLE.to_string()
    } else {
        stripped.to_string()
    }
}

/// 레거시 Markdown 특수문자 이스케이프 (엔티티 밖 텍스트용)
fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '_' | '*' | '`' | '[') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

// ============================================================================
// Tests
// ============================================================================
