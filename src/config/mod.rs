//! 설정 모듈 - 환경변수 기반 설정 로드
//!
//! 사이트 주소, DB 경로, 봇 토큰은 모두 환경변수에서 읽습니다.
//! CLI 플래그가 있으면 그 값이 우선합니다.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

// ============================================================================
// Environment Variables
// ============================================================================

pub const ENV_SITE_URL: &str = "SERMON_SITE_URL";
pub const ENV_SITEMAP_URL: &str = "SERMON_SITEMAP_URL";
pub const ENV_SITEMAP_PATTERN: &str = "SERMON_SITEMAP_PATTERN";
pub const ENV_DB_PATH: &str = "SERMON_DB_PATH";
pub const ENV_HTTP_TIMEOUT: &str = "SERMON_HTTP_TIMEOUT_SECS";
pub const ENV_BOT_TOKEN: &str = "TELEGRAM_BOT_TOKEN";

/// 설교 사이트맵 이름 패턴 (WordPress Sermon Manager)
pub const DEFAULT_SITEMAP_PATTERN: &str = "wp-sitemap-posts-wpfc_sermon";

/// 기본 HTTP 타임아웃
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// Data Directory
// ============================================================================

/// 데이터 디렉토리 경로 (~/.sermon-finder/)
pub fn get_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".sermon-finder")
}

/// 기본 DB 경로
///
/// `SERMON_DB_PATH`가 있으면 그 값, 없으면 `~/.sermon-finder/sermons.db`
pub fn default_db_path() -> PathBuf {
    non_empty_var(ENV_DB_PATH)
        .map(PathBuf::from)
        .unwrap_or_else(|| get_data_dir().join("sermons.db"))
}

// ============================================================================
// Scraper Config
// ============================================================================

/// 스크래핑 설정
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    /// 최상위 사이트맵 URL
    pub sitemap_url: String,
    /// 설교 사이트맵 필터 (부분 문자열)
    pub sitemap_pattern: String,
    /// HTTP 요청 타임아웃
    pub timeout: Duration,
}

impl ScrapeConfig {
    /// 사이트맵 URL을 지정하여 생성
    pub fn new(sitemap_url: impl Into<String>) -> Self {
        Self {
            sitemap_url: sitemap_url.into(),
            sitemap_pattern: DEFAULT_SITEMAP_PATTERN.to_string(),
            timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }

    /// 환경변수에서 로드
    ///
    /// 우선순위:
    /// 1. `override_url` (CLI 플래그)
    /// 2. `SERMON_SITEMAP_URL`
    /// 3. `SERMON_SITE_URL` + `/wp-sitemap.xml`
    pub fn from_env(override_url: Option<String>) -> Result<Self> {
        let sitemap_url = match override_url.or_else(|| non_empty_var(ENV_SITEMAP_URL)) {
            Some(url) => url,
            None => {
                let site = non_empty_var(ENV_SITE_URL).with_context(|| {
                    format!(
                        "사이트 주소가 설정되지 않았습니다. {} 또는 {} 를 설정하세요",
                        ENV_SITE_URL, ENV_SITEMAP_URL
                    )
                })?;
                sitemap_url_for_site(&site)
            }
        };

        let mut config = Self::new(sitemap_url);

        if let Some(pattern) = non_empty_var(ENV_SITEMAP_PATTERN) {
            config.sitemap_pattern = pattern;
        }
        config.timeout = http_timeout_from_env();

        Ok(config)
    }
}

/// 사이트 주소에서 WordPress 사이트맵 URL 생성
pub fn sitemap_url_for_site(site_url: &str) -> String {
    format!("{}/wp-sitemap.xml", site_url.trim_end_matches('/'))
}

/// `SERMON_HTTP_TIMEOUT_SECS` 읽기 (잘못된 값이면 기본값)
pub fn http_timeout_from_env() -> Duration {
    match non_empty_var(ENV_HTTP_TIMEOUT).map(|v| v.parse::<u64>()) {
        Some(Ok(secs)) if secs > 0 => Duration::from_secs(secs),
        Some(_) => {
            tracing::warn!("Invalid {}, using default timeout", ENV_HTTP_TIMEOUT);
            DEFAULT_HTTP_TIMEOUT
        }
        None => DEFAULT_HTTP_TIMEOUT,
    }
}

// ============================================================================
// Bot Token
// ============================================================================

/// 텔레그램 봇 토큰 로드
pub fn get_bot_token() -> Result<String> {
    non_empty_var(ENV_BOT_TOKEN).with_context(|| {
        format!(
            "Bot token not found. Set {} environment variable.\n\
             Create a bot with @BotFather: https://core.telegram.org/bots#how-do-i-create-a-bot",
            ENV_BOT_TOKEN
        )
    })
}

/// 봇 토큰 존재 여부 확인
pub fn has_bot_token() -> bool {
    non_empty_var(ENV_BOT_TOKEN).is_some()
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sitemap_url_for_site() {
        assert_eq!(
            sitemap_url_for_site("https://church.example"),
            "https://church.example/wp-sitemap.xml"
        );
        assert_eq!(
            sitemap_url_for_site("https://church.example/"),
            "https://church.example/wp-sitemap.xml"
        );
    }

    #[test]
    fn test_override_url_wins() {
        let config =
            ScrapeConfig::from_env(Some("http://localhost/sitemap.xml".to_string())).unwrap();
        assert_eq!(config.sitemap_url, "http://localhost/sitemap.xml");
        assert!(!config.sitemap_pattern.is_empty());
    }

    #[test]
    fn test_new_uses_defaults() {
        let config = ScrapeConfig::new("http://localhost/wp-sitemap.xml");
        assert_eq!(config.sitemap_pattern, DEFAULT_SITEMAP_PATTERN);
        assert_eq!(config.timeout, DEFAULT_HTTP_TIMEOUT);
    }

    #[test]
    fn test_data_dir_name() {
        assert!(get_data_dir().ends_with(".sermon-finder"));
    }
}
