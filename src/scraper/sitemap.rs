//! 사이트맵 해석 - `<loc>` URL 추출
//!
//! WordPress 사이트맵은 두 단계입니다:
//! 1. `wp-sitemap.xml` (sitemapindex) → 하위 사이트맵 목록
//! 2. `wp-sitemap-posts-wpfc_sermon-N.xml` (urlset) → 설교 페이지 목록
//!
//! ref: https://www.sitemaps.org/protocol.html

use quick_xml::events::Event;
use quick_xml::Reader;
use url::Url;

use crate::error::{fetch_text, FetchError};

/// 사이트맵 문서에서 `<loc>` 값 추출
///
/// 문서 순서를 유지하고 중복은 제거하지 않습니다.
/// 비어 있거나 절대 http(s) URL이 아닌 항목은 조용히 건너뜁니다.
/// XML이 중간에 깨져도 깨진 `<loc>` 하나만 버리고 계속 읽습니다.
pub fn parse_sitemap(xml: &str) -> Vec<String> {
    let mut reader = Reader::from_str(xml);
    // 닫는 태그 이름이 틀려도 에러 대신 End 이벤트로 받는다
    reader.config_mut().check_end_names = false;
    let mut urls = Vec::new();

    // 현재 열려 있는 <loc>의 텍스트 (None이면 <loc> 밖)
    let mut current: Option<String> = None;
    let mut current_valid = true;

    loop {
        let position = reader.buffer_position();
        match reader.read_event() {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"loc" => {
                current = Some(String::new());
                current_valid = true;
            }
            Ok(Event::Text(e)) => {
                if let Some(ref mut text) = current {
                    match e.unescape() {
                        Ok(s) => text.push_str(&s),
                        Err(_) => current_valid = false,
                    }
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(ref mut text) = current {
                    text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Ok(Event::End(e)) if e.local_name().as_ref() == b"loc" => {
                if let Some(text) = current.take() {
                    match valid_location(&text) {
                        Some(url) if current_valid => urls.push(url),
                        _ => tracing::debug!("Skipping malformed <loc> entry: {:?}", text),
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                tracing::debug!(
                    "Sitemap XML error at byte {}: {} (dropping open <loc>)",
                    reader.buffer_position(),
                    e
                );
                current = None;
                // 더 읽어 나가지 못하면 거기서 끝
                if reader.buffer_position() == position {
                    break;
                }
            }
            _ => {}
        }
    }

    urls
}

/// 절대 http(s) URL이면 정리된 문자열 반환
fn valid_location(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    let url = Url::parse(trimmed).ok()?;
    match url.scheme() {
        "http" | "https" if url.has_host() => Some(trimmed.to_string()),
        _ => None,
    }
}

/// 설교 사이트맵 필터 (부분 문자열 일치)
pub fn filter_sermon_sitemaps(urls: &[String], pattern: &str) -> Vec<String> {
    urls.iter()
        .filter(|url| url.contains(pattern))
        .cloned()
        .collect()
}

// ============================================================================
// SitemapResolver
// ============================================================================

/// 사이트맵 수집기
pub struct SitemapResolver {
    client: reqwest::Client,
}

impl SitemapResolver {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// 사이트맵 하나를 가져와 URL 목록 반환
    pub async fn fetch(&self, sitemap_url: &str) -> Result<Vec<String>, FetchError> {
        let xml = fetch_text(&self.client, sitemap_url).await?;
        let urls = parse_sitemap(&xml);
        tracing::debug!("Found {} URLs in sitemap {}: {:?}", urls.len(), sitemap_url, urls);
        Ok(urls)
    }

    /// 가져오기 실패 시 빈 목록 (로그만 남김)
    pub async fn fetch_or_empty(&self, sitemap_url: &str) -> Vec<String> {
        match self.fetch(sitemap_url).await {
            Ok(urls) => urls,
            Err(e) => {
                tracing::error!("Error parsing sitemap: {}", e);
                Vec::new()
            }
        }
    }

    /// 사이트맵 인덱스 → 설교 사이트맵 → 설교 페이지 URL
    ///
    /// 결과는 사이트맵 순서대로 평탄화됩니다.
    pub async fn resolve(&self, index_url: &str, pattern: &str) -> Vec<String> {
        let index_urls = self.fetch_or_empty(index_url).await;
        tracing::info!("Found {} URLs in the main sitemap.", index_urls.len());

        let sermon_sitemaps = filter_sermon_sitemaps(&index_urls, pattern);
        tracing::info!("Found {} sermon sitemap URLs.", sermon_sitemaps.len());

        let mut sermon_urls = Vec::new();
        for sitemap_url in &sermon_sitemaps {
            sermon_urls.extend(self.fetch_or_empty(sitemap_url).await);
        }

        tracing::info!("Found {} sermon URLs.", sermon_urls.len());
        sermon_urls
    }
}

// ============================================================================
// Tests
// ============================================================================
