//! 설교 페이지 추출기 - Sermon Manager 마크업에서 필드 추출
//!
//! 각 필드는 `태그.클래스` 선택자 하나로 찾으며 서로 독립적입니다.
//! 필드가 없으면 `None`이고, 실패로 취급하지 않습니다.

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::clean::clean_description;
use crate::error::{fetch_text, FetchError};
use crate::knowledge::NewSermon;

const TITLE_SELECTOR: &str = "h2.wpfc-sermon-single-title";
const DESCRIPTION_SELECTOR: &str = "div.wpfc-sermon-single-main";
const DATE_SELECTOR: &str = "div.wpfc-sermon-single-meta-date";
const AUDIO_SELECTOR: &str = "a.wpfc-sermon-single-audio-download";
const IMAGE_SELECTOR: &str = "img.wpfc-sermon-single-image-img";

/// 설교 페이지 추출기
pub struct PageExtractor {
    client: reqwest::Client,
}

impl PageExtractor {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// URL에서 설교 레코드 추출
    ///
    /// 가져오기 실패만 에러입니다. 필드 누락은 `None`으로 채웁니다.
    pub async fn extract(&self, url: &str) -> Result<NewSermon, FetchError> {
        let html = fetch_text(&self.client, url).await?;
        let document = Html::parse_document(&html);
        Ok(extract_sermon(&document))
    }
}

/// 파싱된 문서에서 다섯 필드 추출
pub fn extract_sermon(document: &Html) -> NewSermon {
    let title = first_text(document, TITLE_SELECTOR);

    let description = first_text(document, DESCRIPTION_SELECTOR)
        .map(|raw| clean_description(&raw))
        .filter(|d| !d.is_empty());

    let date = first_text(document, DATE_SELECTOR).and_then(|raw| parse_sermon_date(&raw));

    let mp3_link = first_attr(document, AUDIO_SELECTOR, "href");
    let image_url = first_attr(document, IMAGE_SELECTOR, "src");

    NewSermon {
        title,
        description,
        date,
        mp3_link,
        image_url,
    }
}

fn first_match<'a>(document: &'a Html, selector: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(selector).ok()?;
    document.select(&selector).next()
}

/// 첫 번째 일치 요소의 텍스트 (앞뒤 공백 제거, 비어 있으면 None)
fn first_text(document: &Html, selector: &str) -> Option<String> {
    let element = first_match(document, selector)?;
    let text = element.text().collect::<String>().trim().to_string();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// 첫 번째 일치 요소의 속성값
fn first_attr(document: &Html, selector: &str, attr: &str) -> Option<String> {
    first_match(document, selector)?
        .value()
        .attr(attr)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn ordinal_date_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d{1,2})(?:st|nd|rd|th)\s+([A-Za-z]+)\s+(\d{4})$")
            .expect("date pattern is valid")
    })
}

/// `14th January 2024` 형식 날짜 파싱
///
/// 형식이 맞지 않으면 `None` (에러 아님)
pub fn parse_sermon_date(text: &str) -> Option<NaiveDate> {
    let caps = ordinal_date_regex().captures(text.trim())?;
    let normalized = format!("{} {} {}", &caps[1], &caps[2], &caps[3]);
    NaiveDate::parse_from_str(&normalized, "%d %B %Y").ok()
}

// ============================================================================
// Tests
// ============================================================================
