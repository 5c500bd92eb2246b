//! 스크래퍼 모듈 - 사이트맵 순회 → 설교 페이지 추출 → 저장
//!
//! 한 번의 스크랩 패스는 URL을 하나씩 순서대로 처리합니다.
//! 실패는 URL 단위로 격리되며 전체 패스를 멈추지 않습니다.

mod clean;
mod page;
mod sitemap;

pub use clean::{clean_description, truncate_text};
pub use page::{extract_sermon, parse_sermon_date, PageExtractor};
pub use sitemap::{filter_sermon_sitemaps, parse_sitemap, SitemapResolver};

use anyhow::{Context, Result};

use crate::config::ScrapeConfig;
use crate::knowledge::SermonStore;

/// 스크랩 결과 통계
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrapeStats {
    /// 사이트맵에서 찾은 설교 URL 수
    pub found: usize,
    /// 저장된 레코드 수
    pub saved: usize,
    /// 가져오기/저장 실패로 건너뛴 URL 수
    pub skipped: usize,
}

/// 설교 스크래퍼
pub struct SermonScraper {
    config: ScrapeConfig,
    sitemaps: SitemapResolver,
    pages: PageExtractor,
}

impl SermonScraper {
    /// 새 스크래퍼 생성
    pub fn new(config: ScrapeConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("sermon-finder/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()
            .context("HTTP 클라이언트 생성 실패")?;

        Ok(Self {
            config,
            sitemaps: SitemapResolver::new(client.clone()),
            pages: PageExtractor::new(client),
        })
    }

    /// 설교 페이지 URL 목록 (사이트맵 두 단계)
    pub async fn sermon_urls(&self) -> Vec<String> {
        self.sitemaps
            .resolve(&self.config.sitemap_url, &self.config.sitemap_pattern)
            .await
    }

    /// 전체 스크랩 패스
    ///
    /// 사이트맵/페이지/저장 실패는 모두 통계에 집계되고 패스는 끝까지 진행됩니다.
    pub async fn scrape_website(&self, store: &SermonStore) -> Result<ScrapeStats> {
        tracing::info!("Starting to scrape the website...");

        let urls = self.sermon_urls().await;
        let mut stats = ScrapeStats {
            found: urls.len(),
            ..Default::default()
        };

        for url in &urls {
            tracing::info!("Scraping URL: {}", url);

            let sermon = match self.pages.extract(url).await {
                Ok(sermon) => sermon,
                Err(e) => {
                    tracing::error!("Error scraping {}: {}", url, e);
                    tracing::warn!("Failed to scrape data from URL: {}", url);
                    stats.skipped += 1;
                    continue;
                }
            };

            match store.insert(&sermon) {
                Ok(id) => {
                    stats.saved += 1;
                    tracing::info!(
                        "Scraped and saved: {} (id={})",
                        sermon.title.as_deref().unwrap_or(crate::knowledge::NO_TITLE),
                        id
                    );
                }
                Err(e) => {
                    tracing::error!("Failed to save {}: {:#}", url, e);
                    stats.skipped += 1;
                }
            }
        }

        tracing::info!(
            "Scraping completed. {} found, {} saved, {} skipped",
            stats.found,
            stats.saved,
            stats.skipped
        );
        Ok(stats)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scraper_creation() {
        let scraper = SermonScraper::new(ScrapeConfig::new("http://localhost/wp-sitemap.xml"));
        assert!(scraper.is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_sitemap_yields_empty_pass() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/wp-sitemap.xml")
            .with_status(503)
            .create_async()
            .await;

        let dir = tempfile::TempDir::new().unwrap();
        let store = SermonStore::open(&dir.path().join("scrape.db")).unwrap();

        let scraper =
            SermonScraper::new(ScrapeConfig::new(format!("{}/wp-sitemap.xml", server.url())))
                .unwrap();
        let stats = scraper.scrape_website(&store).await.unwrap();

        assert_eq!(stats, ScrapeStats::default());
        assert!(store.load_all().unwrap().is_empty());
    }
}
