//! sermon-finder - 설교 스크래퍼 + TF-IDF 검색 봇
//!
//! WordPress 사이트맵에서 설교 페이지를 모아 SQLite에 저장하고,
//! 채팅 봇에서 TF-IDF 코사인 유사도로 검색합니다.

pub mod bot;
pub mod cli;
pub mod config;
pub mod error;
pub mod knowledge;
pub mod scraper;

// Re-exports
pub use bot::{Command, Messenger, SermonBot, TelegramClient};
pub use config::{get_data_dir, ScrapeConfig};
pub use error::{DeliveryError, FetchError};
pub use knowledge::{
    search_sermons, search_store, NewSermon, RankedSermon, Sermon, SermonStore, StoreStats,
    TfidfVectorizer, TOP_K,
};
pub use scraper::{
    clean_description, extract_sermon, parse_sitemap, PageExtractor, ScrapeStats, SermonScraper,
    SitemapResolver,
};
