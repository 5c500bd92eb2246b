//! Knowledge 모듈 - 설교 레코드 저장 + TF-IDF 검색
//!
//! - SQLite: 설교 레코드 저장 (`messages` 테이블)
//! - TF-IDF: 제목 + 본문 벡터화
//! - Search: 코사인 유사도 상위 5개

mod search;
mod store;
mod tfidf;

// Re-exports
pub use search::{search_sermons, search_store, RankedSermon, TOP_K};
pub use store::{
    NewSermon, Sermon, SermonStore, StoreStats, NO_DESCRIPTION, NO_IMAGE_URL, NO_MP3_LINK,
    NO_TITLE,
};
pub use tfidf::{cosine_similarity, tokenize, SparseVector, TfidfVectorizer};
