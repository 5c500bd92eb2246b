//! 설교 검색 - 전체 레코드에 대한 TF-IDF 코사인 순위
//!
//! 호출할 때마다 전체 테이블로 벡터 공간을 새로 만듭니다 (캐시/증분 인덱스 없음).

use std::cmp::Ordering;

use anyhow::{Context, Result};

use super::store::{Sermon, SermonStore};
use super::tfidf::{cosine_similarity, TfidfVectorizer};

/// 반환할 최대 결과 수
pub const TOP_K: usize = 5;

/// 점수가 붙은 검색 결과
#[derive(Debug, Clone)]
pub struct RankedSermon {
    pub sermon: Sermon,
    /// 코사인 유사도 (0.0 ~ 1.0)
    pub score: f64,
}

/// 레코드 목록에서 상위 `TOP_K`개 검색
///
/// - 점수 내림차순, 동점은 입력 순서 유지
/// - 빈 목록이면 빈 결과
/// - 겹치는 어휘가 없어도 (모두 0점) 입력 순서대로 상위 결과를 반환
pub fn search_sermons(query: &str, sermons: &[Sermon]) -> Vec<RankedSermon> {
    if sermons.is_empty() {
        return Vec::new();
    }

    let texts: Vec<String> = sermons.iter().map(Sermon::search_text).collect();
    let vectorizer = TfidfVectorizer::fit(&texts);
    let query_vector = vectorizer.transform(query);

    let scores: Vec<f64> = texts
        .iter()
        .map(|text| cosine_similarity(&query_vector, &vectorizer.transform(text)))
        .collect();

    let mut order: Vec<usize> = (0..sermons.len()).collect();
    order.sort_by(|&a, &b| scores[b].partial_cmp(&scores[a]).unwrap_or(Ordering::Equal));

    order
        .into_iter()
        .take(TOP_K)
        .map(|i| RankedSermon {
            sermon: sermons[i].clone(),
            score: scores[i],
        })
        .collect()
}

/// 저장소 전체를 읽어 검색
pub fn search_store(store: &SermonStore, query: &str) -> Result<Vec<RankedSermon>> {
    let sermons = store.load_all().context("Failed to load sermons for search")?;
    tracing::debug!("Searching {} sermons for {:?}", sermons.len(), query);
    Ok(search_sermons(query, &sermons))
}

// ============================================================================
// Tests
// ============================================================================
