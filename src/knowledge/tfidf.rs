//! TF-IDF 벡터화 - 희소 벡터 + 코사인 유사도
//!
//! 가중치는 scikit-learn `TfidfVectorizer` 기본값과 같습니다:
//! - 토큰: 소문자화 후 2글자 이상 단어 (`\b\w\w+\b`)
//! - tf: 원시 빈도
//! - idf: `ln((1 + n) / (1 + df)) + 1`
//! - 벡터는 L2 정규화
//!
//! ref: https://scikit-learn.org/stable/modules/feature_extraction.html#tfidf-term-weighting

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

fn token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b\w\w+\b").expect("token pattern is valid"))
}

/// 텍스트를 소문자 토큰으로 분리
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    token_regex()
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

// ============================================================================
// SparseVector
// ============================================================================

/// 희소 벡터 (용어 인덱스 오름차순)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    entries: Vec<(usize, f64)>,
}

impl SparseVector {
    fn from_map(map: HashMap<usize, f64>) -> Self {
        let mut entries: Vec<(usize, f64)> = map.into_iter().collect();
        entries.sort_by_key(|(index, _)| *index);
        Self { entries }
    }

    pub fn is_zero(&self) -> bool {
        self.entries.iter().all(|(_, w)| *w == 0.0)
    }

    pub fn norm(&self) -> f64 {
        self.entries.iter().map(|(_, w)| w * w).sum::<f64>().sqrt()
    }

    /// 내적 (정렬된 인덱스 병합)
    pub fn dot(&self, other: &SparseVector) -> f64 {
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0;

        while i < self.entries.len() && j < other.entries.len() {
            let (a_idx, a_w) = self.entries[i];
            let (b_idx, b_w) = other.entries[j];
            match a_idx.cmp(&b_idx) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += a_w * b_w;
                    i += 1;
                    j += 1;
                }
            }
        }

        sum
    }

    fn normalized(mut self) -> Self {
        let norm = self.norm();
        if norm > 0.0 {
            for (_, w) in &mut self.entries {
                *w /= norm;
            }
        }
        self
    }
}

/// 코사인 유사도
///
/// 둘 중 하나가 영벡터면 0.0
pub fn cosine_similarity(a: &SparseVector, b: &SparseVector) -> f64 {
    let norm_a = a.norm();
    let norm_b = b.norm();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    a.dot(b) / (norm_a * norm_b)
}

// ============================================================================
// TfidfVectorizer
// ============================================================================

/// 말뭉치에 맞춘 TF-IDF 공간
#[derive(Debug, Clone, Default)]
pub struct TfidfVectorizer {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
}

impl TfidfVectorizer {
    /// 문서 목록으로 어휘와 idf 계산
    ///
    /// 빈 말뭉치면 빈 공간이 되고, 모든 변환 결과는 영벡터입니다.
    pub fn fit<S: AsRef<str>>(documents: &[S]) -> Self {
        let mut document_frequency: HashMap<String, usize> = HashMap::new();

        for document in documents {
            let mut seen: Vec<String> = tokenize(document.as_ref());
            seen.sort();
            seen.dedup();
            for term in seen {
                *document_frequency.entry(term).or_insert(0) += 1;
            }
        }

        // 인덱스는 용어 사전순
        let mut terms: Vec<(String, usize)> = document_frequency.into_iter().collect();
        terms.sort_by(|a, b| a.0.cmp(&b.0));

        let n = documents.len() as f64;
        let mut vocabulary = HashMap::with_capacity(terms.len());
        let mut idf = Vec::with_capacity(terms.len());

        for (index, (term, df)) in terms.into_iter().enumerate() {
            idf.push(((1.0 + n) / (1.0 + df as f64)).ln() + 1.0);
            vocabulary.insert(term, index);
        }

        Self { vocabulary, idf }
    }

    /// 어휘 크기
    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }

    /// 텍스트를 정규화된 TF-IDF 벡터로 변환 (어휘 밖 용어는 무시)
    pub fn transform(&self, text: &str) -> SparseVector {
        let mut weights: HashMap<usize, f64> = HashMap::new();

        for term in tokenize(text) {
            if let Some(&index) = self.vocabulary.get(&term) {
                *weights.entry(index).or_insert(0.0) += 1.0;
            }
        }

        for (index, weight) in weights.iter_mut() {
            *weight *= self.idf[*index];
        }

        SparseVector::from_map(weights).normalized()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize() {
        assert_eq!(
            tokenize("Amazing GRACE, a sermon!"),
            vec!["amazing", "grace", "sermon"]
        );
        assert!(tokenize("").is_empty());
        assert!(tokenize("a b c").is_empty());
    }

    #[test]
    fn test_idf_matches_smooth_formula() {
        let vectorizer = TfidfVectorizer::fit(&["grace faith", "grace hope"]);
        assert_eq!(vectorizer.vocabulary_len(), 3);

        // grace: df=2, n=2 → ln(3/3)+1 = 1
        let grace = vectorizer.vocabulary["grace"];
        assert!((vectorizer.idf[grace] - 1.0).abs() < 1e-9);

        // faith: df=1 → ln(3/2)+1
        let faith = vectorizer.vocabulary["faith"];
        assert!((vectorizer.idf[faith] - ((1.5f64).ln() + 1.0)).abs() < 1e-9);
    }

    #[test]
    fn test_transform_is_unit_length() {
        let vectorizer = TfidfVectorizer::fit(&["grace faith grace", "hope"]);
        let v = vectorizer.transform("grace faith");
        assert!((v.norm() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_terms_give_zero_vector() {
        let vectorizer = TfidfVectorizer::fit(&["grace faith"]);
        let v = vectorizer.transform("unrelated words");
        assert!(v.is_zero());
        assert_eq!(cosine_similarity(&v, &vectorizer.transform("grace")), 0.0);
    }

    #[test]
    fn test_empty_corpus() {
        let empty: [&str; 0] = [];
        let vectorizer = TfidfVectorizer::fit(&empty);
        assert_eq!(vectorizer.vocabulary_len(), 0);
        assert!(vectorizer.transform("anything").is_zero());
    }

    #[test]
    fn test_cosine_same_text() {
        let vectorizer = TfidfVectorizer::fit(&["grace faith", "hope love"]);
        let a = vectorizer.transform("grace faith");
        let b = vectorizer.transform("faith grace");
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_cosine_disjoint() {
        let vectorizer = TfidfVectorizer::fit(&["grace faith", "hope love"]);
        let a = vectorizer.transform("grace");
        let b = vectorizer.transform("hope");
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }
}
