//! 설교 본문 정리 - 플레이어 UI 잔여 텍스트 제거

use std::sync::OnceLock;

use regex::Regex;

/// 본문에 섞여 들어오는 플레이어/페이지 UI 문구
const BOILERPLATE_PHRASES: &[&str] = &[
    "Download. Listen. Share. Be Transformed.",
    "PlayStopNext»«Prev",
    "HIDE PLAYLIST",
    "Topics:",
    "«",
    "»",
];

fn boilerplate_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let mut alternatives: Vec<String> =
            BOILERPLATE_PHRASES.iter().map(|p| regex::escape(p)).collect();
        // 닫기 버튼 "X" 는 단독 토큰일 때만
        alternatives.push(r"\bX\b".to_string());
        Regex::new(&alternatives.join("|")).expect("boilerplate pattern is valid")
    })
}

fn whitespace_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("whitespace pattern is valid"))
}

/// 설교 본문 정리
///
/// UI 문구를 지우고 연속 공백/줄바꿈을 공백 하나로 합칩니다.
/// 문구를 지운 자리에서 새 문구가 생길 수 있으므로 더 바뀌지 않을 때까지
/// 반복합니다. 따라서 두 번 적용해도 결과가 같습니다.
pub fn clean_description(description: &str) -> String {
    let mut current = collapse(description);

    loop {
        let stripped = boilerplate_regex().replace_all(&current, "");
        let next = collapse(&stripped);
        if next == current {
            return next;
        }
        current = next;
    }
}

fn collapse(text: &str) -> String {
    whitespace_regex().replace_all(text, " ").trim().to_string()
}

/// 한 줄 표시용 텍스트 자르기 (UTF-8 안전)
///
/// 줄바꿈과 연속 공백은 공백 하나로 합칩니다.
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    let text = collapse(text);

    if text.chars().count() <= max_chars {
        text
    } else {
        let truncated: String = text.chars().take(max_chars).collect();
        format!("{}...", truncated.trim_end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removes_player_ui() {
        let raw = "Download. Listen. Share. Be Transformed.\n\n  PlayStopNext»«Prev\nHIDE PLAYLIST X\n\
                   Topics: Faith  Grace\n\nA message on grace.";
        assert_eq!(clean_description(raw), "Faith Grace A message on grace.");
    }

    #[test]
    fn test_keeps_words_containing_x() {
        assert_eq!(
            clean_description("Xavier preached on Exodus X"),
            "Xavier preached on Exodus"
        );
    }

    #[test]
    fn test_collapses_whitespace() {
        assert_eq!(clean_description("  a \n\n b\t\tc  "), "a b c");
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "Top«ics: hidden",
            "HIDE\nPLAYLIST then text",
            "« » «» Topics:Topics: X X X",
            "Download. Listen. Share. Be Transformed.Download. Listen. Share. Be Transformed.",
            "plain text",
            "",
        ];
        for input in inputs {
            let once = clean_description(input);
            assert_eq!(clean_description(&once), once, "input: {:?}", input);
        }
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("hello", 10), "hello");
        assert_eq!(truncate_text("hello world", 5), "hello...");
        assert_eq!(truncate_text("hello world", 6), "hello...");
        assert_eq!(truncate_text("hello\nworld", 20), "hello world");
        assert_eq!(truncate_text("은혜와 평강", 3), "은혜와...");
    }

    #[test]
    fn test_nested_phrase_removed() {
        assert_eq!(clean_description("Top«ics: hidden"), "hidden");
    }
}
