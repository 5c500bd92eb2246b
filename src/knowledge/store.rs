//! Sermon Store - rusqlite 기반 설교 레코드 저장소
//!
//! 스크랩한 설교(제목, 본문, 날짜, MP3, 이미지)를 `messages` 테이블에 저장합니다.
//! 저장 위치: ~/.sermon-finder/sermons.db
//!
//! 연결은 작업마다 새로 열고 작업이 끝나면 닫습니다.
//! 공유 커서가 없으므로 여러 작업이 동시에 호출되어도 안전합니다.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OpenFlags, Row};

use crate::config::default_db_path;

// ============================================================================
// Display Sentinels
// ============================================================================

pub const NO_TITLE: &str = "No Title";
pub const NO_DESCRIPTION: &str = "No Description";
pub const NO_MP3_LINK: &str = "No MP3 Link";
pub const NO_IMAGE_URL: &str = "No Image URL";

// ============================================================================
// Types
// ============================================================================

/// 저장된 설교 레코드
#[derive(Debug, Clone, PartialEq)]
pub struct Sermon {
    pub id: i64,
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
    pub mp3_link: Option<String>,
    pub image_url: Option<String>,
}

/// 새 설교 입력용 구조체 (id는 저장 시 부여)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewSermon {
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
    pub mp3_link: Option<String>,
    pub image_url: Option<String>,
}

impl Sermon {
    /// 제목 (없으면 "No Title")
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(NO_TITLE)
    }

    /// 본문 (없으면 "No Description")
    pub fn display_description(&self) -> &str {
        self.description.as_deref().unwrap_or(NO_DESCRIPTION)
    }

    /// MP3 링크 (없으면 "No MP3 Link")
    pub fn display_mp3_link(&self) -> &str {
        self.mp3_link.as_deref().unwrap_or(NO_MP3_LINK)
    }

    /// 이미지 URL (없으면 "No Image URL")
    pub fn display_image_url(&self) -> &str {
        self.image_url.as_deref().unwrap_or(NO_IMAGE_URL)
    }

    /// 검색 대상 텍스트 (제목 + 본문)
    pub fn search_text(&self) -> String {
        format!(
            "{} {}",
            self.title.as_deref().unwrap_or(""),
            self.description.as_deref().unwrap_or("")
        )
    }
}

/// 저장소 통계
#[derive(Debug, Clone)]
pub struct StoreStats {
    pub sermon_count: usize,
    pub dated_count: usize,
    pub with_audio_count: usize,
    pub db_path: PathBuf,
}

// ============================================================================
// SermonStore
// ============================================================================

/// Sermon Store - 설교 레코드 저장소
///
/// 삽입과 전체 조회만 지원합니다. 같은 페이지를 다시 스크랩하면
/// 중복 행이 생깁니다.
#[derive(Debug, Clone)]
pub struct SermonStore {
    db_path: PathBuf,
}

impl SermonStore {
    /// 저장소 열기 (없으면 생성)
    ///
    /// # Arguments
    /// * `path` - DB 파일 경로 (없으면 생성)
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .context("Failed to create database directory")?;
            }
        }

        let store = Self {
            db_path: path.to_path_buf(),
        };

        store.initialize()?;
        Ok(store)
    }

    /// 기본 위치에서 열기 (`SERMON_DB_PATH` 또는 ~/.sermon-finder/sermons.db)
    pub fn open_default() -> Result<Self> {
        Self::open(&default_db_path())
    }

    /// DB 경로 반환
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// 작업 단위 연결 (호출자가 drop 하면 닫힘)
    fn connect(&self) -> Result<Connection> {
        Connection::open_with_flags(
            &self.db_path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_context(|| format!("Failed to open SQLite database {:?}", self.db_path))
    }

    /// 스키마 초기화
    fn initialize(&self) -> Result<()> {
        let conn = self.connect()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT,
                description TEXT,
                date TEXT,
                mp3_link TEXT,
                image_url TEXT
            )",
            [],
        )
        .context("Failed to create messages table")?;

        tracing::debug!("Sermon store initialized at {:?}", self.db_path);
        Ok(())
    }

    /// 설교 저장 (중복 검사 없음)
    pub fn insert(&self, sermon: &NewSermon) -> Result<i64> {
        let conn = self.connect()?;

        conn.execute(
            "INSERT INTO messages (title, description, date, mp3_link, image_url)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                sermon.title,
                sermon.description,
                sermon.date.map(format_date),
                sermon.mp3_link,
                sermon.image_url,
            ],
        )
        .context("Failed to insert sermon")?;

        let id = conn.last_insert_rowid();
        tracing::debug!("Inserted sermon id={}", id);

        Ok(id)
    }

    /// 전체 설교 조회 (검색용)
    pub fn load_all(&self) -> Result<Vec<Sermon>> {
        let conn = self.connect()?;

        let mut stmt = conn.prepare(
            "SELECT id, title, description, date, mp3_link, image_url FROM messages ORDER BY id",
        )?;

        let sermons = stmt
            .query_map([], sermon_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to load sermons")?;

        Ok(sermons)
    }

    /// 최근 설교 목록
    pub fn list_recent(&self, limit: usize) -> Result<Vec<Sermon>> {
        let conn = self.connect()?;

        let mut stmt = conn.prepare(
            "SELECT id, title, description, date, mp3_link, image_url FROM messages
             ORDER BY id DESC
             LIMIT ?1",
        )?;

        let sermons = stmt
            .query_map(params![limit as i64], sermon_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to list sermons")?;

        Ok(sermons)
    }

    /// 저장소 통계
    pub fn stats(&self) -> Result<StoreStats> {
        let conn = self.connect()?;

        let (count, dated, with_audio): (i64, i64, i64) = conn
            .query_row(
                "SELECT COUNT(*), COUNT(date), COUNT(mp3_link) FROM messages",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .context("Failed to read store stats")?;

        Ok(StoreStats {
            sermon_count: count as usize,
            dated_count: dated as usize,
            with_audio_count: with_audio as usize,
            db_path: self.db_path.clone(),
        })
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn sermon_from_row(row: &Row<'_>) -> rusqlite::Result<Sermon> {
    Ok(Sermon {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        date: row.get::<_, Option<String>>(3)?.and_then(|s| parse_date(&s)),
        mp3_link: row.get(4)?,
        image_url: row.get(5)?,
    })
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// ISO 날짜 문자열 파싱 (잘못된 값은 None)
fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_store() -> (TempDir, SermonStore) {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("test.db");
        let store = SermonStore::open(&db_path).unwrap();
        (dir, store)
    }

    fn sample(title: &str) -> NewSermon {
        NewSermon {
            title: Some(title.to_string()),
            description: Some(format!("About {}", title)),
            date: NaiveDate::from_ymd_opt(2024, 1, 14),
            mp3_link: Some("https://church.example/a.mp3".to_string()),
            image_url: None,
        }
    }

    #[test]
    fn test_insert_and_load() {
        let (_dir, store) = create_test_store();

        let id = store.insert(&sample("Grace")).unwrap();
        assert!(id > 0);

        let all = store.load_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, id);
        assert_eq!(all[0].title.as_deref(), Some("Grace"));
        assert_eq!(all[0].date, NaiveDate::from_ymd_opt(2024, 1, 14));
        assert!(all[0].image_url.is_none());
    }

    #[test]
    fn test_duplicates_allowed() {
        let (_dir, store) = create_test_store();

        let first = store.insert(&sample("Same")).unwrap();
        let second = store.insert(&sample("Same")).unwrap();
        assert_ne!(first, second);
        assert_eq!(store.load_all().unwrap().len(), 2);
    }

    #[test]
    fn test_all_fields_absent() {
        let (_dir, store) = create_test_store();

        store.insert(&NewSermon::default()).unwrap();
        let all = store.load_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].display_title(), NO_TITLE);
        assert_eq!(all[0].display_description(), NO_DESCRIPTION);
        assert_eq!(all[0].display_mp3_link(), NO_MP3_LINK);
        assert_eq!(all[0].display_image_url(), NO_IMAGE_URL);
        assert!(all[0].date.is_none());
    }

    #[test]
    fn test_reopen_keeps_rows() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("nested").join("sermons.db");

        SermonStore::open(&db_path).unwrap().insert(&sample("Kept")).unwrap();

        let reopened = SermonStore::open(&db_path).unwrap();
        assert_eq!(reopened.load_all().unwrap().len(), 1);
    }

    #[test]
    fn test_list_recent() {
        let (_dir, store) = create_test_store();

        for i in 0..5 {
            store.insert(&sample(&format!("Sermon {}", i))).unwrap();
        }

        let recent = store.list_recent(2).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].title.as_deref(), Some("Sermon 4"));
    }

    #[test]
    fn test_stats() {
        let (_dir, store) = create_test_store();

        store.insert(&sample("One")).unwrap();
        store.insert(&NewSermon::default()).unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.sermon_count, 2);
        assert_eq!(stats.dated_count, 1);
        assert_eq!(stats.with_audio_count, 1);
    }

    #[test]
    fn test_search_text() {
        let sermon = Sermon {
            id: 1,
            title: Some("Grace".to_string()),
            description: None,
            date: None,
            mp3_link: None,
            image_url: None,
        };
        assert_eq!(sermon.search_text(), "Grace ");
    }
}
