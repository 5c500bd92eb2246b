//! CLI 모듈
//!
//! sermon-finder CLI 명령어 정의 및 구현

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::bot::{run_polling, SermonBot, TelegramClient};
use crate::config::{self, default_db_path, get_bot_token, has_bot_token, ScrapeConfig};
use crate::knowledge::{search_store, SermonStore};
use crate::scraper::{clean_description, truncate_text, SermonScraper};

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Parser)]
#[command(name = "sermon-finder")]
#[command(version, about = "설교 스크래퍼 + 검색 봇", long_about = None)]
pub struct Cli {
    /// SQLite DB 경로 (기본: SERMON_DB_PATH 또는 ~/.sermon-finder/sermons.db)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 사이트맵을 따라 설교 페이지를 스크랩하여 저장
    Scrape {
        /// 최상위 사이트맵 URL (기본: SERMON_SITEMAP_URL 또는 SERMON_SITE_URL/wp-sitemap.xml)
        #[arg(long)]
        sitemap_url: Option<String>,
    },

    /// 저장된 설교 검색 (TF-IDF 상위 5개)
    Search {
        /// 검색 쿼리
        query: Vec<String>,
    },

    /// 저장된 설교 목록
    List {
        /// 결과 개수 제한
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// 상태 확인
    Status,

    /// 텔레그램 봇 실행 (Ctrl-C로 종료)
    Bot,
}

// ============================================================================
// CLI Runner
// ============================================================================

/// CLI 명령어 실행
pub async fn run(cli: Cli) -> Result<()> {
    let db_path = cli.db.unwrap_or_else(default_db_path);

    match cli.command {
        Commands::Scrape { sitemap_url } => cmd_scrape(&db_path, sitemap_url).await,
        Commands::Search { query } => cmd_search(&db_path, &query.join(" ")),
        Commands::List { limit } => cmd_list(&db_path, limit),
        Commands::Status => cmd_status(&db_path),
        Commands::Bot => cmd_bot(&db_path).await,
    }
}

// ============================================================================
// Command Implementations
// ============================================================================

/// 스크랩 명령어 (scrape)
async fn cmd_scrape(db_path: &Path, sitemap_url: Option<String>) -> Result<()> {
    let config = ScrapeConfig::from_env(sitemap_url)?;
    let store = SermonStore::open(db_path).context("SermonStore 열기 실패")?;

    println!("[*] 사이트맵: {}", config.sitemap_url);

    let scraper = SermonScraper::new(config)?;
    let stats = scraper
        .scrape_website(&store)
        .await
        .context("스크랩 실패")?;

    println!(
        "[OK] 완료: 발견 {}, 저장 {}, 건너뜀 {}",
        stats.found, stats.saved, stats.skipped
    );

    Ok(())
}

/// 검색 명령어 (search)
fn cmd_search(db_path: &Path, query: &str) -> Result<()> {
    if query.trim().is_empty() {
        println!("[!] 검색어를 입력하세요. 예: sermon-finder search power");
        return Ok(());
    }

    let store = SermonStore::open(db_path).context("SermonStore 열기 실패")?;

    println!("[*] 검색 중: \"{}\"", query);

    let results = search_store(&store, query).context("검색 실패")?;

    if results.is_empty() {
        println!("\n[!] 검색 결과가 없습니다.");
        return Ok(());
    }

    println!("\n[OK] 검색 결과 ({} 건):\n", results.len());

    for (i, result) in results.iter().enumerate() {
        let sermon = &result.sermon;

        println!(
            "{}. [점수: {:.4}] #{} {}",
            i + 1,
            result.score,
            sermon.id,
            sermon.display_title()
        );

        if let Some(date) = sermon.date {
            println!("   날짜: {}", date.format("%Y-%m-%d"));
        }
        println!(
            "   내용: {}",
            truncate_text(&clean_description(sermon.display_description()), 200)
        );
        println!("   MP3: {}", sermon.display_mp3_link());
        println!();
    }

    Ok(())
}

/// 목록 명령어 (list)
fn cmd_list(db_path: &Path, limit: usize) -> Result<()> {
    let store = SermonStore::open(db_path).context("SermonStore 열기 실패")?;

    let sermons = store
        .list_recent(limit)
        .context("설교 목록 조회 실패")?;

    if sermons.is_empty() {
        println!("[!] 저장된 설교가 없습니다.");
        return Ok(());
    }

    println!("[OK] 저장된 설교 ({} 건):\n", sermons.len());

    for sermon in sermons {
        let date = sermon
            .date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string());

        println!(
            "  #{:<4} [{}] {}",
            sermon.id,
            date,
            truncate_text(sermon.display_title(), 50)
        );
        println!("        MP3: {}", sermon.display_mp3_link());
        println!("        IMG: {}", sermon.display_image_url());
        println!();
    }

    Ok(())
}

/// 상태 명령어 (status)
fn cmd_status(db_path: &Path) -> Result<()> {
    println!("sermon-finder v{}", env!("CARGO_PKG_VERSION"));
    println!();

    println!("[*] 데이터 디렉토리: {}", config::get_data_dir().display());

    match ScrapeConfig::from_env(None) {
        Ok(scrape) => {
            println!("[OK] 사이트맵: {}", scrape.sitemap_url);
            println!("     필터: {}", scrape.sitemap_pattern);
            println!("     타임아웃: {:?}", scrape.timeout);
        }
        Err(_) => {
            println!("[!] 사이트맵: 미설정");
            println!("    설정: export {}=https://your-church.org", config::ENV_SITE_URL);
        }
    }

    if has_bot_token() {
        println!("[OK] 봇 토큰: 설정됨");
    } else {
        println!("[!] 봇 토큰: 미설정");
        println!("    설정: export {}=your-token", config::ENV_BOT_TOKEN);
    }

    match SermonStore::open(db_path).and_then(|store| store.stats()) {
        Ok(stats) => {
            println!("[OK] DB: {}", stats.db_path.display());
            println!("     저장된 설교: {} 건", stats.sermon_count);
            println!(
                "     날짜 있음: {} 건, MP3 있음: {} 건",
                stats.dated_count, stats.with_audio_count
            );
        }
        Err(e) => {
            println!("[!] DB 열기 실패: {:#}", e);
        }
    }

    Ok(())
}

/// 봇 명령어 (bot)
async fn cmd_bot(db_path: &Path) -> Result<()> {
    let token = get_bot_token()?;
    let store = SermonStore::open(db_path).context("SermonStore 열기 실패")?;
    let telegram = TelegramClient::new(&token).context("텔레그램 클라이언트 생성 실패")?;

    let http = reqwest::Client::builder()
        .user_agent(concat!("sermon-finder/", env!("CARGO_PKG_VERSION")))
        .timeout(config::http_timeout_from_env() * 10)
        .build()
        .context("HTTP 클라이언트 생성 실패")?;

    let bot = SermonBot::new(store, telegram, http);
    run_polling(&bot).await
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_search_args() {
        let cli = Cli::parse_from(["sermon-finder", "search", "amazing", "grace"]);
        match cli.command {
            Commands::Search { query } => assert_eq!(query.join(" "), "amazing grace"),
            _ => panic!("expected search"),
        }
        assert!(cli.db.is_none());
    }

    #[test]
    fn test_parse_global_db_flag() {
        let cli = Cli::parse_from(["sermon-finder", "list", "--db", "/tmp/s.db", "-l", "3"]);
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/s.db")));
        assert!(matches!(cli.command, Commands::List { limit: 3 }));
    }

    #[test]
    fn test_search_on_empty_db() {
        let dir = tempfile::TempDir::new().unwrap();
        let db_path = dir.path().join("cli.db");
        assert!(cmd_search(&db_path, "grace").is_ok());
        assert!(cmd_list(&db_path, 5).is_ok());
    }
}
