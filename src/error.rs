//! 에러 타입
//!
//! 네트워크 수집 실패(`FetchError`)와 사용자 전송 실패(`DeliveryError`)를
//! 구분합니다. 호출자가 각 실패에 대한 폴백을 직접 결정합니다.

use thiserror::Error;

/// HTTP 수집 실패 (네트워크 오류 또는 2xx가 아닌 응답)
#[derive(Debug, Error)]
pub enum FetchError {
    /// 요청 전송 실패
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// 성공이 아닌 상태 코드
    #[error("{url} returned HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    /// 응답 본문 읽기 실패
    #[error("failed to read body of {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// 임시 파일 쓰기 실패
    #[error("failed to buffer {url}: {source}")]
    Io {
        url: String,
        #[source]
        source: std::io::Error,
    },
}

/// 채팅 사용자에게 메시지/미디어 전송 실패
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// 전송 HTTP 오류
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Bot API가 거부한 요청
    #[error("{method} rejected: {description}")]
    Api { method: String, description: String },

    /// 첨부 파일 처리 실패
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// 첨부할 미디어 다운로드 실패
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// 상태 코드까지 확인하는 GET 요청
///
/// 2xx가 아니면 `FetchError::Status`를 반환합니다.
pub(crate) async fn get_checked(
    client: &reqwest::Client,
    url: &str,
) -> Result<reqwest::Response, FetchError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|source| FetchError::Request {
            url: url.to_string(),
            source,
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status,
        });
    }

    Ok(response)
}

/// GET 후 본문을 문자열로 읽기
pub(crate) async fn fetch_text(client: &reqwest::Client, url: &str) -> Result<String, FetchError> {
    get_checked(client, url)
        .await?
        .text()
        .await
        .map_err(|source| FetchError::Body {
            url: url.to_string(),
            source,
        })
}
