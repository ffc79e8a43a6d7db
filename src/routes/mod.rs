//! # 라우트 핸들러 모듈
//!
//! HTTP 요청을 처리하는 핸들러 함수들을 모아둔 모듈입니다.
//! Axum에서 핸들러는 HTTP 요청을 받아 응답을 반환하는 async 함수입니다.
//!
//! 각 하위 모듈:
//! - `health`: 서버 상태 확인 (헬스체크)
//! - `lectures`: 강의 등록/조회
//! - `sessions`: 출석 세션 열기/닫기/상태, 현재 스캔 토큰
//! - `check_ins`: 체크인 제출과 출석 목록

pub mod check_ins;
pub mod health;
pub mod lectures;
pub mod sessions;

pub use check_ins::*;
pub use health::*;
pub use lectures::*;
pub use sessions::*;

use axum::{
    routing::{get, post},
    Router,
};
use sqlx::SqlitePool;

use crate::services::rotator::SessionPolicy;
use crate::services::scan_token::{ScanLinks, TokenSigner};

/// 애플리케이션 공유 상태
///
/// 모든 요청 핸들러가 `State(state): State<AppState>`로 접근합니다.
/// 세션 상태 자체는 여기가 아니라 DB에 있으므로,
/// 이 구조체에는 시작 시 정해지는 불변 값만 들어갑니다.
#[derive(Clone)]
pub struct AppState {
    /// SQLite 연결 풀 (내부적으로 Arc로 공유)
    pub pool: SqlitePool,
    /// 스캔 토큰 서명 키
    pub signer: TokenSigner,
    /// QR 코드 URL 생성기
    pub links: ScanLinks,
    /// 세션 기본 정책 (요청에 값이 없을 때 사용)
    pub policy: SessionPolicy,
    /// 반경이 없는 강의에 적용할 기본 반경
    pub default_radius_meters: f64,
}

/// `/api/v1` 아래에 붙는 API 라우터
///
/// Axum 0.8부터 경로 파라미터는 `{id}` 형식입니다.
pub fn router(state: AppState) -> Router {
    Router::new()
        // 강의
        .route("/lectures", get(list_lectures).post(create_lecture))
        .route("/lectures/{id}", get(get_lecture))
        // 출석 세션 (강의당 최대 하나가 열려 있음)
        .route(
            "/lectures/{id}/session",
            get(get_session_status).post(open_session).delete(close_session),
        )
        .route("/lectures/{id}/session/token", get(get_current_token))
        // 체크인
        .route(
            "/lectures/{id}/check-ins",
            get(list_lecture_check_ins).post(submit_check_in),
        )
        .route("/check-ins/scan", post(submit_scanned_check_in))
        .route("/students/{id}/check-ins", get(list_student_check_ins))
        // 헬스체크 API (서버 상태 확인용)
        .route("/health", get(health_check))
        .with_state(state)
}

#[cfg(test)]
pub(crate) mod test_support {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        Router,
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;

    pub fn app(pool: SqlitePool) -> Router {
        let state = AppState {
            pool,
            signer: TokenSigner::new("route-test-secret").unwrap(),
            links: ScanLinks::new("http://localhost:5173").unwrap(),
            policy: SessionPolicy::new(5, 7200).unwrap(),
            default_radius_meters: 200.0,
        };
        Router::new().nest("/api/v1", router(state))
    }

    /// 요청 하나를 보내고 (상태 코드, JSON 본문)을 돌려줍니다.
    pub async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }
}
