//! # 출석 세션 API 라우트 핸들러
//!
//! 교사 화면이 사용하는 엔드포인트입니다.
//!
//! ## 엔드포인트 목록
//! | 메서드 | 경로 | 핸들러 | 설명 |
//! |--------|------|--------|------|
//! | POST | /api/v1/lectures/:id/session | `open_session` | 세션 시작 |
//! | GET | /api/v1/lectures/:id/session | `get_session_status` | 세션 상태 |
//! | DELETE | /api/v1/lectures/:id/session | `close_session` | 세션 종료 |
//! | GET | /api/v1/lectures/:id/session/token | `get_current_token` | 현재 QR 토큰 |
//!
//! ## 세션 사용 흐름
//! ```text
//! 1. 수업 시작 → POST /lectures/:id/session
//! 2. 화면이 회전 주기마다 GET /lectures/:id/session/token 을 호출해 QR을 다시 그림
//! 3. 수업 종료 → DELETE /lectures/:id/session (또는 최대 시간이 지나 자동 종료)
//! ```

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};

use crate::{
    error::AppError,
    models::*,
    routes::AppState,
    services::rotator,
};

/// `POST /lectures/:id/session` — 출석 세션을 엽니다.
///
/// 본문은 선택입니다. `{ "rotation_seconds": 10 }`처럼 기본값 일부만 바꿀 수 있습니다.
pub async fn open_session(
    State(state): State<AppState>,
    Path(lecture_id): Path<i64>,
    body: Option<Json<OpenSessionRequest>>,
) -> Result<(StatusCode, Json<AttendanceSession>), AppError> {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    let policy = state.policy.with_overrides(&req)?;

    let session = rotator::open_session(&state.pool, lecture_id, policy, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// `GET /lectures/:id/session` — 세션 상태와 남은 시간을 조회합니다.
pub async fn get_session_status(
    State(state): State<AppState>,
    Path(lecture_id): Path<i64>,
) -> Result<Json<SessionStatus>, AppError> {
    crate::db::get_lecture(&state.pool, lecture_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let status = rotator::session_status(&state.pool, lecture_id, Utc::now()).await?;
    Ok(Json(status))
}

/// `DELETE /lectures/:id/session` — 세션을 종료합니다.
///
/// 종료 이후에는 이전에 발급된 토큰도 모두 거절됩니다.
pub async fn close_session(
    State(state): State<AppState>,
    Path(lecture_id): Path<i64>,
) -> Result<Json<AttendanceSession>, AppError> {
    let session = rotator::close_session(&state.pool, lecture_id, Utc::now()).await?;
    Ok(Json(session))
}

/// `GET /lectures/:id/session/token` — 지금 QR 코드로 보여줄 토큰
///
/// 응답: `{ "token": { value, bucket, valid_from, valid_until, ... }, "scan_url": "..." }`
pub async fn get_current_token(
    State(state): State<AppState>,
    Path(lecture_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let token = rotator::current_token(&state.pool, &state.signer, lecture_id, Utc::now()).await?;
    let scan_url = state.links.scan_url(&token);
    Ok(Json(json!({
        "token": token,
        "scan_url": scan_url,
    })))
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support::{app, send};
    use crate::test_utils::{seed_lecture, setup_test_db};
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn session_lifecycle() {
        let pool = setup_test_db().await;
        let lecture = seed_lecture(&pool, None, None).await;
        let app = app(pool);
        let base = format!("/api/v1/lectures/{}/session", lecture.id);

        let (status, body) = send(&app, "GET", &base, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["open"], false);

        let (status, session) = send(&app, "POST", &base, None).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(session["rotation_seconds"], 5);
        assert_eq!(session["max_duration_seconds"], 7200);

        let (status, body) = send(&app, "POST", &base, None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "session_already_open");

        let (status, body) = send(&app, "GET", &base, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["open"], true);
        assert!(body["remaining_seconds"].as_i64().unwrap() > 7000);

        let (status, closed) = send(&app, "DELETE", &base, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(closed["id"], session["id"]);
        assert_eq!(closed["close_reason"], "closed");

        let (status, body) = send(&app, "DELETE", &base, None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "session_closed");
    }

    #[tokio::test]
    async fn open_accepts_overrides_and_rejects_bad_values() {
        let pool = setup_test_db().await;
        let lecture = seed_lecture(&pool, None, None).await;
        let app = app(pool);
        let base = format!("/api/v1/lectures/{}/session", lecture.id);

        let (status, body) = send(&app, "POST", &base, Some(json!({ "rotation_seconds": 0 }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "invalid_config");

        let (status, session) = send(
            &app,
            "POST",
            &base,
            Some(json!({ "rotation_seconds": 30, "max_duration_seconds": 600 })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(session["rotation_seconds"], 30);
        assert_eq!(session["max_duration_seconds"], 600);
    }

    #[tokio::test]
    async fn oversized_max_duration_is_rejected_and_lecture_stays_usable() {
        let pool = setup_test_db().await;
        let lecture = seed_lecture(&pool, None, None).await;
        let app = app(pool);
        let base = format!("/api/v1/lectures/{}/session", lecture.id);

        let (status, body) = send(
            &app,
            "POST",
            &base,
            Some(json!({ "max_duration_seconds": 100_000_000_000_000_i64 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "invalid_config");

        // 서버 상한(7200초)보다 긴 값도 거부됩니다
        let (status, _) = send(&app, "POST", &base, Some(json!({ "max_duration_seconds": 7201 }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(&app, "GET", &base, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["open"], false);

        let (status, _) = send(&app, "POST", &base, None).await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, body) = send(&app, "GET", &base, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["open"], true);
    }

    #[tokio::test]
    async fn token_requires_open_session() {
        let pool = setup_test_db().await;
        let lecture = seed_lecture(&pool, None, None).await;
        let app = app(pool);
        let token_uri = format!("/api/v1/lectures/{}/session/token", lecture.id);

        let (status, _) = send(&app, "GET", &token_uri, None).await;
        assert_eq!(status, StatusCode::CONFLICT);

        send(&app, "POST", &format!("/api/v1/lectures/{}/session", lecture.id), None).await;
        let (status, body) = send(&app, "GET", &token_uri, None).await;
        assert_eq!(status, StatusCode::OK);

        let value = body["token"]["value"].as_str().unwrap();
        assert_eq!(value.len(), 16);
        assert_eq!(
            body["scan_url"],
            format!(
                "http://localhost:5173/attend?lectureId={}&t={}",
                lecture.id, value
            )
        );
    }

    #[tokio::test]
    async fn unknown_lecture() {
        let app = app(setup_test_db().await);
        let (status, _) = send(&app, "POST", "/api/v1/lectures/99/session", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, "GET", "/api/v1/lectures/99/session", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
