//! # 출석 세션 데이터베이스 쿼리 모듈
//!
//! 출석 세션의 생성, 종료, 조회를 담당하는 SQL 쿼리 함수들입니다.
//!
//! ## 세션 라이프사이클
//! ```text
//! [시작] insert_session() → 진행 중(closed_at = NULL) → close_session() → [종료]
//! ```
//!
//! `idx_sessions_one_open` 부분 유니크 인덱스가 "강의당 진행 중인 세션 하나"를
//! DB 수준에서 보장합니다. 동시에 두 요청이 세션을 열면 하나는 유니크 제약 위반으로 실패합니다.

use crate::error::AppError;
use crate::models::{AttendanceSession, CloseReason};
use sqlx::SqlitePool;

/// 새 출석 세션 행을 추가합니다.
///
/// 유니크 제약 위반(이미 열린 세션이 있음)은 `AppError::Database`로 그대로 전달되며,
/// 호출자(rotator)가 `AlreadyOpen`으로 변환합니다.
pub async fn insert_session(
    pool: &SqlitePool,
    id: &str,
    lecture_id: i64,
    rotation_seconds: i64,
    max_duration_seconds: i64,
    opened_at: &str,
) -> Result<AttendanceSession, AppError> {
    sqlx::query(
        r#"
        INSERT INTO attendance_sessions (id, lecture_id, rotation_seconds, max_duration_seconds, opened_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(id)
    .bind(lecture_id)
    .bind(rotation_seconds)
    .bind(max_duration_seconds)
    .bind(opened_at)
    .execute(pool)
    .await?;

    get_session(pool, id)
        .await?
        .ok_or(AppError::Internal("Failed to retrieve created session".to_string()))
}

/// ID로 세션 하나를 조회합니다.
pub async fn get_session(pool: &SqlitePool, id: &str) -> Result<Option<AttendanceSession>, AppError> {
    let session = sqlx::query_as::<_, AttendanceSession>(
        r#"
        SELECT id, lecture_id, rotation_seconds, max_duration_seconds,
               opened_at, closed_at, close_reason
        FROM attendance_sessions
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(session)
}

/// 강의의 진행 중인(closed_at이 NULL인) 세션을 조회합니다.
///
/// 최대 시간이 지났는지는 여기서 판단하지 않습니다 (rotator가 담당).
pub async fn find_open_session(
    pool: &SqlitePool,
    lecture_id: i64,
) -> Result<Option<AttendanceSession>, AppError> {
    let session = sqlx::query_as::<_, AttendanceSession>(
        r#"
        SELECT id, lecture_id, rotation_seconds, max_duration_seconds,
               opened_at, closed_at, close_reason
        FROM attendance_sessions
        WHERE lecture_id = ? AND closed_at IS NULL
        "#,
    )
    .bind(lecture_id)
    .fetch_optional(pool)
    .await?;

    Ok(session)
}

/// 가장 최근 세션 (열려 있든 닫혀 있든)
pub async fn latest_session(
    pool: &SqlitePool,
    lecture_id: i64,
) -> Result<Option<AttendanceSession>, AppError> {
    let session = sqlx::query_as::<_, AttendanceSession>(
        r#"
        SELECT id, lecture_id, rotation_seconds, max_duration_seconds,
               opened_at, closed_at, close_reason
        FROM attendance_sessions
        WHERE lecture_id = ?
        ORDER BY opened_at DESC, id DESC
        LIMIT 1
        "#,
    )
    .bind(lecture_id)
    .fetch_optional(pool)
    .await?;

    Ok(session)
}

/// 세션을 종료합니다.
///
/// `closed_at IS NULL` 조건 덕분에 이미 닫힌 세션은 다시 닫히지 않습니다.
/// 두 요청이 동시에 닫아도 먼저 기록된 종료 시각과 사유가 유지됩니다.
///
/// ## 반환값
/// - `Ok(Some(AttendanceSession))`: 종료된(또는 이미 종료되어 있던) 세션
/// - `Ok(None)`: 해당 ID의 세션이 존재하지 않음
pub async fn close_session(
    pool: &SqlitePool,
    id: &str,
    closed_at: &str,
    reason: CloseReason,
) -> Result<Option<AttendanceSession>, AppError> {
    sqlx::query(
        r#"
        UPDATE attendance_sessions
        SET closed_at = ?, close_reason = ?
        WHERE id = ? AND closed_at IS NULL
        "#,
    )
    .bind(closed_at)
    .bind(reason.as_str())
    .bind(id)
    .execute(pool)
    .await?;

    get_session(pool, id).await
}
