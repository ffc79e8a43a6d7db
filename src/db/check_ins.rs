//! # 출석 기록 데이터베이스 쿼리 모듈
//!
//! `check_ins` 테이블은 `UNIQUE (lecture_id, student_id)` 제약을 가집니다.
//! 이 제약이 "학생당 강의당 출석 하나"의 실제 보장이며,
//! 애플리케이션의 사전 조회(`find_check_in`)는 빠른 거절을 위한 것일 뿐입니다.

use crate::error::AppError;
use crate::models::CheckIn;
use sqlx::SqlitePool;

/// 출석 기록을 저장합니다.
///
/// 같은 (lecture_id, student_id)가 이미 있으면 유니크 제약 위반으로
/// `AppError::Database`가 반환됩니다. `db::is_unique_violation`으로 구분하세요.
pub async fn insert_check_in(pool: &SqlitePool, check_in: &CheckIn) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO check_ins
            (id, lecture_id, student_id, session_id, token_bucket, distance_meters, checked_in_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&check_in.id)
    .bind(check_in.lecture_id)
    .bind(&check_in.student_id)
    .bind(&check_in.session_id)
    .bind(check_in.token_bucket)
    .bind(check_in.distance_meters)
    .bind(&check_in.checked_in_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// 특정 학생의 특정 강의 출석 기록
pub async fn find_check_in(
    pool: &SqlitePool,
    lecture_id: i64,
    student_id: &str,
) -> Result<Option<CheckIn>, AppError> {
    let check_in = sqlx::query_as::<_, CheckIn>(
        r#"
        SELECT id, lecture_id, student_id, session_id, token_bucket, distance_meters, checked_in_at
        FROM check_ins
        WHERE lecture_id = ? AND student_id = ?
        "#,
    )
    .bind(lecture_id)
    .bind(student_id)
    .fetch_optional(pool)
    .await?;

    Ok(check_in)
}

/// 강의의 출석 목록 (출석 순)
pub async fn list_for_lecture(pool: &SqlitePool, lecture_id: i64) -> Result<Vec<CheckIn>, AppError> {
    let check_ins = sqlx::query_as::<_, CheckIn>(
        r#"
        SELECT id, lecture_id, student_id, session_id, token_bucket, distance_meters, checked_in_at
        FROM check_ins
        WHERE lecture_id = ?
        ORDER BY checked_in_at ASC, id ASC
        "#,
    )
    .bind(lecture_id)
    .fetch_all(pool)
    .await?;

    Ok(check_ins)
}

/// 학생의 출석 이력 (최신순)
pub async fn list_for_student(pool: &SqlitePool, student_id: &str) -> Result<Vec<CheckIn>, AppError> {
    let check_ins = sqlx::query_as::<_, CheckIn>(
        r#"
        SELECT id, lecture_id, student_id, session_id, token_bucket, distance_meters, checked_in_at
        FROM check_ins
        WHERE student_id = ?
        ORDER BY checked_in_at DESC, id DESC
        "#,
    )
    .bind(student_id)
    .fetch_all(pool)
    .await?;

    Ok(check_ins)
}
