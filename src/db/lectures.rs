//! # 강의 데이터베이스 쿼리 모듈
//!
//! 강의 등록과 조회를 담당하는 SQL 쿼리 함수들입니다.

use crate::error::AppError;
use crate::models::{CreateLectureRequest, Lecture};
use sqlx::SqlitePool;

/// 새 강의를 등록하고 생성된 강의를 반환합니다.
///
/// 강의 ID는 SQLite의 AUTOINCREMENT 정수입니다.
/// `last_insert_rowid()`로 방금 생성된 ID를 얻은 뒤 다시 조회하여,
/// DB 기본값(created_at)이 채워진 완전한 객체를 반환합니다.
pub async fn create_lecture(pool: &SqlitePool, req: &CreateLectureRequest) -> Result<Lecture, AppError> {
    let result = sqlx::query(
        r#"
        INSERT INTO lectures (name, subject, scheduled_at, teacher_id, latitude, longitude, radius_meters)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(req.name.trim())
    .bind(req.subject.trim())
    .bind(&req.scheduled_at)
    .bind(req.teacher_id.trim())
    .bind(req.latitude) // Option<f64>: None이면 SQL NULL
    .bind(req.longitude)
    .bind(req.radius_meters)
    .execute(pool)
    .await?;

    get_lecture(pool, result.last_insert_rowid())
        .await?
        .ok_or(AppError::Internal("Failed to retrieve created lecture".to_string()))
}

/// ID로 강의 하나를 조회합니다.
pub async fn get_lecture(pool: &SqlitePool, id: i64) -> Result<Option<Lecture>, AppError> {
    let lecture = sqlx::query_as::<_, Lecture>(
        r#"
        SELECT id, name, subject, scheduled_at, teacher_id,
               latitude, longitude, radius_meters, created_at
        FROM lectures
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(lecture)
}

/// 강의 목록을 최신순으로 조회합니다.
///
/// `teacher_id`가 주어지면 해당 교사의 강의만 반환합니다.
pub async fn list_lectures(pool: &SqlitePool, teacher_id: Option<&str>) -> Result<Vec<Lecture>, AppError> {
    // `? IS NULL OR teacher_id = ?`: 필터가 없으면 전체, 있으면 해당 교사만
    let lectures = sqlx::query_as::<_, Lecture>(
        r#"
        SELECT id, name, subject, scheduled_at, teacher_id,
               latitude, longitude, radius_meters, created_at
        FROM lectures
        WHERE ? IS NULL OR teacher_id = ?
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .bind(teacher_id)
    .bind(teacher_id)
    .fetch_all(pool)
    .await?;

    Ok(lectures)
}
