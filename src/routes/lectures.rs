//! # 강의(Lecture) 라우트 핸들러
//!
//! ## 엔드포인트
//! - `GET  /api/v1/lectures?teacher_id=...` → 강의 목록 (최신순)
//! - `POST /api/v1/lectures`                → 강의 등록
//! - `GET  /api/v1/lectures/:id`            → 단일 강의 조회
//!
//! 응답의 `attend_url`은 학생용 출석 페이지 주소입니다.
//! 토큰이 붙은 QR 주소는 세션이 열려 있을 때 `/session/token`에서 받습니다.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use crate::{db, error::AppError, models::*, routes::AppState};

fn with_attend_url(state: &AppState, lecture: Lecture) -> LectureResponse {
    LectureResponse {
        attend_url: state.links.attend_url(lecture.id),
        lecture,
    }
}

/// `GET /lectures` — 강의 목록을 조회합니다.
///
/// `teacher_id` 쿼리가 있으면 해당 교사의 강의만 반환합니다.
pub async fn list_lectures(
    State(state): State<AppState>,
    Query(query): Query<LectureQuery>,
) -> Result<Json<Value>, AppError> {
    let lectures = db::list_lectures(&state.pool, query.teacher_id.as_deref()).await?;
    let lectures: Vec<LectureResponse> = lectures
        .into_iter()
        .map(|lecture| with_attend_url(&state, lecture))
        .collect();
    Ok(Json(json!({ "lectures": lectures })))
}

/// `POST /lectures` — 새 강의를 등록합니다.
///
/// 위치를 지정하면 이 강의의 체크인은 지오펜스 검사를 받습니다.
/// 반경이 없으면 서버 기본 반경이 적용됩니다.
pub async fn create_lecture(
    State(state): State<AppState>,
    Json(req): Json<CreateLectureRequest>,
) -> Result<(StatusCode, Json<LectureResponse>), AppError> {
    req.validate()?;

    let lecture = db::create_lecture(&state.pool, &req).await?;
    tracing::info!(
        "Created lecture {} ({}) for teacher {}",
        lecture.id,
        lecture.name,
        lecture.teacher_id
    );
    Ok((StatusCode::CREATED, Json(with_attend_url(&state, lecture))))
}

/// `GET /lectures/:id` — 단일 강의를 조회합니다.
pub async fn get_lecture(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<LectureResponse>, AppError> {
    let lecture = db::get_lecture(&state.pool, id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(with_attend_url(&state, lecture)))
}
