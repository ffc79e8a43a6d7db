//! # 체크인(출석) 라우트 핸들러
//!
//! ## 엔드포인트
//! - `POST /api/v1/lectures/:id/check-ins` → 토큰 + 위치로 체크인
//! - `POST /api/v1/check-ins/scan`         → 스캔한 QR 내용 그대로 체크인
//! - `GET  /api/v1/lectures/:id/check-ins` → 강의 출석 명단 (출석 순)
//! - `GET  /api/v1/students/:id/check-ins` → 학생 출석 이력 (최신순)
//!
//! 거절 사유별 응답은 `AttendanceError`의 상태 코드를 따릅니다.
//! 예: 반경 밖 → 403 + `distance_meters`, 위치 없음 → 422 + `reason`.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};

use crate::{
    db,
    error::AppError,
    models::*,
    routes::AppState,
    services::{
        admission::{admit_check_in, CheckInAttempt},
        scan_token::parse_scan_payload,
    },
};

/// `POST /lectures/:id/check-ins` — 체크인을 제출합니다.
pub async fn submit_check_in(
    State(state): State<AppState>,
    Path(lecture_id): Path<i64>,
    Json(req): Json<CheckInRequest>,
) -> Result<(StatusCode, Json<CheckIn>), AppError> {
    let attempt = CheckInAttempt {
        lecture_id,
        student_id: &req.student_id,
        token: &req.token,
        location: req.location.claimed()?,
    };

    let check_in = admit_check_in(
        &state.pool,
        &state.signer,
        state.default_radius_meters,
        attempt,
        Utc::now(),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(check_in)))
}

/// `POST /check-ins/scan` — QR 코드 내용(URL)을 그대로 받아 체크인합니다.
///
/// 공식 QR 형식이 아니면 400을 반환합니다.
pub async fn submit_scanned_check_in(
    State(state): State<AppState>,
    Json(req): Json<ScanCheckInRequest>,
) -> Result<(StatusCode, Json<CheckIn>), AppError> {
    let (lecture_id, token) = parse_scan_payload(&req.payload)?;
    let attempt = CheckInAttempt {
        lecture_id,
        student_id: &req.student_id,
        token: &token,
        location: req.location.claimed()?,
    };

    let check_in = admit_check_in(
        &state.pool,
        &state.signer,
        state.default_radius_meters,
        attempt,
        Utc::now(),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(check_in)))
}

/// `GET /lectures/:id/check-ins` — 실시간 출석 명단
pub async fn list_lecture_check_ins(
    State(state): State<AppState>,
    Path(lecture_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    db::get_lecture(&state.pool, lecture_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let check_ins = db::list_for_lecture(&state.pool, lecture_id).await?;
    Ok(Json(json!({
        "lecture_id": lecture_id,
        "count": check_ins.len(),
        "check_ins": check_ins,
    })))
}

/// `GET /students/:id/check-ins` — 학생의 출석 이력
pub async fn list_student_check_ins(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let check_ins = db::list_for_student(&state.pool, &student_id).await?;
    Ok(Json(json!({ "check_ins": check_ins })))
}
