//! # 에러 처리 모듈
//!
//! 애플리케이션에서 발생할 수 있는 모든 에러 타입을 정의합니다.
//!
//! 이 모듈의 핵심:
//! - `AttendanceError`: 출석 세션/스캔/지오펜스 과정에서 생기는 "예상 가능한" 결과들.
//!   학생에게 그대로 보여줄 수 있는 에러이며, 서버 장애가 아닙니다.
//! - `AppError` 열거형(enum): 모든 에러 종류를 하나의 타입으로 통합
//! - `IntoResponse` 구현: 에러를 HTTP 응답으로 자동 변환

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::services::geofence::{format_distance, LocationFailure};

/// 출석 처리 도메인 에러
///
/// 모든 variant는 사용자에게 노출되는 정상적인 거절 사유입니다.
/// 특히 `LocationUnavailable`과 `OutOfRange`는 반드시 구분되어야 합니다.
/// 전자는 "위치를 다시 가져오세요", 후자는 "더 가까이 오세요"로 안내됩니다.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AttendanceError {
    /// 잘못된 설정값 (회전 주기 ≤ 0, 반경 ≤ 0 등)
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// 이미 진행 중인 세션이 있는 강의에 세션을 또 열려고 함
    #[error("An attendance session is already open for lecture {lecture_id}")]
    AlreadyOpen { lecture_id: i64 },

    /// 세션이 닫혀 있거나(또는 최대 시간이 지나 자동 종료됨) 존재하지 않음
    #[error("No open attendance session for lecture {lecture_id}")]
    SessionClosed { lecture_id: i64 },

    /// 현재 버킷과 직전 버킷 어디에도 해당하지 않는 토큰
    #[error("QR code has expired, please scan the current code")]
    StaleToken,

    /// 클라이언트가 위치를 얻지 못함 (권한 거부, 시간 초과 등)
    #[error("Location unavailable: {0}")]
    LocationUnavailable(LocationFailure),

    /// 지오펜스 반경 밖에서 스캔함. 계산된 거리를 함께 전달합니다.
    #[error("You are {} away from the lecture location (allowed: {})", format_distance(*distance_meters), format_distance(*radius_meters))]
    OutOfRange {
        distance_meters: f64,
        radius_meters: f64,
    },

    /// 이미 출석한 학생. 최초 기록의 시각이 유지됩니다.
    #[error("Attendance already marked for this lecture")]
    DuplicateCheckIn { checked_in_at: String },
}

impl AttendanceError {
    /// (HTTP 상태 코드, 에러 코드, 추가 필드)
    fn parts(&self) -> (StatusCode, &'static str, Value) {
        match self {
            AttendanceError::InvalidConfig(_) => {
                (StatusCode::BAD_REQUEST, "invalid_config", Value::Null)
            }
            AttendanceError::AlreadyOpen { lecture_id } => (
                StatusCode::CONFLICT,
                "session_already_open",
                json!({ "lecture_id": lecture_id }),
            ),
            AttendanceError::SessionClosed { lecture_id } => (
                StatusCode::CONFLICT,
                "session_closed",
                json!({ "lecture_id": lecture_id }),
            ),
            AttendanceError::StaleToken => (StatusCode::GONE, "stale_token", Value::Null),
            AttendanceError::LocationUnavailable(reason) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "location_unavailable",
                json!({ "reason": reason }),
            ),
            AttendanceError::OutOfRange {
                distance_meters,
                radius_meters,
            } => (
                StatusCode::FORBIDDEN,
                "out_of_range",
                json!({
                    "distance_meters": distance_meters.round(),
                    "radius_meters": radius_meters,
                }),
            ),
            AttendanceError::DuplicateCheckIn { checked_in_at } => (
                StatusCode::CONFLICT,
                "duplicate_check_in",
                json!({ "checked_in_at": checked_in_at }),
            ),
        }
    }
}

/// 애플리케이션에서 발생할 수 있는 모든 에러 종류
///
/// 핸들러에서 `Result<T, AppError>`를 반환하면,
/// Axum이 자동으로 `IntoResponse`를 호출하여 HTTP 응답으로 변환합니다.
#[derive(Debug, Error)]
pub enum AppError {
    /// 요청한 리소스를 찾을 수 없음 (HTTP 404)
    #[error("Resource not found")]
    NotFound,

    /// 잘못된 요청 (HTTP 400)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// 서버 내부 오류 (HTTP 500)
    #[error("Internal error: {0}")]
    Internal(String),

    /// 데이터베이스 오류 (HTTP 500)
    /// #[from]: sqlx::Error → AppError::Database 자동 변환
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// 출석 도메인 에러. 상태 코드는 `AttendanceError::parts`가 결정합니다.
    #[error(transparent)]
    Attendance(#[from] AttendanceError),
}

impl AppError {
    /// 테스트와 핸들러에서 도메인 에러를 꺼내볼 때 사용합니다.
    pub fn as_attendance(&self) -> Option<&AttendanceError> {
        match self {
            AppError::Attendance(e) => Some(e),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    /// AppError를 HTTP 응답으로 변환합니다.
    ///
    /// 내부 에러(Database, Internal)는 실제 에러 내용을 로그에만 기록하고,
    /// 클라이언트에는 일반적인 메시지만 반환합니다.
    fn into_response(self) -> Response {
        let (status, code, message, details) = match self {
            AppError::NotFound => (
                StatusCode::NOT_FOUND,
                "not_found",
                self.to_string(),
                Value::Null,
            ),
            AppError::BadRequest(ref msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", msg.clone(), Value::Null)
            }
            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    Value::Null,
                )
            }
            AppError::Database(ref e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "database_error",
                    "A database error occurred".to_string(),
                    Value::Null,
                )
            }
            AppError::Attendance(ref e) => {
                let (status, code, details) = e.parts();
                (status, code, e.to_string(), details)
            }
        };

        // 결과: { "error": { "code": "...", "message": "...", ...details } }
        let mut error = json!({
            "code": code,
            "message": message
        });
        if let (Value::Object(target), Value::Object(extra)) = (&mut error, details) {
            target.extend(extra);
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}
