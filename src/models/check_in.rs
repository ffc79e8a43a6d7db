//! # 출석(체크인) 모델 정의
//!
//! 체크인은 "어떤 학생이 어떤 강의에 출석했다"는 사실 하나를 기록합니다.
//! (lecture_id, student_id) 쌍마다 최대 하나만 존재하며,
//! 한번 기록되면 수정되지 않습니다.

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::services::geofence::{ClaimedLocation, GeoPoint, LocationFailure};

/// 출석 기록 엔티티 — DB의 `check_ins` 테이블 한 행에 대응합니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CheckIn {
    /// 기록 고유 식별자 (UUIDv7)
    pub id: String,
    pub lecture_id: i64,
    pub student_id: String,
    /// 체크인이 받아들여진 출석 세션
    pub session_id: String,
    /// 수락된 토큰이 속한 시간 버킷 (floor(unix_seconds / rotation))
    pub token_bucket: i64,
    /// 강의실까지의 거리 — 지오펜싱이 꺼져 있으면 None
    pub distance_meters: Option<f64>,
    /// 출석 시각 (ISO 8601). 중복 체크인이 와도 이 값이 기준입니다.
    pub checked_in_at: String,
}

/// 클라이언트가 보고한 위치
///
/// 좌표를 보내거나, 위치를 얻지 못한 이유(`location_error`)를 보냅니다.
/// 둘 다 없으면 `NotProvided`로 취급합니다.
#[derive(Debug, Default, Deserialize)]
pub struct ReportedLocation {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub location_error: Option<LocationFailure>,
}

impl ReportedLocation {
    pub fn claimed(&self) -> Result<ClaimedLocation, AppError> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => GeoPoint::new(latitude, longitude)
                .map(ClaimedLocation::Known)
                .map_err(|e| AppError::BadRequest(e.to_string())),
            (None, None) => Ok(ClaimedLocation::Unavailable(
                self.location_error.unwrap_or(LocationFailure::NotProvided),
            )),
            _ => Err(AppError::BadRequest(
                "latitude and longitude must be provided together".to_string(),
            )),
        }
    }
}

/// 체크인 요청 — `POST /api/v1/lectures/:id/check-ins`
#[derive(Debug, Deserialize)]
pub struct CheckInRequest {
    pub student_id: String,
    /// QR 코드에서 읽은 토큰
    pub token: String,
    #[serde(flatten)]
    pub location: ReportedLocation,
}

/// 스캔 결과 그대로 체크인 — `POST /api/v1/check-ins/scan`
///
/// `payload`는 QR 코드에 담긴 URL 전체이며, 서버가 강의 ID와 토큰을 꺼냅니다.
#[derive(Debug, Deserialize)]
pub struct ScanCheckInRequest {
    pub student_id: String,
    pub payload: String,
    #[serde(flatten)]
    pub location: ReportedLocation,
}
