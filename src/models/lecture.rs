//! # 강의 모델 정의
//!
//! 강의는 출석을 받는 단위입니다. 교사가 강의실 위치를 등록하면
//! 학생은 그 반경 안에서만 출석할 수 있습니다(지오펜싱).
//! 위치가 등록되지 않은 강의는 지오펜싱을 하지 않고 모든 스캔을 허용합니다.

use serde::{Deserialize, Serialize};

use crate::error::AttendanceError;
use crate::services::geofence::{validate_radius, GeoPoint, Geofence};

/// 강의 엔티티 — DB의 `lectures` 테이블 한 행에 대응합니다.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Lecture {
    /// 강의 ID (정수, 자동 증가)
    pub id: i64,
    pub name: String,
    pub subject: String,
    /// 강의 시간 (예: "Mon 10:00") — 표시용 문자열
    pub scheduled_at: Option<String>,
    /// 강의를 만든 교사의 ID (사용자 저장소는 외부 시스템)
    pub teacher_id: String,
    /// 강의실 위도 — None이면 지오펜싱 비활성
    pub latitude: Option<f64>,
    /// 강의실 경도
    pub longitude: Option<f64>,
    /// 허용 반경(미터) — None이면 서버 기본값 사용
    pub radius_meters: Option<f64>,
    pub created_at: String,
}

impl Lecture {
    /// 등록된 강의실 좌표. 위도/경도가 모두 있어야 Some입니다.
    pub fn location(&self) -> Option<GeoPoint> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(GeoPoint {
                latitude,
                longitude,
            }),
            _ => None,
        }
    }

    /// 이 강의의 지오펜스를 만듭니다.
    ///
    /// - 위치가 없으면 `Ok(None)` — 지오펜싱 비활성 (에러가 아님)
    /// - 반경이 없으면 `default_radius_meters` 사용
    pub fn geofence(&self, default_radius_meters: f64) -> Result<Option<Geofence>, AttendanceError> {
        let Some(center) = self.location() else {
            return Ok(None);
        };
        let radius = self.radius_meters.unwrap_or(default_radius_meters);
        Geofence::new(center, radius).map(Some)
    }
}

/// 강의 생성 요청 — `POST /api/v1/lectures`의 요청 본문
#[derive(Debug, Deserialize)]
pub struct CreateLectureRequest {
    pub name: String,
    pub subject: String,
    pub scheduled_at: Option<String>,
    pub teacher_id: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub radius_meters: Option<f64>,
}

impl CreateLectureRequest {
    /// 입력값을 검증합니다.
    ///
    /// 위도와 경도는 둘 다 있거나 둘 다 없어야 하고,
    /// 반경은 양수여야 합니다.
    pub fn validate(&self) -> Result<(), AttendanceError> {
        if self.name.trim().is_empty() {
            return Err(AttendanceError::InvalidConfig(
                "lecture name must not be empty".to_string(),
            ));
        }
        if self.teacher_id.trim().is_empty() {
            return Err(AttendanceError::InvalidConfig(
                "teacher_id must not be empty".to_string(),
            ));
        }
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => {
                GeoPoint::new(latitude, longitude)?;
            }
            (None, None) => {}
            _ => {
                return Err(AttendanceError::InvalidConfig(
                    "latitude and longitude must be provided together".to_string(),
                ))
            }
        }
        if let Some(radius) = self.radius_meters {
            validate_radius(radius)?;
        }
        Ok(())
    }
}

/// 강의 목록 조회 쿼리 — `GET /api/v1/lectures?teacher_id=...`
#[derive(Debug, Deserialize)]
pub struct LectureQuery {
    pub teacher_id: Option<String>,
}

/// 강의 + 학생이 접속할 출석 페이지 URL
#[derive(Debug, Serialize)]
pub struct LectureResponse {
    #[serde(flatten)]
    pub lecture: Lecture,
    pub attend_url: String,
}
