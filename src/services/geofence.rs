//! # 지오펜스(Geofence) 검증 서비스
//!
//! 학생의 위치가 강의실 반경 안에 있는지 판단하는 순수 함수들입니다.
//! DB나 네트워크 I/O가 전혀 없으므로 단위 테스트만으로 검증할 수 있습니다.
//!
//! 이 모듈의 함수들:
//! - `distance_meters()`: 하버사인(haversine) 공식으로 두 좌표 사이 거리 계산
//! - `is_within_radius()`: 거리가 반경 이하인지 판단
//! - `Geofence::check()`: 반경 밖이면 계산된 거리를 담은 에러 반환
//! - `format_distance()`: "150 meters", "1.25 km" 같은 표시용 문자열

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::AttendanceError;

/// 지구 평균 반지름 (미터)
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// 위도/경도 좌표 (단위: 도, degree)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// 범위를 검증하여 좌표를 생성합니다.
    ///
    /// - 위도: -90 ~ 90
    /// - 경도: -180 ~ 180
    /// - NaN, 무한대는 거부
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, AttendanceError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(AttendanceError::InvalidConfig(format!(
                "latitude must be between -90 and 90, got {}",
                latitude
            )));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(AttendanceError::InvalidConfig(format!(
                "longitude must be between -180 and 180, got {}",
                longitude
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }
}

/// 두 좌표 사이의 대권(great-circle) 거리를 미터 단위로 계산합니다.
///
/// 하버사인 공식:
/// ```text
/// a = sin²(Δφ/2) + cos φ1 · cos φ2 · sin²(Δλ/2)
/// c = 2 · atan2(√a, √(1−a))
/// d = R · c
/// ```
/// 결과는 항상 0 이상이며, `distance(a, b) == distance(b, a)`입니다.
pub fn distance_meters(a: GeoPoint, b: GeoPoint) -> f64 {
    let phi1 = a.latitude.to_radians();
    let phi2 = b.latitude.to_radians();
    let delta_phi = (b.latitude - a.latitude).to_radians();
    let delta_lambda = (b.longitude - a.longitude).to_radians();

    let h = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);
    // 부동소수점 오차로 1을 살짝 넘는 경우를 막습니다
    let h = h.clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_METERS * c
}

/// 사용자가 대상 지점으로부터 `radius_meters` 이내에 있는지 판단합니다.
pub fn is_within_radius(user: GeoPoint, target: GeoPoint, radius_meters: f64) -> bool {
    distance_meters(user, target) <= radius_meters
}

/// 반경 값 검증: 양수이고 유한해야 합니다.
pub fn validate_radius(radius_meters: f64) -> Result<f64, AttendanceError> {
    if radius_meters.is_finite() && radius_meters > 0.0 {
        Ok(radius_meters)
    } else {
        Err(AttendanceError::InvalidConfig(format!(
            "radius must be a positive number of meters, got {}",
            radius_meters
        )))
    }
}

/// 강의실 중심 좌표 + 허용 반경
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geofence {
    pub center: GeoPoint,
    pub radius_meters: f64,
}

impl Geofence {
    pub fn new(center: GeoPoint, radius_meters: f64) -> Result<Self, AttendanceError> {
        Ok(Self {
            center,
            radius_meters: validate_radius(radius_meters)?,
        })
    }

    /// 반경 안이면 계산된 거리를, 밖이면 `OutOfRange`를 반환합니다.
    pub fn check(&self, user: GeoPoint) -> Result<f64, AttendanceError> {
        let distance = distance_meters(user, self.center);
        if distance <= self.radius_meters {
            Ok(distance)
        } else {
            Err(AttendanceError::OutOfRange {
                distance_meters: distance,
                radius_meters: self.radius_meters,
            })
        }
    }
}

/// 클라이언트가 위치를 얻지 못한 이유
///
/// 브라우저 Geolocation API의 에러 코드와 대응합니다.
/// 좌표 자체를 보내지 않은 경우는 `NotProvided`입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationFailure {
    PermissionDenied,
    PositionUnavailable,
    Timeout,
    Unsupported,
    NotProvided,
}

impl fmt::Display for LocationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            LocationFailure::PermissionDenied => {
                "location permission denied, please enable location access"
            }
            LocationFailure::PositionUnavailable => "location information is unavailable",
            LocationFailure::Timeout => "location request timed out",
            LocationFailure::Unsupported => "geolocation is not supported by this device",
            LocationFailure::NotProvided => "no location was provided with the check-in",
        };
        f.write_str(message)
    }
}

/// 체크인 요청에 담긴 위치 정보
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClaimedLocation {
    Known(GeoPoint),
    Unavailable(LocationFailure),
}

/// 거리를 사람이 읽기 좋은 문자열로 변환합니다.
///
/// 1km 미만은 반올림한 미터, 이상은 소수점 둘째 자리까지의 km로 표시합니다.
/// 입력은 하버사인 거리나 검증된 반경이므로 항상 유한한 값입니다.
pub fn format_distance(meters: f64) -> String {
    debug_assert!(meters.is_finite(), "distance must be finite, got {}", meters);
    if meters < 1000.0 {
        format!("{} meters", meters.round() as i64)
    } else {
        format!("{:.2} km", meters / 1000.0)
    }
}
