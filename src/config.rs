//! # 애플리케이션 설정(Configuration) 모듈
//!
//! 환경변수에서 서버 설정값을 읽어오는 모듈입니다.
//! `.env` 파일이나 시스템 환경변수에서 값을 가져옵니다.
//!
//! 설정 항목:
//! - `DATABASE_URL`: SQLite 데이터베이스 경로 (필수)
//! - `SCAN_TOKEN_SECRET`: 스캔 토큰 HMAC 서명 비밀키 (필수)
//! - `HOST`: 서버 바인딩 주소
//! - `PORT`: 서버 포트 번호
//! - `FRONTEND_URL`: QR 코드에 담기는 출석 페이지의 기준 URL
//! - `ROTATION_SECONDS`: 토큰 회전 주기 기본값
//! - `SESSION_MAX_DURATION_SECONDS`: 세션 최대 지속 시간 기본값
//! - `DEFAULT_RADIUS_METERS`: 반경이 지정되지 않은 강의의 지오펜스 반경

use std::env;
use std::str::FromStr;

use crate::error::AttendanceError;
use crate::services::geofence::validate_radius;
use crate::services::rotator::SessionPolicy;
use crate::services::scan_token::{ScanLinks, TokenSigner};

/// 애플리케이션 전체 설정을 담는 구조체
///
/// 서버 시작 시 환경변수에서 한 번 읽어온 후,
/// 애플리케이션 전체에서 공유됩니다.
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite 데이터베이스 파일 경로 (예: "sqlite:data/rollcall.db")
    pub database_url: String,
    /// 스캔 토큰 서명에 사용하는 비밀키
    pub scan_token_secret: String,
    /// 서버가 바인딩할 호스트 주소 (기본값: "0.0.0.0")
    pub host: String,
    /// 서버 포트 번호 (기본값: 3000)
    pub port: u16,
    /// 출석 페이지 기준 URL (기본값: "http://localhost:5173")
    pub frontend_url: String,
    /// 토큰 회전 주기, 초 (기본값: 5)
    pub rotation_seconds: i64,
    /// 세션 자동 종료까지의 시간, 초 (기본값: 7200)
    pub session_max_duration_seconds: i64,
    /// 기본 지오펜스 반경, 미터 (기본값: 200)
    pub default_radius_meters: f64,
}

impl Config {
    /// 환경변수에서 설정값을 읽어 Config 인스턴스를 생성합니다.
    ///
    /// # 에러
    /// `DATABASE_URL`과 `SCAN_TOKEN_SECRET`은 필수입니다.
    /// 숫자 항목은 값이 없으면 기본값을 쓰지만, 값이 있는데 숫자가 아니면
    /// 조용히 기본값으로 넘어가지 않고 `InvalidConfig`로 시작을 멈춥니다.
    pub fn from_env() -> Result<Self, AttendanceError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 환경변수 대신 임의의 조회 함수로 설정을 만듭니다. (테스트용 진입점)
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AttendanceError> {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| AttendanceError::InvalidConfig(format!("{} must be set", key)))
        };

        let config = Self {
            database_url: required("DATABASE_URL")?,
            scan_token_secret: required("SCAN_TOKEN_SECRET")?,
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&lookup, "PORT", 3000)?,
            frontend_url: lookup("FRONTEND_URL")
                .unwrap_or_else(|| "http://localhost:5173".to_string()),
            rotation_seconds: parse_or(&lookup, "ROTATION_SECONDS", 5)?,
            session_max_duration_seconds: parse_or(&lookup, "SESSION_MAX_DURATION_SECONDS", 7200)?,
            default_radius_meters: parse_or(&lookup, "DEFAULT_RADIUS_METERS", 200.0)?,
        };

        // 파생 객체를 한 번씩 만들어 보아 잘못된 값이면 여기서 실패합니다
        config.session_policy()?;
        config.token_signer()?;
        config.scan_links()?;
        validate_radius(config.default_radius_meters)?;

        Ok(config)
    }

    /// 세션을 열 때 요청에 값이 없으면 쓰이는 기본 정책
    pub fn session_policy(&self) -> Result<SessionPolicy, AttendanceError> {
        SessionPolicy::new(self.rotation_seconds, self.session_max_duration_seconds)
    }

    pub fn token_signer(&self) -> Result<TokenSigner, AttendanceError> {
        TokenSigner::new(&self.scan_token_secret)
    }

    pub fn scan_links(&self) -> Result<ScanLinks, AttendanceError> {
        ScanLinks::new(&self.frontend_url)
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, AttendanceError> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| {
            AttendanceError::InvalidConfig(format!("{} has an invalid value: {:?}", key, raw))
        }),
    }
}
