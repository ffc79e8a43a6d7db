//! # 스캔 토큰(Scan Token) 서비스
//!
//! QR 코드에 담기는 토큰을 계산하고 검증하는 순수 함수들입니다.
//!
//! ## 토큰 계산 방식
//! ```text
//! bucket = floor(unix_seconds / rotation_seconds)
//! token  = hex(HMAC-SHA256(secret, lecture_id ‖ bucket)[..8])
//! ```
//! 토큰은 난수가 아니라 (강의 ID, 시간 버킷)의 결정적 함수입니다.
//! 그래서 별도의 상태 저장이나 백그라운드 타이머 없이도,
//! 같은 비밀키를 가진 어느 서버 인스턴스든 같은 토큰을 계산합니다.
//!
//! 토큰은 보안 자격 증명이 아닙니다 (QR 이미지에 평문으로 노출됨).
//! 역할은 오래된 스크린샷을 무효화하는 것뿐입니다.

use chrono::{DateTime, TimeZone, Utc};
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;
use url::Url;

use crate::error::{AppError, AttendanceError};
use crate::time::format_timestamp;

type HmacSha256 = Hmac<Sha256>;

/// 토큰 값에 사용하는 HMAC 출력 바이트 수 (hex로 16자)
const TOKEN_BYTES: usize = 8;

/// 현재 버킷 외에 허용하는 직전 버킷 수.
/// 스캔과 제출 사이의 네트워크 지연을 흡수하기 위한 유예 구간입니다.
pub const GRACE_BUCKETS: i64 = 1;

/// 시각이 속한 시간 버킷 번호
pub fn bucket_for(now: DateTime<Utc>, rotation_seconds: i64) -> i64 {
    now.timestamp().div_euclid(rotation_seconds.max(1))
}

/// QR 코드로 표시되는 토큰
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanToken {
    pub lecture_id: i64,
    pub bucket: i64,
    pub value: String,
    /// 이 토큰이 "현재 토큰"이 되는 시각
    pub valid_from: String,
    /// 다음 토큰으로 교체되는 시각
    pub valid_until: String,
}

/// 서버 비밀키로 토큰을 서명하는 객체
#[derive(Clone)]
pub struct TokenSigner {
    mac: HmacSha256,
}

impl TokenSigner {
    pub fn new(secret: &str) -> Result<Self, AttendanceError> {
        if secret.is_empty() {
            return Err(AttendanceError::InvalidConfig(
                "scan token secret must not be empty".to_string(),
            ));
        }
        let mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|e| AttendanceError::InvalidConfig(format!("invalid secret: {}", e)))?;
        Ok(Self { mac })
    }

    /// (강의 ID, 버킷)에 대한 토큰 문자열
    pub fn token_value(&self, lecture_id: i64, bucket: i64) -> String {
        let mut mac = self.mac.clone();
        mac.update(&lecture_id.to_be_bytes());
        mac.update(&bucket.to_be_bytes());
        let digest = mac.finalize().into_bytes();
        hex::encode(&digest[..TOKEN_BYTES])
    }

    /// `now` 시점의 토큰
    pub fn token_at(&self, lecture_id: i64, rotation_seconds: i64, now: DateTime<Utc>) -> ScanToken {
        let rotation = rotation_seconds.max(1);
        let bucket = bucket_for(now, rotation);
        ScanToken {
            lecture_id,
            bucket,
            value: self.token_value(lecture_id, bucket),
            valid_from: bucket_boundary(bucket, rotation),
            valid_until: bucket_boundary(bucket + 1, rotation),
        }
    }

    /// 제출된 토큰이 받아들일 수 있는 버킷의 것인지 확인하고, 그 버킷 번호를 반환합니다.
    ///
    /// 허용 범위: 현재 버킷과 직전 `GRACE_BUCKETS`개.
    /// 세션이 열리기 전 버킷의 토큰은 화면에 표시된 적이 없으므로 거부합니다.
    /// 미래 버킷의 토큰도 거부합니다.
    pub fn accepted_bucket(
        &self,
        lecture_id: i64,
        rotation_seconds: i64,
        opened_at: DateTime<Utc>,
        claimed: &str,
        now: DateTime<Utc>,
    ) -> Result<i64, AttendanceError> {
        let claimed = claimed.trim();
        let current = bucket_for(now, rotation_seconds);
        let earliest = bucket_for(opened_at, rotation_seconds);

        (0..=GRACE_BUCKETS)
            .map(|delta| current - delta)
            .filter(|bucket| *bucket >= earliest)
            .find(|bucket| self.token_value(lecture_id, *bucket) == claimed)
            .ok_or(AttendanceError::StaleToken)
    }
}

fn bucket_boundary(bucket: i64, rotation_seconds: i64) -> String {
    Utc.timestamp_opt(bucket.saturating_mul(rotation_seconds), 0)
        .single()
        .map(format_timestamp)
        .unwrap_or_default()
}

/// 학생이 스캔하는 출석 URL을 만드는 객체
///
/// 형식: `{FRONTEND_URL}/attend?lectureId={id}&t={token}`
#[derive(Debug, Clone)]
pub struct ScanLinks {
    base: Url,
}

impl ScanLinks {
    pub fn new(frontend_url: &str) -> Result<Self, AttendanceError> {
        let base = Url::parse(frontend_url).map_err(|e| {
            AttendanceError::InvalidConfig(format!("invalid frontend url {}: {}", frontend_url, e))
        })?;
        if base.cannot_be_a_base() {
            return Err(AttendanceError::InvalidConfig(format!(
                "frontend url {} cannot be used as a base",
                frontend_url
            )));
        }
        Ok(Self { base })
    }

    /// 토큰 없는 강의 출석 페이지 URL
    pub fn attend_url(&self, lecture_id: i64) -> String {
        self.build(lecture_id, None)
    }

    /// QR 코드에 담는 URL
    pub fn scan_url(&self, token: &ScanToken) -> String {
        self.build(token.lecture_id, Some(&token.value))
    }

    fn build(&self, lecture_id: i64, token: Option<&str>) -> String {
        let mut url = self.base.clone();
        // cannot_be_a_base()는 생성 시 걸러냈으므로 Err가 나오지 않습니다
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("attend");
        }
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("lectureId", &lecture_id.to_string());
            if let Some(token) = token {
                query.append_pair("t", token);
            }
        }
        url.into()
    }
}

/// 스캔한 QR 내용에서 (강의 ID, 토큰)을 꺼냅니다.
pub fn parse_scan_payload(payload: &str) -> Result<(i64, String), AppError> {
    let invalid =
        || AppError::BadRequest("Invalid QR code. Please scan the official lecture QR code.".to_string());

    let url = Url::parse(payload.trim()).map_err(|_| invalid())?;

    let mut lecture_id = None;
    let mut token = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "lectureId" => lecture_id = value.parse::<i64>().ok(),
            "t" if !value.is_empty() => token = Some(value.into_owned()),
            _ => {}
        }
    }

    match (lecture_id, token) {
        (Some(lecture_id), Some(token)) => Ok((lecture_id, token)),
        _ => Err(invalid()),
    }
}
