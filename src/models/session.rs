//! # 출석 세션 모델 정의
//!
//! 교사가 강의에 대해 여는 "출석 가능 시간 창"을 나타냅니다.
//! 세션이 열려 있는 동안 QR 코드의 토큰이 `rotation_seconds`마다 바뀝니다.
//!
//! ## 세션 흐름
//! ```text
//! [닫힘] ──open──▶ [열림] ──close / 최대 시간 초과──▶ [닫힘]
//! ```
//! 토큰 회전은 상태 전이가 아니라 시각으로부터 계산되는 값의 변화일 뿐입니다.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::time::parse_timestamp;

/// 출석 세션 엔티티 — DB의 `attendance_sessions` 테이블 한 행에 대응합니다.
///
/// 서버 프로세스 메모리가 아니라 DB 행으로 상태를 관리하므로,
/// 여러 서버 인스턴스가 같은 세션을 동일하게 해석합니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AttendanceSession {
    /// 세션 고유 식별자 (UUIDv7)
    pub id: String,
    pub lecture_id: i64,
    /// 토큰 회전 주기 (초)
    pub rotation_seconds: i64,
    /// 자동 종료까지의 최대 시간 (초)
    pub max_duration_seconds: i64,
    /// 세션 시작 시각 (ISO 8601)
    pub opened_at: String,
    /// 종료 시각 — None이면 진행 중
    pub closed_at: Option<String>,
    /// 종료 사유 (`closed` | `expired`)
    pub close_reason: Option<String>,
}

impl AttendanceSession {
    pub fn opened_at(&self) -> Result<DateTime<Utc>, AppError> {
        parse_timestamp(&self.opened_at)
    }

    /// 최대 시간이 지나 자동 종료되는 시각
    ///
    /// chrono의 `+` 연산자는 범위를 넘으면 패닉하므로 checked 버전을 씁니다.
    /// 정책 검증을 거친 행이라면 실패하지 않습니다.
    pub fn expires_at(&self) -> Result<DateTime<Utc>, AppError> {
        let opened_at = self.opened_at()?;
        Duration::try_seconds(self.max_duration_seconds)
            .and_then(|ceiling| opened_at.checked_add_signed(ceiling))
            .ok_or_else(|| {
                AppError::Internal(format!(
                    "session {} has an out-of-range max duration: {}s",
                    self.id, self.max_duration_seconds
                ))
            })
    }

    pub fn is_open(&self) -> bool {
        self.closed_at.is_none()
    }
}

/// 세션 종료 사유
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// 교사가 직접 종료
    Closed,
    /// 최대 시간 초과로 자동 종료
    Expired,
}

impl CloseReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            CloseReason::Closed => "closed",
            CloseReason::Expired => "expired",
        }
    }
}

/// 세션 시작 요청 — `POST /api/v1/lectures/:id/session`
///
/// 두 값 모두 선택이며, 없으면 서버 설정의 기본값을 사용합니다.
/// 음수도 받을 수 있도록 i64로 두고, 검증은 서비스 계층에서 합니다.
#[derive(Debug, Default, Deserialize)]
pub struct OpenSessionRequest {
    pub rotation_seconds: Option<i64>,
    pub max_duration_seconds: Option<i64>,
}

/// 세션 상태 응답 — `GET /api/v1/lectures/:id/session`
#[derive(Debug, Serialize)]
pub struct SessionStatus {
    pub lecture_id: i64,
    pub open: bool,
    pub session: Option<AttendanceSession>,
    pub expires_at: Option<String>,
    /// 자동 종료까지 남은 시간 (초)
    pub remaining_seconds: Option<i64>,
}
