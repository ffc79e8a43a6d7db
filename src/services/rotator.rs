//! # 출석 세션 회전기(Session Token Rotator)
//!
//! 강의별 출석 세션을 열고 닫으며, 현재 스캔 토큰을 계산합니다.
//!
//! 세션 상태는 DB 행으로만 관리합니다(프로세스 전역 변수 없음).
//! 토큰은 `scan_token` 모듈의 순수 함수로 매 요청마다 다시 계산하므로
//! 백그라운드 타이머가 필요 없습니다.
//!
//! 최대 시간(ceiling)을 넘긴 세션은 다음에 조회될 때 "게으르게" 종료됩니다.
//! 종료 시각은 조회 시각이 아니라 `opened_at + max_duration`으로 기록합니다.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::db;
use crate::error::{AppError, AttendanceError};
use crate::models::{AttendanceSession, CloseReason, OpenSessionRequest, SessionStatus};
use crate::services::scan_token::{ScanToken, TokenSigner};
use crate::time::format_timestamp;

/// 회전 주기의 상한 (1시간)
pub const MAX_ROTATION_SECONDS: i64 = 60 * 60;

/// 세션 최대 지속 시간의 상한 (7일). 서버 설정값도 이 범위 안이어야 합니다.
pub const MAX_SESSION_DURATION_SECONDS: i64 = 7 * 24 * 60 * 60;

/// 세션 설정값 (회전 주기, 최대 지속 시간)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionPolicy {
    pub rotation_seconds: i64,
    pub max_duration_seconds: i64,
}

impl SessionPolicy {
    /// 두 값 모두 양의 정수이고 상한 이하여야 합니다.
    pub fn new(rotation_seconds: i64, max_duration_seconds: i64) -> Result<Self, AttendanceError> {
        if !(1..=MAX_ROTATION_SECONDS).contains(&rotation_seconds) {
            return Err(AttendanceError::InvalidConfig(format!(
                "rotation interval must be between 1 and {} seconds, got {}",
                MAX_ROTATION_SECONDS, rotation_seconds
            )));
        }
        if !(1..=MAX_SESSION_DURATION_SECONDS).contains(&max_duration_seconds) {
            return Err(AttendanceError::InvalidConfig(format!(
                "maximum session duration must be between 1 and {} seconds, got {}",
                MAX_SESSION_DURATION_SECONDS, max_duration_seconds
            )));
        }
        Ok(Self {
            rotation_seconds,
            max_duration_seconds,
        })
    }

    /// 요청값이 있으면 요청값, 없으면 서버 기본값을 사용합니다.
    ///
    /// 서버의 최대 지속 시간은 기본값이자 상한입니다.
    /// 요청은 세션을 더 짧게만 만들 수 있고, 더 긴 값은 거부됩니다.
    pub fn with_overrides(&self, req: &OpenSessionRequest) -> Result<Self, AttendanceError> {
        let max_duration_seconds = req.max_duration_seconds.unwrap_or(self.max_duration_seconds);
        if max_duration_seconds > self.max_duration_seconds {
            return Err(AttendanceError::InvalidConfig(format!(
                "maximum session duration cannot exceed the server limit of {} seconds, got {}",
                self.max_duration_seconds, max_duration_seconds
            )));
        }
        Self::new(
            req.rotation_seconds.unwrap_or(self.rotation_seconds),
            max_duration_seconds,
        )
    }
}

/// 강의에 출석 세션을 엽니다.
///
/// ## 에러
/// - 강의가 없으면 `NotFound`
/// - 이미 열린 세션이 있으면 `AlreadyOpen`
///   (동시에 열려다 DB 유니크 인덱스에 걸린 경우 포함)
pub async fn open_session(
    pool: &SqlitePool,
    lecture_id: i64,
    policy: SessionPolicy,
    now: DateTime<Utc>,
) -> Result<AttendanceSession, AppError> {
    db::get_lecture(pool, lecture_id)
        .await?
        .ok_or(AppError::NotFound)?;

    // 만료된 세션이 남아 있다면 여기서 닫힙니다
    if active_session(pool, lecture_id, now).await?.is_some() {
        return Err(AttendanceError::AlreadyOpen { lecture_id }.into());
    }

    let id = uuid::Uuid::now_v7().to_string();
    let session = db::insert_session(
        pool,
        &id,
        lecture_id,
        policy.rotation_seconds,
        policy.max_duration_seconds,
        &format_timestamp(now),
    )
    .await
    .map_err(|e| {
        if db::is_unique_violation(&e) {
            AttendanceError::AlreadyOpen { lecture_id }.into()
        } else {
            e
        }
    })?;

    tracing::info!(
        "Opened attendance session {} for lecture {} (rotation {}s, max {}s)",
        session.id,
        lecture_id,
        session.rotation_seconds,
        session.max_duration_seconds
    );
    Ok(session)
}

/// 강의의 진행 중인 세션을 반환합니다.
///
/// 최대 시간이 지난 세션은 이 시점에 `expired`로 닫고 `None`을 반환합니다.
pub async fn active_session(
    pool: &SqlitePool,
    lecture_id: i64,
    now: DateTime<Utc>,
) -> Result<Option<AttendanceSession>, AppError> {
    let Some(session) = db::find_open_session(pool, lecture_id).await? else {
        return Ok(None);
    };

    let expires_at = session.expires_at()?;
    if now < expires_at {
        return Ok(Some(session));
    }

    db::close_session(
        pool,
        &session.id,
        &format_timestamp(expires_at),
        CloseReason::Expired,
    )
    .await?;
    tracing::info!(
        "Attendance session {} for lecture {} expired at {}",
        session.id,
        lecture_id,
        format_timestamp(expires_at)
    );
    Ok(None)
}

/// 진행 중인 세션을 종료합니다.
///
/// 열린 세션이 없으면 `SessionClosed`를 반환합니다.
pub async fn close_session(
    pool: &SqlitePool,
    lecture_id: i64,
    now: DateTime<Utc>,
) -> Result<AttendanceSession, AppError> {
    let session = active_session(pool, lecture_id, now)
        .await?
        .ok_or(AttendanceError::SessionClosed { lecture_id })?;

    let closed = db::close_session(pool, &session.id, &format_timestamp(now), CloseReason::Closed)
        .await?
        .ok_or(AppError::Internal("Closed session disappeared".to_string()))?;

    tracing::info!(
        "Closed attendance session {} for lecture {}",
        closed.id,
        lecture_id
    );
    Ok(closed)
}

/// 현재 스캔 토큰. 세션이 닫혀 있으면 `SessionClosed`.
pub async fn current_token(
    pool: &SqlitePool,
    signer: &TokenSigner,
    lecture_id: i64,
    now: DateTime<Utc>,
) -> Result<ScanToken, AppError> {
    let session = active_session(pool, lecture_id, now)
        .await?
        .ok_or(AttendanceError::SessionClosed { lecture_id })?;

    Ok(signer.token_at(lecture_id, session.rotation_seconds, now))
}

/// 교사 화면에 보여줄 세션 상태
pub async fn session_status(
    pool: &SqlitePool,
    lecture_id: i64,
    now: DateTime<Utc>,
) -> Result<SessionStatus, AppError> {
    if let Some(session) = active_session(pool, lecture_id, now).await? {
        let expires_at = session.expires_at()?;
        return Ok(SessionStatus {
            lecture_id,
            open: true,
            expires_at: Some(format_timestamp(expires_at)),
            remaining_seconds: Some((expires_at - now).num_seconds().max(0)),
            session: Some(session),
        });
    }

    Ok(SessionStatus {
        lecture_id,
        open: false,
        session: db::latest_session(pool, lecture_id).await?,
        expires_at: None,
        remaining_seconds: None,
    })
}
