//! # 체크인 승인(Admission) 서비스
//!
//! 세션 유효성, 토큰 신선도, 지오펜스, 중복 여부를 하나의 결정으로 묶습니다.
//!
//! ## 검사 순서 (비용이 싼 것부터, 실패하면 즉시 반환)
//! 1. 강의에 열린 세션이 있는가 → 아니면 `SessionClosed`
//! 2. 토큰이 현재 또는 직전 버킷의 것인가 → 아니면 `StaleToken`
//! 3. 지오펜스가 있다면 위치가 반경 안인가 → `LocationUnavailable` / `OutOfRange`
//! 4. 이미 출석했는가 → `DuplicateCheckIn`
//! 5. 출석 기록 저장
//!
//! 1, 2번은 순수 계산이라 위치 권한 요청 전에 먼저 걸러낼 수 있습니다.
//! 4번의 사전 조회는 빠른 거절용이고, 실제 보장은 DB 유니크 제약입니다.
//! 동시에 들어온 두 요청이 모두 4번을 통과해도 하나는 5번에서 제약에 걸리며,
//! 그 실패는 `DuplicateCheckIn`으로 변환됩니다.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::db;
use crate::error::{AppError, AttendanceError};
use crate::models::CheckIn;
use crate::services::geofence::ClaimedLocation;
use crate::services::rotator;
use crate::services::scan_token::TokenSigner;
use crate::time::format_timestamp;

/// 한 번의 체크인 시도
#[derive(Debug, Clone)]
pub struct CheckInAttempt<'a> {
    pub lecture_id: i64,
    pub student_id: &'a str,
    pub token: &'a str,
    pub location: ClaimedLocation,
}

/// 체크인을 승인하고 저장된 기록을 반환합니다.
pub async fn admit_check_in(
    pool: &SqlitePool,
    signer: &TokenSigner,
    default_radius_meters: f64,
    attempt: CheckInAttempt<'_>,
    now: DateTime<Utc>,
) -> Result<CheckIn, AppError> {
    let lecture_id = attempt.lecture_id;
    let result = admit(pool, signer, default_radius_meters, attempt, now).await;

    match &result {
        Ok(check_in) => tracing::info!(
            "Student {} checked in to lecture {} (distance: {:?})",
            check_in.student_id,
            lecture_id,
            check_in.distance_meters
        ),
        Err(AppError::Attendance(e)) => {
            tracing::debug!("Check-in rejected for lecture {}: {}", lecture_id, e)
        }
        Err(_) => {}
    }

    result
}

async fn admit(
    pool: &SqlitePool,
    signer: &TokenSigner,
    default_radius_meters: f64,
    attempt: CheckInAttempt<'_>,
    now: DateTime<Utc>,
) -> Result<CheckIn, AppError> {
    let lecture_id = attempt.lecture_id;
    let student_id = attempt.student_id.trim();
    if student_id.is_empty() {
        return Err(AppError::BadRequest("student_id is required".to_string()));
    }

    // 1. 세션
    let session = rotator::active_session(pool, lecture_id, now)
        .await?
        .ok_or(AttendanceError::SessionClosed { lecture_id })?;

    // 2. 토큰
    let token_bucket = signer.accepted_bucket(
        lecture_id,
        session.rotation_seconds,
        session.opened_at()?,
        attempt.token,
        now,
    )?;

    // 3. 지오펜스
    let lecture = db::get_lecture(pool, lecture_id)
        .await?
        .ok_or(AppError::NotFound)?;
    let distance_meters = match lecture.geofence(default_radius_meters)? {
        None => None,
        Some(fence) => match attempt.location {
            ClaimedLocation::Known(point) => Some(fence.check(point)?),
            ClaimedLocation::Unavailable(reason) => {
                return Err(AttendanceError::LocationUnavailable(reason).into())
            }
        },
    };

    // 4. 중복 (빠른 경로)
    if let Some(existing) = db::find_check_in(pool, lecture_id, student_id).await? {
        return Err(AttendanceError::DuplicateCheckIn {
            checked_in_at: existing.checked_in_at,
        }
        .into());
    }

    // 5. 저장
    let check_in = CheckIn {
        id: uuid::Uuid::now_v7().to_string(),
        lecture_id,
        student_id: student_id.to_string(),
        session_id: session.id,
        token_bucket,
        distance_meters,
        checked_in_at: format_timestamp(now),
    };

    match db::insert_check_in(pool, &check_in).await {
        Ok(()) => Ok(check_in),
        Err(e) if db::is_unique_violation(&e) => {
            tracing::warn!(
                "Concurrent duplicate check-in for lecture {} by student {}",
                lecture_id,
                student_id
            );
            let existing = db::find_check_in(pool, lecture_id, student_id)
                .await?
                .ok_or(AppError::Internal(
                    "Duplicate check-in row not found".to_string(),
                ))?;
            Err(AttendanceError::DuplicateCheckIn {
                checked_in_at: existing.checked_in_at,
            }
            .into())
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::geofence::{GeoPoint, LocationFailure, EARTH_RADIUS_METERS};
    use crate::services::rotator::{open_session, SessionPolicy};
    use crate::test_utils::{seed_lecture, setup_test_db};
    use chrono::TimeZone;

    const T0: i64 = 1_700_000_000;
    const CLASSROOM: (f64, f64) = (18.494267, 74.019387);
    const DEFAULT_RADIUS: f64 = 200.0;

    fn at(seconds: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(T0 + seconds, 0).unwrap()
    }

    fn signer() -> TokenSigner {
        TokenSigner::new("admission-test").unwrap()
    }

    fn north_of_classroom(meters: f64) -> ClaimedLocation {
        ClaimedLocation::Known(GeoPoint {
            latitude: CLASSROOM.0 + (meters / EARTH_RADIUS_METERS).to_degrees(),
            longitude: CLASSROOM.1,
        })
    }

    fn attempt<'a>(lecture_id: i64, student_id: &'a str, token: &'a str, location: ClaimedLocation) -> CheckInAttempt<'a> {
        CheckInAttempt {
            lecture_id,
            student_id,
            token,
            location,
        }
    }

    fn attendance_error(err: AppError) -> AttendanceError {
        match err {
            AppError::Attendance(e) => e,
            other => panic!("expected attendance error, got {:?}", other),
        }
    }

    async fn open(pool: &SqlitePool, lecture_id: i64) {
        open_session(pool, lecture_id, SessionPolicy::new(5, 7200).unwrap(), at(0))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn admits_inside_geofence() {
        let pool = setup_test_db().await;
        let lecture = seed_lecture(&pool, Some(CLASSROOM), Some(200.0)).await;
        open(&pool, lecture.id).await;
        let s = signer();
        let token = s.token_at(lecture.id, 5, at(1)).value;

        let check_in = admit_check_in(
            &pool,
            &s,
            DEFAULT_RADIUS,
            attempt(lecture.id, "s1", &token, north_of_classroom(150.0)),
            at(2),
        )
        .await
        .unwrap();

        assert_eq!(check_in.student_id, "s1");
        assert_eq!(check_in.token_bucket, T0 / 5);
        let distance = check_in.distance_meters.unwrap();
        assert!((distance - 150.0).abs() < 1.0);
        assert_eq!(
            db::find_check_in(&pool, lecture.id, "s1").await.unwrap(),
            Some(check_in)
        );
    }

    #[tokio::test]
    async fn rejects_outside_geofence_with_distance() {
        let pool = setup_test_db().await;
        let lecture = seed_lecture(&pool, Some(CLASSROOM), Some(200.0)).await;
        open(&pool, lecture.id).await;
        let s = signer();
        let token = s.token_at(lecture.id, 5, at(1)).value;

        let err = admit_check_in(
            &pool,
            &s,
            DEFAULT_RADIUS,
            attempt(lecture.id, "s1", &token, north_of_classroom(250.0)),
            at(2),
        )
        .await
        .unwrap_err();

        match attendance_error(err) {
            AttendanceError::OutOfRange {
                distance_meters,
                radius_meters,
            } => {
                assert!((distance_meters - 250.0).abs() < 1.0);
                assert_eq!(radius_meters, 200.0);
            }
            other => panic!("expected OutOfRange, got {:?}", other),
        }
        assert!(db::find_check_in(&pool, lecture.id, "s1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn missing_location_is_unavailable_not_out_of_range() {
        let pool = setup_test_db().await;
        let lecture = seed_lecture(&pool, Some(CLASSROOM), None).await;
        open(&pool, lecture.id).await;
        let s = signer();
        let token = s.token_at(lecture.id, 5, at(1)).value;

        let err = admit_check_in(
            &pool,
            &s,
            DEFAULT_RADIUS,
            attempt(
                lecture.id,
                "s1",
                &token,
                ClaimedLocation::Unavailable(LocationFailure::Timeout),
            ),
            at(2),
        )
        .await
        .unwrap_err();

        assert_eq!(
            attendance_error(err),
            AttendanceError::LocationUnavailable(LocationFailure::Timeout)
        );
    }

    #[tokio::test]
    async fn lecture_without_location_skips_geofence() {
        let pool = setup_test_db().await;
        let lecture = seed_lecture(&pool, None, None).await;
        open(&pool, lecture.id).await;
        let s = signer();
        let token = s.token_at(lecture.id, 5, at(1)).value;

        let check_in = admit_check_in(
            &pool,
            &s,
            DEFAULT_RADIUS,
            attempt(
                lecture.id,
                "s1",
                &token,
                ClaimedLocation::Unavailable(LocationFailure::NotProvided),
            ),
            at(2),
        )
        .await
        .unwrap();
        assert_eq!(check_in.distance_meters, None);
    }

    #[tokio::test]
    async fn duplicate_keeps_original_timestamp() {
        let pool = setup_test_db().await;
        let lecture = seed_lecture(&pool, None, None).await;
        open(&pool, lecture.id).await;
        let s = signer();

        let token = s.token_at(lecture.id, 5, at(1)).value;
        let first = admit_check_in(
            &pool,
            &s,
            DEFAULT_RADIUS,
            attempt(lecture.id, "s1", &token, ClaimedLocation::Unavailable(LocationFailure::NotProvided)),
            at(1),
        )
        .await
        .unwrap();

        let token = s.token_at(lecture.id, 5, at(30)).value;
        let err = admit_check_in(
            &pool,
            &s,
            DEFAULT_RADIUS,
            attempt(lecture.id, "s1", &token, ClaimedLocation::Unavailable(LocationFailure::NotProvided)),
            at(30),
        )
        .await
        .unwrap_err();

        assert_eq!(
            attendance_error(err),
            AttendanceError::DuplicateCheckIn {
                checked_in_at: first.checked_in_at.clone()
            }
        );
        let stored = db::list_for_lecture(&pool, lecture.id).await.unwrap();
        assert_eq!(stored, vec![first]);
    }

    #[tokio::test]
    async fn concurrent_duplicates_yield_one_check_in() {
        let pool = setup_test_db().await;
        let lecture = seed_lecture(&pool, None, None).await;
        assert_eq!(lecture.id, 1);
        open(&pool, lecture.id).await;
        let s = signer();
        let token = s.token_at(lecture.id, 5, at(1)).value;

        let submit = |pool: SqlitePool, s: TokenSigner, token: String| async move {
            admit_check_in(
                &pool,
                &s,
                DEFAULT_RADIUS,
                attempt(1, "s1", &token, ClaimedLocation::Unavailable(LocationFailure::NotProvided)),
                at(2),
            )
            .await
        };

        let a = tokio::spawn(submit(pool.clone(), s.clone(), token.clone()));
        let b = tokio::spawn(submit(pool.clone(), s.clone(), token.clone()));
        let results = [a.await.unwrap(), b.await.unwrap()];

        let successes = results.iter().filter(|r| r.is_ok()).count();
        let duplicates = results
            .iter()
            .filter(|r| {
                matches!(
                    r.as_ref().err().and_then(|e| e.as_attendance()),
                    Some(AttendanceError::DuplicateCheckIn { .. })
                )
            })
            .count();
        assert_eq!(successes, 1);
        assert_eq!(duplicates, 1);
        assert_eq!(db::list_for_lecture(&pool, 1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn closed_session_rejects_previously_valid_token() {
        let pool = setup_test_db().await;
        let lecture = seed_lecture(&pool, None, None).await;
        open(&pool, lecture.id).await;
        let s = signer();
        let token = s.token_at(lecture.id, 5, at(1)).value;

        rotator::close_session(&pool, lecture.id, at(2)).await.unwrap();

        let err = admit_check_in(
            &pool,
            &s,
            DEFAULT_RADIUS,
            attempt(lecture.id, "s1", &token, ClaimedLocation::Unavailable(LocationFailure::NotProvided)),
            at(3),
        )
        .await
        .unwrap_err();
        assert_eq!(
            attendance_error(err),
            AttendanceError::SessionClosed {
                lecture_id: lecture.id
            }
        );
    }

    #[tokio::test]
    async fn stale_token_is_checked_before_location() {
        let pool = setup_test_db().await;
        let lecture = seed_lecture(&pool, Some(CLASSROOM), Some(200.0)).await;
        open(&pool, lecture.id).await;
        let s = signer();
        let old = s.token_at(lecture.id, 5, at(0)).value;

        // 두 버킷이 지난 토큰 + 위치 없음 → 위치보다 토큰 에러가 먼저
        let err = admit_check_in(
            &pool,
            &s,
            DEFAULT_RADIUS,
            attempt(lecture.id, "s1", &old, ClaimedLocation::Unavailable(LocationFailure::PermissionDenied)),
            at(12),
        )
        .await
        .unwrap_err();
        assert_eq!(attendance_error(err), AttendanceError::StaleToken);
    }

    #[tokio::test]
    async fn accepts_token_from_previous_bucket() {
        let pool = setup_test_db().await;
        let lecture = seed_lecture(&pool, None, None).await;
        open(&pool, lecture.id).await;
        let s = signer();
        let token = s.token_at(lecture.id, 5, at(4)).value;

        let check_in = admit_check_in(
            &pool,
            &s,
            DEFAULT_RADIUS,
            attempt(lecture.id, "s1", &token, ClaimedLocation::Unavailable(LocationFailure::NotProvided)),
            at(6),
        )
        .await
        .unwrap();
        assert_eq!(check_in.token_bucket, T0 / 5);
    }

    #[tokio::test]
    async fn blank_student_id_is_rejected() {
        let pool = setup_test_db().await;
        let lecture = seed_lecture(&pool, None, None).await;
        open(&pool, lecture.id).await;
        let s = signer();
        let token = s.token_at(lecture.id, 5, at(1)).value;

        let err = admit_check_in(
            &pool,
            &s,
            DEFAULT_RADIUS,
            attempt(lecture.id, "  ", &token, ClaimedLocation::Unavailable(LocationFailure::NotProvided)),
            at(1),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
