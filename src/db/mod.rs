//! # 데이터베이스 접근 계층 (Data Access Layer)
//!
//! 데이터베이스와 직접 상호작용하는 함수들을 모아둔 모듈입니다.
//! 서비스(services/)와 라우트 핸들러(routes/)가 이 모듈의 함수를 호출합니다.
//!
//! 각 하위 모듈:
//! - `lectures`: 강의 등록/조회 쿼리
//! - `sessions`: 출석 세션 생성/종료/조회 쿼리
//! - `check_ins`: 출석 기록 저장/조회 쿼리

pub mod check_ins;
pub mod lectures;
pub mod sessions;

pub use check_ins::*;
pub use lectures::*;
pub use sessions::*;

use crate::error::AppError;

/// 유니크 제약(UNIQUE, PRIMARY KEY, 유니크 인덱스) 위반인지 확인합니다.
///
/// 중복 출석이나 동시 세션 열기처럼 "정상적인 경합"을
/// 일반 DB 에러(500)와 구분하기 위해 사용합니다.
pub fn is_unique_violation(err: &AppError) -> bool {
    match err {
        AppError::Database(sqlx::Error::Database(db_err)) => db_err.is_unique_violation(),
        _ => false,
    }
}
