//! # 데이터 모델 모듈
//!
//! 애플리케이션에서 사용하는 데이터 구조체(struct)들을 정의합니다.
//! 각 하위 모듈은 특정 도메인의 데이터 타입을 담당합니다:
//! - `lecture`: 강의와 강의실 위치(지오펜스) 관련 구조체
//! - `session`: 출석 세션(QR 코드가 회전하는 시간 창) 관련 구조체
//! - `check_in`: 학생 출석 기록과 체크인 요청 구조체
//!
//! `pub use X::*;`로 재공개하여 `crate::models::Lecture`처럼 짧게 접근합니다.

pub mod check_in;
pub mod lecture;
pub mod session;

pub use check_in::*;
pub use lecture::*;
pub use session::*;
