//! # 비즈니스 로직 계층
//!
//! 라우트 핸들러(routes/)와 DB 계층(db/) 사이에서 출석 규칙을 담당합니다.
//!
//! 각 하위 모듈:
//! - `geofence`: 좌표 간 거리 계산과 반경 판정 (순수 함수)
//! - `scan_token`: 시간 버킷 기반 스캔 토큰 서명/검증, QR URL 생성 (순수 함수)
//! - `rotator`: 출석 세션 열기/닫기/자동 만료, 현재 토큰 계산
//! - `admission`: 체크인 승인 (세션 → 토큰 → 위치 → 중복 순서로 검사)

pub mod admission;
pub mod geofence;
pub mod rotator;
pub mod scan_token;
