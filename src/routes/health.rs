//! # 헬스체크(Health Check) 핸들러
//!
//! 서버가 정상적으로 동작하는지 확인하는 엔드포인트입니다.
//!
//! ## 엔드포인트
//! - `GET /api/v1/health` → `{ "status": "ok", "database": "ok" }`
//!
//! 출석 판정은 모두 DB를 거치므로 DB 연결까지 함께 확인합니다.

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::error::AppError;
use crate::routes::AppState;

/// `GET /health` — 서버와 DB 상태를 확인합니다.
///
/// DB에 `SELECT 1`이 실패하면 500 에러 응답이 됩니다.
pub async fn health_check(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    sqlx::query("SELECT 1").execute(&state.pool).await?;

    Ok(Json(json!({
        "status": "ok",
        "database": "ok"
    })))
}
