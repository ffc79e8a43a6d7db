use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use crate::db;
use crate::models::{CreateLectureRequest, Lecture};

/// 마이그레이션이 적용된 인메모리 SQLite 풀
///
/// `sqlite::memory:`는 연결마다 별도의 DB가 생기므로 연결을 하나로 제한합니다.
pub async fn setup_test_db() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory db");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    pool
}

pub async fn seed_lecture(
    pool: &SqlitePool,
    location: Option<(f64, f64)>,
    radius_meters: Option<f64>,
) -> Lecture {
    let req = CreateLectureRequest {
        name: "Data Structures".to_string(),
        subject: "CS201".to_string(),
        scheduled_at: Some("Mon 10:00".to_string()),
        teacher_id: "t1".to_string(),
        latitude: location.map(|(lat, _)| lat),
        longitude: location.map(|(_, lon)| lon),
        radius_meters,
    };
    db::create_lecture(pool, &req)
        .await
        .expect("create lecture")
}
