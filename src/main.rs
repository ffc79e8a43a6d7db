//! # Rollcall 웹 서버 진입점
//!
//! 이 파일은 QR 코드 + 위치 기반 출석 체크 서버의 **시작점(entry point)**입니다.
//! Rust 프로그램은 항상 `main()` 함수에서 실행이 시작됩니다.
//!
//! 이 파일이 수행하는 작업:
//! 1. 환경변수(.env) 로딩
//! 2. 로깅(tracing) 초기화
//! 3. 설정 검증 (잘못된 회전 주기, 반경, URL이면 시작하지 않음)
//! 4. SQLite 데이터베이스 연결 풀 생성
//! 5. 데이터베이스 마이그레이션 실행
//! 6. 애플리케이션 상태(State)와 API 라우터 설정
//! 7. HTTP 서버 시작

// ── 모듈 선언 ──
// `mod` 키워드는 다른 파일을 모듈로 가져옵니다.
// 예: `mod config;`는 같은 디렉토리의 `config.rs` 또는 `config/mod.rs`를 가져옵니다.
// Rust에서는 파일 시스템 구조가 곧 모듈 구조입니다.
mod config;   // 환경변수 설정
mod db;       // SQL 쿼리 함수 (데이터 접근 계층)
mod error;    // AppError, AttendanceError
mod models;   // 강의/세션/체크인 구조체
mod routes;   // HTTP 핸들러와 라우터
mod services; // 지오펜스, 스캔 토큰, 세션 회전, 체크인 승인
mod time;     // DB 시각 문자열 변환

// #[cfg(test)]: 테스트 빌드(`cargo test`)에서만 컴파일되는 모듈
#[cfg(test)]
mod test_utils;

// ── 외부 크레이트 및 모듈에서 필요한 항목 가져오기 ──
// `use` 키워드는 다른 모듈의 항목을 현재 스코프로 가져옵니다.
use anyhow::Result; // anyhow::Result: 어떤 에러 타입이든 담을 수 있는 범용 Result 타입
use axum::Router; // 라우터: URL 경로와 핸들러를 연결하는 구조체
use config::Config; // 우리가 만든 설정 모듈
use routes::AppState; // 모든 핸들러가 공유하는 상태 (DB 풀, 토큰 서명 키 등)
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions}; // SQLite 연결 옵션과 풀 설정
use std::str::FromStr; // 문자열 → 타입 변환 트레이트 (SqliteConnectOptions::from_str)
use tower_http::{
    // tower-http: HTTP 미들웨어 모음 크레이트
    cors::{Any, CorsLayer}, // CORS(Cross-Origin Resource Sharing) 설정
    trace::TraceLayer,      // HTTP 요청/응답 로깅 미들웨어
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt}; // 로깅 초기화 유틸리티

// #[tokio::main]: 비동기 런타임을 시작하는 **어트리뷰트 매크로**
// 이 매크로가 내부적으로 tokio 런타임을 생성하고 main을 그 안에서 실행합니다.
#[tokio::main]
async fn main() -> Result<()> {
    // ── 1단계: 환경변수 로딩 ──
    // .env 파일에서 환경변수를 읽어옵니다. (예: DATABASE_URL, SCAN_TOKEN_SECRET 등)
    // .ok()는 Result를 Option으로 변환하여, .env 파일이 없어도 에러 없이 넘어갑니다.
    dotenvy::dotenv().ok();

    // ── 2단계: 로깅(tracing) 초기화 ──
    // registry(): 로그 수집기를 만들고
    // .with(): 필터와 포맷터를 레이어처럼 쌓아올립니다
    tracing_subscriber::registry()
        .with(
            // EnvFilter: RUST_LOG 환경변수로 로그 레벨을 제어합니다.
            // 환경변수가 없으면 rollcall과 tower_http 모듈을 debug 레벨로 설정
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rollcall=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer()) // 로그를 터미널에 출력하는 포맷터 레이어
        .init(); // 전역 로거로 등록

    // ── 3단계: 설정 로딩 ──
    // `?` 연산자: Result가 Err이면 즉시 함수에서 반환(에러 전파).
    // 잘못된 값(회전 주기 0, 음수 반경, 잘못된 URL 등)은 요청을 받기 전에 여기서 실패합니다.
    let config = Config::from_env()?;
    tracing::info!("Starting Rollcall server on {}:{}", config.host, config.port);
    tracing::info!(
        "Default session policy: rotate every {}s, close after {}s, radius {}m",
        config.rotation_seconds,
        config.session_max_duration_seconds,
        config.default_radius_meters
    );

    // ── 4단계: SQLite 연결 풀 생성 ──
    // 연결 풀(Connection Pool): 데이터베이스 연결을 미리 여러 개 만들어두고 재사용하는 패턴.
    // create_if_missing(true): DB 파일이 없으면 새로 만듭니다.
    let connect_options =
        SqliteConnectOptions::from_str(&config.database_url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(5) // 최대 5개의 동시 연결을 유지
        .connect_with(connect_options) // 데이터베이스에 연결 (비동기)
        .await?; // 연결 실패 시 에러 전파

    // ── 5단계: 데이터베이스 마이그레이션 실행 ──
    // sqlx::migrate!는 컴파일 타임에 ./migrations 폴더의 SQL 파일들을 포함시키는 매크로
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool) // 아직 실행되지 않은 마이그레이션만 순서대로 실행
        .await?;

    // ── 6단계: 애플리케이션 상태(State) 생성 ──
    // 세션 상태는 DB에 있으므로, 여기에는 시작 시 정해지는 불변 값만 들어갑니다.
    // 설정 검증을 이미 통과했으므로 아래 `?`는 실패하지 않습니다.
    let state = AppState {
        pool,
        signer: config.token_signer()?,   // 스캔 토큰 HMAC 서명 키
        links: config.scan_links()?,      // QR 코드 URL 생성기
        policy: config.session_policy()?, // 세션 기본값이자 최대 지속 시간 상한
        default_radius_meters: config.default_radius_meters,
    };

    // ── 7단계: CORS 미들웨어 설정 ──
    // 학생 페이지와 교사 화면이 다른 출처(origin)에서 API를 호출하므로 모두 허용합니다.
    let cors = CorsLayer::new()
        .allow_origin(Any)  // 모든 출처(origin) 허용
        .allow_methods(Any) // 모든 HTTP 메서드 허용
        .allow_headers(Any); // 모든 헤더 허용

    // ── 8단계: 라우터 조립 ──
    // .nest(): API 라우트를 /api/v1 경로 아래에 중첩시킵니다.
    // 예: /lectures → /api/v1/lectures
    let app = Router::new()
        .nest("/api/v1", routes::router(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http()); // HTTP 요청/응답 자동 로깅

    // ── 9단계: 서버 시작 ──
    // TcpListener: TCP 연결을 수신 대기하는 소켓
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    // axum::serve(): 이 줄에서 서버가 종료 시그널을 받을 때까지 실행됩니다.
    axum::serve(listener, app).await?;

    // Ok(()): 성공을 나타내는 Result 값. ()는 "빈 값"(unit 타입)입니다.
    Ok(())
}
