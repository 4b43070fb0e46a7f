use std::{sync::Arc, time::Duration};

use actix::{Actor, System};
use actix_web::{get, web, App, Error, HttpRequest, HttpResponse, HttpServer};
use actix_web_actors::ws;
use battle_server::{
    env::Settings,
    server::{messages::GetServerStats, GameServer},
    session::WsSession,
    AppState, LoggerManager,
};
use clap::Parser;
use prometheus::{Encoder, TextEncoder};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use uuid::Uuid;

#[derive(Parser)]
#[command(
    name = "drawing battle server",
    author = env!("CARGO_PKG_AUTHORS"),
    version = env!("CARGO_PKG_VERSION"),
    about = env!("CARGO_PKG_DESCRIPTION"),
    long_about = None,
)]
struct Args {
    /// config/{run_mode}.toml 을 읽는다. 지정하지 않으면 RUN_MODE 환경 변수
    #[arg(long = "run-mode")]
    run_mode: Option<String>,

    /// 유닛/세션 ID 와 제시어 추첨에 쓰는 seed. 같은 seed 와 같은 입력 순서면 같은 결과
    #[arg(long)]
    seed: Option<u64>,
}

#[get("/ws/")]
async fn battle_ws_route(
    req: HttpRequest,
    stream: web::Payload,
    state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let session = WsSession::new(
        Uuid::new_v4(),
        state.game_server_addr.clone(),
        Duration::from_secs(state.settings.session.heartbeat_interval_seconds),
        Duration::from_secs(state.settings.session.client_timeout_seconds),
    );

    ws::start(session, &req, stream)
}

async fn metrics_route(req: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
    if let Some(expected_token) = &state.settings.server.metrics_auth_token {
        let provided_token = req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.strip_prefix("Bearer "));

        if provided_token != Some(expected_token.as_str()) {
            return HttpResponse::Unauthorized().body("Unauthorized: Invalid or missing token");
        }
    }

    let metric_families = state.metrics_registry.gather();
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(format!("Metrics encode error: {}", e));
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}

async fn ready_route(state: web::Data<AppState>) -> HttpResponse {
    match state.game_server_addr.send(GetServerStats).await {
        Ok(stats) => HttpResponse::Ok().json(stats),
        Err(e) => {
            error!("GameServer is not reachable: {}", e);
            HttpResponse::ServiceUnavailable().body("NOT READY")
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();

    // 1. 환경변수 로드
    dotenv::dotenv().ok();

    // 2. 설정 파일 로드
    let settings = match &args.run_mode {
        Some(run_mode) => Settings::for_run_mode(run_mode),
        None => Settings::new(),
    }
    .expect("Failed to load settings");

    // 3. 로거 초기화
    let logger_manager = Arc::new(LoggerManager::setup(&settings));

    // 4. Metrics
    let metrics_registry = prometheus::Registry::new();
    metrics::register_custom_metrics(&metrics_registry)
        .expect("Failed to register custom metrics");
    info!("Metrics initialized and registered");

    // 5. 전역 Shutdown Token
    let shutdown_token = CancellationToken::new();

    // 6. GameServer 시작
    let seed = args.seed.unwrap_or_else(rand::random);
    info!(
        "Starting GameServer (seed: {}, tick rate: {}Hz)",
        seed, settings.battle.tick_rate_hz
    );
    let game_server_addr =
        GameServer::new(settings.battle.clone(), seed, shutdown_token.clone()).start();

    let app_state = AppState {
        settings: settings.clone(),
        game_server_addr,
        metrics_registry,
        logger_manager,
    };

    // 7. HTTP 서버 시작
    let bind_address = format!("{}:{}", settings.server.bind_address, settings.server.port);
    info!("Starting HTTP server on {}", bind_address);

    let mut server = HttpServer::new(move || {
        let health_route = || async { HttpResponse::Ok().body("OK") };

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .service(battle_ws_route)
            .route("/metrics", web::get().to(metrics_route))
            .route("/health", web::get().to(health_route))
            .route("/ready", web::get().to(ready_route))
    })
    .bind(&bind_address)?
    .run();

    info!("Battle server is running on {}", bind_address);

    // 8. 종료 신호 대기
    tokio::select! {
        res = &mut server => {
            error!("Server exited unexpectedly");
            return res;
        },
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl+C received. Initiating graceful shutdown...");
            shutdown_token.cancel();
            System::current().stop();
        },
    }

    info!("Waiting for all actors to shutdown...");
    server.await?;
    info!("System has shut down gracefully");

    Ok(())
}
