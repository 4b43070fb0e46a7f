use std::io;
use std::sync::Arc;

use actix::Addr;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{env::Settings, server::GameServer};

pub mod battle;
pub mod env;
pub mod error;
pub mod matchmaking;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod session;

/// 설정의 log_level 이 EnvFilter 문법에 맞지 않을 때 쓰는 기본값
const FALLBACK_LOG_LEVEL: &str = "info";

/// log_level 문자열을 EnvFilter 로 바꾼다. 파싱에 실패하면 기본 필터와 실패 사유를 돌려준다.
fn filter_from_level(level: &str) -> (EnvFilter, Option<String>) {
    match EnvFilter::try_new(level) {
        Ok(filter) => (filter, None),
        Err(e) => (EnvFilter::new(FALLBACK_LOG_LEVEL), Some(e.to_string())),
    }
}

pub struct LoggerManager {
    _guard: tracing_appender::non_blocking::WorkerGuard,
}

impl LoggerManager {
    pub fn setup(settings: &Settings) -> Self {
        let file_appender = RollingFileAppender::new(
            Rotation::DAILY,
            &settings.logging.directory,
            &settings.logging.filename,
        );
        let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

        // RUST_LOG 우선, 없으면 설정 파일의 log_level
        let (filter, rejected) = match EnvFilter::try_from_default_env() {
            Ok(filter) => (filter, None),
            Err(_) => filter_from_level(&settings.server.log_level),
        };

        let console_layer = fmt::layer()
            .with_writer(io::stdout)
            .with_ansi(true)
            .with_target(false)
            .pretty();

        // 파일은 grep 하기 쉽게 한 줄 포맷. 세션/연결 로그를 모듈로 구분하려고 target 유지
        let file_layer = fmt::layer()
            .with_writer(file_writer)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(true)
            .with_line_number(true)
            .compact();

        tracing_subscriber::registry()
            .with(filter)
            .with(console_layer)
            .with(file_layer)
            .init();

        if let Some(reason) = rejected {
            tracing::warn!(
                "log_level '{}' 해석 실패 ({}), '{}' 로 대체",
                settings.server.log_level,
                reason,
                FALLBACK_LOG_LEVEL
            );
        }
        tracing::info!(
            "로거 초기화 완료: 콘솔 + {}/{} (daily)",
            settings.logging.directory,
            settings.logging.filename
        );

        Self { _guard: guard }
    }
}

// HTTP 핸들러 전체에서 공유하는 상태
#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub game_server_addr: Addr<GameServer>,
    pub metrics_registry: prometheus::Registry,
    pub logger_manager: Arc<LoggerManager>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_scoped_level_is_kept() {
        let (filter, rejected) = filter_from_level("info,battle_server=debug");
        assert!(rejected.is_none());
        assert!(filter.to_string().contains("battle_server=debug"));
    }

    #[test]
    fn unparsable_level_falls_back_to_info() {
        let (filter, rejected) = filter_from_level("info,battle_server=loud");
        assert!(rejected.is_some());
        assert_eq!(filter.to_string(), FALLBACK_LOG_LEVEL);
    }
}
