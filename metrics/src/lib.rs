use lazy_static::lazy_static;
use prometheus::{opts, Histogram, HistogramOpts, IntCounter, IntGauge, Registry};

lazy_static! {
    // register_... 매크로는 기본 레지스트리에 자동 등록하므로,
    // 여기서는 Opts 만 생성하고 register_custom_metrics 에서 수동으로 등록합니다.

    /// Active websocket connections.
    pub static ref ACTIVE_WS_CONNECTIONS: IntGauge =
        IntGauge::with_opts(opts!("active_ws_connections", "Number of active websocket connections")).unwrap();

    /// The current number of connections waiting for an opponent.
    pub static ref PLAYERS_IN_QUEUE: IntGauge =
        IntGauge::with_opts(opts!("players_in_queue", "Current number of players waiting for an opponent")).unwrap();

    /// The total number of two-player matches formed.
    pub static ref MATCHES_CREATED_TOTAL: IntCounter =
        IntCounter::with_opts(opts!("matches_created_total", "Total number of matches created")).unwrap();

    /// Sessions currently held by the registry (playing or finished).
    pub static ref ACTIVE_SESSIONS: IntGauge =
        IntGauge::with_opts(opts!("active_sessions", "Number of sessions held by the registry")).unwrap();

    pub static ref UNITS_CREATED_TOTAL: IntCounter =
        IntCounter::with_opts(opts!("units_created_total", "Total number of units spawned from drawings")).unwrap();

    pub static ref GAMES_FINISHED_TOTAL: IntCounter =
        IntCounter::with_opts(opts!("games_finished_total", "Total number of sessions that reached a winner")).unwrap();

    pub static ref OPPONENT_DISCONNECTS_TOTAL: IntCounter =
        IntCounter::with_opts(opts!("opponent_disconnects_total", "Sessions torn down because a participant left")).unwrap();

    /// Per-session resolver failures. 실패한 세션만 건너뛰고 스케줄러는 계속 돈다.
    pub static ref SESSION_TICK_FAILURES_TOTAL: IntCounter =
        IntCounter::with_opts(opts!("session_tick_failures_total", "Battle resolver failures isolated to one session")).unwrap();

    pub static ref REJECTED_REQUESTS_TOTAL: IntCounter =
        IntCounter::with_opts(opts!("rejected_requests_total", "Client requests rejected with an error message")).unwrap();

    /// Histogram of one scheduler pass over every playing session (seconds)
    pub static ref TICK_DURATION_SECONDS: Histogram =
        Histogram::with_opts(HistogramOpts::new(
            "tick_duration_seconds",
            "Wall time of one scheduler pass over all playing sessions (seconds)"
        ).buckets(vec![0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.02, 0.033, 0.05, 0.1])).unwrap();
}

/// Registers all custom metrics defined in this crate to the given registry.
///
/// This function should be called during server startup so the
/// `/metrics` endpoint can gather them.
pub fn register_custom_metrics(registry: &Registry) -> Result<(), prometheus::Error> {
    registry.register(Box::new(ACTIVE_WS_CONNECTIONS.clone()))?;
    registry.register(Box::new(PLAYERS_IN_QUEUE.clone()))?;
    registry.register(Box::new(MATCHES_CREATED_TOTAL.clone()))?;
    registry.register(Box::new(ACTIVE_SESSIONS.clone()))?;
    registry.register(Box::new(UNITS_CREATED_TOTAL.clone()))?;
    registry.register(Box::new(GAMES_FINISHED_TOTAL.clone()))?;
    registry.register(Box::new(OPPONENT_DISCONNECTS_TOTAL.clone()))?;
    registry.register(Box::new(SESSION_TICK_FAILURES_TOTAL.clone()))?;
    registry.register(Box::new(REJECTED_REQUESTS_TOTAL.clone()))?;
    registry.register(Box::new(TICK_DURATION_SECONDS.clone()))?;

    Ok(())
}
