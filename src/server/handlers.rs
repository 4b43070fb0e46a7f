use actix::{Context, Handler};
use metrics::{
    GAMES_FINISHED_TOTAL, MATCHES_CREATED_TOTAL, OPPONENT_DISCONNECTS_TOTAL,
    SESSION_TICK_FAILURES_TOTAL, TICK_DURATION_SECONDS, UNITS_CREATED_TOTAL,
};
use tracing::{debug, info};

use crate::registry::MatchOutcome;

use super::{
    messages::{
        Connect, CreateUnit, Disconnect, FindMatch, GetGameState, GetServerStats, ServerStats,
        Tick,
    },
    GameServer,
};

impl Handler<Connect> for GameServer {
    type Result = ();

    fn handle(&mut self, msg: Connect, _ctx: &mut Context<Self>) -> Self::Result {
        debug!("Connection {} registered.", msg.connection_id);
        self.connections.insert(msg.connection_id, msg.addr);
    }
}

impl Handler<Disconnect> for GameServer {
    type Result = ();

    fn handle(&mut self, msg: Disconnect, _ctx: &mut Context<Self>) -> Self::Result {
        self.connections.remove(&msg.connection_id);

        let outbound = self.registry.on_disconnect(msg.connection_id);
        if !outbound.is_empty() {
            OPPONENT_DISCONNECTS_TOTAL.inc();
        }
        self.dispatch(outbound);
        self.refresh_gauges();
        info!("Connection {} deregistered.", msg.connection_id);
    }
}

impl Handler<FindMatch> for GameServer {
    type Result = ();

    fn handle(&mut self, msg: FindMatch, _ctx: &mut Context<Self>) -> Self::Result {
        match self.registry.find_match(msg.connection_id) {
            Ok((outcome, outbound)) => {
                if let MatchOutcome::Started { .. } = outcome {
                    MATCHES_CREATED_TOTAL.inc();
                }
                self.dispatch(outbound);
            }
            Err(e) => self.reject(msg.connection_id, e),
        }
        self.refresh_gauges();
    }
}

impl Handler<CreateUnit> for GameServer {
    type Result = ();

    fn handle(&mut self, msg: CreateUnit, _ctx: &mut Context<Self>) -> Self::Result {
        match self
            .registry
            .create_unit(msg.connection_id, msg.similarity, msg.artifact_ref)
        {
            Ok(outbound) => {
                UNITS_CREATED_TOTAL.inc();
                self.dispatch(outbound);
            }
            Err(e) => self.reject(msg.connection_id, e),
        }
    }
}

impl Handler<GetGameState> for GameServer {
    type Result = ();

    fn handle(&mut self, msg: GetGameState, _ctx: &mut Context<Self>) -> Self::Result {
        match self.registry.game_state(msg.connection_id) {
            Ok(outbound) => self.dispatch(outbound),
            Err(e) => self.reject(msg.connection_id, e),
        }
    }
}

impl Handler<Tick> for GameServer {
    type Result = ();

    fn handle(&mut self, _msg: Tick, _ctx: &mut Context<Self>) -> Self::Result {
        let timer = TICK_DURATION_SECONDS.start_timer();
        let report = self.registry.tick();
        timer.observe_duration();

        GAMES_FINISHED_TOTAL.inc_by(report.finished.len() as u64);
        SESSION_TICK_FAILURES_TOTAL.inc_by(report.failures.len() as u64);
        self.dispatch(report.outbound);
    }
}

impl Handler<GetServerStats> for GameServer {
    type Result = ServerStats;

    fn handle(&mut self, _msg: GetServerStats, _ctx: &mut Context<Self>) -> Self::Result {
        ServerStats {
            connections: self.connections.len(),
            players_in_queue: self.registry.queue_len(),
            sessions: self.registry.session_count(),
        }
    }
}
