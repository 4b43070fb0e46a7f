use std::collections::HashMap;

use actix::{Actor, ActorContext, AsyncContext, Context, Recipient};
use metrics::{ACTIVE_SESSIONS, PLAYERS_IN_QUEUE, REJECTED_REQUESTS_TOTAL};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    battle::BattleRules,
    error::GameError,
    protocol::ServerMessage,
    registry::{Outbound, SessionRegistry},
};

pub mod handlers;
pub mod messages;

use messages::Tick;

/// 모든 매칭/세션 상태를 소유하는 단일 actor.
///
/// 요청 처리와 틱 해석이 같은 mailbox 에서 순서대로 실행되므로
/// 한 세션에 대한 변경이 서로 겹치지 않는다.
pub struct GameServer {
    pub(super) registry: SessionRegistry,
    pub(super) connections: HashMap<Uuid, Recipient<ServerMessage>>,
    shutdown_token: CancellationToken,
}

impl GameServer {
    pub fn new(rules: BattleRules, seed: u64, shutdown_token: CancellationToken) -> Self {
        Self {
            registry: SessionRegistry::new(rules, seed),
            connections: HashMap::new(),
            shutdown_token,
        }
    }

    /// 전송은 fire-and-forget. 이미 끊긴 연결로 가는 메시지는 버린다.
    pub(super) fn dispatch(&self, outbound: Vec<Outbound>) {
        for Outbound { to, message } in outbound {
            match self.connections.get(&to) {
                Some(recipient) => recipient.do_send(message),
                None => debug!(
                    "Dropping {} for unknown connection {}",
                    message.event_name(),
                    to
                ),
            }
        }
    }

    /// 거절은 요청한 연결에게만 보낸다.
    pub(super) fn reject(&self, connection_id: Uuid, error: GameError) {
        warn!("Request from {} rejected: {}", connection_id, error);
        REJECTED_REQUESTS_TOTAL.inc();
        self.dispatch(vec![Outbound::new(connection_id, error.into())]);
    }

    pub(super) fn refresh_gauges(&self) {
        PLAYERS_IN_QUEUE.set(self.registry.queue_len() as i64);
        ACTIVE_SESSIONS.set(self.registry.session_count() as i64);
    }
}

impl Actor for GameServer {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        let interval = self.registry.rules().tick_interval();
        info!("GameServer actor started. Tick interval: {:?}", interval);

        ctx.run_interval(interval, |act, ctx| {
            if act.shutdown_token.is_cancelled() {
                info!("Shutdown requested. Stopping battle scheduler.");
                ctx.stop();
                return;
            }
            ctx.address().do_send(Tick);
        });
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        info!(
            "GameServer stopped with {} sessions and {} connections.",
            self.registry.session_count(),
            self.connections.len()
        );
    }
}
