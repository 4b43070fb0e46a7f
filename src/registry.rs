use std::collections::HashMap;

use rand::{rngs::StdRng, SeedableRng};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    battle::{
        catalog::random_prompt, ids::IdGenerator, resolve_tick, BattleRules, GameSession, Side,
        TickOutcome,
    },
    error::{GameError, GameResult},
    matchmaking::{EnqueueOutcome, MatchQueue},
    protocol::ServerMessage,
};

/// 특정 연결로 보낼 메시지. 전송은 fire-and-forget.
#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    pub to: Uuid,
    pub message: ServerMessage,
}

impl Outbound {
    pub fn new(to: Uuid, message: ServerMessage) -> Self {
        Self { to, message }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    Waiting,
    Started { session_id: Uuid },
}

/// 스케줄러 한 번의 결과
#[derive(Debug, Default)]
pub struct TickReport {
    pub outbound: Vec<Outbound>,
    /// 이번 틱에 종료된 세션
    pub finished: Vec<Uuid>,
    /// 해석에 실패한 세션. 다른 세션의 스케줄링에는 영향이 없다.
    pub failures: Vec<(Uuid, GameError)>,
    pub sessions_ticked: usize,
}

/// Session Registry
///
/// 세션 id / 연결 id → 세션 매핑과 연결 종료 정리 정책을 소유한다.
/// 모든 변경은 이 객체를 통해 순차적으로 일어나므로 내부 잠금이 없다.
pub struct SessionRegistry {
    rules: BattleRules,
    queue: MatchQueue,
    sessions: HashMap<Uuid, GameSession>,
    connection_sessions: HashMap<Uuid, Uuid>,
    ids: IdGenerator,
    rng: StdRng,
}

impl SessionRegistry {
    pub fn new(rules: BattleRules, seed: u64) -> Self {
        Self {
            rules,
            queue: MatchQueue::new(),
            sessions: HashMap::new(),
            connection_sessions: HashMap::new(),
            ids: IdGenerator::new(seed),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn rules(&self) -> &BattleRules {
        &self.rules
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_waiting(&self, connection_id: Uuid) -> bool {
        self.queue.contains(connection_id)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn session(&self, session_id: Uuid) -> Option<&GameSession> {
        self.sessions.get(&session_id)
    }

    pub fn lookup(&self, connection_id: Uuid) -> Option<&GameSession> {
        self.connection_sessions
            .get(&connection_id)
            .and_then(|session_id| self.sessions.get(session_id))
    }

    /// attachMatch: 대기열에 넣고, 짝이 지어지면 세션을 만든다.
    pub fn find_match(&mut self, connection_id: Uuid) -> GameResult<(MatchOutcome, Vec<Outbound>)> {
        if self.connection_sessions.contains_key(&connection_id) {
            return Err(GameError::AlreadyInGame { connection_id });
        }

        match self.queue.enqueue(connection_id)? {
            EnqueueOutcome::Waiting => {
                info!("Connection {} is waiting for an opponent.", connection_id);
                Ok((
                    MatchOutcome::Waiting,
                    vec![Outbound::new(connection_id, ServerMessage::WaitingForOpponent)],
                ))
            }
            EnqueueOutcome::Paired { first, second } => {
                let left = first.connection_id;
                let right = second.connection_id;
                let session_id = self.ids.next_session();
                let prompt = random_prompt(&mut self.rng);
                let session = GameSession::new(session_id, left, right, prompt.clone(), &self.rules);

                self.sessions.insert(session_id, session);
                self.connection_sessions.insert(left, session_id);
                self.connection_sessions.insert(right, session_id);

                info!(
                    "Session {} started: {} (left) vs {} (right)",
                    session_id, left, right
                );

                let start = |me: Uuid, opponent: Uuid, side| {
                    Outbound::new(
                        me,
                        ServerMessage::GameStart {
                            session_id,
                            your_side: side,
                            opponent_id: opponent,
                            prompt: prompt.clone(),
                        },
                    )
                };
                Ok((
                    MatchOutcome::Started { session_id },
                    vec![start(left, right, Side::Left), start(right, left, Side::Right)],
                ))
            }
        }
    }

    /// 연결이 속한 세션에 유닛을 만든다.
    pub fn create_unit(
        &mut self,
        connection_id: Uuid,
        similarity: f64,
        artifact_ref: serde_json::Value,
    ) -> GameResult<Vec<Outbound>> {
        let session_id = *self
            .connection_sessions
            .get(&connection_id)
            .ok_or(GameError::SessionNotFound)?;
        self.create_unit_in(session_id, connection_id, similarity, artifact_ref)
    }

    /// 세션 id 를 명시한 create_unit. 식별자가 맞지 않으면 아무것도 바꾸지 않는다.
    pub fn create_unit_in(
        &mut self,
        session_id: Uuid,
        connection_id: Uuid,
        similarity: f64,
        artifact_ref: serde_json::Value,
    ) -> GameResult<Vec<Outbound>> {
        let session = self
            .sessions
            .get_mut(&session_id)
            .ok_or(GameError::SessionNotFound)?;

        let created = session.create_unit(
            connection_id,
            similarity,
            artifact_ref,
            &mut self.ids,
            &mut self.rng,
            &self.rules,
        )?;

        info!(
            "Unit {} ({}) created in session {} by {} (similarity: {:.1}%)",
            created.unit.id,
            created.unit.name,
            session_id,
            connection_id,
            created.unit.similarity * 100.0
        );

        let message = ServerMessage::UnitCreated {
            unit: created.unit,
            owner_id: connection_id,
            new_prompt: Some(created.new_prompt),
        };
        Ok(session
            .participants()
            .into_iter()
            .map(|to| Outbound::new(to, message.clone()))
            .collect())
    }

    pub fn game_state(&self, connection_id: Uuid) -> GameResult<Vec<Outbound>> {
        let session = self.lookup(connection_id).ok_or(GameError::SessionNotFound)?;
        Ok(vec![Outbound::new(
            connection_id,
            ServerMessage::GameState {
                players: session.status(),
                prompt: session.current_prompt.clone(),
            },
        )])
    }

    /// onDisconnect: 대기열에서 빼고, 세션이 있으면 상대에게 알린 뒤 세션과 두 매핑을 모두 지운다.
    ///
    /// 유예 시간이나 재접속은 없다.
    pub fn on_disconnect(&mut self, connection_id: Uuid) -> Vec<Outbound> {
        if self.queue.remove(connection_id) {
            info!("Connection {} left the queue.", connection_id);
        }

        let Some(session_id) = self.connection_sessions.remove(&connection_id) else {
            return Vec::new();
        };

        let Some(session) = self.sessions.remove(&session_id) else {
            warn!(
                "Connection {} mapped to missing session {}",
                connection_id, session_id
            );
            return Vec::new();
        };

        let mut outbound = Vec::new();
        for participant in session.participants() {
            if participant == connection_id {
                continue;
            }
            self.connection_sessions.remove(&participant);
            outbound.push(Outbound::new(participant, ServerMessage::OpponentDisconnected));
        }

        info!(
            "Session {} closed after {} disconnected ({} ticks played)",
            session_id, connection_id, session.tick
        );
        outbound
    }

    /// 전역 스케줄러 한 번: playing 상태인 모든 세션을 한 틱씩 진행한다.
    pub fn tick(&mut self) -> TickReport {
        self.tick_with(resolve_tick)
    }

    /// 세션별 해석기를 받는 tick. 한 세션의 실패는 report.failures 에만 남고
    /// 나머지 세션은 그대로 진행된다.
    pub(crate) fn tick_with<F>(&mut self, mut resolve: F) -> TickReport
    where
        F: FnMut(&mut GameSession, &BattleRules) -> GameResult<TickOutcome>,
    {
        let mut report = TickReport::default();

        for (session_id, session) in self.sessions.iter_mut() {
            if !session.is_playing() {
                continue;
            }
            report.sessions_ticked += 1;

            let outcome = match resolve(session, &self.rules) {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!("Battle tick failed for session {}: {}", session_id, e);
                    report.failures.push((*session_id, e));
                    continue;
                }
            };

            let participants = session.participants();
            let update = ServerMessage::BattleUpdate {
                updates: outcome.updates.clone(),
                game_state: outcome.game_state.clone(),
                winner: outcome.winner,
            };
            for to in participants {
                report.outbound.push(Outbound::new(to, update.clone()));
            }

            if let (true, Some(winner)) = (outcome.is_finished(), outcome.winner) {
                info!("Session {} finished! Winner: {}", session_id, winner);
                report.finished.push(*session_id);
                for to in participants {
                    report.outbound.push(Outbound::new(
                        to,
                        ServerMessage::GameOver {
                            winner,
                            is_winner: to == winner,
                        },
                    ));
                }
            }
        }

        report
    }

    #[cfg(test)]
    pub(crate) fn session_mut(&mut self, session_id: Uuid) -> Option<&mut GameSession> {
        self.sessions.get_mut(&session_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ErrorCode;
    use serde_json::Value;

    fn conn(n: u128) -> Uuid {
        Uuid::from_u128(n)
    }

    fn paired(registry: &mut SessionRegistry, a: Uuid, b: Uuid) -> Uuid {
        registry.find_match(a).unwrap();
        match registry.find_match(b).unwrap().0 {
            MatchOutcome::Started { session_id } => session_id,
            MatchOutcome::Waiting => panic!("second player should start a session"),
        }
    }

    #[test]
    fn first_player_waits_second_starts() {
        let mut registry = SessionRegistry::new(BattleRules::default(), 7);

        let (outcome, outbound) = registry.find_match(conn(1)).unwrap();
        assert_eq!(outcome, MatchOutcome::Waiting);
        assert_eq!(outbound, vec![Outbound::new(conn(1), ServerMessage::WaitingForOpponent)]);

        let (outcome, outbound) = registry.find_match(conn(2)).unwrap();
        let MatchOutcome::Started { session_id } = outcome else {
            panic!("expected a started session");
        };
        assert_eq!(registry.queue_len(), 0);
        assert_eq!(outbound.len(), 2);

        match &outbound[0].message {
            ServerMessage::GameStart { your_side, opponent_id, session_id: sid, .. } => {
                assert_eq!(outbound[0].to, conn(1));
                assert_eq!(*your_side, Side::Left);
                assert_eq!(*opponent_id, conn(2));
                assert_eq!(*sid, session_id);
            }
            other => panic!("unexpected message {other:?}"),
        }
        match &outbound[1].message {
            ServerMessage::GameStart { your_side, opponent_id, .. } => {
                assert_eq!(outbound[1].to, conn(2));
                assert_eq!(*your_side, Side::Right);
                assert_eq!(*opponent_id, conn(1));
            }
            other => panic!("unexpected message {other:?}"),
        }

        assert_eq!(registry.lookup(conn(1)).map(|s| s.id), Some(session_id));
        assert_eq!(registry.lookup(conn(2)).map(|s| s.id), Some(session_id));
    }

    #[test]
    fn player_in_game_cannot_queue_again() {
        let mut registry = SessionRegistry::new(BattleRules::default(), 7);
        paired(&mut registry, conn(1), conn(2));

        let err = registry.find_match(conn(1)).unwrap_err();
        assert_eq!(err, GameError::AlreadyInGame { connection_id: conn(1) });
        assert_eq!(err.code(), ErrorCode::AlreadyInGame);
        assert_eq!(registry.queue_len(), 0);
    }

    #[test]
    fn duplicate_find_match_while_waiting_is_rejected() {
        let mut registry = SessionRegistry::new(BattleRules::default(), 7);
        registry.find_match(conn(1)).unwrap();

        let err = registry.find_match(conn(1)).unwrap_err();
        assert_eq!(err, GameError::AlreadyInQueue { connection_id: conn(1) });
        assert_eq!(registry.queue_len(), 1);
        assert_eq!(registry.session_count(), 0);
    }

    #[test]
    fn create_unit_without_session_fails() {
        let mut registry = SessionRegistry::new(BattleRules::default(), 7);
        let err = registry.create_unit(conn(1), 0.5, Value::Null).unwrap_err();
        assert_eq!(err, GameError::SessionNotFound);
    }

    #[test]
    fn create_unit_in_foreign_session_fails_without_changes() {
        let mut registry = SessionRegistry::new(BattleRules::default(), 7);
        let session_id = paired(&mut registry, conn(1), conn(2));
        let prompt_before = registry.session(session_id).unwrap().current_prompt.clone();

        let err = registry
            .create_unit_in(session_id, conn(3), 0.5, Value::Null)
            .unwrap_err();
        assert!(matches!(err, GameError::PlayerNotFound { .. }));

        let session = registry.session(session_id).unwrap();
        assert_eq!(session.current_prompt, prompt_before);
        assert!(session.players().iter().all(|p| p.units.is_empty()));
    }

    #[test]
    fn unit_created_reaches_both_players_with_new_prompt() {
        let mut registry = SessionRegistry::new(BattleRules::default(), 7);
        let session_id = paired(&mut registry, conn(1), conn(2));

        let outbound = registry.create_unit(conn(2), 0.8, Value::Null).unwrap();
        let current = registry.session(session_id).unwrap().current_prompt.clone();

        let recipients: Vec<Uuid> = outbound.iter().map(|o| o.to).collect();
        assert_eq!(recipients, vec![conn(1), conn(2)]);
        for o in &outbound {
            match &o.message {
                ServerMessage::UnitCreated { unit, owner_id, new_prompt } => {
                    assert_eq!(*owner_id, conn(2));
                    assert_eq!(unit.side, Side::Right);
                    assert_eq!(new_prompt.as_ref(), Some(&current));
                }
                other => panic!("unexpected message {other:?}"),
            }
        }
    }

    #[test]
    fn disconnect_notifies_opponent_and_clears_both_mappings() {
        let mut registry = SessionRegistry::new(BattleRules::default(), 7);
        let session_id = paired(&mut registry, conn(1), conn(2));

        let outbound = registry.on_disconnect(conn(1));
        assert_eq!(outbound, vec![Outbound::new(conn(2), ServerMessage::OpponentDisconnected)]);
        assert!(registry.session(session_id).is_none());
        assert!(registry.lookup(conn(2)).is_none());

        // 남은 플레이어는 다시 매칭을 찾을 수 있다
        let (outcome, _) = registry.find_match(conn(2)).unwrap();
        assert_eq!(outcome, MatchOutcome::Waiting);
    }

    #[test]
    fn disconnect_of_unknown_connection_is_noop() {
        let mut registry = SessionRegistry::new(BattleRules::default(), 7);
        assert!(registry.on_disconnect(conn(42)).is_empty());
        assert_eq!(registry.session_count(), 0);
    }

    #[test]
    fn tick_broadcasts_update_and_game_over() {
        let mut registry = SessionRegistry::new(BattleRules::default(), 7);
        let session_id = paired(&mut registry, conn(1), conn(2));

        let report = registry.tick();
        assert_eq!(report.sessions_ticked, 1);
        assert_eq!(report.outbound.len(), 2);
        assert!(report
            .outbound
            .iter()
            .all(|o| o.message.event_name() == "battle_update"));

        registry
            .session_mut(session_id)
            .unwrap()
            .player_by_side_mut(Side::Left)
            .current_health = 0;

        let report = registry.tick();
        assert_eq!(report.finished, vec![session_id]);
        let game_over: Vec<&Outbound> = report
            .outbound
            .iter()
            .filter(|o| o.message.event_name() == "game_over")
            .collect();
        assert_eq!(game_over.len(), 2);
        for o in game_over {
            assert_eq!(
                o.message,
                ServerMessage::GameOver {
                    winner: conn(2),
                    is_winner: o.to == conn(2),
                }
            );
        }

        // 종료된 세션은 더 이상 진행되지 않는다
        let report = registry.tick();
        assert_eq!(report.sessions_ticked, 0);
        assert!(report.outbound.is_empty());
        assert_eq!(registry.session_count(), 1);

        // 연결이 끊기기 전까지 종료된 세션의 매핑은 유지된다
        assert_eq!(
            registry.find_match(conn(2)).unwrap_err(),
            GameError::AlreadyInGame { connection_id: conn(2) }
        );
        registry.on_disconnect(conn(1));
        assert_eq!(registry.find_match(conn(2)).unwrap().0, MatchOutcome::Waiting);
    }

    #[test]
    fn failing_session_does_not_stop_the_others() {
        let mut registry = SessionRegistry::new(BattleRules::default(), 7);
        let broken = paired(&mut registry, conn(1), conn(2));
        let healthy = paired(&mut registry, conn(3), conn(4));

        let report = registry.tick_with(|session, rules| {
            if session.id == broken {
                return Err(GameError::Internal("roster corrupted".into()));
            }
            resolve_tick(session, rules)
        });

        assert_eq!(report.sessions_ticked, 2);
        assert_eq!(
            report.failures,
            vec![(broken, GameError::Internal("roster corrupted".into()))]
        );
        let mut recipients: Vec<Uuid> = report.outbound.iter().map(|o| o.to).collect();
        recipients.sort();
        assert_eq!(recipients, vec![conn(3), conn(4)]);
        assert_eq!(registry.session(healthy).unwrap().tick, 1);
        assert_eq!(registry.session(broken).unwrap().tick, 0);

        // 다음 틱에는 다시 스케줄된다
        let report = registry.tick();
        assert_eq!(report.sessions_ticked, 2);
        assert!(report.failures.is_empty());
    }

    #[test]
    fn game_state_reports_display_health() {
        let mut registry = SessionRegistry::new(BattleRules::default(), 7);
        let session_id = paired(&mut registry, conn(1), conn(2));
        registry
            .session_mut(session_id)
            .unwrap()
            .player_by_side_mut(Side::Right)
            .current_health = -30;

        let outbound = registry.game_state(conn(1)).unwrap();
        match &outbound[0].message {
            ServerMessage::GameState { players, .. } => {
                assert_eq!(players[&conn(2)].health, 0);
                assert_eq!(players[&conn(2)].max_health, 1000);
                assert_eq!(players[&conn(1)].side, Side::Left);
            }
            other => panic!("unexpected message {other:?}"),
        }
        assert_eq!(registry.game_state(conn(9)).unwrap_err(), GameError::SessionNotFound);
    }
}
