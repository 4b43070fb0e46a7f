use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{GameError, GameResult};

use super::{
    catalog::{random_prompt, Prompt},
    ids::IdGenerator,
    rules::BattleRules,
    unit::{spawn_unit, Side, SpawnRequest, Unit},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Playing,
    /// 종료 상태. playing 으로 돌아가지 않는다.
    Finished,
}

#[derive(Debug, Clone)]
pub struct Player {
    pub id: Uuid,
    pub side: Side,
    pub base_health: i32,
    /// 승패 판정 전까지 음수가 될 수 있다.
    pub current_health: i32,
    /// 생존 유닛. 생성 순서대로 유지된다.
    pub units: Vec<Unit>,
}

impl Player {
    fn new(id: Uuid, side: Side, rules: &BattleRules) -> Self {
        Self {
            id,
            side,
            base_health: rules.base_health,
            current_health: rules.base_health,
            units: Vec::new(),
        }
    }

    pub fn is_defeated(&self) -> bool {
        self.current_health <= 0
    }

    /// 표시용 체력 (0 미만은 0)
    pub fn display_health(&self) -> i32 {
        self.current_health.max(0)
    }
}

/// battle_update 에 실리는 틱 이후 스냅샷
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSnapshot {
    pub health: i32,
    pub unit_count: usize,
}

/// game_state 응답용 상세 상태
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStatus {
    pub health: i32,
    pub max_health: i32,
    pub unit_count: usize,
    pub side: Side,
}

/// create_unit 성공 결과
#[derive(Debug, Clone)]
pub struct UnitCreated {
    pub unit: Unit,
    pub new_prompt: Prompt,
}

/// 두 플레이어가 한 레인에서 싸우는 매치 한 판
#[derive(Debug, Clone)]
pub struct GameSession {
    pub id: Uuid,
    /// Side::index() 로 접근. [left, right]
    players: [Player; 2],
    pub state: SessionState,
    /// 두 플레이어가 공유하는 다음 제시어
    pub current_prompt: Prompt,
    pub winner: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    /// 이 세션에서 해석된 틱 수
    pub tick: u64,
}

impl GameSession {
    pub fn new(id: Uuid, left: Uuid, right: Uuid, prompt: Prompt, rules: &BattleRules) -> Self {
        Self {
            id,
            players: [
                Player::new(left, Side::Left, rules),
                Player::new(right, Side::Right, rules),
            ],
            state: SessionState::Playing,
            current_prompt: prompt,
            winner: None,
            created_at: Utc::now(),
            tick: 0,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.state == SessionState::Playing
    }

    pub fn participants(&self) -> [Uuid; 2] {
        [self.players[0].id, self.players[1].id]
    }

    pub fn players(&self) -> &[Player; 2] {
        &self.players
    }

    pub(crate) fn players_mut(&mut self) -> &mut [Player; 2] {
        &mut self.players
    }

    pub fn player(&self, connection_id: Uuid) -> Option<&Player> {
        self.players.iter().find(|p| p.id == connection_id)
    }

    pub fn player_by_side(&self, side: Side) -> &Player {
        &self.players[side.index()]
    }

    pub fn player_by_side_mut(&mut self, side: Side) -> &mut Player {
        &mut self.players[side.index()]
    }

    /// Unit Factory 진입점.
    ///
    /// 현재 제시어로 유닛을 만들어 호출한 플레이어의 로스터 끝에 붙이고,
    /// 세션 공용 제시어를 새로 뽑는다.
    pub fn create_unit<R: Rng + ?Sized>(
        &mut self,
        connection_id: Uuid,
        similarity: f64,
        artifact_ref: serde_json::Value,
        ids: &mut IdGenerator,
        rng: &mut R,
        rules: &BattleRules,
    ) -> GameResult<UnitCreated> {
        let side = self
            .player(connection_id)
            .map(|p| p.side)
            .ok_or(GameError::PlayerNotFound {
                session_id: self.id,
                connection_id,
            })?;

        if !self.is_playing() {
            return Err(GameError::GameAlreadyOver {
                session_id: self.id,
            });
        }

        let (id, seq) = ids.next_unit();
        let unit = spawn_unit(
            SpawnRequest {
                id,
                seq,
                owner_id: connection_id,
                side,
                prompt: &self.current_prompt,
                similarity,
                artifact_ref,
            },
            rules,
        );

        self.player_by_side_mut(side).units.push(unit.clone());
        self.current_prompt = random_prompt(rng);

        Ok(UnitCreated {
            unit,
            new_prompt: self.current_prompt.clone(),
        })
    }

    pub fn snapshot(&self) -> BTreeMap<Uuid, PlayerSnapshot> {
        self.players
            .iter()
            .map(|p| {
                (
                    p.id,
                    PlayerSnapshot {
                        health: p.current_health,
                        unit_count: p.units.len(),
                    },
                )
            })
            .collect()
    }

    pub fn status(&self) -> BTreeMap<Uuid, PlayerStatus> {
        self.players
            .iter()
            .map(|p| {
                (
                    p.id,
                    PlayerStatus {
                        health: p.display_health(),
                        max_health: p.base_health,
                        unit_count: p.units.len(),
                        side: p.side,
                    },
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::catalog::catalog;
    use rand::{rngs::StdRng, SeedableRng};

    fn session() -> GameSession {
        GameSession::new(
            Uuid::from_u128(1),
            Uuid::from_u128(10),
            Uuid::from_u128(20),
            catalog()[0].clone(),
            &BattleRules::default(),
        )
    }

    #[test]
    fn players_start_full_health_on_fixed_sides() {
        let s = session();
        assert_eq!(s.player_by_side(Side::Left).id, Uuid::from_u128(10));
        assert_eq!(s.player_by_side(Side::Right).id, Uuid::from_u128(20));
        assert!(s.players().iter().all(|p| p.current_health == 1000));
        assert_eq!(s.player(Uuid::from_u128(20)).map(|p| p.side), Some(Side::Right));
        assert!(s.player(Uuid::from_u128(30)).is_none());
    }

    #[test]
    fn create_unit_appends_and_rotates_shared_prompt() {
        let mut s = session();
        let mut ids = IdGenerator::new(1);
        let mut rng = StdRng::seed_from_u64(1);
        let rules = BattleRules::default();

        let created = s
            .create_unit(Uuid::from_u128(20), 0.5, serde_json::Value::Null, &mut ids, &mut rng, &rules)
            .unwrap();

        assert_eq!(created.unit.name, "Snowball Elf");
        assert_eq!(created.unit.side, Side::Right);
        assert_eq!(s.player_by_side(Side::Right).units.len(), 1);
        assert_eq!(s.current_prompt, created.new_prompt);
    }

    #[test]
    fn create_unit_for_stranger_is_rejected() {
        let mut s = session();
        let mut ids = IdGenerator::new(1);
        let mut rng = StdRng::seed_from_u64(1);
        let before = s.current_prompt.clone();

        let err = s
            .create_unit(
                Uuid::from_u128(99),
                0.5,
                serde_json::Value::Null,
                &mut ids,
                &mut rng,
                &BattleRules::default(),
            )
            .unwrap_err();

        assert!(matches!(err, GameError::PlayerNotFound { .. }));
        assert_eq!(s.current_prompt, before);
        assert!(s.players().iter().all(|p| p.units.is_empty()));
    }
}
