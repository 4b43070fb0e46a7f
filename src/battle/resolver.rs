use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::{GameError, GameResult};

use super::{
    damage::apply_attack,
    rules::BattleRules,
    session::{GameSession, PlayerSnapshot, SessionState},
    unit::Unit,
};

/// 틱 동안 한 유닛이 한 행동. 서버 → 클라이언트 방향으로만 쓰인다.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum UnitAction {
    #[serde(rename_all = "camelCase")]
    Move { unit_id: Uuid, position: i32 },
    #[serde(rename_all = "camelCase")]
    Attack {
        unit_id: Uuid,
        target_id: Uuid,
        damage: i32,
    },
    #[serde(rename_all = "camelCase")]
    AttackBase { unit_id: Uuid, damage: i32 },
}

/// 본진 피해. `player_id` 는 피해를 입은 쪽.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseDamage {
    pub player_id: Uuid,
    pub damage: i32,
    pub unit_id: Uuid,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TickUpdates {
    pub units: Vec<UnitAction>,
    pub deaths: Vec<Uuid>,
    pub base_damage: Vec<BaseDamage>,
}

/// 한 세션에 대한 한 틱의 결과
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutcome {
    pub updates: TickUpdates,
    pub game_state: BTreeMap<Uuid, PlayerSnapshot>,
    pub winner: Option<Uuid>,
    pub state: SessionState,
}

impl TickOutcome {
    pub fn is_finished(&self) -> bool {
        self.state == SessionState::Finished
    }
}

/// 살아있는 적 중 가장 가까운 유닛의 인덱스.
///
/// `units` 는 생성 순서로 정렬되어 있어야 하며, 거리가 같으면 먼저 만들어진 유닛이 선택된다.
fn nearest_enemy(units: &[Unit], index: usize) -> Option<usize> {
    let me = &units[index];
    let enemy_side = me.side.opponent();

    let mut nearest: Option<(usize, i32)> = None;
    for (i, candidate) in units.iter().enumerate() {
        if candidate.side != enemy_side || !candidate.is_alive() {
            continue;
        }
        let distance = (me.position - candidate.position).abs();
        match nearest {
            Some((_, best)) if distance >= best => {}
            _ => nearest = Some((i, distance)),
        }
    }
    nearest.map(|(i, _)| i)
}

fn pair_mut(units: &mut [Unit], attacker: usize, target: usize) -> (&Unit, &mut Unit) {
    if attacker < target {
        let (head, tail) = units.split_at_mut(target);
        (&head[attacker], &mut tail[0])
    } else {
        let (head, tail) = units.split_at_mut(attacker);
        (&tail[0], &mut head[target])
    }
}

/// Battle Resolver: playing 상태 세션의 모든 유닛을 한 틱 진행시킨다.
///
/// 1. 양쪽 생존 유닛을 생성 순서로 합친다.
/// 2. 유닛마다 가장 가까운 적을 찾아 교전 거리 안이면 공격, 아니면 전진.
///    적이 없으면 적 본진으로 전진하고, 끝에 닿았으면 본진을 공격한다.
/// 3. 사망 유닛을 로스터에서 제거한다.
/// 4. 승패 판정 후 결과를 돌려준다.
///
/// 같은 틱 안에서 먼저 죽은 유닛은 이후 행동하지도, 공격 대상이 되지도 않는다.
/// 본진에 닿은 유닛은 소모되지 않고 적이 나타날 때까지 매 틱 본진을 공격한다.
pub fn resolve_tick(session: &mut GameSession, rules: &BattleRules) -> GameResult<TickOutcome> {
    if !session.is_playing() {
        return Err(GameError::SessionNotPlaying {
            session_id: session.id,
        });
    }
    session.tick += 1;

    let mut units: Vec<Unit> = session
        .players_mut()
        .iter_mut()
        .flat_map(|player| player.units.drain(..))
        .filter(Unit::is_alive)
        .collect();
    units.sort_by_key(|unit| unit.seq);

    let mut updates = TickUpdates::default();

    for index in 0..units.len() {
        if !units[index].is_alive() {
            continue;
        }
        let side = units[index].side;
        let unit_id = units[index].id;

        match nearest_enemy(&units, index) {
            Some(target) => {
                let distance = (units[index].position - units[target].position).abs();
                if distance < rules.engage_range {
                    let (attacker, defender) = pair_mut(&mut units, index, target);
                    let result = apply_attack(attacker, defender, rules);

                    updates.units.push(UnitAction::Attack {
                        unit_id,
                        target_id: result.target_id,
                        damage: result.final_damage,
                    });
                    if result.target_killed {
                        debug!(
                            "Session {} tick {}: unit {} killed by {}",
                            session.id, session.tick, result.target_id, unit_id
                        );
                        updates.deaths.push(result.target_id);
                    }
                } else {
                    let position = units[index].advance(rules);
                    updates.units.push(UnitAction::Move { unit_id, position });
                }
            }
            None => {
                if side.reached_enemy_base(units[index].position, rules) {
                    let damage = units[index].attack;
                    let enemy = session.player_by_side_mut(side.opponent());
                    enemy.current_health = enemy.current_health.saturating_sub(damage);

                    updates.base_damage.push(BaseDamage {
                        player_id: enemy.id,
                        damage,
                        unit_id,
                    });
                    updates.units.push(UnitAction::AttackBase { unit_id, damage });
                } else {
                    let position = units[index].advance(rules);
                    updates.units.push(UnitAction::Move { unit_id, position });
                }
            }
        }
    }

    for unit in units.into_iter().filter(Unit::is_alive) {
        session.player_by_side_mut(unit.side).units.push(unit);
    }

    let [left, right] = session.players();
    let winner = if left.is_defeated() {
        Some(right.id)
    } else if right.is_defeated() {
        Some(left.id)
    } else {
        None
    };

    if let Some(winner_id) = winner {
        session.state = SessionState::Finished;
        session.winner = Some(winner_id);
    }

    Ok(TickOutcome {
        updates,
        game_state: session.snapshot(),
        winner: session.winner,
        state: session.state,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::{
        catalog::catalog,
        ids::IdGenerator,
        unit::{spawn_unit, Side, SpawnRequest},
    };

    fn unit_at(ids: &mut IdGenerator, side: Side, position: i32) -> Unit {
        let (id, seq) = ids.next_unit();
        let mut unit = spawn_unit(
            SpawnRequest {
                id,
                seq,
                owner_id: Uuid::nil(),
                side,
                prompt: &catalog()[0],
                similarity: 0.5,
                artifact_ref: serde_json::Value::Null,
            },
            &BattleRules::default(),
        );
        unit.position = position;
        unit
    }

    #[test]
    fn nearest_enemy_prefers_earliest_on_tie() {
        let mut ids = IdGenerator::new(3);
        let units = vec![
            unit_at(&mut ids, Side::Left, 100),
            unit_at(&mut ids, Side::Right, 130),
            unit_at(&mut ids, Side::Right, 70),
        ];
        assert_eq!(nearest_enemy(&units, 0), Some(1));
    }

    #[test]
    fn nearest_enemy_skips_dead_units() {
        let mut ids = IdGenerator::new(3);
        let mut units = vec![
            unit_at(&mut ids, Side::Left, 100),
            unit_at(&mut ids, Side::Right, 110),
            unit_at(&mut ids, Side::Right, 300),
        ];
        units[1].take_damage(10_000);
        assert_eq!(nearest_enemy(&units, 0), Some(2));
    }

    #[test]
    fn pair_mut_works_in_both_directions() {
        let mut ids = IdGenerator::new(3);
        let mut units = vec![
            unit_at(&mut ids, Side::Left, 0),
            unit_at(&mut ids, Side::Right, 10),
        ];
        {
            let (attacker, target) = pair_mut(&mut units, 1, 0);
            assert_eq!(attacker.side, Side::Right);
            target.health = 1;
        }
        assert_eq!(units[0].health, 1);
    }
}
