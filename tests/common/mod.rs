#![allow(dead_code)]

use battle_server::battle::{
    catalog,
    ids::IdGenerator,
    unit::{spawn_unit, SpawnRequest},
    BattleRules, GameSession, Prompt, Side,
};
use uuid::Uuid;

pub const LEFT_PLAYER: Uuid = Uuid::from_u128(0xA);
pub const RIGHT_PLAYER: Uuid = Uuid::from_u128(0xB);

/// 테스트 전용 고정 seed
pub const TEST_SEED: u64 = 0xC0FFEE;

pub fn prompt_named(name: &str) -> Prompt {
    catalog()
        .iter()
        .find(|p| p.name == name)
        .cloned()
        .unwrap_or_else(|| panic!("unknown prompt {name}"))
}

pub fn snowball_elf() -> Prompt {
    prompt_named("Snowball Elf")
}

pub fn new_session(rules: &BattleRules) -> GameSession {
    GameSession::new(
        Uuid::from_u128(0x5E55),
        LEFT_PLAYER,
        RIGHT_PLAYER,
        snowball_elf(),
        rules,
    )
}

/// 제시어/위치를 직접 지정해서 유닛을 로스터에 넣는다.
pub fn place_unit(
    session: &mut GameSession,
    ids: &mut IdGenerator,
    rules: &BattleRules,
    side: Side,
    prompt: &Prompt,
    similarity: f64,
    position: i32,
) -> Uuid {
    let (id, seq) = ids.next_unit();
    let owner_id = session.player_by_side(side).id;
    let mut unit = spawn_unit(
        SpawnRequest {
            id,
            seq,
            owner_id,
            side,
            prompt,
            similarity,
            artifact_ref: serde_json::Value::Null,
        },
        rules,
    );
    unit.position = position;
    session.player_by_side_mut(side).units.push(unit);
    id
}

pub fn conn(n: u128) -> Uuid {
    Uuid::from_u128(n)
}
