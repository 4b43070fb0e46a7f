use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    catalog::{Prompt, PromptKind},
    rules::BattleRules,
};

/// 유사도 0 일 때의 스탯 배율
pub const MIN_STAT_MULTIPLIER: f64 = 0.3;
/// 유사도 1 당 추가되는 배율 (0.3 ~ 1.5배)
pub const SIMILARITY_WEIGHT: f64 = 1.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn opponent(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    /// 적 본진 방향으로의 이동 부호
    pub fn direction(self) -> i32 {
        match self {
            Side::Left => 1,
            Side::Right => -1,
        }
    }

    pub fn home_position(self, rules: &BattleRules) -> i32 {
        match self {
            Side::Left => 0,
            Side::Right => rules.lane_length,
        }
    }

    /// 적 본진 끝에 도달했는지
    pub fn reached_enemy_base(self, position: i32, rules: &BattleRules) -> bool {
        match self {
            Side::Left => position >= rules.lane_length,
            Side::Right => position <= 0,
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Side::Left => 0,
            Side::Right => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitState {
    Moving,
    Dead,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Unit {
    pub id: Uuid,
    /// 생성 순서. 해석 순서와 동점 처리에 사용되며 클라이언트로는 나가지 않는다.
    #[serde(skip)]
    pub seq: u64,
    pub owner_id: Uuid,
    pub side: Side,
    #[serde(rename = "type")]
    pub kind: PromptKind,
    pub name: String,
    pub icon: String,
    pub attack: i32,
    pub defense: i32,
    pub health: i32,
    pub max_health: i32,
    pub healing: i32,
    pub similarity: f64,
    pub artifact_ref: serde_json::Value,
    pub position: i32,
    pub state: UnitState,
    pub created_at: DateTime<Utc>,
}

impl Unit {
    pub fn is_alive(&self) -> bool {
        self.state != UnitState::Dead
    }

    /// 데미지를 적용하고 사망 여부를 반환한다.
    pub fn take_damage(&mut self, damage: i32) -> bool {
        self.health -= damage;
        if self.health <= 0 {
            self.state = UnitState::Dead;
        }
        !self.is_alive()
    }

    /// 적 본진 방향으로 한 걸음. 레인 밖으로는 나가지 않는다.
    pub fn advance(&mut self, rules: &BattleRules) -> i32 {
        let next = self.position + self.side.direction() * rules.move_speed;
        self.position = next.clamp(0, rules.lane_length);
        self.position
    }
}

/// 유닛 생성 요청
#[derive(Debug, Clone)]
pub struct SpawnRequest<'a> {
    pub id: Uuid,
    pub seq: u64,
    pub owner_id: Uuid,
    pub side: Side,
    pub prompt: &'a Prompt,
    pub similarity: f64,
    pub artifact_ref: serde_json::Value,
}

/// 클라이언트가 보고한 유사도는 신뢰하지 않고 [0, 1] 로 접는다.
pub fn clamp_similarity(similarity: f64) -> f64 {
    if similarity.is_nan() {
        return 0.0;
    }
    similarity.clamp(0.0, 1.0)
}

pub fn stat_multiplier(similarity: f64) -> f64 {
    MIN_STAT_MULTIPLIER + clamp_similarity(similarity) * SIMILARITY_WEIGHT
}

fn scale(base: u32, multiplier: f64) -> i32 {
    (f64::from(base) * multiplier).round() as i32
}

/// Unit Factory: 제시어 + 유사도 → 실제 유닛 스탯
pub fn spawn_unit(request: SpawnRequest<'_>, rules: &BattleRules) -> Unit {
    let similarity = clamp_similarity(request.similarity);
    let multiplier = stat_multiplier(similarity);
    let prompt = request.prompt;
    let health = scale(prompt.base_health, multiplier);

    Unit {
        id: request.id,
        seq: request.seq,
        owner_id: request.owner_id,
        side: request.side,
        kind: prompt.kind,
        name: prompt.name.clone(),
        icon: prompt.icon.clone(),
        attack: scale(prompt.base_attack, multiplier),
        defense: scale(prompt.base_defense, multiplier),
        health,
        max_health: health,
        healing: prompt
            .base_healing
            .map(|healing| scale(healing, multiplier))
            .unwrap_or(0),
        similarity,
        artifact_ref: request.artifact_ref,
        position: request.side.home_position(rules),
        state: UnitState::Moving,
        created_at: Utc::now(),
    }
}
