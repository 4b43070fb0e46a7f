use uuid::Uuid;

use super::{rules::BattleRules, unit::Unit};

/// 데미지 계산 결과
#[derive(Debug, Clone, PartialEq)]
pub struct DamageResult {
    pub target_id: Uuid,
    pub final_damage: i32,
    pub target_killed: bool,
}

/// 기본 데미지 (attack - defense, 최소 min_damage)
///
/// 최소값이 있으므로 방어력이 아무리 높아도 교착 상태는 생기지 않는다.
pub fn calculate_damage(attack: i32, defense: i32, rules: &BattleRules) -> i32 {
    attack.saturating_sub(defense).max(rules.min_damage)
}

/// 공격자 → 대상 데미지 적용 (HP 감소와 사망 판정만 처리)
pub fn apply_attack(attacker: &Unit, target: &mut Unit, rules: &BattleRules) -> DamageResult {
    let final_damage = calculate_damage(attacker.attack, target.defense, rules);
    let target_killed = target.take_damage(final_damage);

    DamageResult {
        target_id: target.id,
        final_damage,
        target_killed,
    }
}
