use serde::{Deserialize, Serialize};

/// 전투 밸런스 설정
///
/// 설정 파일의 `[battle]` 섹션에서 읽으며, 누락된 값은 기본값을 사용합니다.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BattleRules {
    /// 스케줄러 틱 빈도 (Hz)
    pub tick_rate_hz: u32,
    /// 레인 길이. 0 = left 본진, lane_length = right 본진
    pub lane_length: i32,
    /// 이 거리 미만이면 교전
    pub engage_range: i32,
    /// 틱당 이동 거리
    pub move_speed: i32,
    /// 플레이어 본진 체력
    pub base_health: i32,
    /// 한 번의 공격이 주는 최소 데미지
    pub min_damage: i32,
}

impl Default for BattleRules {
    fn default() -> Self {
        Self {
            tick_rate_hz: 30,
            lane_length: 800,
            engage_range: 50,
            move_speed: 2,
            base_health: 1000,
            min_damage: 1,
        }
    }
}

impl BattleRules {
    /// 설정값이 유효한지 검증
    pub fn validate(&self) -> Result<(), String> {
        if self.tick_rate_hz == 0 {
            return Err("Invalid battle.tick_rate_hz: 0 (must be > 0)".to_string());
        }
        if self.lane_length <= 0 {
            return Err(format!(
                "Invalid battle.lane_length: {} (must be > 0)",
                self.lane_length
            ));
        }
        if self.move_speed <= 0 || self.engage_range <= 0 {
            return Err(format!(
                "Invalid battle.move_speed/engage_range: {}/{} (must be > 0)",
                self.move_speed, self.engage_range
            ));
        }
        if self.base_health <= 0 || self.min_damage <= 0 {
            return Err(format!(
                "Invalid battle.base_health/min_damage: {}/{} (must be > 0)",
                self.base_health, self.min_damage
            ));
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(1.0 / f64::from(self.tick_rate_hz.max(1)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let rules = BattleRules::default();
        assert!(rules.validate().is_ok());
        assert_eq!(rules.tick_interval().as_millis(), 33);
    }

    #[test]
    fn zero_tick_rate_is_rejected() {
        let rules = BattleRules {
            tick_rate_hz: 0,
            ..BattleRules::default()
        };
        assert!(rules.validate().is_err());
    }
}
