use once_cell::sync::Lazy;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// 유닛 원형 분류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptKind {
    Attack,
    Defense,
    Magic,
}

/// 그림 제시어. 다음에 그릴 유닛의 원형과 기본 스탯.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prompt {
    #[serde(rename = "type")]
    pub kind: PromptKind,
    pub name: String,
    pub description: String,
    pub base_attack: u32,
    pub base_defense: u32,
    pub base_health: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_healing: Option<u32>,
    pub icon: String,
}

impl Prompt {
    fn entry(
        kind: PromptKind,
        name: &str,
        description: &str,
        (base_attack, base_defense, base_health): (u32, u32, u32),
        base_healing: Option<u32>,
        icon: &str,
    ) -> Self {
        Self {
            kind,
            name: name.to_string(),
            description: description.to_string(),
            base_attack,
            base_defense,
            base_health,
            base_healing,
            icon: icon.to_string(),
        }
    }
}

static CATALOG: Lazy<Vec<Prompt>> = Lazy::new(|| {
    use PromptKind::*;
    vec![
        Prompt::entry(Attack, "Snowball Elf", "An elf that hurls snowballs", (30, 10, 100), None, "🧝"),
        Prompt::entry(Defense, "Snowman Shieldbearer", "A sturdy snowman guard", (10, 50, 200), None, "⛄"),
        Prompt::entry(Magic, "Magic Rudolph", "A reindeer casting spells", (50, 20, 80), None, "🦌"),
        Prompt::entry(Attack, "Santa Warrior", "Santa throwing gift bombs", (40, 15, 120), None, "🎅"),
        Prompt::entry(Defense, "Christmas Tree Guardian", "A solid guardian tree", (15, 60, 250), None, "🎄"),
        Prompt::entry(Magic, "Angel Healer", "An angel that mends allies", (5, 25, 100), Some(20), "👼"),
    ]
});

/// 프로세스 시작 시 한 번 만들어지는 고정 카탈로그
pub fn catalog() -> &'static [Prompt] {
    &CATALOG
}

/// 카탈로그에서 균등 확률로 하나를 뽑는다.
pub fn random_prompt<R: Rng + ?Sized>(rng: &mut R) -> Prompt {
    let prompts = catalog();
    prompts[rng.gen_range(0..prompts.len())].clone()
}
