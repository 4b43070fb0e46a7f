pub mod catalog;
pub mod damage;
pub mod ids;
pub mod resolver;
pub mod rules;
pub mod session;
pub mod unit;

pub use catalog::{catalog, random_prompt, Prompt, PromptKind};
pub use resolver::{resolve_tick, BaseDamage, TickOutcome, TickUpdates, UnitAction};
pub use rules::BattleRules;
pub use session::{GameSession, Player, PlayerSnapshot, PlayerStatus, SessionState, UnitCreated};
pub use unit::{Side, Unit, UnitState};
