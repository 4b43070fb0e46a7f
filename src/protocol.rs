use std::collections::BTreeMap;

use actix::prelude::*;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::{
    battle::{Prompt, PlayerSnapshot, PlayerStatus, Side, TickUpdates, Unit},
    error::{GameError, GameResult},
};

// --- Client to Server Messages ---

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// 매칭 대기열에 들어가기를 요청합니다.
    FindMatch,

    /// 그림을 제출해 유닛을 만듭니다. similarity 는 외부 판별 결과(0~1)입니다.
    #[serde(rename_all = "camelCase")]
    CreateUnit {
        #[serde(default, deserialize_with = "lenient_similarity")]
        similarity: f64,
        #[serde(default, alias = "drawingData")]
        artifact_ref: serde_json::Value,
    },

    /// 현재 세션 상태를 요청합니다.
    GetGameState,
}

/// similarity 는 프레임을 거절하는 이유가 되지 않는다.
///
/// 숫자가 아니거나(null, 문자열, 누락) NaN 이면 0, f64 범위를 넘는 값은 가까운 끝(0 또는 1)으로 접는다.
/// 범위 안의 값은 그대로 두고 Unit Factory 에서 [0, 1] 로 clamp 한다.
fn lenient_similarity<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let serde_json::Value::Number(number) = value else {
        return Ok(0.0);
    };

    // 범위를 넘는 리터럴은 as_f64() 가 None 이므로 원문을 다시 읽는다 (1e400 → inf)
    let parsed = number
        .as_f64()
        .or_else(|| number.to_string().parse::<f64>().ok())
        .unwrap_or(0.0);

    Ok(match parsed {
        f if f.is_nan() => 0.0,
        f if f.is_infinite() => f.clamp(0.0, 1.0),
        f => f,
    })
}

/// 텍스트 프레임 → ClientMessage. 실패는 InvalidMessage 로 분류된다.
pub fn parse_client_message(text: &str) -> GameResult<ClientMessage> {
    serde_json::from_str(text).map_err(|e| GameError::InvalidMessage(e.to_string()))
}

// --- Server to Client Messages ---

#[derive(Serialize, Message, Clone, Debug, PartialEq)]
#[rtype(result = "()")]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// 대기열에 등록되었고 상대를 기다리는 중입니다.
    WaitingForOpponent,

    /// 매치가 성사되었습니다.
    #[serde(rename_all = "camelCase")]
    GameStart {
        session_id: Uuid,
        your_side: Side,
        opponent_id: Uuid,
        prompt: Prompt,
    },

    /// 세션 내에 새 유닛이 생성되었습니다. 두 참가자 모두에게 전달됩니다.
    #[serde(rename_all = "camelCase")]
    UnitCreated {
        unit: Unit,
        owner_id: Uuid,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        new_prompt: Option<Prompt>,
    },

    /// 틱 단위 전투 결과 (playing 동안 30/s)
    #[serde(rename_all = "camelCase")]
    BattleUpdate {
        updates: TickUpdates,
        game_state: BTreeMap<Uuid, PlayerSnapshot>,
        winner: Option<Uuid>,
    },

    #[serde(rename_all = "camelCase")]
    GameOver { winner: Uuid, is_winner: bool },

    /// get_game_state 응답
    GameState {
        players: BTreeMap<Uuid, PlayerStatus>,
        prompt: Prompt,
    },

    OpponentDisconnected,

    /// 요청이 거절되었습니다.
    Error { code: ErrorCode, message: String },
}

impl ServerMessage {
    pub fn event_name(&self) -> &'static str {
        match self {
            ServerMessage::WaitingForOpponent => "waiting_for_opponent",
            ServerMessage::GameStart { .. } => "game_start",
            ServerMessage::UnitCreated { .. } => "unit_created",
            ServerMessage::BattleUpdate { .. } => "battle_update",
            ServerMessage::GameOver { .. } => "game_over",
            ServerMessage::GameState { .. } => "game_state",
            ServerMessage::OpponentDisconnected => "opponent_disconnected",
            ServerMessage::Error { .. } => "error",
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|_| "{\"type\":\"error\",\"code\":\"internal_error\",\"message\":\"json serialization failed\"}".to_string())
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    AlreadyInGame,
    AlreadyInQueue,
    SessionNotFound,
    PlayerNotFound,
    GameAlreadyOver,
    InvalidMessageFormat,
    InternalError,
}
