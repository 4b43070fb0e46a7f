use actix::prelude::*;
use uuid::Uuid;

use crate::protocol::ServerMessage;

/// 새 웹소켓 연결을 등록합니다. 이후 이 연결로 가는 메시지는 `addr` 로 전달됩니다.
#[derive(Message)]
#[rtype(result = "()")]
pub struct Connect {
    pub connection_id: Uuid,
    pub addr: Recipient<ServerMessage>,
}

/// 연결 종료. 대기열/세션 정리까지 한 번에 처리됩니다.
#[derive(Message)]
#[rtype(result = "()")]
pub struct Disconnect {
    pub connection_id: Uuid,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct FindMatch {
    pub connection_id: Uuid,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct CreateUnit {
    pub connection_id: Uuid,
    pub similarity: f64,
    pub artifact_ref: serde_json::Value,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct GetGameState {
    pub connection_id: Uuid,
}

/// 전역 스케줄러 한 번. 타이머가 자기 자신에게 보냅니다.
#[derive(Message)]
#[rtype(result = "()")]
pub struct Tick;

#[derive(Message)]
#[rtype(result = "ServerStats")]
pub struct GetServerStats;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, MessageResponse)]
#[serde(rename_all = "camelCase")]
pub struct ServerStats {
    pub connections: usize,
    pub players_in_queue: usize,
    pub sessions: usize,
}
