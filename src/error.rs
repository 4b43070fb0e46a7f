use thiserror::Error;
use uuid::Uuid;

use crate::protocol::{ErrorCode, ServerMessage};

/// Unified error types for matchmaking and battle requests.
///
/// 모든 거절은 요청을 보낸 연결에게만 전달되며, 세션이나 상대방에게 영향을 주지 않습니다.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GameError {
    #[error("Connection {connection_id} is already in a game")]
    AlreadyInGame { connection_id: Uuid },

    #[error("Connection {connection_id} is already waiting for an opponent")]
    AlreadyInQueue { connection_id: Uuid },

    #[error("Game not found")]
    SessionNotFound,

    #[error("Player {connection_id} not found in session {session_id}")]
    PlayerNotFound { session_id: Uuid, connection_id: Uuid },

    #[error("Session {session_id} is already over")]
    GameAlreadyOver { session_id: Uuid },

    #[error("Session {session_id} is not in playing state")]
    SessionNotPlaying { session_id: Uuid },

    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for registry operations
pub type GameResult<T> = Result<T, GameError>;

impl GameError {
    pub fn code(&self) -> ErrorCode {
        match self {
            GameError::AlreadyInGame { .. } => ErrorCode::AlreadyInGame,
            GameError::AlreadyInQueue { .. } => ErrorCode::AlreadyInQueue,
            GameError::SessionNotFound => ErrorCode::SessionNotFound,
            GameError::PlayerNotFound { .. } => ErrorCode::PlayerNotFound,
            GameError::GameAlreadyOver { .. } | GameError::SessionNotPlaying { .. } => {
                ErrorCode::GameAlreadyOver
            }
            GameError::InvalidMessage(_) => ErrorCode::InvalidMessageFormat,
            GameError::Internal(_) => ErrorCode::InternalError,
        }
    }
}

/// Convert GameError to the client-facing error message.
impl From<GameError> for ServerMessage {
    fn from(error: GameError) -> Self {
        let code = error.code();
        let message = match &error {
            // 내부 구현은 클라이언트에 노출하지 않습니다.
            GameError::Internal(_) => "Internal server error".to_string(),
            _ => error.to_string(),
        };
        ServerMessage::Error { code, message }
    }
}
