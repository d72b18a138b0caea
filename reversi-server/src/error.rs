//! 服务端错误

use thiserror::Error;

use protocol::{ErrorCode, MoveError, ServerMessage, SessionId};

/// 单个请求被拒绝的原因
///
/// 全部可恢复：只拒绝触发它的那一个请求，状态保持不变，只回复给发起方。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    /// 无效落子
    #[error("Invalid move: {0}")]
    InvalidMove(#[from] MoveError),

    /// 没有等待中的对局
    #[error("No game available to join")]
    NoGameAvailable,

    /// 连接已在某局中
    #[error("Already seated in game {0}")]
    AlreadyInGame(SessionId),

    /// 对局不存在（或已结束）
    #[error("Unknown session: {0}")]
    UnknownSession(SessionId),

    /// 未知事件
    #[error("Unknown event: {0}")]
    UnknownEvent(String),

    /// 消息格式错误
    #[error("Malformed message: {0}")]
    MalformedMessage(String),
}

impl GameError {
    /// 对应的错误码
    pub fn code(&self) -> ErrorCode {
        match self {
            GameError::InvalidMove(_) => ErrorCode::InvalidMove,
            GameError::NoGameAvailable => ErrorCode::NoGameAvailable,
            GameError::AlreadyInGame(_) => ErrorCode::AlreadyInGame,
            GameError::UnknownSession(_) => ErrorCode::UnknownSession,
            GameError::UnknownEvent(_) => ErrorCode::UnknownEvent,
            GameError::MalformedMessage(_) => ErrorCode::MalformedMessage,
        }
    }

    /// 转换为发给客户端的错误消息
    pub fn to_message(&self) -> ServerMessage {
        ServerMessage::Error {
            code: self.code(),
            message: self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message() {
        let err = GameError::from(MoveError::NotYourTurn);
        assert_eq!(err.code(), ErrorCode::InvalidMove);
        assert_eq!(
            err.to_message(),
            ServerMessage::Error {
                code: ErrorCode::InvalidMove,
                message: "Invalid move: Not your turn".to_string(),
            }
        );
    }
}
