//! 消息类型定义
//!
//! 入站：`{event, game_id?, data}`；出站：`{event, data}`。

use serde::{Deserialize, Serialize};

use crate::board::View;

/// 玩家令牌（落子时唯一的身份凭证，绝不发给对手）
pub type PlayerToken = String;

/// 对局 ID
pub type SessionId = String;

/// 客户端发来的原始信封
///
/// `event` 保持字符串形式，由服务端映射到封闭的事件集合，
/// 未知事件需要显式报错而不是被反序列化吞掉。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientEnvelope {
    pub event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_id: Option<SessionId>,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl ClientEnvelope {
    /// 构造不带 game_id 的信封
    pub fn new(event: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            event: event.into(),
            game_id: None,
            data,
        }
    }

    /// 附带 game_id
    pub fn with_game(mut self, game_id: impl Into<SessionId>) -> Self {
        self.game_id = Some(game_id.into());
        self
    }
}

/// `move` 事件的数据
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovePayload {
    pub x: i32,
    pub y: i32,
    pub player_id: PlayerToken,
}

/// 发给自己的身份信息（含令牌）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnPlayerInfo {
    pub id: PlayerToken,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
}

/// 对手的公开信息（不含令牌）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerInfo {
    pub ip: String,
}

/// 服务端发送给客户端的消息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerMessage {
    // === 对局事件 ===
    /// 新对局已创建，等待对手
    GameStarted {
        game_id: SessionId,
        player: OwnPlayerInfo,
    },
    /// 加入对局成功（加入者执白）
    JoinedGame {
        game_id: SessionId,
        host_ip: String,
        player: OwnPlayerInfo,
    },
    /// 对手已加入（发给创建者）
    PlayerJoinedGame { game_id: SessionId, player: PeerInfo },
    /// 局面变化
    PositionChanged {
        position: View,
        my_turn: bool,
        my_score: u32,
        opponents_score: u32,
    },
    /// 游戏结束
    GameOver {
        position: View,
        i_won: bool,
        opponent_won: bool,
        my_score: u32,
        opponents_score: u32,
    },

    // === 心跳 ===
    /// 心跳响应
    Pong,

    // === 错误 ===
    /// 错误消息
    Error { code: ErrorCode, message: String },
}

impl ServerMessage {
    /// 线路上的事件名
    pub fn event_name(&self) -> &'static str {
        match self {
            ServerMessage::GameStarted { .. } => "game_started",
            ServerMessage::JoinedGame { .. } => "joined_game",
            ServerMessage::PlayerJoinedGame { .. } => "player_joined_game",
            ServerMessage::PositionChanged { .. } => "position_changed",
            ServerMessage::GameOver { .. } => "game_over",
            ServerMessage::Pong => "pong",
            ServerMessage::Error { .. } => "error",
        }
    }
}

/// 错误码定义
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u16)]
pub enum ErrorCode {
    // === 对局相关 (1xx) ===
    /// 没有可加入的对局
    NoGameAvailable = 100,
    /// 对局不存在
    UnknownSession = 101,
    /// 连接已在某局中
    AlreadyInGame = 102,

    // === 落子相关 (2xx) ===
    /// 无效落子
    InvalidMove = 200,

    // === 消息相关 (4xx) ===
    /// 未知事件
    UnknownEvent = 400,
    /// 消息格式错误
    MalformedMessage = 401,
}

impl ErrorCode {
    /// 数值错误码（按类别分段：1xx 对局、2xx 落子、4xx 消息）
    pub fn as_u16(self) -> u16 {
        self as u16
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use crate::cell::Side;
    use serde_json::json;

    #[test]
    fn test_client_envelope_decode() {
        let raw = r#"{"event":"move","game_id":"abc","data":{"x":2,"y":3,"player_id":"tok"}}"#;
        let envelope: ClientEnvelope = serde_json::from_str(raw).unwrap();
        assert_eq!(envelope.event, "move");
        assert_eq!(envelope.game_id.as_deref(), Some("abc"));

        let payload: MovePayload = serde_json::from_value(envelope.data).unwrap();
        assert_eq!(
            payload,
            MovePayload {
                x: 2,
                y: 3,
                player_id: "tok".to_string()
            }
        );
    }

    #[test]
    fn test_client_envelope_defaults() {
        let envelope: ClientEnvelope = serde_json::from_str(r#"{"event":"join_game"}"#).unwrap();
        assert_eq!(envelope.game_id, None);
        assert!(envelope.data.is_null());
    }

    #[test]
    fn test_server_message_shape() {
        let msg = ServerMessage::PlayerJoinedGame {
            game_id: "g1".to_string(),
            player: PeerInfo {
                ip: "10.0.0.2".to_string(),
            },
        };
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({
                "event": "player_joined_game",
                "data": { "game_id": "g1", "player": { "ip": "10.0.0.2" } }
            })
        );
        assert_eq!(msg.event_name(), "player_joined_game");
    }

    #[test]
    fn test_position_changed_grid() {
        let msg = ServerMessage::PositionChanged {
            position: Board::initial().render_view(Side::Black),
            my_turn: true,
            my_score: 2,
            opponents_score: 2,
        };
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["event"], "position_changed");
        assert_eq!(value["data"]["position"][3], json!([0, 0, 3, 1, 2, 0, 0, 0]));
        assert_eq!(value["data"]["my_turn"], true);

        let decoded: ServerMessage = serde_json::from_value(value).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn test_error_message_shape() {
        let msg = ServerMessage::Error {
            code: ErrorCode::UnknownEvent,
            message: "Unknown event: resign".to_string(),
        };
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["event"], "error");
        assert_eq!(value["data"]["code"], "unknown_event");
    }

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::NoGameAvailable.as_u16(), 100);
        assert_eq!(ErrorCode::AlreadyInGame.as_u16(), 102);
        assert_eq!(ErrorCode::InvalidMove.as_u16(), 200);
        assert_eq!(ErrorCode::MalformedMessage.as_u16(), 401);

        let decoded: ErrorCode = serde_json::from_value(json!("already_in_game")).unwrap();
        assert_eq!(decoded, ErrorCode::AlreadyInGame);
    }
}
