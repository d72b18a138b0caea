//! 入站事件分发

use std::str::FromStr;

use tracing::debug;

use protocol::{ClientEnvelope, MovePayload, ServerMessage, SessionId};

use crate::error::GameError;
use crate::player::Peer;
use crate::registry::SessionRegistry;
use crate::session::MoveOutcome;

/// 已知的入站事件（封闭集合）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// 创建新对局
    StartNewGame,
    /// 加入等待中的对局
    JoinGame,
    /// 落子
    Move,
    /// 心跳
    Ping,
}

impl EventKind {
    /// 线路上的事件名
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::StartNewGame => "start_new_game",
            EventKind::JoinGame => "join_game",
            EventKind::Move => "move",
            EventKind::Ping => "ping",
        }
    }
}

impl FromStr for EventKind {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start_new_game" => Ok(EventKind::StartNewGame),
            "join_game" => Ok(EventKind::JoinGame),
            "move" => Ok(EventKind::Move),
            "ping" => Ok(EventKind::Ping),
            other => Err(GameError::UnknownEvent(other.to_string())),
        }
    }
}

/// 消息分发器
pub struct Dispatcher;

impl Dispatcher {
    /// 处理一条入站消息，失败时只回复发起方
    pub fn dispatch(registry: &mut SessionRegistry, peer: &Peer, envelope: ClientEnvelope) {
        if let Err(err) = Self::route(registry, peer, envelope) {
            Self::reject(peer, err);
        }
    }

    /// 把错误回复给发起方
    pub fn reject(peer: &Peer, err: GameError) {
        debug!(conn = peer.id(), code = err.code().as_u16(), error = %err, "request rejected");
        peer.send_message(err.to_message());
    }

    /// 按事件类型路由到注册表或对局
    pub fn route(
        registry: &mut SessionRegistry,
        peer: &Peer,
        envelope: ClientEnvelope,
    ) -> Result<(), GameError> {
        let kind: EventKind = envelope.event.parse()?;
        debug!(conn = peer.id(), event = kind.name(), "dispatching");

        match kind {
            EventKind::StartNewGame => {
                registry.start_new_game(peer.clone())?;
                Ok(())
            }
            EventKind::JoinGame => {
                registry.join_game(peer.clone())?;
                Ok(())
            }
            EventKind::Move => Self::handle_move(registry, envelope.game_id, envelope.data),
            EventKind::Ping => {
                peer.send_message(ServerMessage::Pong);
                Ok(())
            }
        }
    }

    /// 处理落子，终局时立即移除对局
    fn handle_move(
        registry: &mut SessionRegistry,
        game_id: Option<SessionId>,
        data: serde_json::Value,
    ) -> Result<(), GameError> {
        let game_id = game_id
            .ok_or_else(|| GameError::MalformedMessage("move requires game_id".to_string()))?;
        let payload: MovePayload = serde_json::from_value(data)
            .map_err(|e| GameError::MalformedMessage(e.to_string()))?;

        let session = registry.get_mut(&game_id)?;
        match session.make_move(&payload.player_id, payload.x, payload.y)? {
            MoveOutcome::Continued => {}
            MoveOutcome::Finished(_) => {
                registry.remove(&game_id)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protocol::{Board, Cell, ErrorCode, Side, BOARD_SIZE};
    use serde_json::json;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn drain(rx: &mut UnboundedReceiver<ServerMessage>) -> Vec<ServerMessage> {
        let mut out = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            out.push(msg);
        }
        out
    }

    fn error_code(msgs: &[ServerMessage]) -> Option<ErrorCode> {
        match msgs {
            [ServerMessage::Error { code, .. }] => Some(*code),
            _ => None,
        }
    }

    fn move_envelope(game_id: &str, token: &str, x: i32, y: i32) -> ClientEnvelope {
        ClientEnvelope::new("move", json!({ "x": x, "y": y, "player_id": token })).with_game(game_id)
    }

    /// 建立一局进行中的对局，返回 (对局 ID, 黑方令牌, 白方令牌)
    fn start_game(
        registry: &mut SessionRegistry,
        host: &Peer,
        guest: &Peer,
        host_rx: &mut UnboundedReceiver<ServerMessage>,
        guest_rx: &mut UnboundedReceiver<ServerMessage>,
    ) -> (SessionId, String, String) {
        Dispatcher::dispatch(registry, host, ClientEnvelope::new("start_new_game", json!({})));
        let (game_id, black) = match drain(host_rx).as_slice() {
            [ServerMessage::GameStarted { game_id, player }] => (game_id.clone(), player.id.clone()),
            other => panic!("unexpected messages: {:?}", other),
        };

        Dispatcher::dispatch(registry, guest, ClientEnvelope::new("join_game", json!({})));
        let white = match drain(guest_rx).first() {
            Some(ServerMessage::JoinedGame { player, .. }) => player.id.clone(),
            other => panic!("unexpected message: {:?}", other),
        };
        drain(host_rx);

        (game_id, black, white)
    }

    #[test]
    fn test_event_kind_parse() {
        for kind in [EventKind::StartNewGame, EventKind::JoinGame, EventKind::Move, EventKind::Ping] {
            assert_eq!(kind.name().parse::<EventKind>(), Ok(kind));
        }
        assert_eq!(
            "resign".parse::<EventKind>(),
            Err(GameError::UnknownEvent("resign".to_string()))
        );
    }

    #[test]
    fn test_unknown_event_reported() {
        let mut registry = SessionRegistry::new();
        let (peer, mut rx) = Peer::channel(1, "10.0.0.1");

        Dispatcher::dispatch(&mut registry, &peer, ClientEnvelope::new("on_close", json!({})));
        assert_eq!(error_code(&drain(&mut rx)), Some(ErrorCode::UnknownEvent));
        assert_eq!(registry.count(), 0);
    }

    #[test]
    fn test_ping() {
        let mut registry = SessionRegistry::new();
        let (peer, mut rx) = Peer::channel(1, "10.0.0.1");

        Dispatcher::dispatch(&mut registry, &peer, ClientEnvelope::new("ping", json!({})));
        assert_eq!(drain(&mut rx), vec![ServerMessage::Pong]);
    }

    #[test]
    fn test_join_without_open_game() {
        let mut registry = SessionRegistry::new();
        let (peer, mut rx) = Peer::channel(1, "10.0.0.1");

        Dispatcher::dispatch(&mut registry, &peer, ClientEnvelope::new("join_game", json!({})));
        assert_eq!(error_code(&drain(&mut rx)), Some(ErrorCode::NoGameAvailable));
    }

    #[test]
    fn test_host_cannot_join_own_game() {
        let mut registry = SessionRegistry::new();
        let (host, mut rx) = Peer::channel(1, "10.0.0.1");

        Dispatcher::dispatch(&mut registry, &host, ClientEnvelope::new("start_new_game", json!({})));
        assert!(matches!(
            drain(&mut rx).as_slice(),
            [ServerMessage::GameStarted { .. }]
        ));

        Dispatcher::dispatch(&mut registry, &host, ClientEnvelope::new("join_game", json!({})));
        assert_eq!(error_code(&drain(&mut rx)), Some(ErrorCode::AlreadyInGame));

        Dispatcher::dispatch(&mut registry, &host, ClientEnvelope::new("start_new_game", json!({})));
        assert_eq!(error_code(&drain(&mut rx)), Some(ErrorCode::AlreadyInGame));
        assert_eq!(registry.count(), 1);
        assert_eq!(registry.open_count(), 1);
    }

    #[test]
    fn test_move_unknown_session() {
        let mut registry = SessionRegistry::new();
        let (peer, mut rx) = Peer::channel(1, "10.0.0.1");

        Dispatcher::dispatch(&mut registry, &peer, move_envelope("nope", "tok", 2, 3));
        assert_eq!(error_code(&drain(&mut rx)), Some(ErrorCode::UnknownSession));
    }

    #[test]
    fn test_move_malformed() {
        let mut registry = SessionRegistry::new();
        let (peer, mut rx) = Peer::channel(1, "10.0.0.1");

        // 缺少 game_id
        let envelope = ClientEnvelope::new("move", json!({ "x": 2, "y": 3, "player_id": "tok" }));
        Dispatcher::dispatch(&mut registry, &peer, envelope);
        assert_eq!(error_code(&drain(&mut rx)), Some(ErrorCode::MalformedMessage));

        // 缺少 player_id
        let envelope = ClientEnvelope::new("move", json!({ "x": 2, "y": 3 })).with_game("g");
        Dispatcher::dispatch(&mut registry, &peer, envelope);
        assert_eq!(error_code(&drain(&mut rx)), Some(ErrorCode::MalformedMessage));
    }

    #[test]
    fn test_rejected_move_only_reaches_mover() {
        let mut registry = SessionRegistry::new();
        let (host, mut host_rx) = Peer::channel(1, "10.0.0.1");
        let (guest, mut guest_rx) = Peer::channel(2, "10.0.0.2");
        let (game_id, _black, white) =
            start_game(&mut registry, &host, &guest, &mut host_rx, &mut guest_rx);

        Dispatcher::dispatch(&mut registry, &guest, move_envelope(&game_id, &white, 2, 4));
        assert_eq!(error_code(&drain(&mut guest_rx)), Some(ErrorCode::InvalidMove));
        assert!(drain(&mut host_rx).is_empty());
        assert_eq!(registry.get(&game_id).unwrap().board(), &Board::initial());
    }

    #[test]
    fn test_move_broadcasts_to_both() {
        let mut registry = SessionRegistry::new();
        let (host, mut host_rx) = Peer::channel(1, "10.0.0.1");
        let (guest, mut guest_rx) = Peer::channel(2, "10.0.0.2");
        let (game_id, black, _white) =
            start_game(&mut registry, &host, &guest, &mut host_rx, &mut guest_rx);

        Dispatcher::dispatch(&mut registry, &host, move_envelope(&game_id, &black, 2, 3));
        assert!(matches!(
            drain(&mut host_rx).as_slice(),
            [ServerMessage::PositionChanged { my_turn: false, my_score: 4, .. }]
        ));
        assert!(matches!(
            drain(&mut guest_rx).as_slice(),
            [ServerMessage::PositionChanged { my_turn: true, my_score: 1, .. }]
        ));
    }

    #[test]
    fn test_finishing_move_removes_session() {
        let mut registry = SessionRegistry::new();
        let (host, mut host_rx) = Peer::channel(1, "10.0.0.1");
        let (guest, mut guest_rx) = Peer::channel(2, "10.0.0.2");
        let (game_id, black, white) =
            start_game(&mut registry, &host, &guest, &mut host_rx, &mut guest_rx);

        let mut cells = [[Cell::Empty; BOARD_SIZE]; BOARD_SIZE];
        cells[0][0] = Cell::Disc(Side::Black);
        cells[0][1] = Cell::Disc(Side::White);
        registry.get_mut(&game_id).unwrap().set_board(Board::from_cells(cells));

        Dispatcher::dispatch(&mut registry, &host, move_envelope(&game_id, &black, 0, 2));
        assert!(matches!(
            drain(&mut host_rx).as_slice(),
            [ServerMessage::GameOver { i_won: true, opponent_won: false, .. }]
        ));
        assert!(matches!(
            drain(&mut guest_rx).as_slice(),
            [ServerMessage::GameOver { i_won: false, opponent_won: true, .. }]
        ));
        assert_eq!(
            registry.get(&game_id).unwrap_err(),
            GameError::UnknownSession(game_id.clone())
        );

        Dispatcher::dispatch(&mut registry, &guest, move_envelope(&game_id, &white, 0, 3));
        assert_eq!(error_code(&drain(&mut guest_rx)), Some(ErrorCode::UnknownSession));
    }
}
