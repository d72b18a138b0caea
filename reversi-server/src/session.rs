//! 对局状态机
//!
//! WaitingForOpponent → InProgress → Finished。进入 Finished 后由调用方
//! 在同一次处理中把对局从注册表移除。

use std::collections::HashMap;

use tracing::{debug, info};

use protocol::{
    Board, MoveError, OwnPlayerInfo, PeerInfo, PlayerToken, Score, ServerMessage, SessionId,
    Side,
};

use crate::error::GameError;
use crate::player::{ConnectionId, Peer, Player};

/// 对局状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// 只有创建者，等待对手加入
    WaitingForOpponent,
    /// 双方就位，轮流落子
    InProgress,
    /// 已结束（终态）
    Finished,
}

/// 一次成功落子的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// 轮到对手
    Continued,
    /// 对手无棋可走，对局结束
    Finished(Score),
}

/// 一局对局
#[derive(Debug)]
pub struct GameSession {
    id: SessionId,
    /// 创建序号（匹配时先到先得）
    seq: u64,
    state: SessionState,
    board: Board,
    /// 令牌 -> 玩家，最多两人
    players: HashMap<PlayerToken, Player>,
    /// 当前走子方的令牌，对手加入前为 None
    current_turn: Option<PlayerToken>,
}

impl GameSession {
    /// 创建对局，创建者执黑，并通知其 `game_started`
    ///
    /// 返回对局和创建者令牌。
    pub fn create(id: SessionId, seq: u64, peer: Peer) -> (Self, PlayerToken) {
        let host = Player::new(Side::Black, peer);
        let token = host.token().clone();
        host.send_message(ServerMessage::GameStarted {
            game_id: id.clone(),
            player: OwnPlayerInfo {
                id: host.token().clone(),
                ip: Some(host.ip().to_string()),
            },
        });
        info!(game = %id, conn = host.peer().id(), ip = host.ip(), "game created");

        let mut players = HashMap::with_capacity(2);
        players.insert(token.clone(), host);

        let session = Self {
            id,
            seq,
            state: SessionState::WaitingForOpponent,
            board: Board::initial(),
            players,
            current_turn: None,
        };
        (session, token)
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// 可加入：等待中且恰好一名玩家
    pub fn is_open(&self) -> bool {
        self.state == SessionState::WaitingForOpponent && self.players.len() == 1
    }

    /// 指定阵营的玩家
    pub fn player(&self, side: Side) -> Option<&Player> {
        self.players.values().find(|p| p.side() == side)
    }

    /// 当前走子方
    pub fn current_side(&self) -> Option<Side> {
        let token = self.current_turn.as_ref()?;
        self.players.get(token).map(|p| p.side())
    }

    /// 该连接是否为本局玩家
    pub fn has_connection(&self, conn: ConnectionId) -> bool {
        self.players.values().any(|p| p.peer().id() == conn)
    }

    /// 对手加入：执白，黑方先走，双方收到局面
    pub fn join(&mut self, peer: Peer) -> Result<PlayerToken, GameError> {
        if !self.is_open() {
            return Err(GameError::NoGameAvailable);
        }

        let host = self
            .player(Side::Black)
            .cloned()
            .ok_or(GameError::NoGameAvailable)?;
        let guest = Player::new(Side::White, peer);
        let token = guest.token().clone();

        guest.send_message(ServerMessage::JoinedGame {
            game_id: self.id.clone(),
            host_ip: host.ip().to_string(),
            player: OwnPlayerInfo {
                id: token.clone(),
                ip: None,
            },
        });
        host.send_message(ServerMessage::PlayerJoinedGame {
            game_id: self.id.clone(),
            player: PeerInfo {
                ip: guest.ip().to_string(),
            },
        });
        info!(game = %self.id, conn = guest.peer().id(), ip = guest.ip(), "opponent joined");

        self.players.insert(token.clone(), guest);
        self.current_turn = Some(host.token().clone());
        self.state = SessionState::InProgress;
        self.broadcast_position();

        Ok(token)
    }

    /// 落子
    ///
    /// 失败时棋盘、轮次均不变，也不广播。
    pub fn make_move(&mut self, token: &str, x: i32, y: i32) -> Result<MoveOutcome, GameError> {
        let side = self
            .players
            .get(token)
            .map(|p| p.side())
            .ok_or(MoveError::UnknownCredentials)?;

        if self.state != SessionState::InProgress || self.current_turn.as_deref() != Some(token) {
            return Err(MoveError::NotYourTurn.into());
        }

        let flips = self.board.make_move(side, x, y)?;
        debug!(game = %self.id, %side, x, y, flipped = flips.len(), "move applied");

        let next = side.opposite();
        if !self.board.has_valid_move(next) {
            return Ok(MoveOutcome::Finished(self.finish()));
        }

        self.current_turn = self.player(next).map(|p| p.token().clone());
        self.broadcast_position();
        Ok(MoveOutcome::Continued)
    }

    /// 连接断开：离开者判负，留下的一方获胜
    ///
    /// 返回 true 表示对局因此结束，调用方应将其移除。
    pub fn abandon(&mut self, conn: ConnectionId) -> bool {
        if !self.has_connection(conn) || self.state == SessionState::Finished {
            return false;
        }

        if self.state == SessionState::InProgress {
            let score = self.board.score();
            let position = self.board.plain_view();
            for player in self.players.values().filter(|p| p.peer().id() != conn) {
                let side = player.side();
                player.send_message(ServerMessage::GameOver {
                    position,
                    i_won: true,
                    opponent_won: false,
                    my_score: score.of(side),
                    opponents_score: score.of(side.opposite()),
                });
            }
        }

        info!(game = %self.id, conn, "player left, game abandoned");
        self.state = SessionState::Finished;
        self.current_turn = None;
        true
    }

    /// 直接替换棋盘，用于构造残局
    #[cfg(test)]
    pub(crate) fn set_board(&mut self, board: Board) {
        self.board = board;
    }

    /// 给每位玩家发送各自视角的局面
    fn broadcast_position(&self) {
        let score = self.board.score();
        for player in self.players.values() {
            let side = player.side();
            player.send_message(ServerMessage::PositionChanged {
                position: self.board.render_view(side),
                my_turn: self.current_turn.as_ref() == Some(player.token()),
                my_score: score.of(side),
                opponents_score: score.of(side.opposite()),
            });
        }
    }

    /// 进入终态并广播结果
    fn finish(&mut self) -> Score {
        self.state = SessionState::Finished;
        self.current_turn = None;

        let score = self.board.score();
        let position = self.board.plain_view();
        for player in self.players.values() {
            let side = player.side();
            let mine = score.of(side);
            let theirs = score.of(side.opposite());
            player.send_message(ServerMessage::GameOver {
                position,
                i_won: mine > theirs,
                opponent_won: theirs > mine,
                my_score: mine,
                opponents_score: theirs,
            });
        }

        info!(game = %self.id, black = score.black, white = score.white, "game over");
        score
    }
}
