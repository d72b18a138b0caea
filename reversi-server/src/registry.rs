//! 对局注册表

use std::collections::HashMap;

use tracing::{debug, info};

use protocol::{PlayerToken, SessionId, SESSION_ID_LEN};

use crate::error::GameError;
use crate::player::{random_id, ConnectionId, Peer};
use crate::session::GameSession;

/// 进程内所有活跃对局
///
/// 由服务端入口持有并显式传给分发器。
pub struct SessionRegistry {
    sessions: HashMap<SessionId, GameSession>,
    next_seq: u64,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: HashMap::new(),
            next_seq: 0,
        }
    }

    /// 生成未被占用的对局 ID
    fn generate_id(&self) -> SessionId {
        loop {
            let id = random_id(SESSION_ID_LEN);
            if !self.sessions.contains_key(&id) {
                return id;
            }
        }
    }

    /// 连接已在某局中时拒绝再开局或入局
    fn ensure_unseated(&self, conn: ConnectionId) -> Result<(), GameError> {
        match self.sessions.values().find(|s| s.has_connection(conn)) {
            Some(session) => Err(GameError::AlreadyInGame(session.id().clone())),
            None => Ok(()),
        }
    }

    /// 创建新对局，返回对局 ID 和创建者令牌
    pub fn start_new_game(&mut self, peer: Peer) -> Result<(SessionId, PlayerToken), GameError> {
        self.ensure_unseated(peer.id())?;

        let id = self.generate_id();
        let seq = self.next_seq;
        self.next_seq += 1;

        let (session, token) = GameSession::create(id.clone(), seq, peer);
        self.sessions.insert(id.clone(), session);

        Ok((id, token))
    }

    /// 加入最早创建的等待中对局
    pub fn join_game(&mut self, peer: Peer) -> Result<(SessionId, PlayerToken), GameError> {
        self.ensure_unseated(peer.id())?;

        let id = self
            .sessions
            .values()
            .filter(|s| s.is_open())
            .min_by_key(|s| s.seq())
            .map(|s| s.id().clone())
            .ok_or(GameError::NoGameAvailable)?;

        let session = self.get_mut(&id)?;
        let token = session.join(peer)?;
        Ok((id, token))
    }

    /// 获取对局
    pub fn get(&self, id: &str) -> Result<&GameSession, GameError> {
        self.sessions
            .get(id)
            .ok_or_else(|| GameError::UnknownSession(id.to_string()))
    }

    /// 获取对局（可变）
    pub fn get_mut(&mut self, id: &str) -> Result<&mut GameSession, GameError> {
        self.sessions
            .get_mut(id)
            .ok_or_else(|| GameError::UnknownSession(id.to_string()))
    }

    /// 移除对局，之后对该 ID 的引用都会得到 UnknownSession
    pub fn remove(&mut self, id: &str) -> Result<GameSession, GameError> {
        let session = self
            .sessions
            .remove(id)
            .ok_or_else(|| GameError::UnknownSession(id.to_string()))?;
        info!(game = %id, remaining = self.sessions.len(), "session removed");
        Ok(session)
    }

    /// 处理连接断开：该连接参与的对局全部结束并移除
    pub fn drop_connection(&mut self, conn: ConnectionId) -> Vec<SessionId> {
        let ended: Vec<SessionId> = self
            .sessions
            .values_mut()
            .filter_map(|s| s.abandon(conn).then(|| s.id().clone()))
            .collect();

        for id in &ended {
            self.sessions.remove(id);
        }
        if !ended.is_empty() {
            debug!(conn, count = ended.len(), "sessions closed after disconnect");
        }
        ended
    }

    /// 等待中的对局数量
    pub fn open_count(&self) -> usize {
        self.sessions.values().filter(|s| s.is_open()).count()
    }

    /// 活跃对局数量
    pub fn count(&self) -> usize {
        self.sessions.len()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
