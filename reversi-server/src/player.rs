//! 玩家与连接句柄

use rand::distributions::Alphanumeric;
use rand::Rng;
use tokio::sync::mpsc;
use tracing::debug;

use protocol::{PlayerToken, ServerMessage, Side, TOKEN_LEN};

/// 连接 ID（每条传输连接一个）
pub type ConnectionId = u64;

/// 生成不可猜测的字母数字串（thread_rng 为密码学安全 RNG）
pub fn random_id(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// 连接句柄
///
/// 出站消息写入无界通道，由连接自己的写任务发出，发送方不会被挂起。
#[derive(Debug, Clone)]
pub struct Peer {
    id: ConnectionId,
    ip: String,
    tx: mpsc::UnboundedSender<ServerMessage>,
}

impl Peer {
    pub fn new(id: ConnectionId, ip: String, tx: mpsc::UnboundedSender<ServerMessage>) -> Self {
        Self { id, ip, tx }
    }

    /// 创建句柄及其接收端
    pub fn channel(id: ConnectionId, ip: impl Into<String>) -> (Self, mpsc::UnboundedReceiver<ServerMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(id, ip.into(), tx), rx)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// 远端 IP
    pub fn ip(&self) -> &str {
        &self.ip
    }

    /// 发送消息，连接已关闭时丢弃
    pub fn send_message(&self, msg: ServerMessage) {
        let event = msg.event_name();
        if self.tx.send(msg).is_err() {
            debug!(conn = self.id, event, "connection gone, dropping message");
        }
    }
}

/// 对局中的玩家
///
/// 创建后不再修改，随对局一起销毁。
#[derive(Debug, Clone)]
pub struct Player {
    token: PlayerToken,
    side: Side,
    peer: Peer,
}

impl Player {
    /// 以新令牌创建玩家
    pub fn new(side: Side, peer: Peer) -> Self {
        Self {
            token: random_id(TOKEN_LEN),
            side,
            peer,
        }
    }

    pub fn token(&self) -> &PlayerToken {
        &self.token
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn peer(&self) -> &Peer {
        &self.peer
    }

    /// 远端 IP
    pub fn ip(&self) -> &str {
        self.peer.ip()
    }

    pub fn send_message(&self, msg: ServerMessage) {
        self.peer.send_message(msg);
    }
}
