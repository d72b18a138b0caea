//! 服务器主逻辑
//!
//! 每条连接一个读任务和一个写任务，只负责收发帧；所有对局状态由单一的
//! 状态任务持有，逐条处理事件，同一时刻每局至多一个修改在进行。

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use protocol::{
    ClientEnvelope, Connection, Listener, NetworkConfig, ProtocolError, TcpConnection,
    TcpListener,
};

use crate::dispatcher::Dispatcher;
use crate::error::GameError;
use crate::player::{ConnectionId, Peer};
use crate::registry::SessionRegistry;

/// 事件队列容量
const EVENT_QUEUE_SIZE: usize = 1024;

/// accept 失败后的重试间隔（例如文件描述符耗尽）
const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// 连接任务发给状态任务的事件
#[derive(Debug)]
pub enum ServerEvent {
    /// 新连接
    Connected(Peer),
    /// 收到一条消息
    Message {
        conn: ConnectionId,
        envelope: ClientEnvelope,
    },
    /// 收到无法解析的消息
    Malformed { conn: ConnectionId, reason: String },
    /// 连接断开
    Disconnected(ConnectionId),
}

/// 服务器状态
pub struct ServerState {
    pub registry: SessionRegistry,
    /// 连接 ID -> 连接句柄
    pub connections: HashMap<ConnectionId, Peer>,
}

impl ServerState {
    pub fn new() -> Self {
        Self {
            registry: SessionRegistry::new(),
            connections: HashMap::new(),
        }
    }

    /// 处理单个事件，处理完毕前不会开始下一个
    pub fn handle_event(&mut self, event: ServerEvent) {
        match event {
            ServerEvent::Connected(peer) => {
                info!(conn = peer.id(), ip = peer.ip(), "connection opened");
                self.connections.insert(peer.id(), peer);
            }
            ServerEvent::Message { conn, envelope } => {
                let Some(peer) = self.connections.get(&conn) else {
                    warn!(conn, "message from unknown connection");
                    return;
                };
                Dispatcher::dispatch(&mut self.registry, peer, envelope);
            }
            ServerEvent::Malformed { conn, reason } => {
                if let Some(peer) = self.connections.get(&conn) {
                    Dispatcher::reject(peer, GameError::MalformedMessage(reason));
                }
            }
            ServerEvent::Disconnected(conn) => {
                self.connections.remove(&conn);
                let ended = self.registry.drop_connection(conn);
                info!(conn, sessions_closed = ended.len(), "connection closed");
            }
        }
    }
}

impl Default for ServerState {
    fn default() -> Self {
        Self::new()
    }
}

/// 状态任务：逐条处理事件直到所有发送端关闭
pub async fn run_state(mut state: ServerState, mut events: mpsc::Receiver<ServerEvent>) {
    while let Some(event) = events.recv().await {
        state.handle_event(event);
    }
    debug!("event channel closed, state task exiting");
}

/// 服务器
pub struct Server {
    listener: TcpListener,
}

impl Server {
    /// 绑定监听地址
    pub async fn bind(config: &NetworkConfig) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(&config.addr()).await?;
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> Option<String> {
        self.listener.local_addr()
    }

    /// 接受连接直到进程退出
    pub async fn run(mut self) -> anyhow::Result<()> {
        let (tx, rx) = mpsc::channel(EVENT_QUEUE_SIZE);
        tokio::spawn(run_state(ServerState::new(), rx));

        info!(addr = ?self.local_addr(), "reversi server listening");

        let mut next_id: ConnectionId = 1;
        loop {
            let conn = accept_with_backoff(&mut self.listener).await;
            let id = next_id;
            next_id += 1;
            tokio::spawn(handle_connection(id, conn, tx.clone()));
        }
    }
}

/// 接受下一条连接，失败时等待片刻再重试
async fn accept_with_backoff<L: Listener>(listener: &mut L) -> L::Conn {
    loop {
        match listener.accept().await {
            Ok(conn) => return conn,
            Err(e) => {
                warn!(error = %e, "accept failed, retrying");
                tokio::time::sleep(ACCEPT_RETRY_DELAY).await;
            }
        }
    }
}

/// 单条连接的收发循环
async fn handle_connection(id: ConnectionId, conn: TcpConnection, events: mpsc::Sender<ServerEvent>) {
    let ip = conn.remote_ip().unwrap_or_else(|| "unknown".to_string());
    let (mut reader, mut writer) = conn.split();
    let (peer, mut outbox) = Peer::channel(id, ip);

    if events.send(ServerEvent::Connected(peer)).await.is_err() {
        return;
    }

    // 所有 Peer 句柄释放后通道关闭，写任务随之退出
    tokio::spawn(async move {
        while let Some(msg) = outbox.recv().await {
            if let Err(e) = writer.write_frame(&msg).await {
                debug!(conn = id, error = %e, "write failed");
                break;
            }
        }
    });

    loop {
        let event = match reader.read_frame::<ClientEnvelope>().await {
            Ok(envelope) => ServerEvent::Message { conn: id, envelope },
            Err(ProtocolError::Json(e)) => ServerEvent::Malformed {
                conn: id,
                reason: e.to_string(),
            },
            Err(ProtocolError::ConnectionClosed) => break,
            Err(e) => {
                warn!(conn = id, error = %e, "read failed, closing connection");
                break;
            }
        };

        if events.send(event).await.is_err() {
            break;
        }
    }

    let _ = events.send(ServerEvent::Disconnected(id)).await;
}
