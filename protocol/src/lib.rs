//! 黑白棋共享协议库
//!
//! 包含:
//! - 阵营、格子、坐标等核心数据结构
//! - 棋盘与翻转规则
//! - 消息类型定义 (ClientEnvelope, ServerMessage)
//! - 传输层抽象 (Connector, Connection, Listener traits)
//! - 帧编解码

mod board;
mod cell;
mod constants;
mod error;
mod message;
mod transport;

pub use board::{Board, Score, View};
pub use cell::{Cell, Position, Side, ViewCell};
pub use constants::*;
pub use error::{MoveError, ProtocolError, Result};
pub use message::{
    ClientEnvelope, ErrorCode, MovePayload, OwnPlayerInfo, PeerInfo, PlayerToken,
    ServerMessage, SessionId,
};
pub use transport::{
    Connection, Connector, Listener,
    TcpConnection, TcpConnector, TcpListener,
    NetworkConfig, FrameReader, FrameWriter,
    HOST_ENV, PORT_ENV,
};
