//! 黑白棋服务端
//!
//! 包含:
//! - 玩家与连接句柄
//! - 对局状态机
//! - 对局注册表与匹配
//! - 事件分发
//! - 连接与状态任务

pub mod dispatcher;
pub mod error;
pub mod player;
pub mod registry;
pub mod server;
pub mod session;

pub use dispatcher::{Dispatcher, EventKind};
pub use error::GameError;
pub use player::{ConnectionId, Peer, Player};
pub use registry::SessionRegistry;
pub use server::{Server, ServerEvent, ServerState};
pub use session::{GameSession, MoveOutcome, SessionState};
