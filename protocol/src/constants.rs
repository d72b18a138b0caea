//! 协议常量定义

use std::time::Duration;

/// 协议版本号
pub const PROTOCOL_VERSION: u8 = 1;

/// 棋盘边长（8x8）
pub const BOARD_SIZE: usize = 8;

/// 消息帧最大大小
pub const MAX_FRAME_SIZE: usize = 65536;

/// 玩家令牌长度（字母数字）
pub const TOKEN_LEN: usize = 32;

/// 对局 ID 长度（字母数字）
pub const SESSION_ID_LEN: usize = 16;

/// 默认监听端口
pub const DEFAULT_PORT: u16 = 8888;

/// 连接超时（秒）
pub const CONNECT_TIMEOUT_SECS: u64 = 10;

/// 连接超时 Duration
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(CONNECT_TIMEOUT_SECS);
