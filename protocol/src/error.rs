//! 错误类型定义

use thiserror::Error;

/// 落子被拒绝的原因
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MoveError {
    /// 无效的阵营编码
    #[error("Invalid side code: {code}")]
    InvalidSide { code: u8 },

    /// 坐标越界
    #[error("Coordinates out of range: ({x}, {y})")]
    OutOfRange { x: i32, y: i32 },

    /// 目标格已有棋子
    #[error("Cell ({x}, {y}) is occupied")]
    CellOccupied { x: u8, y: u8 },

    /// 落子不能翻转任何棋子
    #[error("Placing at ({x}, {y}) flips nothing")]
    NoFlips { x: u8, y: u8 },

    /// 不是你的回合
    #[error("Not your turn")]
    NotYourTurn,

    /// 玩家令牌无法识别
    #[error("Unknown credentials")]
    UnknownCredentials,
}

/// 协议错误类型
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// IO 错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON 序列化错误
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// 协议版本不匹配
    #[error("Protocol version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: u8, actual: u8 },

    /// 帧大小超限
    #[error("Frame too large: {size} bytes (max: {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// 连接超时
    #[error("Connection timeout")]
    ConnectionTimeout,

    /// 连接已关闭
    #[error("Connection closed")]
    ConnectionClosed,

    /// 配置无效
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

/// 协议操作结果类型
pub type Result<T> = std::result::Result<T, ProtocolError>;
