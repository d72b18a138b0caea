//! 阵营、格子与坐标

use serde::{Deserialize, Serialize};

use crate::constants::BOARD_SIZE;
use crate::error::MoveError;

/// 阵营
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// 黑方（先手，创建对局的一方）
    Black,
    /// 白方（后手，加入对局的一方）
    White,
}

impl Side {
    /// 获取对方阵营
    pub fn opposite(&self) -> Side {
        match self {
            Side::Black => Side::White,
            Side::White => Side::Black,
        }
    }

    /// 线路上的编码（1 = 白，2 = 黑）
    pub fn code(&self) -> u8 {
        match self {
            Side::White => 1,
            Side::Black => 2,
        }
    }

    /// 从线路编码解析，其它值一律报错
    pub fn from_code(code: u8) -> Result<Side, MoveError> {
        match code {
            1 => Ok(Side::White),
            2 => Ok(Side::Black),
            _ => Err(MoveError::InvalidSide { code }),
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Black => write!(f, "black"),
            Side::White => write!(f, "white"),
        }
    }
}

/// 棋盘上的格子（规范状态，不含提示标记）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Cell {
    #[default]
    Empty,
    Disc(Side),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// 棋子所属阵营
    pub fn side(&self) -> Option<Side> {
        match self {
            Cell::Empty => None,
            Cell::Disc(side) => Some(*side),
        }
    }
}

/// 渲染给玩家看的格子
///
/// 与 [`Cell`] 相比多了 `PossibleMove`，只出现在派生视图中。
/// 序列化为整数：0 = 空，1 = 白，2 = 黑，3 = 可落子。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum ViewCell {
    Empty,
    Disc(Side),
    PossibleMove,
}

/// 可落子提示的线路编码
const POSSIBLE_MOVE_CODE: u8 = 3;

impl From<Cell> for ViewCell {
    fn from(cell: Cell) -> Self {
        match cell {
            Cell::Empty => ViewCell::Empty,
            Cell::Disc(side) => ViewCell::Disc(side),
        }
    }
}

impl From<ViewCell> for u8 {
    fn from(cell: ViewCell) -> u8 {
        match cell {
            ViewCell::Empty => 0,
            ViewCell::Disc(side) => side.code(),
            ViewCell::PossibleMove => POSSIBLE_MOVE_CODE,
        }
    }
}

impl TryFrom<u8> for ViewCell {
    type Error = MoveError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(ViewCell::Empty),
            POSSIBLE_MOVE_CODE => Ok(ViewCell::PossibleMove),
            other => Side::from_code(other).map(ViewCell::Disc),
        }
    }
}

/// 棋盘位置
///
/// `x` 为行、`y` 为列，与线路上 `position[x][y]` 一致。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    /// 行 (0-7)
    pub x: u8,
    /// 列 (0-7)
    pub y: u8,
}

impl Position {
    /// 创建新位置，越界返回 None
    pub fn new(x: i32, y: i32) -> Option<Self> {
        if Self::in_bounds(x, y) {
            Some(Self { x: x as u8, y: y as u8 })
        } else {
            None
        }
    }

    /// 创建新位置（不检查边界，内部使用）
    pub const fn new_unchecked(x: u8, y: u8) -> Self {
        Self { x, y }
    }

    /// 坐标是否落在棋盘内
    pub fn in_bounds(x: i32, y: i32) -> bool {
        (0..BOARD_SIZE as i32).contains(&x) && (0..BOARD_SIZE as i32).contains(&y)
    }

    /// 获取偏移后的位置
    pub fn offset(&self, dx: i8, dy: i8) -> Option<Position> {
        Position::new(self.x as i32 + dx as i32, self.y as i32 + dy as i32)
    }

    /// 遍历棋盘全部 64 个位置（按行优先）
    pub fn all() -> impl Iterator<Item = Position> {
        (0..BOARD_SIZE as u8)
            .flat_map(|x| (0..BOARD_SIZE as u8).map(move |y| Position::new_unchecked(x, y)))
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}
