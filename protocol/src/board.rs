//! 棋盘与翻转规则

use serde::{Deserialize, Serialize};

use crate::cell::{Cell, Position, Side, ViewCell};
use crate::constants::BOARD_SIZE;
use crate::error::MoveError;

/// 渲染给某一方的棋盘视图，`view[x][y]`
pub type View = [[ViewCell; BOARD_SIZE]; BOARD_SIZE];

/// 八个方向 (dx, dy)
const DIRECTIONS: [(i8, i8); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// 双方子数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Score {
    pub black: u32,
    pub white: u32,
}

impl Score {
    /// 指定阵营的子数
    pub fn of(&self, side: Side) -> u32 {
        match side {
            Side::Black => self.black,
            Side::White => self.white,
        }
    }

    pub fn total(&self) -> u32 {
        self.black + self.white
    }
}

/// 棋盘
///
/// 规范网格只包含 [`Cell`]，唯一的修改入口是 [`Board::make_move`]。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    cells: [[Cell; BOARD_SIZE]; BOARD_SIZE],
}

impl Board {
    /// 创建空棋盘
    pub fn empty() -> Self {
        Self {
            cells: [[Cell::Empty; BOARD_SIZE]; BOARD_SIZE],
        }
    }

    /// 创建初始棋盘（中央四子交叉摆放）
    pub fn initial() -> Self {
        let mut cells = [[Cell::Empty; BOARD_SIZE]; BOARD_SIZE];
        cells[3][3] = Cell::Disc(Side::White);
        cells[3][4] = Cell::Disc(Side::Black);
        cells[4][3] = Cell::Disc(Side::Black);
        cells[4][4] = Cell::Disc(Side::White);
        Self { cells }
    }

    /// 从给定网格构造棋盘（残局、测试）
    pub fn from_cells(cells: [[Cell; BOARD_SIZE]; BOARD_SIZE]) -> Self {
        Self { cells }
    }

    /// 获取指定位置的格子
    pub fn get(&self, pos: Position) -> Cell {
        self.cells[pos.x as usize][pos.y as usize]
    }

    /// 坐标是否在 8x8 范围内
    pub fn is_valid_coordinate(x: i32, y: i32) -> bool {
        Position::in_bounds(x, y)
    }

    /// 计算在 `pos` 落下 `side` 会翻转的所有棋子
    ///
    /// 目标格非空时返回空集。
    pub fn compute_flips(&self, side: Side, pos: Position) -> Vec<Position> {
        if !self.get(pos).is_empty() {
            return Vec::new();
        }

        let opponent = Cell::Disc(side.opposite());
        let mut flips = Vec::new();

        for (dx, dy) in DIRECTIONS {
            let mut run = Vec::new();
            let mut cursor = pos.offset(dx, dy);

            while let Some(next) = cursor {
                if self.get(next) != opponent {
                    break;
                }
                run.push(next);
                cursor = next.offset(dx, dy);
            }

            // 需要以己方棋子收口，且中间至少夹住一颗对方棋子
            let bracketed = matches!(cursor, Some(end) if self.get(end) == Cell::Disc(side));
            if bracketed && !run.is_empty() {
                flips.extend(run);
            }
        }

        flips
    }

    /// 落子，返回被翻转的棋子
    ///
    /// 失败时棋盘保持不变。
    pub fn make_move(&mut self, side: Side, x: i32, y: i32) -> Result<Vec<Position>, MoveError> {
        let pos = Position::new(x, y).ok_or(MoveError::OutOfRange { x, y })?;

        if !self.get(pos).is_empty() {
            return Err(MoveError::CellOccupied { x: pos.x, y: pos.y });
        }

        let flips = self.compute_flips(side, pos);
        if flips.is_empty() {
            return Err(MoveError::NoFlips { x: pos.x, y: pos.y });
        }

        self.cells[pos.x as usize][pos.y as usize] = Cell::Disc(side);
        for flipped in &flips {
            self.cells[flipped.x as usize][flipped.y as usize] = Cell::Disc(side);
        }

        Ok(flips)
    }

    /// 指定阵营所有合法落点
    pub fn valid_moves(&self, side: Side) -> Vec<Position> {
        Position::all()
            .filter(|&pos| !self.compute_flips(side, pos).is_empty())
            .collect()
    }

    /// 指定阵营是否还有合法落点
    pub fn has_valid_move(&self, side: Side) -> bool {
        Position::all().any(|pos| !self.compute_flips(side, pos).is_empty())
    }

    /// 统计双方子数
    pub fn score(&self) -> Score {
        let mut score = Score::default();
        for pos in Position::all() {
            match self.get(pos).side() {
                Some(Side::Black) => score.black += 1,
                Some(Side::White) => score.white += 1,
                None => {}
            }
        }
        score
    }

    /// 派生给 `side` 的视图：规范网格 + 可落子提示
    pub fn render_view(&self, side: Side) -> View {
        let mut view = self.cells.map(|row| row.map(ViewCell::from));
        for pos in self.valid_moves(side) {
            view[pos.x as usize][pos.y as usize] = ViewCell::PossibleMove;
        }
        view
    }

    /// 不带提示的视图（终局展示用）
    pub fn plain_view(&self) -> View {
        self.cells.map(|row| row.map(ViewCell::from))
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::initial()
    }
}
