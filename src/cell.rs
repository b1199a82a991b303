use anyhow::{Result, anyhow};

use crate::screen::cp437;

pub const DEFAULT_ROWS: usize = 25;
pub const DEFAULT_COLS: usize = 80;

/// Attribute byte layout: bit 7 blink, bits 6-4 background, bits 3-0 foreground.
pub const BLINK_BIT: u8 = 0x80;
pub const BG_SHIFT: u8 = 4;
pub const BG_MASK: u8 = 0x07;
pub const FG_MASK: u8 = 0x0F;

/// The high byte of a text-mode cell.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct Attribute(pub u8);

impl Attribute {
    /// Light gray on black, the BIOS default.
    pub const DEFAULT: Attribute = Attribute(0x07);

    pub const fn new(fg: u8, bg: u8, blink: bool) -> Self {
        let blink = if blink { BLINK_BIT } else { 0 };
        Self(blink | ((bg & BG_MASK) << BG_SHIFT) | (fg & FG_MASK))
    }

    pub const fn blink(self) -> bool {
        self.0 & BLINK_BIT != 0
    }

    pub const fn background(self) -> u8 {
        (self.0 >> BG_SHIFT) & BG_MASK
    }

    pub const fn foreground(self) -> u8 {
        self.0 & FG_MASK
    }

    pub const fn with_blink(self, blink: bool) -> Self {
        Self::new(self.foreground(), self.background(), blink)
    }
}

/// One packed character + attribute pair. Low byte is the glyph code.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct Cell(pub u16);

impl Cell {
    pub const BLANK: Cell = Cell::new(b' ', Attribute::DEFAULT);

    pub const fn new(code: u8, attr: Attribute) -> Self {
        Self(((attr.0 as u16) << 8) | code as u16)
    }

    pub const fn code(self) -> u8 {
        (self.0 & 0xFF) as u8
    }

    pub const fn attr(self) -> Attribute {
        Attribute((self.0 >> 8) as u8)
    }

    pub const fn from_le_bytes(bytes: [u8; 2]) -> Self {
        Self(u16::from_le_bytes(bytes))
    }
}

/// Row-major grid of cells. Dimensions are fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<Cell>,
}

impl Grid {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![Cell::BLANK; rows * cols],
        }
    }

    pub fn from_cells(rows: usize, cols: usize, cells: Vec<Cell>) -> Result<Self> {
        if cells.len() != rows * cols {
            return Err(anyhow!(
                "grid of {rows}x{cols} needs {} cells, got {}",
                rows * cols,
                cells.len()
            ));
        }
        Ok(Self { rows, cols, cells })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn get(&self, row: usize, col: usize) -> Option<Cell> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        Some(self.cells[row * self.cols + col])
    }

    /// Out-of-bounds writes are dropped.
    pub fn set(&mut self, row: usize, col: usize, cell: Cell) {
        if row < self.rows && col < self.cols {
            self.cells[row * self.cols + col] = cell;
        }
    }

    /// Writes `text` as CP437 starting at (`row`, `col`), clipped at the end of the row.
    pub fn put_str(&mut self, row: usize, col: usize, text: &str, attr: Attribute) {
        for (offset, ch) in text.chars().enumerate() {
            let col = col + offset;
            if col >= self.cols {
                break;
            }
            self.set(row, col, Cell::new(cp437::encode(ch), attr));
        }
    }

    pub fn fill(&mut self, cell: Cell) {
        self.cells.fill(cell);
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::new(DEFAULT_ROWS, DEFAULT_COLS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_attribute_fields() {
        let attr = Attribute(0x9E);
        assert!(attr.blink());
        assert_eq!(attr.background(), 1);
        assert_eq!(attr.foreground(), 14);

        let attr = Attribute(0x0F);
        assert!(!attr.blink());
        assert_eq!(attr.background(), 0);
        assert_eq!(attr.foreground(), 15);
    }

    #[test]
    fn attribute_new_masks_fields() {
        assert_eq!(Attribute::new(15, 0, true), Attribute(0x8F));
        assert_eq!(Attribute::new(0x1F, 0x0F, false), Attribute(0x7F));
        assert_eq!(Attribute(0x8F).with_blink(false), Attribute(0x0F));
    }

    #[test]
    fn cell_splits_code_and_attribute() {
        let cell = Cell(0x0F41);
        assert_eq!(cell.code(), 0x41);
        assert_eq!(cell.attr(), Attribute(0x0F));
        assert_eq!(Cell::new(0x41, Attribute(0x0F)), cell);
        assert_eq!(Cell::from_le_bytes([0x41, 0x0F]), cell);
    }

    #[test]
    fn from_cells_checks_length() {
        assert!(Grid::from_cells(2, 2, vec![Cell::BLANK; 3]).is_err());
        let grid = Grid::from_cells(2, 2, vec![Cell::BLANK; 4]).unwrap();
        assert_eq!((grid.rows(), grid.cols()), (2, 2));
    }

    #[test]
    fn put_str_clips_at_row_end() {
        let mut grid = Grid::new(2, 4);
        grid.put_str(0, 2, "abc", Attribute(0x1E));
        assert_eq!(grid.get(0, 2), Some(Cell::new(b'a', Attribute(0x1E))));
        assert_eq!(grid.get(0, 3), Some(Cell::new(b'b', Attribute(0x1E))));
        assert_eq!(grid.get(1, 0), Some(Cell::BLANK));
        assert_eq!(grid.get(0, 4), None);
    }
}
