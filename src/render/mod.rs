use crate::cell::Cell;
use crate::font::GlyphTable;

mod frame;
mod image;

pub use frame::{FrameBuilder, FramePair};
pub use image::IndexedImage;

pub const DEFAULT_CELL_WIDTH: usize = 8;
/// Glyph rows are bytes, so a cell is at most eight pixels wide.
pub const MAX_CELL_WIDTH: usize = 8;

/// Turns packed cells into blocks of palette indices.
#[derive(Debug, Clone)]
pub struct Rasterizer<'a> {
    glyphs: &'a GlyphTable,
    cell_width: usize,
    cell_height: usize,
}

impl<'a> Rasterizer<'a> {
    /// `cell_width` is clamped to `1..=MAX_CELL_WIDTH`; the height follows the glyph table.
    pub fn new(glyphs: &'a GlyphTable, cell_width: usize) -> Self {
        Self {
            glyphs,
            cell_width: cell_width.clamp(1, MAX_CELL_WIDTH),
            cell_height: glyphs.height(),
        }
    }

    pub fn cell_width(&self) -> usize {
        self.cell_width
    }

    pub fn cell_height(&self) -> usize {
        self.cell_height
    }

    /// Writes one `cell_width x cell_height` block at the start of `dest`,
    /// scanline `y` beginning at `y * pitch`.
    ///
    /// Every pixel gets the background first. Glyph bits then paint the
    /// foreground, unless the cell blinks and `suppress_blink` is set.
    ///
    /// # Panics
    ///
    /// If `dest` is shorter than `(cell_height - 1) * pitch + cell_width`.
    pub fn render_cell(&self, dest: &mut [u8], pitch: usize, cell: Cell, suppress_blink: bool) {
        let code = cell.code();
        let attr = cell.attr();
        let blink = attr.blink();
        let bg = attr.background();
        let fg = attr.foreground();

        for y in 0..self.cell_height {
            let bits = self.glyphs.row(code, y);
            let line = &mut dest[y * pitch..y * pitch + self.cell_width];
            for (x, pixel) in line.iter_mut().enumerate() {
                *pixel = bg;

                if blink && suppress_blink {
                    continue;
                }

                if bits & (1 << (self.cell_width - 1 - x)) != 0 {
                    *pixel = fg;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Attribute;

    fn block(raster: &Rasterizer, cell: Cell, suppress: bool) -> Vec<u8> {
        let mut dest = vec![0xEE; raster.cell_width() * raster.cell_height()];
        raster.render_cell(&mut dest, raster.cell_width(), cell, suppress);
        dest
    }

    #[test]
    fn glyph_bits_select_foreground() {
        let glyphs = GlyphTable::builtin();
        let raster = Rasterizer::new(&glyphs, 8);
        let out = block(&raster, Cell::new(b'A', Attribute(0x1E)), false);

        for y in 0..16 {
            let bits = glyphs.row(b'A', y);
            for x in 0..8 {
                let expected = if bits & (0x80 >> x) != 0 { 14 } else { 1 };
                assert_eq!(out[y * 8 + x], expected, "pixel ({x}, {y})");
            }
        }
    }

    #[test]
    fn suppressed_blink_leaves_background() {
        let glyphs = GlyphTable::builtin();
        let raster = Rasterizer::new(&glyphs, 8);
        let out = block(&raster, Cell::new(0xDB, Attribute(0xCF)), true);
        assert!(out.iter().all(|&px| px == 4));

        let out = block(&raster, Cell::new(0xDB, Attribute(0xCF)), false);
        assert!(out.iter().all(|&px| px == 15));
    }

    #[test]
    fn respects_pitch() {
        let glyphs = GlyphTable::builtin();
        let raster = Rasterizer::new(&glyphs, 8);
        let pitch = 24;
        let mut dest = vec![0xEE; pitch * 16];
        raster.render_cell(&mut dest[8..], pitch, Cell::new(0xDB, Attribute(0x0A)), false);

        for y in 0..16 {
            let line = &dest[y * pitch..(y + 1) * pitch];
            assert!(line[..8].iter().all(|&px| px == 0xEE));
            assert!(line[8..16].iter().all(|&px| px == 10));
            assert!(line[16..].iter().all(|&px| px == 0xEE));
        }
    }

    #[test]
    fn narrow_cells_take_low_bits() {
        let glyphs = GlyphTable::from_raw(vec![0b0000_0101; 256 * 2]).unwrap();
        let raster = Rasterizer::new(&glyphs, 3);
        let out = block(&raster, Cell::new(0, Attribute(0x02)), false);
        assert_eq!(out, vec![2, 0, 2, 2, 0, 2]);
    }

    #[test]
    fn cell_width_is_clamped() {
        let glyphs = GlyphTable::builtin();
        assert_eq!(Rasterizer::new(&glyphs, 0).cell_width(), 1);
        assert_eq!(Rasterizer::new(&glyphs, 9).cell_width(), 8);
    }
}
