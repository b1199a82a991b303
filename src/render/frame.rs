use tracing::debug;

use super::{IndexedImage, Rasterizer};
use crate::blink::BlinkPhase;
use crate::cell::Grid;

/// Both blink frames of one grid snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramePair {
    pub visible: IndexedImage,
    pub suppressed: IndexedImage,
}

impl FramePair {
    pub fn get(&self, phase: BlinkPhase) -> &IndexedImage {
        match phase {
            BlinkPhase::Visible => &self.visible,
            BlinkPhase::Suppressed => &self.suppressed,
        }
    }

    pub fn width(&self) -> usize {
        self.visible.width()
    }

    pub fn height(&self) -> usize {
        self.visible.height()
    }
}

pub struct FrameBuilder<'a> {
    raster: Rasterizer<'a>,
}

impl<'a> FrameBuilder<'a> {
    pub fn new(raster: Rasterizer<'a>) -> Self {
        Self { raster }
    }

    /// Pixel size of the frames built for `grid`.
    pub fn dimensions(&self, grid: &Grid) -> (usize, usize) {
        (
            grid.cols() * self.raster.cell_width(),
            grid.rows() * self.raster.cell_height(),
        )
    }

    /// Rasterizes every cell into both frames. The pair is only handed out
    /// once fully populated; rebuilding after a grid change means building
    /// and swapping in a new pair.
    pub fn build(&self, grid: &Grid) -> FramePair {
        let (width, height) = self.dimensions(grid);
        let mut visible = IndexedImage::new(width, height);
        let mut suppressed = IndexedImage::new(width, height);

        let cell_width = self.raster.cell_width();
        let cell_height = self.raster.cell_height();
        let pitch = visible.stride();

        for row in 0..grid.rows() {
            for col in 0..grid.cols() {
                let Some(cell) = grid.get(row, col) else {
                    continue;
                };
                let offset = row * cell_height * pitch + col * cell_width;

                self.raster
                    .render_cell(&mut visible.pixels_mut()[offset..], pitch, cell, false);
                self.raster
                    .render_cell(&mut suppressed.pixels_mut()[offset..], pitch, cell, true);
            }
        }

        debug!(
            rows = grid.rows(),
            cols = grid.cols(),
            width,
            height,
            "built blink frames"
        );
        FramePair {
            visible,
            suppressed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{Attribute, Cell};
    use crate::font::GlyphTable;

    #[test]
    fn frames_cover_the_grid() {
        let glyphs = GlyphTable::builtin();
        let builder = FrameBuilder::new(Rasterizer::new(&glyphs, 8));
        let grid = Grid::new(25, 80);
        let frames = builder.build(&grid);

        assert_eq!((frames.width(), frames.height()), (640, 400));
        assert_eq!(frames.suppressed.width(), 640);
        assert_eq!(frames.suppressed.height(), 400);
    }

    #[test]
    fn cells_land_at_their_offsets() {
        let glyphs = GlyphTable::builtin();
        let builder = FrameBuilder::new(Rasterizer::new(&glyphs, 8));
        let mut grid = Grid::new(2, 3);
        grid.fill(Cell::new(b' ', Attribute(0x00)));
        grid.set(1, 2, Cell::new(0xDB, Attribute(0x8C)));

        let frames = builder.build(&grid);
        for y in 0..32 {
            for x in 0..24 {
                let inside = y >= 16 && x >= 16;
                let visible = frames.visible.pixel(x, y).unwrap();
                let suppressed = frames.suppressed.pixel(x, y).unwrap();
                assert_eq!(visible, if inside { 12 } else { 0 }, "({x}, {y})");
                assert_eq!(suppressed, 0, "({x}, {y})");
            }
        }
    }

    #[test]
    fn get_selects_by_phase() {
        let glyphs = GlyphTable::builtin();
        let builder = FrameBuilder::new(Rasterizer::new(&glyphs, 8));
        let mut grid = Grid::new(1, 1);
        grid.set(0, 0, Cell::new(0xDB, Attribute(0x8F)));
        let frames = builder.build(&grid);

        assert_eq!(frames.get(BlinkPhase::Visible).pixel(0, 0), Some(15));
        assert_eq!(frames.get(BlinkPhase::Suppressed).pixel(0, 0), Some(0));
    }
}
