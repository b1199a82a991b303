use std::time::{Duration, Instant};

use proptest::prelude::*;
use textmode::blink::{BlinkPhase, BlinkScheduler};
use textmode::cell::{Attribute, Cell, Grid};
use textmode::font::GlyphTable;
use textmode::render::{FrameBuilder, Rasterizer};

fn render(glyphs: &GlyphTable, cell: Cell, suppress: bool) -> Vec<u8> {
    let raster = Rasterizer::new(glyphs, 8);
    let mut dest = vec![0xEE; 8 * glyphs.height()];
    raster.render_cell(&mut dest, 8, cell, suppress);
    dest
}

proptest! {
    #[test]
    fn unset_bits_show_background(code: u8, attr: u8, suppress: bool) {
        let glyphs = GlyphTable::builtin();
        let out = render(&glyphs, Cell::new(code, Attribute(attr)), suppress);
        let bg = Attribute(attr).background();

        for y in 0..16 {
            let bits = glyphs.row(code, y);
            for x in 0..8 {
                if bits & (0x80 >> x) == 0 {
                    prop_assert_eq!(out[y * 8 + x], bg);
                }
            }
        }
    }

    #[test]
    fn suppressed_blink_is_solid_background(code: u8, attr in 0x80u8..=0xFF) {
        let glyphs = GlyphTable::builtin();
        let out = render(&glyphs, Cell::new(code, Attribute(attr)), true);
        let bg = Attribute(attr).background();
        prop_assert!(out.iter().all(|&px| px == bg));
    }

    #[test]
    fn non_blinking_cells_ignore_suppression(code: u8, attr in 0x00u8..0x80) {
        let glyphs = GlyphTable::builtin();
        let cell = Cell::new(code, Attribute(attr));
        prop_assert_eq!(render(&glyphs, cell, false), render(&glyphs, cell, true));
    }

    #[test]
    fn frame_building_is_idempotent(
        rows in 1usize..6,
        cols in 1usize..6,
        seed in proptest::collection::vec(any::<u16>(), 36),
    ) {
        let cells = seed.into_iter().take(rows * cols).map(Cell).collect();
        let grid = Grid::from_cells(rows, cols, cells).unwrap();
        let glyphs = GlyphTable::builtin();
        let builder = FrameBuilder::new(Rasterizer::new(&glyphs, 8));

        prop_assert_eq!(builder.build(&grid), builder.build(&grid));
    }

    #[test]
    fn phase_parity_follows_elapsed_periods(k in 0u32..200, period_ms in 1u64..500) {
        let period = Duration::from_millis(period_ms);
        let epoch = Instant::now();
        let mut scheduler = BlinkScheduler::new(epoch, period);

        for step in 1..=k {
            scheduler.update(epoch + period * step);
        }
        let expected = if k % 2 == 0 { BlinkPhase::Visible } else { BlinkPhase::Suppressed };
        prop_assert_eq!(scheduler.phase(), expected);
        prop_assert_eq!(BlinkPhase::at(period * k, period), expected);
    }

    #[test]
    fn single_late_check_matches_periodic_checks(k in 0u32..200, jitter_ms in 0u64..50) {
        let period = Duration::from_millis(100);
        let epoch = Instant::now();
        let mut scheduler = BlinkScheduler::new(epoch, period);

        scheduler.update(epoch + period * k + Duration::from_millis(jitter_ms));
        let expected = if k % 2 == 0 { BlinkPhase::Visible } else { BlinkPhase::Suppressed };
        prop_assert_eq!(scheduler.phase(), expected);
        prop_assert_eq!(scheduler.deadline(), epoch + period * (k + 1));
    }
}
