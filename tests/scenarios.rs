use textmode::cell::{Attribute, Cell, Grid};
use textmode::font::GlyphTable;
use textmode::palette::PALETTE;
use textmode::render::{FrameBuilder, FramePair, Rasterizer};
use textmode::screen;

fn build(cells: &[Cell]) -> (GlyphTable, FramePair) {
    let glyphs = GlyphTable::builtin();
    let grid = Grid::from_cells(1, cells.len(), cells.to_vec()).unwrap();
    let frames = FrameBuilder::new(Rasterizer::new(&glyphs, 8)).build(&grid);
    (glyphs, frames)
}

#[test]
fn white_on_black_letter() {
    let (glyphs, frames) = build(&[Cell::new(0x41, Attribute(0x0F))]);
    assert_eq!(frames.visible, frames.suppressed);

    let mut lit = 0;
    for y in 0..16 {
        let bits = glyphs.row(0x41, y);
        for x in 0..8 {
            let rgb = frames.visible.rgb(x, y).unwrap();
            if bits & (0x80 >> x) != 0 {
                assert_eq!(rgb, PALETTE[15]);
                lit += 1;
            } else {
                assert_eq!(rgb, PALETTE[0]);
            }
        }
    }
    assert!(lit > 0);
}

#[test]
fn blinking_space_is_background_in_both_frames() {
    let (_, frames) = build(&[Cell::new(0x20, Attribute(0x8F))]);
    assert!(frames.suppressed.pixels().iter().all(|&px| px == 0));
    // the space glyph is blank, so the visible frame matches
    assert_eq!(frames.visible, frames.suppressed);
}

#[test]
fn blinking_block_disappears_when_suppressed() {
    let (_, frames) = build(&[Cell::new(0xDB, Attribute(0xBE))]);
    assert!(frames.visible.pixels().iter().all(|&px| px == 14));
    assert!(frames.suppressed.pixels().iter().all(|&px| px == 3));
}

#[test]
fn extreme_codes_render() {
    let (_, frames) = build(&[
        Cell::new(0x00, Attribute(0x1F)),
        Cell::new(0xFF, Attribute(0x2F)),
    ]);
    assert_eq!(frames.width(), 16);
    for y in 0..16 {
        for x in 0..8 {
            assert_eq!(frames.visible.pixel(x, y), Some(1));
            assert_eq!(frames.visible.pixel(x + 8, y), Some(2));
        }
    }
}

#[test]
fn full_screen_dump_renders_at_vga_resolution() {
    let mut bytes = Vec::with_capacity(4000);
    for index in 0..2000u32 {
        bytes.push((index % 256) as u8);
        bytes.push(if index % 7 == 0 { 0x9E } else { 0x17 });
    }
    let grid = screen::parse_dump(&bytes, 25, 80).unwrap();

    let glyphs = GlyphTable::builtin();
    let frames = FrameBuilder::new(Rasterizer::new(&glyphs, 8)).build(&grid);
    assert_eq!((frames.width(), frames.height()), (640, 400));
    assert_ne!(frames.visible, frames.suppressed);
}
