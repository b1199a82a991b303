//! Where grids come from: raw text-mode dumps, or screens composed with
//! ratatui widgets and transcoded to code page 437.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Widget},
};
use tracing::debug;

use crate::cell::{Attribute, Cell, Grid};
use crate::palette::{self, Rgb};

pub mod cp437;

/// ANSI color number to VGA palette index.
const ANSI_TO_VGA: [u8; 16] = [0, 4, 2, 6, 1, 5, 3, 7, 8, 12, 10, 14, 9, 13, 11, 15];

/// ratatui named colors in VGA palette order.
const VGA_COLORS: [Color; 16] = [
    Color::Black,
    Color::Blue,
    Color::Green,
    Color::Cyan,
    Color::Red,
    Color::Magenta,
    Color::Yellow,
    Color::Gray,
    Color::DarkGray,
    Color::LightBlue,
    Color::LightGreen,
    Color::LightCyan,
    Color::LightRed,
    Color::LightMagenta,
    Color::LightYellow,
    Color::White,
];

const DEFAULT_FG: u8 = 7;
const DEFAULT_BG: u8 = 0;

/// Reads a raw cell dump: (code, attribute) byte pairs, row-major, as found
/// at segment B800 in text mode. Bytes past the grid are ignored.
pub fn load_dump(path: &Path, rows: usize, cols: usize) -> Result<Grid> {
    let bytes = fs::read(path).with_context(|| format!("read screen {}", path.display()))?;
    let grid = parse_dump(&bytes, rows, cols)
        .with_context(|| format!("parse screen {}", path.display()))?;
    debug!(path = %path.display(), rows, cols, "loaded screen dump");
    Ok(grid)
}

pub fn parse_dump(bytes: &[u8], rows: usize, cols: usize) -> Result<Grid> {
    let needed = rows * cols * 2;
    if bytes.len() < needed {
        return Err(anyhow!(
            "screen dump has {} bytes, a {rows}x{cols} grid needs {needed}",
            bytes.len()
        ));
    }

    let cells = bytes[..needed]
        .chunks_exact(2)
        .map(|pair| Cell::from_le_bytes([pair[0], pair[1]]))
        .collect();
    Grid::from_cells(rows, cols, cells)
}

/// Transcodes a ratatui buffer into text-mode cells.
///
/// Backgrounds lose their intensity bit, since the attribute byte only has
/// room for eight background colors.
pub fn from_buffer(buf: &Buffer) -> Grid {
    let area = buf.area;
    let mut grid = Grid::new(area.height as usize, area.width as usize);

    for y in 0..area.height {
        for x in 0..area.width {
            let cell = &buf[(area.x + x, area.y + y)];
            let ch = cell.symbol().chars().next().unwrap_or(' ');

            let mut fg = vga_index(cell.fg, DEFAULT_FG);
            let mut bg = vga_index(cell.bg, DEFAULT_BG);
            if cell.modifier.contains(Modifier::REVERSED) {
                std::mem::swap(&mut fg, &mut bg);
            }
            let blink = cell
                .modifier
                .intersects(Modifier::SLOW_BLINK | Modifier::RAPID_BLINK);

            grid.set(
                y as usize,
                x as usize,
                Cell::new(cp437::encode(ch), Attribute::new(fg, bg, blink)),
            );
        }
    }
    grid
}

/// Maps a ratatui color onto the 16-entry palette.
pub fn vga_index(color: Color, default: u8) -> u8 {
    match color {
        Color::Reset => default,
        Color::Indexed(n) if n < 16 => ANSI_TO_VGA[n as usize],
        Color::Indexed(n) => palette::nearest(xterm_rgb(n)),
        Color::Rgb(r, g, b) => palette::nearest(Rgb::new(r, g, b)),
        named => VGA_COLORS
            .iter()
            .position(|&c| c == named)
            .map_or(default, |index| index as u8),
    }
}

fn xterm_rgb(n: u8) -> Rgb {
    match n {
        16..=231 => {
            let i = n - 16;
            let level = |v: u8| if v == 0 { 0 } else { 55 + 40 * v };
            Rgb::new(level(i / 36), level((i / 6) % 6), level(i % 6))
        }
        232..=255 => {
            let gray = 8 + 10 * (n - 232);
            Rgb::new(gray, gray, gray)
        }
        _ => palette::color(ANSI_TO_VGA[n as usize & 0x0F]),
    }
}

/// The built-in splash screen.
pub fn demo(rows: u16, cols: u16) -> Grid {
    let area = Rect::new(0, 0, cols, rows);
    let mut buf = Buffer::empty(area);
    render_demo(area, &mut buf);
    from_buffer(&buf)
}

fn render_demo(area: Rect, buf: &mut Buffer) {
    buf.set_style(area, Style::default().fg(Color::Gray).bg(Color::Blue));

    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(12),
            Constraint::Min(0),
        ])
        .split(area);
    let horiz = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(52),
            Constraint::Min(0),
        ])
        .split(vert[1]);
    let box_area = horiz[1];

    let block = Block::default()
        .title(" textmode ")
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .style(Style::default().fg(Color::White).bg(Color::Blue));
    let inner = block.inner(box_area);
    block.render(box_area, buf);

    let swatch: Vec<Span> = VGA_COLORS
        .iter()
        .map(|&color| Span::styled("██", Style::default().fg(color)))
        .collect();

    let lines = vec![
        Line::from(""),
        Line::from("80x25 text mode, 8x16 glyphs, 16 colors"),
        Line::from(""),
        Line::from(swatch),
        Line::from(""),
        Line::from("░▒▓█ ┌─┬─┐ ╔═╦═╗ ☺☻♥♦♣♠ ÇüéâäàåçêëèïîìÄÅ"),
        Line::from(""),
        Line::from(Span::styled(
            "Press any key or click to exit",
            Style::default()
                .fg(Color::LightYellow)
                .add_modifier(Modifier::SLOW_BLINK),
        )),
    ];
    Paragraph::new(lines).centered().render(inner, buf);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_dump_reads_pairs() {
        let bytes = [b'H', 0x1F, b'i', 0x8E, 0xFF, 0xFF];
        let grid = parse_dump(&bytes, 1, 2).unwrap();
        assert_eq!(grid.get(0, 0), Some(Cell::new(b'H', Attribute(0x1F))));
        assert_eq!(grid.get(0, 1), Some(Cell::new(b'i', Attribute(0x8E))));
    }

    #[test]
    fn parse_dump_rejects_short_input() {
        assert!(parse_dump(&[0; 3999], 25, 80).is_err());
        assert!(parse_dump(&[0; 4000], 25, 80).is_ok());
    }

    #[test]
    fn named_colors_map_to_vga() {
        assert_eq!(vga_index(Color::Red, 7), 4);
        assert_eq!(vga_index(Color::Yellow, 7), 6);
        assert_eq!(vga_index(Color::LightBlue, 7), 9);
        assert_eq!(vga_index(Color::White, 7), 15);
        assert_eq!(vga_index(Color::Reset, 7), 7);
        assert_eq!(vga_index(Color::Indexed(1), 7), 4);
        assert_eq!(vga_index(Color::Indexed(231), 7), 15);
        assert_eq!(vga_index(Color::Rgb(0, 0, 0xB0), 7), 1);
    }

    #[test]
    fn buffer_cells_transcode() {
        let area = Rect::new(0, 0, 3, 1);
        let mut buf = Buffer::empty(area);
        buf.set_string(0, 0, "═", Style::default().fg(Color::White).bg(Color::Blue));
        buf.set_string(
            1,
            0,
            "x",
            Style::default()
                .fg(Color::LightRed)
                .bg(Color::LightGreen)
                .add_modifier(Modifier::SLOW_BLINK),
        );
        buf.set_string(2, 0, "y", Style::default().add_modifier(Modifier::REVERSED));

        let grid = from_buffer(&buf);
        assert_eq!(grid.get(0, 0), Some(Cell::new(0xCD, Attribute(0x1F))));
        // bright green background folds to green
        assert_eq!(grid.get(0, 1), Some(Cell::new(b'x', Attribute(0xAC))));
        assert_eq!(grid.get(0, 2), Some(Cell::new(b'y', Attribute(0x70))));
    }

    #[test]
    fn demo_has_a_blinking_prompt() {
        let grid = demo(25, 80);
        assert_eq!((grid.rows(), grid.cols()), (25, 80));
        assert!(grid.cells().iter().any(|cell| cell.attr().blink()));
        assert!(grid.cells().iter().any(|cell| cell.code() == 0xC9));
    }
}
