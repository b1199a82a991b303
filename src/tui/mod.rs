use std::io::{Stdout, stdout};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use crossterm::{
    ExecutableCommand,
    cursor::{Hide, Show},
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind, MouseEventKind,
    },
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend, buffer::Buffer, layout::Rect, style::Color};
use tracing::{debug, info, trace};

use crate::blink::BlinkPhase;
use crate::driver::{Presenter, Signal};
use crate::palette;
use crate::render::{FramePair, IndexedImage};

/// Upper half block: foreground paints the top pixel, background the bottom one.
const HALF_BLOCK: &str = "▀";

/// Shows frames in the terminal, two pixel rows per character row.
pub struct TerminalPresenter {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    frames: Option<FramePair>,
    phase: BlinkPhase,
}

impl TerminalPresenter {
    pub fn new() -> Result<Self> {
        let backend = CrosstermBackend::new(stdout());
        let terminal = Terminal::new(backend).context("create terminal")?;
        Ok(Self {
            terminal,
            frames: None,
            phase: BlinkPhase::Visible,
        })
    }

    fn draw(&mut self) -> Result<()> {
        let Some(frames) = self.frames.as_ref() else {
            return Err(anyhow!("present called before upload"));
        };
        let image = frames.get(self.phase);
        self.terminal
            .draw(|frame| {
                let area = frame.area();
                paint(image, frame.buffer_mut(), area);
            })
            .context("draw frame")?;
        Ok(())
    }
}

impl Presenter for TerminalPresenter {
    fn upload(&mut self, frames: &FramePair) -> Result<()> {
        self.frames = Some(frames.clone());
        Ok(())
    }

    fn present(&mut self, phase: BlinkPhase) -> Result<()> {
        self.phase = phase;
        self.draw()
    }

    fn poll_signal(&mut self, timeout: Duration) -> Result<Option<Signal>> {
        if !event::poll(timeout).context("poll terminal events")? {
            return Ok(None);
        }

        match event::read().context("read terminal event")? {
            Event::Key(key) if key.kind == KeyEventKind::Press => Ok(Some(Signal::KeyPress)),
            Event::Mouse(mouse) if matches!(mouse.kind, MouseEventKind::Down(_)) => {
                Ok(Some(Signal::ButtonPress))
            }
            Event::Resize(width, height) => {
                debug!(width, height, "terminal resized");
                self.draw()?;
                Ok(None)
            }
            other => {
                trace!(?other, "ignored terminal event");
                Ok(None)
            }
        }
    }
}

/// Samples `image` nearest-neighbor into `area`, two pixels per cell.
pub fn paint(image: &IndexedImage, buf: &mut Buffer, area: Rect) {
    if area.width == 0 || area.height == 0 || image.width() == 0 || image.height() == 0 {
        return;
    }

    let columns = area.width as usize;
    let pixel_rows = area.height as usize * 2;

    for cy in 0..area.height {
        for cx in 0..area.width {
            let x = cx as usize * image.width() / columns;
            let top = cy as usize * 2 * image.height() / pixel_rows;
            let bottom = (cy as usize * 2 + 1) * image.height() / pixel_rows;

            let Some(cell) = buf.cell_mut((area.x + cx, area.y + cy)) else {
                continue;
            };
            cell.set_symbol(HALF_BLOCK)
                .set_fg(color_at(image, x, top))
                .set_bg(color_at(image, x, bottom));
        }
    }
}

fn color_at(image: &IndexedImage, x: usize, y: usize) -> Color {
    let rgb = image.rgb(x, y).unwrap_or(palette::color(0));
    Color::Rgb(rgb.r, rgb.g, rgb.b)
}

/// Puts the terminal into raw, alternate-screen, mouse-reporting mode.
pub fn enter() -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut out = stdout();
    out.execute(EnterAlternateScreen)
        .context("enter alternate screen")?;
    out.execute(EnableMouseCapture)
        .context("enable mouse capture")?;
    out.execute(Hide).context("hide cursor")?;
    info!("terminal ready");
    Ok(())
}

/// Undoes [`enter`].
pub fn leave() -> Result<()> {
    let mut out = stdout();
    out.execute(Show).context("show cursor")?;
    out.execute(DisableMouseCapture)
        .context("disable mouse capture")?;
    out.execute(LeaveAlternateScreen)
        .context("leave alternate screen")?;
    disable_raw_mode().context("disable raw mode")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{Attribute, Cell, Grid};
    use crate::font::GlyphTable;
    use crate::render::{FrameBuilder, Rasterizer};

    #[test]
    fn paints_upper_and_lower_pixels() {
        let glyphs = GlyphTable::builtin();
        let builder = FrameBuilder::new(Rasterizer::new(&glyphs, 8));
        let mut grid = Grid::new(1, 2);
        // upper half block in light red on blue, then plain green
        grid.set(0, 0, Cell::new(0xDF, Attribute(0x1C)));
        grid.set(0, 1, Cell::new(b' ', Attribute(0x20)));
        let frames = builder.build(&grid);

        // one cell per 8x8 pixel square
        let area = Rect::new(0, 0, 2, 1);
        let mut buf = Buffer::empty(area);
        paint(&frames.visible, &mut buf, area);

        let red = palette::color(12);
        let blue = palette::color(1);
        let green = palette::color(2);
        let first = &buf[(0, 0)];
        assert_eq!(first.symbol(), HALF_BLOCK);
        assert_eq!(first.fg, Color::Rgb(red.r, red.g, red.b));
        assert_eq!(first.bg, Color::Rgb(blue.r, blue.g, blue.b));
        let second = &buf[(1, 0)];
        assert_eq!(second.fg, Color::Rgb(green.r, green.g, green.b));
        assert_eq!(second.bg, Color::Rgb(green.r, green.g, green.b));
    }

    #[test]
    fn empty_area_is_left_alone() {
        let image = IndexedImage::new(8, 16);
        let area = Rect::new(0, 0, 0, 0);
        let mut buf = Buffer::empty(area);
        paint(&image, &mut buf, area);
        assert!(buf.content.is_empty());
    }
}
