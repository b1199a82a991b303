use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Result, anyhow};
use clap::Parser;

use crate::blink::BLINK_PERIOD;
use crate::cell::{DEFAULT_COLS, DEFAULT_ROWS, Grid};
use crate::font::GlyphTable;
use crate::render::{DEFAULT_CELL_WIDTH, MAX_CELL_WIDTH};
use crate::screen;

const MAX_SCALE: usize = 8;

#[derive(Parser, Debug, Clone)]
#[command(about = "Render a VGA text-mode screen with blinking attributes")]
pub struct Args {
    /// Raw text-mode dump (code, attribute byte pairs); the built-in splash when omitted
    #[arg(short, long)]
    pub screen: Option<PathBuf>,

    /// Glyph table: raw 256-glyph dump or PSF1 font
    #[arg(short, long)]
    pub font: Option<PathBuf>,

    #[arg(long, default_value_t = DEFAULT_ROWS)]
    pub rows: usize,

    #[arg(long, default_value_t = DEFAULT_COLS)]
    pub cols: usize,

    /// Pixels per cell horizontally (1-8)
    #[arg(long, default_value_t = DEFAULT_CELL_WIDTH)]
    pub cell_width: usize,

    /// Integer window scale factor (Wayland only)
    #[arg(long, default_value_t = 2)]
    pub scale: usize,

    /// Blink half-period in milliseconds
    #[arg(long, default_value_t = BLINK_PERIOD.as_millis() as u64)]
    pub blink_ms: u64,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    pub log: Option<PathBuf>,
}

/// Validated settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub screen: Option<PathBuf>,
    pub font: Option<PathBuf>,
    pub rows: usize,
    pub cols: usize,
    pub cell_width: usize,
    pub scale: usize,
    pub blink_period: Duration,
    pub log: Option<PathBuf>,
}

impl TryFrom<Args> for Config {
    type Error = anyhow::Error;

    fn try_from(args: Args) -> Result<Self> {
        if args.rows == 0 || args.cols == 0 {
            return Err(anyhow!("grid must have at least one row and column"));
        }
        if args.rows > u16::MAX as usize || args.cols > u16::MAX as usize {
            return Err(anyhow!("grid of {}x{} is too large", args.rows, args.cols));
        }
        if !(1..=MAX_CELL_WIDTH).contains(&args.cell_width) {
            return Err(anyhow!(
                "cell width {} outside 1..={MAX_CELL_WIDTH}",
                args.cell_width
            ));
        }
        if !(1..=MAX_SCALE).contains(&args.scale) {
            return Err(anyhow!("scale {} outside 1..={MAX_SCALE}", args.scale));
        }
        if args.blink_ms == 0 {
            return Err(anyhow!("blink period must be at least 1 ms"));
        }

        Ok(Self {
            screen: args.screen,
            font: args.font,
            rows: args.rows,
            cols: args.cols,
            cell_width: args.cell_width,
            scale: args.scale,
            blink_period: Duration::from_millis(args.blink_ms),
            log: args.log,
        })
    }
}

impl Config {
    pub fn glyphs(&self) -> Result<GlyphTable> {
        match self.font.as_deref() {
            Some(path) => GlyphTable::load(path),
            None => Ok(GlyphTable::builtin()),
        }
    }

    pub fn grid(&self) -> Result<Grid> {
        match self.screen.as_deref() {
            Some(path) => screen::load_dump(path, self.rows, self.cols),
            None => Ok(screen::demo(self.rows as u16, self.cols as u16)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Config> {
        let args = Args::try_parse_from(std::iter::once("textmode").chain(args.iter().copied()))?;
        Config::try_from(args)
    }

    #[test]
    fn defaults() {
        let config = parse(&[]).unwrap();
        assert_eq!((config.rows, config.cols), (25, 80));
        assert_eq!(config.cell_width, 8);
        assert_eq!(config.scale, 2);
        assert_eq!(config.blink_period, Duration::from_millis(224));
        assert!(config.screen.is_none());
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert!(parse(&["--rows", "0"]).is_err());
        assert!(parse(&["--cell-width", "9"]).is_err());
        assert!(parse(&["--scale", "0"]).is_err());
        assert!(parse(&["--blink-ms", "0"]).is_err());
        assert!(parse(&["--cols", "70000"]).is_err());
    }

    #[test]
    fn builds_demo_grid_of_configured_size() {
        let config = parse(&["--rows", "30", "--cols", "90"]).unwrap();
        let grid = config.grid().unwrap();
        assert_eq!((grid.rows(), grid.cols()), (30, 90));
    }
}
