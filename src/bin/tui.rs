use clap::Parser;
use tracing::info;

use textmode::{
    config::{Args, Config},
    driver::{self, Signal, SystemClock},
    render::{FrameBuilder, FramePair, Rasterizer},
    tui::{self, TerminalPresenter},
};

fn main() -> anyhow::Result<()> {
    let config = Config::try_from(Args::parse())?;
    // stderr belongs to the alternate screen, so only file logging is available
    if let Some(path) = config.log.as_deref() {
        textmode::logging::init(Some(path))?;
    }

    let glyphs = config.glyphs()?;
    let grid = config.grid()?;
    let frames = FrameBuilder::new(Rasterizer::new(&glyphs, config.cell_width)).build(&grid);

    tui::enter()?;
    let result = run_app(&config, &frames);
    tui::leave()?;

    let signal = result?;
    info!(?signal, "exiting");
    Ok(())
}

fn run_app(config: &Config, frames: &FramePair) -> anyhow::Result<Signal> {
    let mut presenter = TerminalPresenter::new()?;
    driver::run(&mut presenter, frames, &SystemClock, config.blink_period)
}
