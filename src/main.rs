use anyhow::Context;
use clap::Parser;
use tracing::info;

use textmode::{
    config::{Args, Config},
    driver::{self, SystemClock},
    render::{FrameBuilder, Rasterizer},
    wayland::WaylandPresenter,
};

fn main() -> anyhow::Result<()> {
    let config = Config::try_from(Args::parse())?;
    textmode::logging::init(config.log.as_deref())?;

    let glyphs = config.glyphs()?;
    let grid = config.grid()?;
    let frames = FrameBuilder::new(Rasterizer::new(&glyphs, config.cell_width)).build(&grid);

    // no partial rendering: a window we cannot set up ends the run here
    let mut presenter =
        WaylandPresenter::connect(config.scale).context("set up wayland presentation")?;
    let signal = driver::run(&mut presenter, &frames, &SystemClock, config.blink_period)?;

    info!(?signal, "exiting");
    Ok(())
}
