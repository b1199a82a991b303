//! Character-mode display emulation: packed text cells in, pixel frames out.
//!
//! A [`cell::Grid`] is rasterized once into a [`render::FramePair`] holding
//! the blink-visible and blink-suppressed frames. The [`driver`] then swaps
//! between them on the [`blink`] timer and hands the active one to a
//! [`driver::Presenter`] (a Wayland window or the terminal).

pub mod blink;
pub mod cell;
pub mod config;
pub mod driver;
pub mod font;
pub mod logging;
pub mod palette;
pub mod render;
pub mod screen;
pub mod tui;
pub mod wayland;
