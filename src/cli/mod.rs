//! CLI Interface: User input and terminal rendering
//!
//! # Components
//! - `input.rs`: Key bindings and mouse capture using crossterm
//! - `display.rs`: Frame view, live metrics and results rendering

pub mod display;
pub mod input;

pub use display::Display;
pub use input::{Command, InputEvent, InputHandler};
