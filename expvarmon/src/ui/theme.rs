//! Shared UI theme constants.

use ratatui::style::Color;

pub const OK: Color = Color::Green;
pub const ERR: Color = Color::Red;
pub const RESTARTED: Color = Color::Yellow;
pub const SPARK: Color = Color::Cyan;
pub const SELECTED_BG: Color = Color::Rgb(60, 60, 70);
