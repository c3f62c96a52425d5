//! UI module root: exposes drawing functions for individual panels.

pub mod header;
pub mod services;
pub mod spark;
pub mod status;
pub mod theme;
