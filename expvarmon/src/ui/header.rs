//! Top header with endpoint count, poll interval and time of the last update.

use std::time::Duration;

use chrono::{DateTime, Local};
use ratatui::{
    layout::Rect,
    widgets::{Block, Borders},
};

use crate::format::format_duration;

pub fn draw_header(
    f: &mut ratatui::Frame<'_>,
    area: Rect,
    services: usize,
    interval: Duration,
    last_update: Option<DateTime<Local>>,
) {
    let updated = last_update
        .map(|t| format!("updated {}", t.format("%H:%M:%S")))
        .unwrap_or_else(|| "connecting...".into());
    let title = format!(
        "expvarmon | {} service(s) | every {} | {}  (q quit, r ack restart)",
        services,
        format_duration(interval),
        updated
    );
    f.render_widget(Block::default().title(title).borders(Borders::BOTTOM), area);
}
