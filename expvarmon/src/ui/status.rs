//! Bottom status line: last error or command line of the selected service.

use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::service::Service;
use crate::ui::services::status_span;
use crate::ui::theme::ERR;

pub fn draw_status(f: &mut ratatui::Frame<'_>, area: Rect, s: &Service) {
    let detail = match &s.err {
        Some(e) => Span::styled(e.to_string(), Style::default().fg(ERR)),
        None if s.cmdline.is_empty() => Span::raw(s.url.to_string()),
        None => Span::raw(s.cmdline.clone()),
    };
    let line = Line::from(vec![
        Span::raw(format!("{} ", s.name)),
        status_span(s),
        Span::raw(" "),
        detail,
    ]);
    f.render_widget(Paragraph::new(line), area);
}
