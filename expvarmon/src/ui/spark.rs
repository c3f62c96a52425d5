//! Sparklines for every tracked variable of the selected service.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    widgets::{Block, Borders, Sparkline},
};

use crate::service::{Service, NOT_AVAILABLE};
use crate::ui::theme::SPARK;
use crate::var::VarName;

pub fn draw_sparks(f: &mut ratatui::Frame<'_>, area: Rect, s: &Service, vars: &[VarName]) {
    if vars.is_empty() || area.height == 0 {
        return;
    }
    let n = vars.len() as u32;
    let constraints: Vec<Constraint> = (0..n).map(|_| Constraint::Ratio(1, n)).collect();
    let slots = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    for (v, slot) in vars.iter().zip(slots.iter()) {
        let title = format!(
            "{}: {} | max: {}",
            v.long(),
            s.value(v),
            s.max(v).unwrap_or_else(|| NOT_AVAILABLE.to_string())
        );
        let data = spark_data(&s.values(v), slot.width.saturating_sub(2) as usize);
        let spark = Sparkline::default()
            .block(Block::default().borders(Borders::ALL).title(title))
            .data(&data)
            .style(Style::default().fg(SPARK));
        f.render_widget(spark, *slot);
    }
}

// Keep the newest points that fit; sparklines cannot show negatives.
pub fn spark_data(values: &[i64], max_points: usize) -> Vec<u64> {
    let start = values.len().saturating_sub(max_points);
    values[start..].iter().map(|&v| v.max(0) as u64).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_newest_points() {
        assert_eq!(spark_data(&[1, 2, 3, 4], 2), vec![3, 4]);
        assert_eq!(spark_data(&[1, 2], 10), vec![1, 2]);
        assert_eq!(spark_data(&[-5, 5], 10), vec![0, 5]);
        assert!(spark_data(&[], 4).is_empty());
    }
}
