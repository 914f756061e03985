//! Dashboard screens and the widgets they share.

pub mod admin;
pub mod mr;

use crate::analytics::TrendPoint;
use crate::components::{money, palette, panel};
use crate::tui::Frame;
use ratatui::{
    prelude::*,
    widgets::{Bar, BarChart, BarGroup, Paragraph},
};

pub fn render_stat_card(frame: &mut Frame, area: Rect, label: &str, value: String) {
    let card = Paragraph::new(vec![
        Line::from(Span::styled(
            value,
            Style::default()
                .fg(palette::ACCENT)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(label, Style::default().fg(palette::MUTED))),
    ])
    .alignment(Alignment::Center)
    .block(panel(""));
    frame.render_widget(card, area);
}

/// Bars are heights from `count`; the order value is printed under each bar.
pub fn render_trend_chart(frame: &mut Frame, area: Rect, title: &str, points: &[TrendPoint]) {
    if points.is_empty() {
        let empty = Paragraph::new("No data yet")
            .style(Style::default().fg(palette::MUTED))
            .alignment(Alignment::Center)
            .block(panel(title));
        frame.render_widget(empty, area);
        return;
    }

    let bars: Vec<Bar> = points
        .iter()
        .map(|point| {
            Bar::default()
                .value(point.count as u64)
                .label(Line::from(point.label()))
                .text_value(format!("{} · {}", point.count, money(point.value)))
                .style(Style::default().fg(palette::ACCENT))
                .value_style(
                    Style::default()
                        .fg(palette::BACKGROUND)
                        .bg(palette::ACCENT),
                )
        })
        .collect();

    let available = area.width.saturating_sub(2);
    let slots = points.len() as u16;
    let bar_width = (available / slots.max(1)).saturating_sub(1).clamp(3, 18);

    let chart = BarChart::default()
        .block(panel(title))
        .data(BarGroup::default().bars(&bars))
        .bar_width(bar_width)
        .bar_gap(1)
        .label_style(Style::default().fg(palette::TEXT));
    frame.render_widget(chart, area);
}
