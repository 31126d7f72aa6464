use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, StatefulWidget, Widget},
};

use crate::aggregate::GroupCounts;
use crate::config::Theme;

/// Distribution panel: one bar per group with count and share.
/// The highlighted entry is the drill target.
pub struct Distribution<'a> {
    counts: &'a GroupCounts,
    theme: &'a Theme,
    title: &'a str,
    drilled: Option<&'a str>,
}

impl<'a> Distribution<'a> {
    pub fn new(counts: &'a GroupCounts, theme: &'a Theme, title: &'a str) -> Self {
        Self {
            counts,
            theme,
            title,
            drilled: None,
        }
    }

    pub fn with_drilled(mut self, drilled: Option<&'a str>) -> Self {
        self.drilled = drilled;
        self
    }
}

impl StatefulWidget for Distribution<'_> {
    type State = ListState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut ListState) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(self.title)
            .border_style(Style::default().fg(self.theme.get("table_border")));
        let inner = block.inner(area);
        block.render(area, buf);

        let total = self.counts.total();
        if total == 0 {
            Line::from(Span::styled(
                "No orders match",
                Style::default().fg(self.theme.get("dimmed")),
            ))
            .render(inner, buf);
            return;
        }

        let max_count = self
            .counts
            .entries
            .iter()
            .map(|(_, count)| *count)
            .max()
            .unwrap_or(1);
        // Bar occupies what's left after the widest "label count (pct%)" text
        let text_width = self
            .counts
            .entries
            .iter()
            .map(|(label, count)| {
                let pct = *count as f64 / total as f64 * 100.0;
                format!("{} {} ({:.0}%)", label, count, pct).chars().count()
            })
            .max()
            .unwrap_or(0);
        let bar_width = (inner.width as usize).saturating_sub(text_width + 2);

        let items: Vec<ListItem> = self
            .counts
            .entries
            .iter()
            .map(|(label, count)| {
                let pct = *count as f64 / total as f64 * 100.0;
                let text = format!("{} {} ({:.0}%)", label, count, pct);
                let filled = if max_count > 0 {
                    (bar_width * count).div_ceil(max_count)
                } else {
                    0
                };
                let bar: String = "█".repeat(filled.min(bar_width));
                let style = if self.drilled == Some(label.as_str()) {
                    Style::default().fg(self.theme.get("warning")).bold()
                } else {
                    Style::default().fg(self.theme.get("text_primary"))
                };
                ListItem::new(Line::from(vec![
                    Span::styled(format!("{:<width$}  ", text, width = text_width), style),
                    Span::styled(bar, Style::default().fg(self.theme.get("success"))),
                ]))
            })
            .collect();

        let list = List::new(items)
            .highlight_style(Style::default().bg(self.theme.get("table_selected")).bold());
        StatefulWidget::render(list, inner, buf, state);
    }
}
