use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::aggregate::Summary as Kpis;
use crate::config::Theme;

/// KPI panel over the visible rows.
pub struct SummaryPanel<'a> {
    kpis: &'a Kpis,
    theme: &'a Theme,
}

impl<'a> SummaryPanel<'a> {
    pub fn new(kpis: &'a Kpis, theme: &'a Theme) -> Self {
        Self { kpis, theme }
    }

    fn line(&self, label: &str, value: String) -> Line<'static> {
        Line::from(vec![
            Span::styled(
                format!("{:<13}", label),
                Style::default().fg(self.theme.get("text_secondary")),
            ),
            Span::styled(value, Style::default().fg(self.theme.get("text_primary")).bold()),
        ])
    }
}

impl Widget for &SummaryPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title("Summary")
            .border_style(Style::default().fg(self.theme.get("table_border")));
        let inner = block.inner(area);
        block.render(area, buf);

        let avg_days = self
            .kpis
            .mean_days
            .map(|d| format!("{:.2}", d))
            .unwrap_or_else(|| "--".to_string());
        let last_update = self
            .kpis
            .last_update
            .clone()
            .unwrap_or_else(|| "--".to_string());

        let lines = vec![
            self.line("Orders", self.kpis.total.to_string()),
            self.line(
                "Delivered",
                format!("{} ({:.1}%)", self.kpis.delivered, self.kpis.delivered_pct),
            ),
            self.line("Avg days", avg_days),
            self.line("Drivers", self.kpis.distinct_drivers.to_string()),
            self.line("DSPs", self.kpis.distinct_dsps.to_string()),
            self.line("Routes", self.kpis.distinct_routes.to_string()),
            self.line("Last update", last_update),
        ];

        Paragraph::new(lines).render(inner, buf);
    }
}
