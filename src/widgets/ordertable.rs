use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::Span,
    widgets::{Cell, Row, StatefulWidget, Table, TableState},
};

use crate::config::Theme;
use crate::days::{parse_days, DaysBucket};
use crate::schema::{FieldRole, ResolvedSchema};
use crate::source::RecordSet;

const TABLE_ROLES: [FieldRole; 8] = [
    FieldRole::Warehouse,
    FieldRole::Dsp,
    FieldRole::Route,
    FieldRole::Status,
    FieldRole::Driver,
    FieldRole::Time,
    FieldRole::Tracking,
    FieldRole::Days,
];

const CELL_PADDING: u16 = 1;

/// Table over the currently visible rows. Each row is colored by its
/// days-remaining bucket.
pub struct OrderTable<'a> {
    set: &'a RecordSet,
    schema: &'a ResolvedSchema,
    rows: &'a [usize],
    theme: &'a Theme,
}

impl<'a> OrderTable<'a> {
    pub fn new(
        set: &'a RecordSet,
        schema: &'a ResolvedSchema,
        rows: &'a [usize],
        theme: &'a Theme,
    ) -> Self {
        Self {
            set,
            schema,
            rows,
            theme,
        }
    }
}

impl StatefulWidget for OrderTable<'_> {
    type State = TableState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut TableState) {
        // Column widths: header length, grown to the widest visible cell
        let mut widths: Vec<u16> = TABLE_ROLES
            .iter()
            .map(|role| self.schema.column(*role).chars().count() as u16)
            .collect();

        let visible_height = area.height.saturating_sub(1) as usize;
        let start = state.offset().min(self.rows.len());
        let window = &self.rows[start..self.rows.len().min(start + visible_height)];

        for &row_idx in window {
            if let Some(record) = self.set.get(row_idx) {
                for (col, role) in TABLE_ROLES.iter().enumerate() {
                    let len = self.schema.value(record, *role).chars().count() as u16;
                    widths[col] = widths[col].max(len);
                }
            }
        }

        let rows: Vec<Row> = self
            .rows
            .iter()
            .filter_map(|&row_idx| self.set.get(row_idx))
            .map(|record| {
                let days = parse_days(self.schema.value(record, FieldRole::Days));
                let color = self.theme.get(DaysBucket::classify(days).theme_key());
                let cells: Vec<Cell> = TABLE_ROLES
                    .iter()
                    .map(|role| Cell::from(self.schema.value(record, *role).to_string()))
                    .collect();
                Row::new(cells).style(Style::default().fg(color))
            })
            .collect();

        let header_style = Style::default().fg(self.theme.get("table_header"));
        let headers: Vec<Span> = TABLE_ROLES
            .iter()
            .map(|role| Span::raw(self.schema.column(*role).to_string()))
            .collect();

        StatefulWidget::render(
            Table::new(rows, widths)
                .column_spacing(CELL_PADDING)
                .header(Row::new(headers).style(header_style))
                .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED)),
            area,
            buf,
            state,
        );
    }
}
