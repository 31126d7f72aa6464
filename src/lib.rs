pub mod aggregate;
pub mod config;
pub mod days;
pub mod drill;
pub mod filter;
pub mod schema;
pub mod source;
pub mod widgets;

use std::path::PathBuf;
use std::sync::mpsc::Sender;

use chrono::{DateTime, Local};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, ListState, Paragraph, StatefulWidget, TableState, Widget},
};
use regex::Regex;

use crate::aggregate::{GroupCounts, Summary};
use crate::days::BucketLabel;
use crate::drill::{AggregateMode, DrillDown};
use crate::filter::FilterState;
use crate::schema::{FieldRole, ResolvedSchema};
use crate::source::RecordSet;
use crate::widgets::controls::Controls;
use crate::widgets::distribution::Distribution;
use crate::widgets::multi_select::{MultiSelect, MultiSelectEvent};
use crate::widgets::ordertable::OrderTable;
use crate::widgets::summary::SummaryPanel;
use crate::widgets::text_input::{TextInput, TextInputEvent};

pub use crate::config::{AppConfig, ConfigManager, Theme};
pub use crate::source::OpenOptions;

pub const APP_NAME: &str = "orderdash";

pub enum AppEvent {
    Key(KeyEvent),
    Open(PathBuf, OpenOptions),
    Loaded(RecordSet),
    LoadFailed(String),
    Resize,
    Exit,
    Crash(String),
}

#[derive(Debug, Default, PartialEq, Eq)]
pub enum InputMode {
    #[default]
    Normal,
    /// Live substring search over the driver field
    DriverSearch,
    /// Exact keyed lookup (driver on the driver page, route on the route page)
    Lookup,
    Picker(PickerKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerKind {
    Warehouse,
    Dsp,
    Route,
    Status,
    Days,
}

impl PickerKind {
    fn title(&self) -> &'static str {
        match self {
            PickerKind::Warehouse => "Warehouse",
            PickerKind::Dsp => "DSP",
            PickerKind::Route => "Route",
            PickerKind::Status => "Status",
            PickerKind::Days => "Days left",
        }
    }

    fn role(&self) -> Option<FieldRole> {
        match self {
            PickerKind::Dsp => Some(FieldRole::Dsp),
            PickerKind::Route => Some(FieldRole::Route),
            PickerKind::Status => Some(FieldRole::Status),
            PickerKind::Warehouse | PickerKind::Days => None,
        }
    }
}

/// Which pane Up/Down and Enter act on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Focus {
    #[default]
    Table,
    Chart,
}

pub struct App {
    events: Sender<AppEvent>,
    config: AppConfig,
    theme: Theme,
    path: Option<PathBuf>,
    open_options: OpenOptions,
    set: Option<RecordSet>,
    schema: ResolvedSchema,
    filters: FilterState,
    drill: DrillDown,
    /// Applied keyed-lookup value; None shows all rows
    lookup_key: Option<String>,
    counts: GroupCounts,
    summary: Summary,
    delivered_re: Regex,
    pub input_mode: InputMode,
    search_input: TextInput,
    lookup_input: TextInput,
    picker: Option<MultiSelect>,
    focus: Focus,
    table_state: TableState,
    chart_state: ListState,
    status: Option<String>,
    last_refresh: Option<DateTime<Local>>,
}

impl App {
    pub fn new(events: Sender<AppEvent>) -> App {
        let config = AppConfig::default();
        let theme = Theme::from_config(&config.theme).unwrap_or_default();
        Self::new_with_config(events, theme, config)
    }

    pub fn new_with_config(events: Sender<AppEvent>, theme: Theme, config: AppConfig) -> App {
        let mode = match config.dashboard.mode.as_str() {
            "route" => AggregateMode::Route,
            _ => AggregateMode::Driver,
        };
        let delivered_re = aggregate::delivered_matcher(&config.dashboard.delivered_pattern);
        let filters = FilterState::new().with_days_below(config.dashboard.initial_days_below);
        let search_input = TextInput::new().with_theme(&theme);
        let lookup_input = TextInput::new().with_theme(&theme);

        App {
            events,
            config,
            theme,
            path: None,
            open_options: OpenOptions::new(),
            set: None,
            schema: ResolvedSchema::resolve(&[]),
            filters,
            drill: DrillDown::new(mode),
            lookup_key: None,
            counts: GroupCounts::default(),
            summary: Summary::default(),
            delivered_re,
            input_mode: InputMode::Normal,
            search_input,
            lookup_input,
            picker: None,
            focus: Focus::default(),
            table_state: TableState::default(),
            chart_state: ListState::default(),
            status: None,
            last_refresh: None,
        }
    }

    pub fn send_event(&mut self, event: AppEvent) -> Result<()> {
        self.events.send(event)?;
        Ok(())
    }

    pub fn set_mode(&mut self, mode: AggregateMode) {
        if self.drill.mode() != mode {
            self.drill = DrillDown::new(mode);
            // The lookup key only makes sense against the old page's key field
            self.lookup_key = None;
            self.recompute_base();
        }
    }

    pub fn mode(&self) -> AggregateMode {
        self.drill.mode()
    }

    /// Install or clear the keyed lookup programmatically (used by --key).
    pub fn set_lookup_key(&mut self, key: Option<String>) {
        self.lookup_key = key.filter(|k| !k.trim().is_empty());
        self.recompute_base();
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn visible_rows(&self) -> &[usize] {
        self.drill.rows()
    }

    pub fn summary(&self) -> &Summary {
        &self.summary
    }

    pub fn counts(&self) -> &GroupCounts {
        &self.counts
    }

    /// Process one event, possibly emitting a follow-up event.
    pub fn event(&mut self, event: &AppEvent) -> Option<AppEvent> {
        match event {
            AppEvent::Key(key) => self.key(key),
            AppEvent::Open(path, options) => {
                self.path = Some(path.clone());
                self.open_options = options.clone();
                self.status = Some(format!("Loading {}...", path.display()));
                // Load off the UI thread; the result comes back as an event
                let events = self.events.clone();
                let path = path.clone();
                let options = options.clone();
                std::thread::spawn(move || {
                    let event = match source::read_orders(&path, &options) {
                        Ok(set) => AppEvent::Loaded(set),
                        Err(e) => AppEvent::LoadFailed(e.to_string()),
                    };
                    let _ = events.send(event);
                });
                None
            }
            AppEvent::Loaded(set) => {
                self.install_records(set.clone());
                None
            }
            AppEvent::LoadFailed(message) => {
                // Keep whatever was on screen before the failed refresh
                self.status = Some(format!("Load failed: {}", message));
                None
            }
            AppEvent::Resize => None,
            AppEvent::Exit | AppEvent::Crash(_) => None,
        }
    }

    /// Adopt a freshly read record set. Active filters and the lookup key
    /// survive a refresh; any drill is discarded with the old baseline.
    pub fn install_records(&mut self, set: RecordSet) {
        self.schema = ResolvedSchema::resolve(set.headers());
        let count = set.len();
        self.set = Some(set);
        self.last_refresh = Some(Local::now());
        self.status = Some(format!("Loaded {} orders", count));
        self.table_state = TableState::default();
        self.recompute_base();
    }

    /// Rebuild the visible baseline: keyed lookup (or everything), then the
    /// composed filters. Resets any drill narrowing.
    fn recompute_base(&mut self) {
        let Some(set) = &self.set else {
            self.drill.set_baseline(String::new(), Vec::new());
            self.counts = GroupCounts::default();
            self.summary = Summary::default();
            return;
        };
        let base = match &self.lookup_key {
            Some(key) => filter::exact_match(set, &self.schema, self.drill.mode().key_role(), key),
            None => set.all_indices(),
        };
        let visible = self.filters.apply(set, &self.schema, &base);
        let anchor = self.lookup_key.clone().unwrap_or_default();
        self.drill.set_baseline(anchor, visible);
        self.refresh_derived();
    }

    /// Recompute the chart and summary from the current rows without
    /// touching the drill baseline.
    fn refresh_derived(&mut self) {
        let Some(set) = &self.set else {
            return;
        };
        let role = self.drill.mode().chart_role();
        self.counts = aggregate::group_by(set, self.drill.rows(), &self.schema, role);
        self.summary = aggregate::summarize(set, self.drill.rows(), &self.schema, &self.delivered_re);

        // Keep both cursors inside the new row counts
        match self.chart_state.selected() {
            Some(idx) if idx < self.counts.entries.len() => {}
            _ if self.counts.entries.is_empty() => self.chart_state.select(None),
            _ => self.chart_state.select(Some(0)),
        }
        match self.table_state.selected() {
            Some(idx) if idx < self.drill.rows().len() => {}
            _ if self.drill.rows().is_empty() => self.table_state.select(None),
            _ => self.table_state.select(Some(0)),
        }
    }

    /// Enter, replace, or (on the already-applied entry) leave the drill.
    fn drill_into_selected(&mut self) {
        let Some(idx) = self.chart_state.selected() else {
            return;
        };
        let Some(label) = self.counts.label(idx).map(str::to_string) else {
            return;
        };
        if self.drill.applied_label() == Some(label.as_str()) {
            self.drill.clear();
        } else if let Some(set) = &self.set {
            self.drill.drill(set, &self.schema, &label);
        }
        self.refresh_derived();
    }

    /// Write the visible tracking ids to the configured export file.
    fn export_tracking(&mut self) {
        let Some(set) = &self.set else {
            return;
        };
        let ids: Vec<String> = self
            .drill
            .rows()
            .iter()
            .filter_map(|&i| set.get(i))
            .map(|record| self.schema.value(record, FieldRole::Tracking).to_string())
            .filter(|id| !id.is_empty())
            .collect();
        let path = PathBuf::from(&self.config.dashboard.tracking_export);
        self.status = match std::fs::write(&path, ids.join("\n") + "\n") {
            Ok(()) => Some(format!("Copied {} tracking ids to {}", ids.len(), path.display())),
            Err(e) => Some(format!("Copy failed: {}", e)),
        };
    }

    fn open_picker(&mut self, kind: PickerKind) {
        let Some(set) = &self.set else {
            self.status = Some("No data loaded yet".to_string());
            return;
        };
        let picker = match kind {
            PickerKind::Warehouse => {
                let options = filter::unique_values(set, &self.schema, FieldRole::Warehouse);
                let selected = self.filters.warehouse.iter().cloned().collect();
                MultiSelect::new(kind.title(), options, &self.theme)
                    .single_choice()
                    .with_selected(selected)
            }
            PickerKind::Days => {
                let options = BucketLabel::iterator()
                    .map(|label| label.as_str().to_string())
                    .collect();
                let selected = self
                    .filters
                    .days
                    .iter()
                    .map(|label| label.as_str().to_string())
                    .collect();
                MultiSelect::new(kind.title(), options, &self.theme).with_selected(selected)
            }
            _ => {
                let Some(role) = kind.role() else { return };
                let options = filter::unique_values(set, &self.schema, role);
                let selected = self
                    .filters
                    .selection_mut(role)
                    .map(|s| s.clone())
                    .unwrap_or_default();
                MultiSelect::new(kind.title(), options, &self.theme).with_selected(selected)
            }
        };
        self.picker = Some(picker);
        self.input_mode = InputMode::Picker(kind);
    }

    fn apply_picker(&mut self, kind: PickerKind) {
        let Some(picker) = self.picker.take() else {
            return;
        };
        let selected = picker.into_selected();
        match kind {
            PickerKind::Warehouse => {
                self.filters.warehouse = selected.into_iter().next();
            }
            PickerKind::Days => {
                self.filters.days = BucketLabel::iterator()
                    .filter(|label| selected.contains(label.as_str()))
                    .collect();
            }
            _ => {
                if let Some(role) = kind.role() {
                    if let Some(slot) = self.filters.selection_mut(role) {
                        *slot = selected;
                    }
                }
            }
        }
        self.input_mode = InputMode::Normal;
        self.recompute_base();
    }

    fn key(&mut self, key: &KeyEvent) -> Option<AppEvent> {
        match &self.input_mode {
            InputMode::Normal => self.key_normal(key),
            InputMode::DriverSearch => {
                match self.search_input.handle_key(key) {
                    TextInputEvent::Changed => {
                        self.filters.driver_search = self.search_input.value().to_string();
                        self.recompute_base();
                    }
                    TextInputEvent::Submit => {
                        self.search_input.set_focused(false);
                        self.input_mode = InputMode::Normal;
                    }
                    TextInputEvent::Cancel => {
                        self.search_input.clear();
                        self.filters.driver_search.clear();
                        self.search_input.set_focused(false);
                        self.input_mode = InputMode::Normal;
                        self.recompute_base();
                    }
                    TextInputEvent::None => {}
                }
                None
            }
            InputMode::Lookup => {
                match self.lookup_input.handle_key(key) {
                    TextInputEvent::Submit => {
                        let value = self.lookup_input.value().trim().to_string();
                        self.lookup_key = if value.is_empty() { None } else { Some(value) };
                        self.lookup_input.set_focused(false);
                        self.input_mode = InputMode::Normal;
                        self.recompute_base();
                    }
                    TextInputEvent::Cancel => {
                        self.lookup_input.set_focused(false);
                        self.input_mode = InputMode::Normal;
                    }
                    _ => {}
                }
                None
            }
            InputMode::Picker(kind) => {
                let kind = *kind;
                if let Some(picker) = &mut self.picker {
                    match picker.handle_key(key) {
                        MultiSelectEvent::Apply => self.apply_picker(kind),
                        MultiSelectEvent::Cancel => {
                            self.picker = None;
                            self.input_mode = InputMode::Normal;
                        }
                        MultiSelectEvent::None => {}
                    }
                }
                None
            }
        }
    }

    fn key_normal(&mut self, key: &KeyEvent) -> Option<AppEvent> {
        match key.code {
            KeyCode::Char('q') => return Some(AppEvent::Exit),
            KeyCode::Char('/') => {
                self.search_input.set_value(self.filters.driver_search.clone());
                self.search_input.set_focused(true);
                self.input_mode = InputMode::DriverSearch;
            }
            KeyCode::Char('k') => {
                self.lookup_input
                    .set_value(self.lookup_key.clone().unwrap_or_default());
                self.lookup_input.set_focused(true);
                self.input_mode = InputMode::Lookup;
            }
            KeyCode::Char('w') => self.open_picker(PickerKind::Warehouse),
            KeyCode::Char('d') => self.open_picker(PickerKind::Dsp),
            KeyCode::Char('u') => self.open_picker(PickerKind::Route),
            KeyCode::Char('t') => self.open_picker(PickerKind::Status),
            KeyCode::Char('b') => self.open_picker(PickerKind::Days),
            KeyCode::Char('m') => {
                let next = match self.drill.mode() {
                    AggregateMode::Driver => AggregateMode::Route,
                    AggregateMode::Route => AggregateMode::Driver,
                };
                self.set_mode(next);
            }
            KeyCode::Char('R') => {
                self.filters.clear();
                self.lookup_key = None;
                self.search_input.clear();
                self.recompute_base();
                self.status = Some("Filters reset".to_string());
            }
            KeyCode::Char('g') => {
                if let Some(path) = &self.path {
                    return Some(AppEvent::Open(path.clone(), self.open_options.clone()));
                }
            }
            KeyCode::Char('y') => self.export_tracking(),
            KeyCode::Char('c') | KeyCode::Esc => {
                if self.drill.is_drilled() {
                    self.drill.clear();
                    self.refresh_derived();
                }
            }
            KeyCode::Tab => {
                self.focus = match self.focus {
                    Focus::Table => Focus::Chart,
                    Focus::Chart => Focus::Table,
                };
            }
            KeyCode::Up => match self.focus {
                Focus::Table => self.table_state.select_previous(),
                Focus::Chart => self.chart_state.select_previous(),
            },
            KeyCode::Down => match self.focus {
                Focus::Table => self.table_state.select_next(),
                Focus::Chart => self.chart_state.select_next(),
            },
            KeyCode::Enter => {
                if self.focus == Focus::Chart {
                    self.drill_into_selected();
                }
            }
            _ => {}
        }
        None
    }

    fn header_line(&self) -> Line<'static> {
        let mut spans = vec![
            Span::styled(
                format!("{} · {} page", APP_NAME, self.drill.mode().as_str()),
                Style::default().fg(self.theme.get("table_header")).bold(),
            ),
        ];
        if let Some(key) = &self.lookup_key {
            spans.push(Span::styled(
                format!("  {}: {}", self.drill.mode().key_role().as_str(), key),
                Style::default().fg(self.theme.get("warning")),
            ));
        }
        let active = self.filters.active_count();
        if active > 0 {
            spans.push(Span::styled(
                format!("  {} filter{} active", active, if active == 1 { "" } else { "s" }),
                Style::default().fg(self.theme.get("text_secondary")),
            ));
        }
        if let Some(refreshed) = &self.last_refresh {
            spans.push(Span::styled(
                format!("  Updated: {}", refreshed.format("%H:%M:%S")),
                Style::default().fg(self.theme.get("dimmed")),
            ));
        }
        Line::from(spans)
    }
}

impl Widget for &mut App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let theme = self.theme.clone();

        Block::default()
            .style(Style::default().bg(theme.get("background")))
            .render(area, buf);

        let mut constraints = vec![Constraint::Length(1)]; // Header
        if self.drill.is_drilled() {
            constraints.push(Constraint::Length(1)); // Breadcrumb
        }
        constraints.push(Constraint::Fill(1)); // Main
        let input_open = matches!(self.input_mode, InputMode::DriverSearch | InputMode::Lookup);
        if input_open {
            constraints.push(Constraint::Length(3)); // Text input
        }
        constraints.push(Constraint::Length(1)); // Status
        constraints.push(Constraint::Length(1)); // Controls
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        let mut idx = 0;
        self.header_line().render(layout[idx], buf);
        idx += 1;

        if self.drill.is_drilled() {
            if let Some(breadcrumb) = self.drill.breadcrumb() {
                Line::from(Span::styled(
                    format!("← {} (Esc to go back)", breadcrumb),
                    Style::default().fg(theme.get("warning")),
                ))
                .render(layout[idx], buf);
            }
            idx += 1;
        }

        let main_area = layout[idx];
        idx += 1;

        let main = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(38)])
            .split(main_area);

        if let Some(set) = &self.set {
            let table = OrderTable::new(set, &self.schema, self.drill.rows(), &theme);
            StatefulWidget::render(table, main[0], buf, &mut self.table_state);
        } else {
            Paragraph::new("No data loaded")
                .centered()
                .style(Style::default().fg(theme.get("dimmed")))
                .render(main[0], buf);
        }

        let sidebar = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Fill(1), Constraint::Length(9)])
            .split(main[1]);

        let chart_title = format!("By {}", self.drill.mode().chart_role().as_str());
        let chart = Distribution::new(&self.counts, &theme, &chart_title)
            .with_drilled(self.drill.applied_label());
        StatefulWidget::render(chart, sidebar[0], buf, &mut self.chart_state);

        (&SummaryPanel::new(&self.summary, &theme)).render(sidebar[1], buf);

        if input_open {
            let (title, input) = match self.input_mode {
                InputMode::DriverSearch => ("Driver search", &self.search_input),
                _ => ("Lookup", &self.lookup_input),
            };
            let block = Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(Style::default().fg(theme.get("modal_border_active")));
            let inner = block.inner(layout[idx]);
            block.render(layout[idx], buf);
            input.render(inner, buf);
            idx += 1;
        }

        let status = self.status.clone().unwrap_or_default();
        Paragraph::new(status)
            .style(Style::default().fg(theme.get("text_secondary")))
            .render(layout[idx], buf);
        idx += 1;

        let controls = Controls::with_row_count(self.drill.rows().len())
            .with_dimmed(self.set.is_none())
            .with_search_active(self.input_mode == InputMode::DriverSearch);
        (&controls).render(layout[idx], buf);

        if let InputMode::Picker(_) = self.input_mode {
            if let Some(picker) = &mut self.picker {
                let popup_area = centered_rect(area, 40, 60);
                picker.render(popup_area, buf, &theme);
            }
        }
    }
}

fn centered_rect(r: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Record;
    use crossterm::event::KeyModifiers;
    use std::sync::mpsc::channel;

    fn records() -> RecordSet {
        let headers = vec![
            "Warehouse".to_string(),
            "DSP".to_string(),
            "# Route".to_string(),
            "Latest Status".to_string(),
            "Driver id".to_string(),
            "Latest Update Time".to_string(),
            "Tracking".to_string(),
            "还剩/天断更".to_string(),
        ];
        let rows = vec![
            row(&headers, ["DLA1", "Alpha", "CX1", "Delivered", "Ann", "2026-08-28 10:00", "T1", "3.5"]),
            row(&headers, ["DLA1", "Alpha", "CX1", "In transit", "Ann", "2026-08-28 11:00", "T2", "0.5"]),
            row(&headers, ["DLA2", "Beta", "CX2", "In transit", "Bob", "2026-08-28 09:00", "T3", "1.5"]),
            row(&headers, ["DLA2", "Beta", "CX2", "配送完成", "Bob", "2026-08-28 12:00", "T4", "-1"]),
        ];
        RecordSet::new(headers, rows)
    }

    fn row(headers: &[String], values: [&str; 8]) -> Record {
        Record::from_pairs(
            headers
                .iter()
                .cloned()
                .zip(values.iter().map(|v| v.to_string()))
                .collect(),
        )
    }

    fn app() -> App {
        let (tx, _rx) = channel::<AppEvent>();
        let mut config = AppConfig::default();
        // Tests drive filters explicitly
        config.dashboard.initial_days_below = f64::NEG_INFINITY;
        let theme = Theme::from_config(&config.theme).unwrap();
        let mut app = App::new_with_config(tx, theme, config);
        app.filters.days.clear();
        app.install_records(records());
        app
    }

    fn key(code: KeyCode) -> AppEvent {
        AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn load_shows_all_rows_without_filters() {
        let app = app();
        assert_eq!(app.visible_rows(), &[0, 1, 2, 3]);
        assert_eq!(app.summary().total, 4);
        assert_eq!(app.summary().delivered, 2);
    }

    #[test]
    fn initial_view_preselects_urgent_days_buckets() {
        let (tx, _rx) = channel::<AppEvent>();
        let mut app = App::new(tx);
        app.install_records(records());
        // Default threshold of 2.0 keeps days < 2 only
        assert_eq!(app.visible_rows(), &[1, 2, 3]);
    }

    #[test]
    fn driver_page_charts_status() {
        let app = app();
        let labels: Vec<&str> = app
            .counts()
            .entries
            .iter()
            .map(|(label, _)| label.as_str())
            .collect();
        assert_eq!(labels, vec!["Delivered", "In transit", "配送完成"]);
    }

    #[test]
    fn drill_narrows_and_esc_restores() {
        let mut app = app();
        app.event(&key(KeyCode::Tab));
        app.chart_state.select(Some(1)); // "In transit"
        app.event(&key(KeyCode::Enter));
        assert_eq!(app.visible_rows(), &[1, 2]);
        app.event(&key(KeyCode::Esc));
        assert_eq!(app.visible_rows(), &[0, 1, 2, 3]);
    }

    #[test]
    fn drill_on_applied_entry_clears_it() {
        let mut app = app();
        app.event(&key(KeyCode::Tab));
        app.chart_state.select(Some(0));
        app.event(&key(KeyCode::Enter));
        assert_eq!(app.visible_rows(), &[0]);
        app.event(&key(KeyCode::Enter));
        assert_eq!(app.visible_rows(), &[0, 1, 2, 3]);
    }

    #[test]
    fn driver_search_filters_live() {
        let mut app = app();
        app.event(&key(KeyCode::Char('/')));
        app.event(&key(KeyCode::Char('b')));
        app.event(&key(KeyCode::Char('o')));
        assert_eq!(app.visible_rows(), &[2, 3]);
        app.event(&key(KeyCode::Enter));
        assert_eq!(app.input_mode, InputMode::Normal);
        assert_eq!(app.filters().driver_search, "bo");
    }

    #[test]
    fn lookup_restricts_then_clears() {
        let mut app = app();
        app.event(&key(KeyCode::Char('k')));
        for c in "Ann".chars() {
            app.event(&key(KeyCode::Char(c)));
        }
        app.event(&key(KeyCode::Enter));
        assert_eq!(app.visible_rows(), &[0, 1]);

        // Empty submit clears the lookup
        app.event(&key(KeyCode::Char('k')));
        for _ in 0..3 {
            app.event(&key(KeyCode::Backspace));
        }
        app.event(&key(KeyCode::Enter));
        assert_eq!(app.visible_rows(), &[0, 1, 2, 3]);
    }

    #[test]
    fn mode_toggle_switches_chart_field_and_drops_lookup() {
        let mut app = app();
        app.event(&key(KeyCode::Char('k')));
        for c in "Ann".chars() {
            app.event(&key(KeyCode::Char(c)));
        }
        app.event(&key(KeyCode::Enter));
        app.event(&key(KeyCode::Char('m')));
        assert_eq!(app.mode(), AggregateMode::Route);
        assert_eq!(app.visible_rows(), &[0, 1, 2, 3]);
        let labels: Vec<&str> = app
            .counts()
            .entries
            .iter()
            .map(|(label, _)| label.as_str())
            .collect();
        assert_eq!(labels, vec!["Ann", "Bob"]);
    }

    #[test]
    fn filter_change_resets_active_drill() {
        let mut app = app();
        app.event(&key(KeyCode::Tab));
        app.chart_state.select(Some(0));
        app.event(&key(KeyCode::Enter));
        assert!(app.drill.is_drilled());

        app.open_picker(PickerKind::Status);
        app.apply_picker(PickerKind::Status);
        assert!(!app.drill.is_drilled());
    }

    #[test]
    fn reset_clears_filters_and_lookup() {
        let mut app = app();
        app.filters.dsp.insert("Alpha".to_string());
        app.lookup_key = Some("Ann".to_string());
        app.recompute_base();
        assert_eq!(app.visible_rows(), &[0, 1]);
        app.event(&key(KeyCode::Char('R')));
        assert!(app.filters().is_empty());
        assert_eq!(app.visible_rows(), &[0, 1, 2, 3]);
    }

    #[test]
    fn load_failure_keeps_previous_data() {
        let mut app = app();
        app.event(&AppEvent::LoadFailed("boom".to_string()));
        assert_eq!(app.visible_rows(), &[0, 1, 2, 3]);
        assert!(app.status.as_deref().unwrap_or("").contains("boom"));
    }

    #[test]
    fn export_writes_visible_tracking_ids() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("export.txt");
        let mut app = app();
        app.config.dashboard.tracking_export = out.to_string_lossy().to_string();
        app.filters.dsp.insert("Beta".to_string());
        app.recompute_base();
        app.export_tracking();
        let contents = std::fs::read_to_string(&out).unwrap();
        assert_eq!(contents, "T3\nT4\n");
    }
}
