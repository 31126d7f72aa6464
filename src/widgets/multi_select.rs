use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Style, Stylize},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Widget},
};
use std::collections::HashSet;

use crate::config::Theme;
use crate::widgets::text_input::{TextInput, TextInputEvent};

/// Display label for an empty value
pub const BLANKS_LABEL: &str = "(Blanks)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultiSelectEvent {
    None,
    Apply,  // Enter pressed: commit the selection
    Cancel, // Esc pressed: discard changes
}

/// Modal picker over a list of values with a search box.
/// Empty-string options render as "(Blanks)". In single mode choosing an
/// option replaces the selection instead of toggling into it.
pub struct MultiSelect {
    pub title: String,
    options: Vec<String>,
    selected: HashSet<String>,
    search: TextInput,
    list_state: ListState,
    single: bool,
}

impl MultiSelect {
    pub fn new(title: impl Into<String>, options: Vec<String>, theme: &Theme) -> Self {
        let mut search = TextInput::new().with_theme(theme);
        search.set_focused(true);
        let mut list_state = ListState::default();
        if !options.is_empty() {
            list_state.select(Some(0));
        }
        Self {
            title: title.into(),
            options,
            selected: HashSet::new(),
            search,
            list_state,
            single: false,
        }
    }

    pub fn single_choice(mut self) -> Self {
        self.single = true;
        self
    }

    pub fn with_selected(mut self, selected: HashSet<String>) -> Self {
        self.selected = selected;
        self
    }

    pub fn selected(&self) -> &HashSet<String> {
        &self.selected
    }

    pub fn into_selected(self) -> HashSet<String> {
        self.selected
    }

    /// Options matching the current search text
    fn visible(&self) -> Vec<&String> {
        let needle = self.search.value().to_lowercase();
        self.options
            .iter()
            .filter(|opt| {
                if needle.is_empty() {
                    return true;
                }
                let label = if opt.is_empty() { BLANKS_LABEL } else { opt };
                label.to_lowercase().contains(&needle)
            })
            .collect()
    }

    fn toggle_highlighted(&mut self) {
        let visible: Vec<String> = self.visible().into_iter().cloned().collect();
        let Some(idx) = self.list_state.selected() else {
            return;
        };
        let Some(value) = visible.get(idx) else {
            return;
        };
        if self.single {
            if self.selected.contains(value) {
                self.selected.clear();
            } else {
                self.selected.clear();
                self.selected.insert(value.clone());
            }
        } else if !self.selected.remove(value) {
            self.selected.insert(value.clone());
        }
    }

    fn clamp_selection(&mut self) {
        let count = self.visible().len();
        if count == 0 {
            self.list_state.select(None);
        } else {
            match self.list_state.selected() {
                Some(idx) if idx < count => {}
                _ => self.list_state.select(Some(0)),
            }
        }
    }

    pub fn handle_key(&mut self, event: &KeyEvent) -> MultiSelectEvent {
        match (event.code, event.modifiers) {
            (KeyCode::Up, _) => {
                self.list_state.select_previous();
                MultiSelectEvent::None
            }
            (KeyCode::Down, _) => {
                self.list_state.select_next();
                MultiSelectEvent::None
            }
            (KeyCode::Char(' '), KeyModifiers::NONE) => {
                self.toggle_highlighted();
                MultiSelectEvent::None
            }
            (KeyCode::Char('a'), KeyModifiers::CONTROL) if !self.single => {
                let visible: Vec<String> = self.visible().into_iter().cloned().collect();
                self.selected.extend(visible);
                MultiSelectEvent::None
            }
            (KeyCode::Char('n'), KeyModifiers::CONTROL) => {
                self.selected.clear();
                MultiSelectEvent::None
            }
            _ => match self.search.handle_key(event) {
                TextInputEvent::Submit => MultiSelectEvent::Apply,
                TextInputEvent::Cancel => MultiSelectEvent::Cancel,
                TextInputEvent::Changed => {
                    self.clamp_selection();
                    MultiSelectEvent::None
                }
                TextInputEvent::None => MultiSelectEvent::None,
            },
        }
    }

    pub fn render(&mut self, area: Rect, buf: &mut Buffer, theme: &Theme) {
        Clear.render(area, buf);
        let block = Block::default()
            .borders(Borders::ALL)
            .title(self.title.as_str())
            .border_style(Style::default().fg(theme.get("modal_border_active")));
        let inner = block.inner(area);
        block.render(area, buf);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Search box
                Constraint::Min(0),    // Option list
                Constraint::Length(1), // Hint line
            ])
            .split(inner);

        (&self.search).render(chunks[0], buf);

        let items: Vec<ListItem> = self
            .visible()
            .iter()
            .map(|opt| {
                let marker = if self.selected.contains(*opt) {
                    "[x] "
                } else {
                    "[ ] "
                };
                let label = if opt.is_empty() { BLANKS_LABEL } else { opt };
                ListItem::new(format!("{}{}", marker, label))
            })
            .collect();

        let list = List::new(items)
            .style(Style::default().fg(theme.get("text_primary")))
            .highlight_style(Style::default().bg(theme.get("table_selected")).bold());
        ratatui::widgets::StatefulWidget::render(list, chunks[1], buf, &mut self.list_state);

        let hint = if self.single {
            "Space select · Enter apply · Esc cancel"
        } else {
            "Space toggle · ^A all · ^N none · Enter apply · Esc cancel"
        };
        Paragraph::new(hint)
            .style(Style::default().fg(theme.get("dimmed")))
            .render(chunks[2], buf);
    }
}
