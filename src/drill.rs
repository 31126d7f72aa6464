//! One-level drill-down from the distribution chart into the table.
//!
//! Two states: Baseline (rows as composed by the filters, or by a keyed
//! lookup) and Drilled (one extra exact-match predicate applied on top of
//! the captured baseline). Selecting another chart entry while drilled
//! replaces the narrowing; clearing restores the baseline rows exactly as
//! captured. No deeper history is kept.

use crate::schema::{FieldRole, ResolvedSchema};
use crate::source::RecordSet;

/// Which distribution the page charts, and therefore which field a chart
/// selection narrows by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AggregateMode {
    /// Driver page: chart groups by status; drilling filters on status.
    #[default]
    Driver,
    /// Route page: chart groups by driver; drilling filters on driver.
    Route,
}

impl AggregateMode {
    /// The field the chart groups by. Drilling narrows on the same field.
    pub fn chart_role(&self) -> FieldRole {
        match self {
            AggregateMode::Driver => FieldRole::Status,
            AggregateMode::Route => FieldRole::Driver,
        }
    }

    /// The field the keyed lookup matches exactly.
    pub fn key_role(&self) -> FieldRole {
        match self {
            AggregateMode::Driver => FieldRole::Driver,
            AggregateMode::Route => FieldRole::Route,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AggregateMode::Driver => "driver",
            AggregateMode::Route => "route",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DrillDown {
    mode: AggregateMode,
    /// The keyed-lookup value behind the current baseline; empty = all.
    anchor: String,
    baseline: Vec<usize>,
    applied: Option<String>,
    narrowed: Vec<usize>,
}

impl DrillDown {
    pub fn new(mode: AggregateMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn mode(&self) -> AggregateMode {
        self.mode
    }

    pub fn anchor(&self) -> &str {
        &self.anchor
    }

    /// Install a new baseline (from recomposed filters or a keyed lookup).
    /// Always discards any active narrowing.
    pub fn set_baseline(&mut self, anchor: String, rows: Vec<usize>) {
        self.anchor = anchor;
        self.baseline = rows;
        self.applied = None;
        self.narrowed.clear();
    }

    pub fn is_drilled(&self) -> bool {
        self.applied.is_some()
    }

    pub fn applied_label(&self) -> Option<&str> {
        self.applied.as_deref()
    }

    /// Enter (or replace) the drill: keep only baseline rows whose chart
    /// field equals `label`, honoring the blank sentinel used by group-by.
    pub fn drill(&mut self, set: &RecordSet, schema: &ResolvedSchema, label: &str) {
        let role = self.mode.chart_role();
        let sentinel = crate::aggregate::blank_sentinel(role);
        self.narrowed = self
            .baseline
            .iter()
            .copied()
            .filter(|&i| {
                set.get(i)
                    .map(|record| {
                        let value = schema.value(record, role);
                        value == label || (value.is_empty() && label == sentinel)
                    })
                    .unwrap_or(false)
            })
            .collect();
        self.applied = Some(label.to_string());
    }

    /// Drilled -> Baseline: restore the exact rows captured before the
    /// drill entered.
    pub fn clear(&mut self) {
        self.applied = None;
        self.narrowed.clear();
    }

    /// The rows the table, chart, and summary should show right now.
    pub fn rows(&self) -> &[usize] {
        if self.is_drilled() {
            &self.narrowed
        } else {
            &self.baseline
        }
    }

    pub fn baseline_rows(&self) -> &[usize] {
        &self.baseline
    }

    /// Breadcrumb text for the drill badge, present only while drilled.
    pub fn breadcrumb(&self) -> Option<String> {
        self.applied.as_ref().map(|label| {
            let anchor = if self.anchor.is_empty() {
                "ALL"
            } else {
                self.anchor.as_str()
            };
            format!(
                "{} {} · {}: {}",
                self.mode.as_str(),
                anchor,
                self.mode.chart_role().as_str(),
                label
            )
        })
    }
}
