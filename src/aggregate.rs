//! Grouped counts and KPI summaries over the visible subset.

use regex::Regex;

use crate::days::parse_days;
use crate::schema::{FieldRole, ResolvedSchema};
use crate::source::RecordSet;

/// Default pattern identifying a delivered status, covering the localized
/// spellings seen in exports.
pub const DELIVERED_PATTERN: &str = r"(?i)delivered|投递|配送完成";

pub fn delivered_matcher(pattern: &str) -> Regex {
    Regex::new(pattern)
        .unwrap_or_else(|_| Regex::new(DELIVERED_PATTERN).expect("builtin delivered pattern"))
}

/// Label used when a grouped field is blank or missing.
pub fn blank_sentinel(role: FieldRole) -> &'static str {
    match role {
        FieldRole::Driver => "Unknown driver",
        _ => "Unknown",
    }
}

/// Counts per distinct value of one field, in encounter order over the
/// visible subset. Presentation layers may resort.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupCounts {
    pub role: Option<FieldRole>,
    pub entries: Vec<(String, usize)>,
}

impl GroupCounts {
    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, n)| n).sum()
    }

    pub fn label(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(|(label, _)| label.as_str())
    }
}

/// Partition the given rows by the literal value of one resolved field.
pub fn group_by(
    set: &RecordSet,
    rows: &[usize],
    schema: &ResolvedSchema,
    role: FieldRole,
) -> GroupCounts {
    let mut entries: Vec<(String, usize)> = Vec::new();
    for &i in rows {
        let Some(record) = set.get(i) else { continue };
        let raw = schema.value(record, role);
        let key = if raw.is_empty() {
            blank_sentinel(role)
        } else {
            raw
        };
        match entries.iter_mut().find(|(label, _)| label == key) {
            Some((_, n)) => *n += 1,
            None => entries.push((key.to_string(), 1)),
        }
    }
    GroupCounts {
        role: Some(role),
        entries,
    }
}

/// KPI summary over a visible (possibly drill-narrowed) subset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Summary {
    pub total: usize,
    pub delivered: usize,
    /// Percentage of total; 0.0 when total is 0.
    pub delivered_pct: f64,
    /// Mean of parsable days values, rounded to two decimals. None when no
    /// record has a parsable value.
    pub mean_days: Option<f64>,
    /// Lexicographic maximum of the raw timestamp strings. Only a true
    /// "most recent" when all timestamps share one monotonic format.
    pub last_update: Option<String>,
    pub distinct_drivers: usize,
    pub distinct_dsps: usize,
    pub distinct_routes: usize,
}

/// Compute the summary KPIs over `rows`. An empty subset yields the defined
/// "no data" summary rather than an error.
pub fn summarize(
    set: &RecordSet,
    rows: &[usize],
    schema: &ResolvedSchema,
    delivered: &Regex,
) -> Summary {
    let total = rows.len();
    if total == 0 {
        return Summary::default();
    }

    let mut delivered_count = 0;
    let mut days_sum = 0.0;
    let mut days_n = 0usize;
    let mut last_update: Option<&str> = None;
    let mut drivers = std::collections::HashSet::new();
    let mut dsps = std::collections::HashSet::new();
    let mut routes = std::collections::HashSet::new();

    for &i in rows {
        let Some(record) = set.get(i) else { continue };
        if delivered.is_match(schema.value(record, FieldRole::Status)) {
            delivered_count += 1;
        }
        let d = parse_days(schema.value(record, FieldRole::Days));
        if !d.is_nan() {
            days_sum += d;
            days_n += 1;
        }
        let time = schema.value(record, FieldRole::Time);
        if !time.is_empty() && last_update.map(|best| time > best).unwrap_or(true) {
            last_update = Some(time);
        }
        drivers.insert(schema.value(record, FieldRole::Driver));
        dsps.insert(schema.value(record, FieldRole::Dsp));
        routes.insert(schema.value(record, FieldRole::Route));
    }

    Summary {
        total,
        delivered: delivered_count,
        delivered_pct: delivered_count as f64 / total as f64 * 100.0,
        mean_days: (days_n > 0).then(|| round2(days_sum / days_n as f64)),
        last_update: last_update.map(str::to_string),
        distinct_drivers: drivers.len(),
        distinct_dsps: dsps.len(),
        distinct_routes: routes.len(),
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
