//! Independent filter predicates and their conjunctive composition.
//!
//! Each predicate operates on one resolved field. An empty selection means
//! "no restriction", never "exclude all"; the empty string is a legal
//! selected member representing blank cells. Any state mutation triggers a
//! full re-evaluation over the record set rather than an incremental
//! update.

use std::collections::HashSet;

use crate::days::{parse_days, BucketLabel};
use crate::schema::{FieldRole, ResolvedSchema};
use crate::source::{Record, RecordSet};

/// The whole filter control surface for one page.
#[derive(Debug, Clone, Default)]
pub struct FilterState {
    /// Warehouse single-select. None = all.
    pub warehouse: Option<String>,
    pub dsp: HashSet<String>,
    pub route: HashSet<String>,
    pub status: HashSet<String>,
    pub days: HashSet<BucketLabel>,
    /// Case-insensitive substring match against the driver field.
    pub driver_search: String,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-select the days buckets entirely below `threshold`.
    pub fn with_days_below(mut self, threshold: f64) -> Self {
        self.days = BucketLabel::below(threshold).into_iter().collect();
        self
    }

    pub fn is_empty(&self) -> bool {
        self.warehouse.is_none()
            && self.dsp.is_empty()
            && self.route.is_empty()
            && self.status.is_empty()
            && self.days.is_empty()
            && self.driver_search.is_empty()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Number of predicates currently restricting the view.
    pub fn active_count(&self) -> usize {
        usize::from(self.warehouse.is_some())
            + usize::from(!self.dsp.is_empty())
            + usize::from(!self.route.is_empty())
            + usize::from(!self.status.is_empty())
            + usize::from(!self.days.is_empty())
            + usize::from(!self.driver_search.is_empty())
    }

    pub fn selection_mut(&mut self, role: FieldRole) -> Option<&mut HashSet<String>> {
        match role {
            FieldRole::Dsp => Some(&mut self.dsp),
            FieldRole::Route => Some(&mut self.route),
            FieldRole::Status => Some(&mut self.status),
            _ => None,
        }
    }

    /// Conjunction of all active predicates, short-circuiting per record.
    pub fn matches(&self, schema: &ResolvedSchema, record: &Record) -> bool {
        if let Some(wanted) = &self.warehouse {
            if schema.value(record, FieldRole::Warehouse).trim() != wanted {
                return false;
            }
        }
        if !membership(&self.dsp, schema.value(record, FieldRole::Dsp)) {
            return false;
        }
        if !membership(&self.route, schema.value(record, FieldRole::Route)) {
            return false;
        }
        if !membership(&self.status, schema.value(record, FieldRole::Status)) {
            return false;
        }
        if !self.driver_search.is_empty() {
            let driver = schema.value(record, FieldRole::Driver).to_lowercase();
            if !driver.contains(&self.driver_search.to_lowercase()) {
                return false;
            }
        }
        if !self.days.is_empty() {
            let d = parse_days(schema.value(record, FieldRole::Days));
            if !self.days.iter().any(|label| label.matches(d)) {
                return false;
            }
        }
        true
    }

    /// Apply all predicates over `base` (row indices into `set`), preserving
    /// order. `base` is the full set for a plain view or a keyed-lookup
    /// subset.
    pub fn apply(&self, set: &RecordSet, schema: &ResolvedSchema, base: &[usize]) -> Vec<usize> {
        base.iter()
            .copied()
            .filter(|&i| {
                set.get(i)
                    .map(|record| self.matches(schema, record))
                    .unwrap_or(false)
            })
            .collect()
    }
}

/// Exact-membership predicate: empty selection passes everything; blank
/// cells match the explicit empty-string member.
fn membership(selection: &HashSet<String>, value: &str) -> bool {
    selection.is_empty() || selection.contains(value.trim())
}

/// Rows of `set` (in input order) whose `key_role` value exactly equals
/// `key`. Used by the keyed driver/route lookup that resets the baseline.
pub fn exact_match(
    set: &RecordSet,
    schema: &ResolvedSchema,
    key_role: FieldRole,
    key: &str,
) -> Vec<usize> {
    set.rows()
        .iter()
        .enumerate()
        .filter(|(_, record)| schema.value(record, key_role) == key)
        .map(|(i, _)| i)
        .collect()
}

/// Distinct trimmed values of a role over the whole record set, for picker
/// population: empty string first when blanks exist, then ascending by
/// code point. No locale collation is applied, so mixed-script option
/// lists group by script (ASCII before CJK) rather than by a locale's
/// dictionary order.
pub fn unique_values(set: &RecordSet, schema: &ResolvedSchema, role: FieldRole) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut has_blank = false;
    let mut values = Vec::new();
    for record in set.rows() {
        let v = schema.value(record, role).trim();
        if v.is_empty() {
            has_blank = true;
            continue;
        }
        if seen.insert(v.to_string()) {
            values.push(v.to_string());
        }
    }
    values.sort();
    if has_blank {
        values.insert(0, String::new());
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Record;

    fn record(pairs: &[(&str, &str)]) -> Record {
        Record::from_pairs(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    fn sample_set() -> (RecordSet, ResolvedSchema) {
        let headers: Vec<String> = [
            "Tracking",
            "Warehouse",
            "DSP",
            "Driver id",
            "# Route",
            "Latest Status",
            "还剩/天断更",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        let rows = vec![
            record(&[
                ("Tracking", "T1"),
                ("Warehouse", "W1"),
                ("DSP", "Alpha"),
                ("Driver id", "D100"),
                ("# Route", "R1"),
                ("Latest Status", "Delivered"),
                ("还剩/天断更", "2"),
            ]),
            record(&[
                ("Tracking", "T2"),
                ("Warehouse", "W2"),
                ("DSP", "Beta"),
                ("Driver id", "D200"),
                ("# Route", "R2"),
                ("Latest Status", "In Transit"),
                ("还剩/天断更", "-1"),
            ]),
            record(&[
                ("Tracking", "T3"),
                ("Warehouse", "W1"),
                ("DSP", ""),
                ("Driver id", "D100"),
                ("# Route", "R1"),
                ("Latest Status", "Delivered"),
                ("还剩/天断更", "6"),
            ]),
        ];
        let schema = ResolvedSchema::resolve(&headers);
        (RecordSet::new(headers, rows), schema)
    }

    #[test]
    fn empty_state_passes_everything_in_order() {
        let (set, schema) = sample_set();
        let visible = FilterState::new().apply(&set, &schema, &set.all_indices());
        assert_eq!(visible, vec![0, 1, 2]);
    }

    #[test]
    fn warehouse_is_single_select_equality() {
        let (set, schema) = sample_set();
        let mut filters = FilterState::new();
        filters.warehouse = Some("W1".to_string());
        assert_eq!(filters.apply(&set, &schema, &set.all_indices()), vec![0, 2]);
    }

    #[test]
    fn membership_selection_restricts() {
        let (set, schema) = sample_set();
        let mut filters = FilterState::new();
        filters.status.insert("Delivered".to_string());
        assert_eq!(filters.apply(&set, &schema, &set.all_indices()), vec![0, 2]);
    }

    #[test]
    fn blank_member_matches_blank_cells_only() {
        let (set, schema) = sample_set();
        let mut filters = FilterState::new();
        filters.dsp.insert(String::new());
        assert_eq!(filters.apply(&set, &schema, &set.all_indices()), vec![2]);
    }

    #[test]
    fn growing_a_selection_never_shrinks_its_own_pass_set() {
        let (set, schema) = sample_set();
        let mut filters = FilterState::new();
        filters.status.insert("Delivered".to_string());
        let narrow = filters.apply(&set, &schema, &set.all_indices());
        filters.status.insert("In Transit".to_string());
        let wide = filters.apply(&set, &schema, &set.all_indices());
        assert!(narrow.iter().all(|i| wide.contains(i)));
    }

    #[test]
    fn driver_search_is_case_insensitive_substring() {
        let (set, schema) = sample_set();
        let mut filters = FilterState::new();
        filters.driver_search = "d1".to_string();
        assert_eq!(filters.apply(&set, &schema, &set.all_indices()), vec![0, 2]);
    }

    #[test]
    fn days_bucket_filter_uses_vocabulary() {
        let (set, schema) = sample_set();
        let mut filters = FilterState::new();
        filters.days.insert(BucketLabel::BelowZero);
        assert_eq!(filters.apply(&set, &schema, &set.all_indices()), vec![1]);
    }

    #[test]
    fn unparsable_days_fail_any_bucket_selection() {
        let headers = vec!["还剩/天断更".to_string()];
        let set = RecordSet::new(headers.clone(), vec![record(&[("还剩/天断更", "n/a")])]);
        let schema = ResolvedSchema::resolve(&headers);
        let mut filters = FilterState::new();
        filters.days.insert(BucketLabel::Three);
        assert!(filters.apply(&set, &schema, &set.all_indices()).is_empty());
    }

    #[test]
    fn predicates_compose_conjunctively() {
        let (set, schema) = sample_set();
        let mut filters = FilterState::new();
        filters.warehouse = Some("W1".to_string());
        filters.days.insert(BucketLabel::Two);
        assert_eq!(filters.apply(&set, &schema, &set.all_indices()), vec![0]);
    }

    #[test]
    fn exact_match_lookup() {
        let (set, schema) = sample_set();
        assert_eq!(
            exact_match(&set, &schema, FieldRole::Driver, "D100"),
            vec![0, 2]
        );
        assert!(exact_match(&set, &schema, FieldRole::Route, "R9").is_empty());
    }

    #[test]
    fn unique_values_sorted_with_blank_first() {
        let (set, schema) = sample_set();
        assert_eq!(
            unique_values(&set, &schema, FieldRole::Dsp),
            vec!["".to_string(), "Alpha".to_string(), "Beta".to_string()]
        );
    }

    #[test]
    fn unique_values_order_mixed_scripts_by_code_point() {
        let headers = vec!["DSP".to_string()];
        let set = RecordSet::new(
            headers.clone(),
            vec![
                record(&[("DSP", "顺丰")]),
                record(&[("DSP", "Beta")]),
                record(&[("DSP", "中通")]),
                record(&[("DSP", "Alpha")]),
            ],
        );
        let schema = ResolvedSchema::resolve(&headers);
        assert_eq!(
            unique_values(&set, &schema, FieldRole::Dsp),
            vec![
                "Alpha".to_string(),
                "Beta".to_string(),
                "中通".to_string(),
                "顺丰".to_string(),
            ]
        );
    }

    #[test]
    fn active_count_and_clear() {
        let mut filters = FilterState::new().with_days_below(2.0);
        filters.warehouse = Some("W1".to_string());
        assert_eq!(filters.active_count(), 2);
        filters.clear();
        assert!(filters.is_empty());
    }
}
