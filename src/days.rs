//! Days-remaining parsing and bucket classification.
//!
//! The "还剩/天断更" column is free text; we pull the first signed numeric
//! token out of it. Unparsable cells become NaN, which never matches a
//! filter bucket, is excluded from averages, and colors as the no-data
//! bucket.

use regex::Regex;
use std::sync::OnceLock;

fn days_token() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"-?\d+(\.\d+)?").expect("days token pattern"))
}

/// Extract the days-until-stale value from a cell. Thousands separators are
/// stripped first. Returns NaN when no numeric token exists.
pub fn parse_days(text: &str) -> f64 {
    if text.is_empty() {
        return f64::NAN;
    }
    let stripped = text.replace(',', "");
    match days_token().find(&stripped) {
        Some(m) => m.as_str().parse().unwrap_or(f64::NAN),
        None => f64::NAN,
    }
}

/// Row coloring bucket. Total and exhaustive over f64 including NaN:
/// every value lands in exactly one bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaysBucket {
    /// d < 0: already stale.
    Overdue,
    /// 0 <= d < 1: goes stale today.
    DueToday,
    /// 1 <= d < 2: goes stale tomorrow.
    DueTomorrow,
    /// 2 <= d <= 5.
    DueSoon,
    /// d > 5, or no parsable value.
    Fresh,
}

impl DaysBucket {
    pub fn classify(d: f64) -> Self {
        if d.is_nan() {
            return DaysBucket::Fresh;
        }
        if d < 0.0 {
            DaysBucket::Overdue
        } else if d < 1.0 {
            DaysBucket::DueToday
        } else if d < 2.0 {
            DaysBucket::DueTomorrow
        } else if d <= 5.0 {
            DaysBucket::DueSoon
        } else {
            DaysBucket::Fresh
        }
    }

    /// Theme color key for row coloring.
    pub fn theme_key(&self) -> &'static str {
        match self {
            DaysBucket::Overdue => "days_overdue",
            DaysBucket::DueToday => "days_due_today",
            DaysBucket::DueTomorrow => "days_due_tomorrow",
            DaysBucket::DueSoon => "days_due_soon",
            DaysBucket::Fresh => "days_fresh",
        }
    }
}

/// The fixed five-label selection vocabulary of the days filter.
///
/// Membership for "1"/"2"/"3" is `floor(d) == N`; "<0" is `d < 0`;
/// "<1" is `0 <= d < 1`. NaN matches nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BucketLabel {
    BelowZero,
    BelowOne,
    One,
    Two,
    Three,
}

impl BucketLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            BucketLabel::BelowZero => "<0",
            BucketLabel::BelowOne => "<1",
            BucketLabel::One => "1",
            BucketLabel::Two => "2",
            BucketLabel::Three => "3",
        }
    }

    pub fn iterator() -> impl Iterator<Item = BucketLabel> {
        [
            BucketLabel::BelowZero,
            BucketLabel::BelowOne,
            BucketLabel::One,
            BucketLabel::Two,
            BucketLabel::Three,
        ]
        .iter()
        .copied()
    }

    pub fn matches(&self, d: f64) -> bool {
        if d.is_nan() {
            return false;
        }
        match self {
            BucketLabel::BelowZero => d < 0.0,
            BucketLabel::BelowOne => (0.0..1.0).contains(&d),
            BucketLabel::One => d.floor() == 1.0,
            BucketLabel::Two => d.floor() == 2.0,
            BucketLabel::Three => d.floor() == 3.0,
        }
    }

    /// Labels whose whole range lies below `threshold`. Used for the first
    /// screen default of "stale + about to go stale" (threshold 2 selects
    /// "<0", "<1", "1").
    pub fn below(threshold: f64) -> Vec<BucketLabel> {
        let mut labels = Vec::new();
        if threshold > 0.0 {
            labels.push(BucketLabel::BelowZero);
        }
        if threshold >= 1.0 {
            labels.push(BucketLabel::BelowOne);
        }
        for (label, upper) in [
            (BucketLabel::One, 2.0),
            (BucketLabel::Two, 3.0),
            (BucketLabel::Three, 4.0),
        ] {
            if threshold >= upper {
                labels.push(label);
            }
        }
        labels
    }
}
