//! Maps logical field roles to whatever literal column names the loaded CSV
//! actually uses. Export headers come in English or Chinese depending on who
//! produced the file, so each role carries a priority-ordered alias list.

use std::collections::HashMap;

use crate::source::Record;

/// A logical field concept, independent of its literal column spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldRole {
    Warehouse,
    Dsp,
    Route,
    Status,
    Driver,
    Time,
    Tracking,
    Days,
}

impl FieldRole {
    /// Acceptable literal header spellings, highest priority first.
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            FieldRole::Warehouse => &["Warehouse", "仓库"],
            FieldRole::Dsp => &["DSP", "Dsp", "承运商", "配送商", "Carrier"],
            FieldRole::Route => &["# Route", "Route", "线路", "线路号", "Line"],
            FieldRole::Status => &["Latest Status", "Status", "状态码", "状态", "最新状态"],
            FieldRole::Driver => &["Driver id", "Driver", "司机", "司机号"],
            FieldRole::Time => &[
                "Latest Update Time",
                "最后一次状态时间",
                "最后更新时间",
                "Date",
            ],
            FieldRole::Tracking => &["Tracking", "订单号", "运单号", "Waybill"],
            FieldRole::Days => &["还剩/天断更", "天数差", "Days Left", "剩余天数", "剩余/天断更"],
        }
    }

    /// Column name used when no alias matches. Lookups against an absent
    /// column read as empty rather than erroring.
    pub fn fallback(&self) -> &'static str {
        self.aliases()[0]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldRole::Warehouse => "warehouse",
            FieldRole::Dsp => "dsp",
            FieldRole::Route => "route",
            FieldRole::Status => "status",
            FieldRole::Driver => "driver",
            FieldRole::Time => "time",
            FieldRole::Tracking => "tracking",
            FieldRole::Days => "days",
        }
    }

    pub fn iterator() -> impl Iterator<Item = FieldRole> {
        [
            FieldRole::Warehouse,
            FieldRole::Dsp,
            FieldRole::Route,
            FieldRole::Status,
            FieldRole::Driver,
            FieldRole::Time,
            FieldRole::Tracking,
            FieldRole::Days,
        ]
        .iter()
        .copied()
    }
}

/// Comparator key: whitespace stripped, lower-cased.
fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// The role -> actual column mapping for one loaded record set.
///
/// Resolution is deterministic: for each role, the first alias in priority
/// order that matches an existing header (after normalization) wins. Must be
/// recomputed whenever the header set changes; a reload with different
/// headers invalidates any previous schema.
#[derive(Debug, Clone, Default)]
pub struct ResolvedSchema {
    columns: HashMap<FieldRole, Option<String>>,
}

impl ResolvedSchema {
    pub fn resolve(headers: &[String]) -> Self {
        let normalized: Vec<(String, &String)> =
            headers.iter().map(|h| (normalize(h), h)).collect();

        let mut columns = HashMap::new();
        for role in FieldRole::iterator() {
            let hit = role.aliases().iter().find_map(|alias| {
                let key = normalize(alias);
                normalized
                    .iter()
                    .find(|(n, _)| *n == key)
                    .map(|(_, h)| (*h).clone())
            });
            columns.insert(role, hit);
        }

        Self { columns }
    }

    /// The literal column name for a role: the resolved header, or the
    /// role's fallback when nothing matched.
    pub fn column(&self, role: FieldRole) -> &str {
        self.columns
            .get(&role)
            .and_then(|c| c.as_deref())
            .unwrap_or_else(|| role.fallback())
    }

    pub fn is_resolved(&self, role: FieldRole) -> bool {
        self.columns.get(&role).map(|c| c.is_some()).unwrap_or(false)
    }

    /// Read a role's value from a record. Missing columns read as "".
    pub fn value<'a>(&self, record: &'a Record, role: FieldRole) -> &'a str {
        record.get(self.column(role))
    }
}
