use color_eyre::Result;
use orderdash::aggregate::{self, delivered_matcher, DELIVERED_PATTERN};
use orderdash::days::BucketLabel;
use orderdash::drill::{AggregateMode, DrillDown};
use orderdash::filter::{self, FilterState};
use orderdash::schema::{FieldRole, ResolvedSchema};
use orderdash::source::{read_orders, OpenOptions};
use std::io::Write;
use tempfile::NamedTempFile;

fn sample_csv() -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    writeln!(
        file,
        "Warehouse,DSP,# Route,Latest Status,Driver,Latest Update Time,Tracking,Days Left"
    )?;
    writeln!(file, "DLA1,Alpha,CX1,Delivered,Ann,2026-08-28 10:00,T1,3.5")?;
    writeln!(file, "DLA1,Alpha,CX1,In transit,Ann,2026-08-28 11:00,T2,0.5")?;
    writeln!(file, "DLA1,Beta,CX2,In transit,Bob,2026-08-28 09:00,T3,\"1,5\"")?;
    writeln!(file, "DLA2,Beta,CX2,配送完成,Bob,2026-08-28 12:00,T4,-1")?;
    writeln!(file, "DLA2,Beta,CX3,Out for delivery,,2026-08-27 08:00,T5,")?;
    Ok(file)
}

#[test]
fn full_pipeline_from_csv_to_summary() -> Result<()> {
    let file = sample_csv()?;
    let set = read_orders(file.path(), &OpenOptions::new())?;
    let schema = ResolvedSchema::resolve(set.headers());
    assert!(schema.is_resolved(FieldRole::Days));

    let filters = FilterState::new();
    let visible = filters.apply(&set, &schema, &set.all_indices());
    assert_eq!(visible.len(), 5);

    let delivered = delivered_matcher(DELIVERED_PATTERN);
    let summary = aggregate::summarize(&set, &visible, &schema, &delivered);
    assert_eq!(summary.total, 5);
    assert_eq!(summary.delivered, 2);
    assert_eq!(summary.delivered_pct, 40.0);
    // Days: 3.5, 0.5, 15 (comma-stripped "1,5"), -1; the blank cell is skipped
    assert_eq!(summary.mean_days, Some(4.5));
    assert_eq!(summary.last_update.as_deref(), Some("2026-08-28 12:00"));
    // Blank drivers count as one distinct value, matching the chart's sentinel group
    assert_eq!(summary.distinct_drivers, 3);
    Ok(())
}

#[test]
fn filters_compose_conjunctively_over_csv_rows() -> Result<()> {
    let file = sample_csv()?;
    let set = read_orders(file.path(), &OpenOptions::new())?;
    let schema = ResolvedSchema::resolve(set.headers());

    let mut filters = FilterState::new();
    filters.dsp.insert("Beta".to_string());
    filters.days.insert(BucketLabel::BelowZero);
    let visible = filters.apply(&set, &schema, &set.all_indices());
    assert_eq!(visible, vec![3]);
    Ok(())
}

#[test]
fn keyed_lookup_then_drill_round_trip() -> Result<()> {
    let file = sample_csv()?;
    let set = read_orders(file.path(), &OpenOptions::new())?;
    let schema = ResolvedSchema::resolve(set.headers());

    // Route page anchored on CX2
    let mode = AggregateMode::Route;
    let base = filter::exact_match(&set, &schema, mode.key_role(), "CX2");
    assert_eq!(base, vec![2, 3]);

    let mut drill = DrillDown::new(mode);
    drill.set_baseline("CX2".to_string(), base.clone());
    let counts = aggregate::group_by(&set, drill.rows(), &schema, mode.chart_role());
    assert_eq!(counts.entries, vec![("Bob".to_string(), 2)]);

    drill.drill(&set, &schema, "Bob");
    assert_eq!(drill.rows(), &[2, 3]);
    assert_eq!(
        drill.breadcrumb().as_deref(),
        Some("route CX2 · driver: Bob")
    );
    drill.clear();
    assert_eq!(drill.rows(), base.as_slice());
    Ok(())
}

#[test]
fn blank_drivers_group_under_the_sentinel() -> Result<()> {
    let file = sample_csv()?;
    let set = read_orders(file.path(), &OpenOptions::new())?;
    let schema = ResolvedSchema::resolve(set.headers());

    let mode = AggregateMode::Route;
    let mut drill = DrillDown::new(mode);
    drill.set_baseline(String::new(), set.all_indices());
    let counts = aggregate::group_by(&set, drill.rows(), &schema, mode.chart_role());
    let labels: Vec<&str> = counts.entries.iter().map(|(l, _)| l.as_str()).collect();
    assert!(labels.contains(&"Unknown driver"));

    drill.drill(&set, &schema, "Unknown driver");
    assert_eq!(drill.rows(), &[4]);
    Ok(())
}

#[test]
fn semicolon_delimiter_is_honored() -> Result<()> {
    let mut file = NamedTempFile::new()?;
    writeln!(file, "Warehouse;DSP;# Route;Latest Status;Driver;Latest Update Time;Tracking;Days Left")?;
    writeln!(file, "DLA1;Alpha;CX1;Delivered;Ann;2026-08-28 10:00;T1;2")?;

    let set = read_orders(file.path(), &OpenOptions::new().with_delimiter(b';'))?;
    assert_eq!(set.len(), 1);
    let schema = ResolvedSchema::resolve(set.headers());
    assert!(schema.is_resolved(FieldRole::Tracking));
    Ok(())
}
