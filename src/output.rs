//! Output formatting and persistence for aggregates and day summaries.
//!
//! Supports pretty-printing, JSON files, CSV append and the event log export.

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info};

use crate::aggregate::WeekAggregate;
use crate::aggregate::types::HighSpeedEvent;
use crate::stats::DayStats;
use csv::WriterBuilder;
use std::fs::OpenOptions;
use std::path::Path;

/// Logs an aggregate using Rust's debug pretty-print format.
pub fn print_pretty(aggregate: &WeekAggregate) {
    debug!("{:#?}", aggregate);
}

/// Serializes any output value as pretty-printed JSON.
pub fn render_json(value: &impl Serialize) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Writes a value as pretty-printed JSON, replacing any existing file.
pub fn write_json(path: &str, value: &impl Serialize) -> Result<()> {
    let json = render_json(value)?;
    std::fs::write(path, json)?;
    info!(path, "JSON written");
    Ok(())
}

/// Appends a [`DayStats`] record as a row to a CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_record(path: &str, day_stats: &DayStats) -> Result<()> {
    let file_exists = Path::new(path).exists();
    debug!(path, file_exists, "Appending CSV record");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists) // IMPORTANT when appending
        .from_writer(file);

    writer.serialize(day_stats)?;
    writer.flush()?;

    Ok(())
}

/// Writes the high-speed event log as CSV, replacing any existing file.
pub fn write_events(path: &str, events: &[HighSpeedEvent]) -> Result<()> {
    let mut writer = WriterBuilder::new().has_headers(true).from_path(path)?;
    for event in events {
        writer.serialize(event)?;
    }
    writer.flush()?;

    info!(path, events = events.len(), "Event log written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate_observations;
    use crate::config::DeploymentConfig;
    use crate::parser::parse_row;
    use std::env;
    use std::fs;

    fn temp_path(name: &str) -> String {
        format!("{}/{}", env::temp_dir().display(), name)
    }

    fn sample_aggregate() -> WeekAggregate {
        let rows = vec![
            parse_row("05-09-2017 08:15,car,NORTH,-,-,70", 0).unwrap(),
            parse_row("05-09-2017 09:30,truck,SOUTH,-,-,91", 0).unwrap(),
        ];
        aggregate_observations(&rows, &DeploymentConfig::reference().days, 80.0)
    }

    #[test]
    fn test_print_pretty_does_not_panic() {
        print_pretty(&sample_aggregate());
    }

    #[test]
    fn test_render_json_fields() {
        let json = render_json(&sample_aggregate()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["total_vehicles"], 2);
        assert_eq!(value["by_hour"].as_array().unwrap().len(), 24);
        assert_eq!(value["risk_by_hour"].as_array().unwrap().len(), 24);
        assert_eq!(value["class_distribution"][0]["class"], "car");
        assert_eq!(value["by_direction"][0]["direction"], "NORTH");
        assert_eq!(value["high_speed_events"][0]["timestamp"], "5-09-2017 09:00");
    }

    #[test]
    fn test_append_record_writes_header_once() {
        let path = temp_path("traffic_week_test_header.csv");
        let _ = fs::remove_file(&path);

        let stats = DayStats::default();
        append_record(&path, &stats).unwrap();
        append_record(&path, &stats).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        // Header line should appear exactly once
        let header_count = content.lines().filter(|l| l.contains("generated_at")).count();
        assert_eq!(header_count, 1);
        assert_eq!(content.lines().count(), 3);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_events() {
        let path = temp_path("traffic_week_test_events.csv");
        let _ = fs::remove_file(&path);

        write_events(&path, &sample_aggregate().high_speed_events).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines[0], "timestamp,kind,direction,speed_kmh,confidence");
        assert_eq!(lines[1], "5-09-2017 09:00,Speeding,Southbound,91.0,76");

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_json_round_trips_as_json() {
        let path = temp_path("traffic_week_test_week.json");
        write_json(&path, &sample_aggregate()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["over_limit_count"], 1);

        fs::remove_file(&path).unwrap();
    }
}
