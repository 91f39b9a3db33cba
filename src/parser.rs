//! Row parser for per-day traffic sensor CSV exports.
//!
//! Each data line looks like
//! `DD-MM-YYYY HH:MM,<class>,<entry direction>,<..>,<..>,<speed km/h>[,...]`.
//! Malformed lines are dropped, never reported as errors.

use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// Minimum number of comma separated fields in a usable data line.
pub const MIN_FIELDS: usize = 6;

const TIMESTAMP_FIELD: usize = 0;
const CLASS_FIELD: usize = 1;
const DIRECTION_FIELD: usize = 2;
const SPEED_FIELD: usize = 5;

/// Vehicle classification reported by the sensor.
///
/// Unrecognized labels are read as [`VehicleClass::Car`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleClass {
    Car,
    Truck,
    Bus,
}

impl VehicleClass {
    pub const ALL: [VehicleClass; 3] = [VehicleClass::Car, VehicleClass::Truck, VehicleClass::Bus];

    /// Reads a class label case-insensitively, coercing anything unknown to `Car`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "truck" => VehicleClass::Truck,
            "bus" => VehicleClass::Bus,
            _ => VehicleClass::Car,
        }
    }

    /// Display name, e.g. `Truck`.
    pub fn name(&self) -> &'static str {
        match self {
            VehicleClass::Car => "Car",
            VehicleClass::Truck => "Truck",
            VehicleClass::Bus => "Bus",
        }
    }
}

impl fmt::Display for VehicleClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            VehicleClass::Car => "car",
            VehicleClass::Truck => "truck",
            VehicleClass::Bus => "bus",
        })
    }
}

/// One of the four canonical approach directions of the intersection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    /// Canonical order, also used to break ranking ties.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
    ];

    /// Matches an already upper-cased entry label.
    pub fn from_entry(entry: &str) -> Option<Self> {
        match entry {
            "NORTH" => Some(Direction::North),
            "SOUTH" => Some(Direction::South),
            "EAST" => Some(Direction::East),
            "WEST" => Some(Direction::West),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::North => "NORTH",
            Direction::South => "SOUTH",
            Direction::East => "EAST",
            Direction::West => "WEST",
        }
    }

    /// Lower-case identifier, e.g. `north`.
    pub fn id(&self) -> &'static str {
        match self {
            Direction::North => "north",
            Direction::South => "south",
            Direction::East => "east",
            Direction::West => "west",
        }
    }

    /// Title-cased name, e.g. `North`.
    pub fn name(&self) -> &'static str {
        match self {
            Direction::North => "North",
            Direction::South => "South",
            Direction::East => "East",
            Direction::West => "West",
        }
    }
}

/// A single parsed sensor reading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    pub timestamp: String,
    pub class: VehicleClass,
    /// Upper-cased entry direction, kept verbatim even outside the canonical four.
    pub entry: String,
    pub speed_kmh: f64,
    pub hour: usize,
    pub day_index: usize,
}

impl Observation {
    /// The canonical direction, if the entry label is one of the four.
    pub fn direction(&self) -> Option<Direction> {
        Direction::from_entry(&self.entry)
    }
}

/// Parses a single raw data line tagged with `day_index`.
///
/// Returns `None` for lines with fewer than six fields or an unreadable speed.
pub fn parse_row(raw_line: &str, day_index: usize) -> Option<Observation> {
    let record: StringRecord = raw_line.split(',').collect();
    parse_record(&record, day_index)
}

/// Parses an already split record. Shares the rules of [`parse_row`].
pub fn parse_record(record: &StringRecord, day_index: usize) -> Option<Observation> {
    if record.len() < MIN_FIELDS {
        return None;
    }

    let speed_kmh = parse_leading_f64(record.get(SPEED_FIELD)?)?;
    let timestamp = record.get(TIMESTAMP_FIELD)?.trim().to_string();
    let class = VehicleClass::from_label(record.get(CLASS_FIELD)?);
    let entry = record.get(DIRECTION_FIELD)?.trim().to_uppercase();

    Some(Observation {
        hour: parse_hour(&timestamp),
        timestamp,
        class,
        entry,
        speed_kmh,
        day_index,
    })
}

/// Parses a whole day export. The first line is always treated as a header.
pub fn parse_source(raw_text: &str, day_index: usize) -> Vec<Observation> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .quoting(false)
        .trim(Trim::All)
        .from_reader(raw_text.trim().as_bytes());

    let mut observations = Vec::new();
    let mut dropped = 0usize;

    for result in rdr.records() {
        match result {
            Ok(record) => match parse_record(&record, day_index) {
                Some(obs) => observations.push(obs),
                None => dropped += 1,
            },
            Err(_) => dropped += 1,
        }
    }

    debug!(
        day_index,
        parsed = observations.len(),
        dropped,
        "Source parsed"
    );

    observations
}

/// Extracts the hour from a `DD-MM-YYYY HH:MM` timestamp.
///
/// Anything unreadable yields hour 0; readable values are clamped to 0..=23.
pub fn parse_hour(timestamp: &str) -> usize {
    timestamp
        .split_whitespace()
        .nth(1)
        .and_then(|time| time.split(':').next())
        .and_then(parse_leading_i64)
        .map(|h| h.clamp(0, 23) as usize)
        .unwrap_or(0)
}

/// Reads the longest leading integer, ignoring trailing garbage (`"08h"` -> 8).
fn parse_leading_i64(text: &str) -> Option<i64> {
    let text = text.trim();
    let bytes = text.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end == digits_start {
        return None;
    }
    // only overflow can fail here; saturate like a float parse would
    let saturated = if bytes[0] == b'-' { i64::MIN } else { i64::MAX };
    Some(text[..end].parse().unwrap_or(saturated))
}

/// Reads the longest leading decimal number (`"85.5km"` -> 85.5).
fn parse_leading_f64(text: &str) -> Option<f64> {
    let text = text.trim();
    let bytes = text.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }

    let mut digits = 0;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
        digits += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        let mut frac_end = end + 1;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
            digits += 1;
        }
        end = frac_end;
    }
    if digits == 0 {
        return None;
    }

    // exponent only counts when followed by at least one digit
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    text[..end].parse::<f64>().ok().filter(|v| v.is_finite())
}
