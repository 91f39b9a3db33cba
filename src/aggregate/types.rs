//! Data types produced by the weekly aggregation.

use crate::aggregate::utility::mean;
use crate::parser::{Direction, VehicleClass};
use serde::Serialize;
use std::fmt;

/// Vehicle counts split by class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClassCounts {
    pub car: usize,
    pub truck: usize,
    pub bus: usize,
}

impl ClassCounts {
    pub fn add(&mut self, class: VehicleClass) {
        match class {
            VehicleClass::Car => self.car += 1,
            VehicleClass::Truck => self.truck += 1,
            VehicleClass::Bus => self.bus += 1,
        }
    }

    pub fn get(&self, class: VehicleClass) -> usize {
        match class {
            VehicleClass::Car => self.car,
            VehicleClass::Truck => self.truck,
            VehicleClass::Bus => self.bus,
        }
    }

    pub fn total(&self) -> usize {
        self.car + self.truck + self.bus
    }
}

/// Volume and over-limit count for one hour of the day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HourTally {
    pub count: usize,
    pub over_limit: usize,
}

/// Volume and over-limit count for one observed day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayTally {
    pub day_index: usize,
    pub label: String,
    pub count: usize,
    pub over_limit: usize,
}

/// Running totals for one canonical direction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectionTally {
    pub direction: Direction,
    pub count: usize,
    pub speed_sum_kmh: f64,
    pub classes: ClassCounts,
}

impl DirectionTally {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            count: 0,
            speed_sum_kmh: 0.0,
            classes: ClassCounts::default(),
        }
    }
}

/// A direction's place in the volume ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectionFlow {
    /// 1-based, busiest first.
    pub rank: usize,
    pub direction: Direction,
    pub name: String,
    pub volume: usize,
    pub avg_speed_kmh: f64,
    pub speed_sum_kmh: f64,
    pub classes: ClassCounts,
}

impl fmt::Display for DirectionFlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} vehicles • avg {} km/h • {} car, {} truck, {} bus",
            self.volume,
            mean(self.speed_sum_kmh, self.volume).round() as i64,
            self.classes.car,
            self.classes.truck,
            self.classes.bus
        )
    }
}

/// Share of one vehicle class among all classified vehicles.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassShare {
    pub class: VehicleClass,
    pub name: &'static str,
    pub value: usize,
    pub percent: f64,
}

/// Count of one class entering from one direction, e.g. `North Truck`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectionClassBar {
    pub label: String,
    pub direction: Direction,
    pub class: VehicleClass,
    pub value: usize,
}

/// Display record for one over-limit observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HighSpeedEvent {
    pub timestamp: String,
    pub kind: &'static str,
    pub direction: String,
    pub speed_kmh: f64,
    /// Percent, 70..=99.
    pub confidence: u8,
}

/// Snapshot of a full aggregation run. Built once, never updated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekAggregate {
    pub speed_limit_kmh: f64,
    pub total_vehicles: usize,
    pub avg_speed_kmh: f64,
    pub avg_speed_mph: f64,
    /// All over-limit observations, including those beyond the event log cap.
    pub over_limit_count: usize,
    pub by_hour: [HourTally; 24],
    pub by_day: Vec<DayTally>,
    /// Canonical directions in NORTH, SOUTH, EAST, WEST order.
    pub by_direction: Vec<DirectionTally>,
    pub by_hour_class: [ClassCounts; 24],
    pub top_flows_by_direction: Vec<DirectionFlow>,
    pub class_distribution: Vec<ClassShare>,
    pub risk_by_hour: [u8; 24],
    pub direction_class_bars: Vec<DirectionClassBar>,
    pub high_speed_events: Vec<HighSpeedEvent>,
}

impl WeekAggregate {
    /// Number of vehicles with a class, i.e. the sum of `class_distribution`.
    pub fn total_classified(&self) -> usize {
        self.class_distribution.iter().map(|c| c.value).sum()
    }

    /// Totals for one canonical direction.
    pub fn direction(&self, direction: Direction) -> Option<&DirectionTally> {
        self.by_direction.iter().find(|d| d.direction == direction)
    }
}
