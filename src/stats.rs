//! Single-day summaries used by the per-day views.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::aggregate::utility::{bound_label, kmh_to_mph, mean, percent, round1};
use crate::config::DaySource;
use crate::parser::{Direction, Observation};

/// Headline numbers for one day export, appended as a CSV row.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DayStats {
    pub generated_at: DateTime<Utc>,
    pub day_index: usize,
    pub calendar_label: String,
    pub speed_limit_kmh: f64,
    pub total_vehicles: usize,
    pub avg_speed_kmh: f64,
    pub avg_speed_mph: f64,
    pub over_limit: usize,
}

impl DayStats {
    pub fn from_observations(observations: &[Observation], speed_limit_kmh: f64) -> Self {
        let total_vehicles = observations.len();
        let speed_sum: f64 = observations.iter().map(|o| o.speed_kmh).sum();
        let over_limit = observations
            .iter()
            .filter(|o| o.speed_kmh >= speed_limit_kmh)
            .count();
        let avg_kmh = mean(speed_sum, total_vehicles);

        DayStats {
            generated_at: Utc::now(),
            speed_limit_kmh,
            total_vehicles,
            avg_speed_kmh: round1(avg_kmh),
            avg_speed_mph: kmh_to_mph(avg_kmh),
            over_limit,
            ..Default::default()
        }
    }

    /// Set the day this summary describes
    pub fn with_day(mut self, day: &DaySource) -> Self {
        self.day_index = day.day_index;
        self.calendar_label = day.calendar_label.clone();
        self
    }

    /// Share of vehicles at or over the limit, percent to one decimal.
    pub fn over_limit_pct(&self) -> f64 {
        percent(self.over_limit, self.total_vehicles)
    }
}

/// Average speed and volume for one approach direction on one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectionSpeed {
    pub id: &'static str,
    pub label: String,
    pub avg_speed_kmh: f64,
    pub avg_speed_mph: f64,
    pub volume: usize,
}

/// Per-direction speed summary, always all four canonical directions in order.
/// Non-canonical entries are ignored.
pub fn direction_speeds(observations: &[Observation]) -> Vec<DirectionSpeed> {
    Direction::ALL
        .iter()
        .map(|&direction| {
            let (sum, volume) = observations
                .iter()
                .filter(|o| o.direction() == Some(direction))
                .fold((0.0, 0usize), |(sum, n), o| (sum + o.speed_kmh, n + 1));
            let avg_kmh = mean(sum, volume);

            DirectionSpeed {
                id: direction.id(),
                label: bound_label(direction.as_str()),
                avg_speed_kmh: round1(avg_kmh),
                avg_speed_mph: kmh_to_mph(avg_kmh),
                volume,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_source;
    use chrono::NaiveDate;

    const DAY: &str = "timestamp,class,entry,exit,lane,speed\n\
                       05-09-2017 07:00,car,NORTH,a,b,60\n\
                       05-09-2017 07:05,car,north,a,b,70\n\
                       05-09-2017 07:10,truck,EAST,a,b,90\n\
                       05-09-2017 07:15,bus,SIDE,a,b,20\n\
                       05-09-2017 07:20,bus,EAST,a\n";

    #[test]
    fn test_over_limit_pct_rounds_to_one_decimal() {
        let stats = DayStats {
            total_vehicles: 3,
            over_limit: 1,
            ..Default::default()
        };
        assert_eq!(stats.over_limit_pct(), 33.3);
    }

    #[test]
    fn test_day_stats() {
        let rows = parse_source(DAY, 0);
        let day = DaySource {
            day_index: 0,
            calendar_label: "Sept 5".to_string(),
            file_identifier: "september5.csv".to_string(),
            date: NaiveDate::from_ymd_opt(2017, 9, 5).unwrap(),
        };
        let stats = DayStats::from_observations(&rows, 80.0).with_day(&day);

        assert_eq!(stats.total_vehicles, 4);
        assert_eq!(stats.avg_speed_kmh, 60.0);
        assert_eq!(stats.avg_speed_mph, 37.3);
        assert_eq!(stats.over_limit, 1);
        assert_eq!(stats.over_limit_pct(), 25.0);
        assert_eq!(stats.calendar_label, "Sept 5");
    }

    #[test]
    fn test_day_stats_empty() {
        let stats = DayStats::from_observations(&[], 80.0);
        assert_eq!(stats.total_vehicles, 0);
        assert_eq!(stats.avg_speed_kmh, 0.0);
        assert_eq!(stats.over_limit_pct(), 0.0);
    }

    #[test]
    fn test_direction_speeds() {
        let rows = parse_source(DAY, 0);
        let speeds = direction_speeds(&rows);

        assert_eq!(speeds.len(), 4);
        assert_eq!(speeds[0].id, "north");
        assert_eq!(speeds[0].label, "Northbound");
        assert_eq!(speeds[0].volume, 2);
        assert_eq!(speeds[0].avg_speed_kmh, 65.0);
        assert_eq!(speeds[0].avg_speed_mph, 40.4);
        assert_eq!(speeds[1].volume, 0);
        assert_eq!(speeds[1].avg_speed_kmh, 0.0);
        assert_eq!(speeds[2].volume, 1);
        assert_eq!(speeds[3].id, "west");
    }
}
