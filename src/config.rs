//! Deployment configuration: which day exports make up the observation week.

use anyhow::{Result, bail};
use chrono::{Datelike, NaiveDate};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Speed limit applied when none is configured.
pub const DEFAULT_SPEED_LIMIT_KMH: f64 = 80.0;

/// One day of sensor data and where to load it from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaySource {
    pub day_index: usize,
    pub calendar_label: String,
    pub file_identifier: String,
    pub date: NaiveDate,
}

/// Which subset of the configured days a report covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    Daily,
    Weekly,
    Monthly,
}

/// Day list and defaults for one deployment.
///
/// Stored as JSON on disk:
/// ```json
/// {
///   "speed_limit_kmh": 80.0,
///   "daily_index": 6,
///   "days": [
///     { "day_index": 0, "calendar_label": "Sept 5",
///       "file_identifier": "september5.csv", "date": "2017-09-05" }
///   ]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentConfig {
    #[serde(default = "default_speed_limit")]
    pub speed_limit_kmh: f64,
    /// Day used for daily reports; the last configured day when absent.
    #[serde(default)]
    pub daily_index: Option<usize>,
    pub days: Vec<DaySource>,
}

fn default_speed_limit() -> f64 {
    DEFAULT_SPEED_LIMIT_KMH
}

/// Accepts only finite, positive speed limits.
pub fn validate_speed_limit(speed_limit_kmh: f64) -> Result<f64> {
    if !speed_limit_kmh.is_finite() || speed_limit_kmh <= 0.0 {
        bail!("speed limit must be a positive number of km/h, got {speed_limit_kmh}");
    }
    Ok(speed_limit_kmh)
}

impl DeploymentConfig {
    /// Loads and validates the config from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: DeploymentConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// The reference deployment: one intersection, September 5 to 11, 2017.
    pub fn reference() -> Self {
        const FILES: [(u32, &str); 7] = [
            (5, "september5.csv"),
            (6, "september6.csv"),
            (7, "september7.csv"),
            (8, "september 8.csv"),
            (9, "september 9.csv"),
            (10, "september10.csv"),
            (11, "september11.csv"),
        ];

        let days = FILES
            .iter()
            .enumerate()
            .map(|(day_index, &(day, file))| DaySource {
                day_index,
                calendar_label: format!("Sept {day}"),
                file_identifier: file.to_string(),
                date: NaiveDate::from_ymd_opt(2017, 9, day).unwrap_or_default(),
            })
            .collect();

        Self {
            speed_limit_kmh: DEFAULT_SPEED_LIMIT_KMH,
            daily_index: Some(6),
            days,
        }
    }

    /// Checks that day indices are unique and the daily index refers to a day.
    pub fn validate(&self) -> Result<()> {
        if self.days.is_empty() {
            bail!("deployment config has no days");
        }
        for (i, day) in self.days.iter().enumerate() {
            if self.days[..i].iter().any(|d| d.day_index == day.day_index) {
                bail!("duplicate day_index {}", day.day_index);
            }
        }
        if let Some(idx) = self.daily_index {
            if self.day(idx).is_none() {
                bail!("daily_index {idx} does not match any configured day");
            }
        }
        validate_speed_limit(self.speed_limit_kmh)?;
        Ok(())
    }

    /// Looks up a day by its index.
    pub fn day(&self, day_index: usize) -> Option<&DaySource> {
        self.days.iter().find(|d| d.day_index == day_index)
    }

    /// Selects the day sources a report of `kind` aggregates over.
    pub fn select(&self, kind: ReportKind) -> Vec<DaySource> {
        match kind {
            ReportKind::Daily => self
                .daily_index
                .and_then(|idx| self.day(idx))
                .or_else(|| self.days.last())
                .into_iter()
                .cloned()
                .collect(),
            ReportKind::Weekly => self.days.clone(),
            ReportKind::Monthly => {
                let Some(last) = self.days.last() else {
                    return Vec::new();
                };
                self.days
                    .iter()
                    .filter(|d| d.date.year() == last.date.year() && d.date.month() == last.date.month())
                    .cloned()
                    .collect()
            }
        }
    }
}

impl Default for DeploymentConfig {
    fn default() -> Self {
        Self::reference()
    }
}
