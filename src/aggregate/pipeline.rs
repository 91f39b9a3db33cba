use crate::aggregate::error::SourceLoadError;
use crate::aggregate::types::WeekAggregate;
use crate::aggregate::week::aggregate_observations;
use crate::config::DaySource;
use crate::fetch::TextSource;
use crate::parser::{Observation, parse_source};
use futures::future::try_join_all;
use tracing::{error, info};

/// Fetches every source, then aggregates the combined observations.
///
/// Fetches run concurrently. The first failure aborts the whole run and the
/// remaining in-flight fetches are dropped; no partial aggregate is produced.
#[tracing::instrument(skip(sources, fetcher), fields(sources = sources.len()))]
pub async fn aggregate_week<S: TextSource + ?Sized>(
    sources: &[DaySource],
    speed_limit_kmh: f64,
    fetcher: &S,
) -> Result<WeekAggregate, SourceLoadError> {
    let observations = load_observations(sources, fetcher).await?;
    let aggregate = aggregate_observations(&observations, sources, speed_limit_kmh);

    info!(
        total_vehicles = aggregate.total_vehicles,
        over_limit = aggregate.over_limit_count,
        avg_speed_kmh = aggregate.avg_speed_kmh,
        "Week aggregated"
    );

    Ok(aggregate)
}

/// Fetches and parses every source, tagging rows with their day index.
///
/// The result keeps source-list order regardless of fetch completion order.
pub async fn load_observations<S: TextSource + ?Sized>(
    sources: &[DaySource],
    fetcher: &S,
) -> Result<Vec<Observation>, SourceLoadError> {
    let fetches = sources.iter().map(|day| load_day(day, fetcher));
    let per_day = try_join_all(fetches).await?;
    Ok(per_day.into_iter().flatten().collect())
}

/// Fetches and parses a single day source.
pub async fn load_day<S: TextSource + ?Sized>(
    day: &DaySource,
    fetcher: &S,
) -> Result<Vec<Observation>, SourceLoadError> {
    let text = fetcher
        .fetch_text(&day.file_identifier)
        .await
        .map_err(|source| {
            error!(identifier = %day.file_identifier, error = %source, "Source fetch failed");
            SourceLoadError {
                identifier: day.file_identifier.clone(),
                source,
            }
        })?;

    Ok(parse_source(&text, day.day_index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Result, anyhow};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::collections::HashMap;
    use std::time::Duration;

    /// In-memory source; identifiers without an entry fail.
    struct MapSource {
        files: HashMap<String, String>,
        delays: HashMap<String, u64>,
    }

    impl MapSource {
        fn new(files: &[(&str, &str)]) -> Self {
            Self {
                files: files
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                delays: HashMap::new(),
            }
        }

        fn with_delay(mut self, identifier: &str, millis: u64) -> Self {
            self.delays.insert(identifier.to_string(), millis);
            self
        }
    }

    #[async_trait]
    impl TextSource for MapSource {
        async fn fetch_text(&self, identifier: &str) -> Result<String> {
            if let Some(&millis) = self.delays.get(identifier) {
                tokio::time::sleep(Duration::from_millis(millis)).await;
            }
            self.files
                .get(identifier)
                .cloned()
                .ok_or_else(|| anyhow!("404 Not Found"))
        }
    }

    fn days(n: usize) -> Vec<DaySource> {
        (0..n)
            .map(|i| DaySource {
                day_index: i,
                calendar_label: format!("Day {i}"),
                file_identifier: format!("day{i}.csv"),
                date: NaiveDate::from_ymd_opt(2017, 9, i as u32 + 5).unwrap(),
            })
            .collect()
    }

    const HEADER: &str = "timestamp,class,entry,exit,lane,speed";

    #[tokio::test]
    async fn test_two_day_week() {
        let day0 = format!("{HEADER}\n-,car,NORTH,-,-,70\n-,truck,SOUTH,-,-,90");
        let day1 = format!("{HEADER}\n-,bus,EAST,-,-,85");
        let source = MapSource::new(&[("day0.csv", day0.as_str()), ("day1.csv", day1.as_str())]);

        let agg = aggregate_week(&days(2), 80.0, &source).await.unwrap();

        assert_eq!(agg.total_vehicles, 3);
        assert_eq!(agg.over_limit_count, 2);
        assert_eq!(agg.by_day[0].count, 2);
        assert_eq!(agg.by_day[1].count, 1);
        let percents: Vec<_> = agg.class_distribution.iter().map(|c| c.percent).collect();
        assert_eq!(percents, vec![33.3, 33.3, 33.3]);
    }

    #[tokio::test]
    async fn test_failed_source_aborts_week() {
        let day = format!("{HEADER}\n-,car,NORTH,-,-,70");
        let files: Vec<(String, String)> = (0..7)
            .filter(|&i| i != 3)
            .map(|i| (format!("day{i}.csv"), day.clone()))
            .collect();
        let refs: Vec<(&str, &str)> = files.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        let source = MapSource::new(&refs);

        let err = aggregate_week(&days(7), 80.0, &source).await.unwrap_err();

        assert_eq!(err.identifier, "day3.csv");
        assert!(err.to_string().contains("day3.csv"));
    }

    #[tokio::test]
    async fn test_observations_keep_source_order() {
        let day0 = format!("{HEADER}\n-,car,NORTH,-,-,90");
        let day1 = format!("{HEADER}\n-,bus,EAST,-,-,95");
        let source = MapSource::new(&[("day0.csv", day0.as_str()), ("day1.csv", day1.as_str())])
            .with_delay("day0.csv", 50);

        let rows = load_observations(&days(2), &source).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].day_index, 0);
        assert_eq!(rows[1].day_index, 1);

        let agg = aggregate_week(&days(2), 80.0, &source).await.unwrap();
        assert_eq!(agg.high_speed_events[0].direction, "Northbound");
    }

    #[tokio::test]
    async fn test_short_rows_are_dropped_silently() {
        let day0 = format!("{HEADER}\n-,car,NORTH,-,-,70\n-,car,NORTH,-\n-,bus,WEST,-,-,60");
        let source = MapSource::new(&[("day0.csv", day0.as_str())]);

        let agg = aggregate_week(&days(1), 80.0, &source).await.unwrap();
        assert_eq!(agg.total_vehicles, 2);
    }

    #[tokio::test]
    async fn test_no_sources_is_empty_week() {
        let source = MapSource::new(&[]);
        let agg = aggregate_week(&[], 80.0, &source).await.unwrap();

        assert_eq!(agg.total_vehicles, 0);
        assert!(agg.by_day.is_empty());
    }

    #[tokio::test]
    async fn test_works_through_boxed_source() {
        let day0 = format!("{HEADER}\n-,car,NORTH,-,-,70");
        let source: Box<dyn TextSource> = Box::new(MapSource::new(&[("day0.csv", day0.as_str())]));

        let agg = aggregate_week(&days(1), 80.0, &source).await.unwrap();
        assert_eq!(agg.total_vehicles, 1);
    }
}
