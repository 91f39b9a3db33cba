use crate::aggregate::risk::risk_by_hour;
use crate::aggregate::types::{
    ClassCounts, ClassShare, DayTally, DirectionClassBar, DirectionFlow, DirectionTally,
    HighSpeedEvent, HourTally, WeekAggregate,
};
use crate::aggregate::utility::{bound_label, kmh_to_mph, mean, percent, round1};
use crate::config::DaySource;
use crate::parser::{Direction, Observation, VehicleClass};

/// Maximum number of high-speed events kept in the event log.
pub const HIGH_SPEED_EVENT_CAP: usize = 100;

/// Day of month is not zero-padded: `5-09-2017 08:00`.
const EVENT_TIMESTAMP_FORMAT: &str = "%-d-%m-%Y %H:%M";

/// Folds observations from the given days into a [`WeekAggregate`].
///
/// `speed_limit_kmh` is inclusive: a reading at exactly the limit is over it.
/// Observation order only matters for which high-speed events survive the cap.
pub fn aggregate_observations(
    observations: &[Observation],
    days: &[DaySource],
    speed_limit_kmh: f64,
) -> WeekAggregate {
    let mut by_hour = [HourTally::default(); 24];
    let mut by_hour_class = [ClassCounts::default(); 24];
    let mut by_day: Vec<DayTally> = days
        .iter()
        .map(|d| DayTally {
            day_index: d.day_index,
            label: d.calendar_label.clone(),
            count: 0,
            over_limit: 0,
        })
        .collect();
    let mut by_direction: Vec<DirectionTally> =
        Direction::ALL.iter().map(|&d| DirectionTally::new(d)).collect();
    let mut by_class = ClassCounts::default();

    let mut speed_sum_kmh = 0.0;
    let mut over_limit_count = 0usize;
    let mut high_speed_events = Vec::new();

    for obs in observations {
        let hour = obs.hour.min(23);
        let over_limit = obs.speed_kmh >= speed_limit_kmh;
        let day = day_slot(&mut by_day, obs.day_index);

        speed_sum_kmh += obs.speed_kmh;
        by_hour[hour].count += 1;
        day.count += 1;
        by_class.add(obs.class);
        by_hour_class[hour].add(obs.class);

        if over_limit {
            by_hour[hour].over_limit += 1;
            day.over_limit += 1;
            over_limit_count += 1;

            if high_speed_events.len() < HIGH_SPEED_EVENT_CAP {
                let day_source = days.iter().find(|d| d.day_index == obs.day_index);
                high_speed_events.push(high_speed_event(obs, day_source, speed_limit_kmh));
            }
        }

        if let Some(direction) = obs.direction() {
            if let Some(tally) = by_direction.iter_mut().find(|t| t.direction == direction) {
                tally.count += 1;
                tally.speed_sum_kmh += obs.speed_kmh;
                tally.classes.add(obs.class);
            }
        }
    }

    let total_vehicles = observations.len();
    let avg_speed_kmh = mean(speed_sum_kmh, total_vehicles);

    WeekAggregate {
        speed_limit_kmh,
        total_vehicles,
        avg_speed_kmh: round1(avg_speed_kmh),
        avg_speed_mph: kmh_to_mph(avg_speed_kmh),
        over_limit_count,
        top_flows_by_direction: rank_flows(&by_direction),
        class_distribution: class_distribution(&by_class),
        risk_by_hour: risk_by_hour(&by_hour),
        direction_class_bars: direction_class_bars(&by_direction),
        by_hour,
        by_day,
        by_direction,
        by_hour_class,
        high_speed_events,
    }
}

/// Finds the tally for `day_index`, appending one for days outside the list.
fn day_slot(by_day: &mut Vec<DayTally>, day_index: usize) -> &mut DayTally {
    let pos = match by_day.iter().position(|d| d.day_index == day_index) {
        Some(pos) => pos,
        None => {
            by_day.push(DayTally {
                day_index,
                label: format!("Day {}", day_index + 1),
                count: 0,
                over_limit: 0,
            });
            by_day.len() - 1
        }
    };
    &mut by_day[pos]
}

fn high_speed_event(
    obs: &Observation,
    day: Option<&DaySource>,
    speed_limit_kmh: f64,
) -> HighSpeedEvent {
    let timestamp = day
        .and_then(|d| d.date.and_hms_opt(obs.hour as u32, 0, 0))
        .map(|dt| dt.format(EVENT_TIMESTAMP_FORMAT).to_string())
        .unwrap_or_else(|| obs.timestamp.clone());
    let confidence = (70.0 + (obs.speed_kmh - speed_limit_kmh) / 2.0)
        .round()
        .clamp(0.0, 99.0) as u8;

    HighSpeedEvent {
        timestamp,
        kind: "Speeding",
        direction: bound_label(&obs.entry),
        speed_kmh: round1(obs.speed_kmh),
        confidence,
    }
}

/// Ranks directions by volume, busiest first. Ties keep canonical order.
fn rank_flows(by_direction: &[DirectionTally]) -> Vec<DirectionFlow> {
    let mut flows: Vec<DirectionFlow> = by_direction
        .iter()
        .map(|t| DirectionFlow {
            rank: 0,
            direction: t.direction,
            name: bound_label(t.direction.as_str()),
            volume: t.count,
            avg_speed_kmh: round1(mean(t.speed_sum_kmh, t.count)),
            speed_sum_kmh: t.speed_sum_kmh,
            classes: t.classes,
        })
        .collect();

    // sort_by is stable
    flows.sort_by(|a, b| b.volume.cmp(&a.volume));
    for (i, flow) in flows.iter_mut().enumerate() {
        flow.rank = i + 1;
    }
    flows
}

fn class_distribution(by_class: &ClassCounts) -> Vec<ClassShare> {
    let present: Vec<(VehicleClass, usize)> = VehicleClass::ALL
        .iter()
        .map(|&c| (c, by_class.get(c)))
        .filter(|&(_, value)| value > 0)
        .collect();
    let total: usize = present.iter().map(|&(_, value)| value).sum();

    present
        .into_iter()
        .map(|(class, value)| ClassShare {
            class,
            name: class.name(),
            value,
            percent: percent(value, total),
        })
        .collect()
}

fn direction_class_bars(by_direction: &[DirectionTally]) -> Vec<DirectionClassBar> {
    by_direction
        .iter()
        .flat_map(|t| {
            VehicleClass::ALL.into_iter().filter_map(move |class| {
                let value = t.classes.get(class);
                (value > 0).then(|| DirectionClassBar {
                    label: format!("{} {}", t.direction.name(), class.name()),
                    direction: t.direction,
                    class,
                    value,
                })
            })
        })
        .collect()
}
