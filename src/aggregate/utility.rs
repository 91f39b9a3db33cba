/// Kilometres per mile, as used for every km/h to mph conversion.
pub const KM_PER_MILE: f64 = 1.609;

/// Rounds to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Converts km/h to mph, rounded to one decimal place.
pub fn kmh_to_mph(kmh: f64) -> f64 {
    round1(kmh / KM_PER_MILE)
}

/// Mean of `sum` over `count` items; 0.0 when there are none.
pub fn mean(sum: f64, count: usize) -> f64 {
    if count == 0 { 0.0 } else { sum / count as f64 }
}

/// Share of `part` in `total` as a percentage rounded to one decimal.
pub fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        round1(part as f64 / total as f64 * 100.0)
    }
}

/// Twelve-hour clock label for an hour of day: `12 AM`, `1 AM`, ..., `11 PM`.
pub fn hour_label(hour: usize) -> String {
    match hour {
        0 => "12 AM".to_string(),
        12 => "12 PM".to_string(),
        h if h < 12 => format!("{h} AM"),
        h => format!("{} PM", h - 12),
    }
}

/// `NORTH` -> `Northbound`. Applied verbatim to non-canonical entries too.
pub fn bound_label(entry: &str) -> String {
    let mut chars = entry.chars();
    match chars.next() {
        Some(first) => format!("{first}{}bound", chars.as_str().to_lowercase()),
        None => "bound".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round1() {
        assert_eq!(round1(33.333), 33.3);
        assert_eq!(round1(66.66), 66.7);
        assert_eq!(round1(0.0), 0.0);
    }

    #[test]
    fn test_kmh_to_mph() {
        assert_eq!(kmh_to_mph(80.0), 49.7);
        assert_eq!(kmh_to_mph(0.0), 0.0);
    }

    #[test]
    fn test_mean_empty() {
        assert_eq!(mean(10.0, 0), 0.0);
        assert_eq!(mean(10.0, 4), 2.5);
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(1, 3), 33.3);
        assert_eq!(percent(2, 3), 66.7);
        assert_eq!(percent(5, 0), 0.0);
    }

    #[test]
    fn test_hour_label() {
        assert_eq!(hour_label(0), "12 AM");
        assert_eq!(hour_label(1), "1 AM");
        assert_eq!(hour_label(11), "11 AM");
        assert_eq!(hour_label(12), "12 PM");
        assert_eq!(hour_label(13), "1 PM");
        assert_eq!(hour_label(23), "11 PM");
    }

    #[test]
    fn test_bound_label() {
        assert_eq!(bound_label("NORTH"), "Northbound");
        assert_eq!(bound_label("WEST"), "Westbound");
        assert_eq!(bound_label("NE"), "Nebound");
        assert_eq!(bound_label(""), "bound");
    }
}
