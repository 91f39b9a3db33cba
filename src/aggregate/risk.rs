use super::types::HourTally;

/// Highest risk level.
pub const MAX_RISK_LEVEL: u8 = 4;

/// Buckets an hour's volume relative to the busiest hour into a risk level.
///
/// | count / max | Level |
/// |-------------|-------|
/// | 1.00        | 4     |
/// | >= 0.75     | 3     |
/// | >= 0.50     | 2     |
/// | >= 0.25     | 1     |
/// | < 0.25      | 0     |
pub fn risk_level(count: usize, max_count: usize) -> u8 {
    let max_count = max_count.max(1);
    let level = (count as f64 / max_count as f64 * f64::from(MAX_RISK_LEVEL)).floor();
    level.clamp(0.0, f64::from(MAX_RISK_LEVEL)) as u8
}

/// Risk level for every hour of the day against that day's peak hour.
pub fn risk_by_hour(by_hour: &[HourTally; 24]) -> [u8; 24] {
    let max_count = by_hour.iter().map(|h| h.count).max().unwrap_or(0);
    std::array::from_fn(|h| risk_level(by_hour[h].count, max_count))
}
