//! Weekly aggregation of parsed sensor readings.
//!
//! Fetches every configured day export, parses it into observations tagged with
//! the day index, and folds the combined set into a single immutable
//! [`WeekAggregate`] snapshot for the dashboard views.

pub mod error;
pub mod pipeline;
pub mod risk;
pub mod types;
pub mod utility;
pub mod week;

pub use error::SourceLoadError;
pub use pipeline::{aggregate_week, load_day, load_observations};
pub use types::WeekAggregate;
pub use week::{HIGH_SPEED_EVENT_CAP, aggregate_observations};
