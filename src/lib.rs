//! # USA Day Tracker
//!
//! Counts presence days ("USA days") inside a rolling 365-day window and
//! reports when the oldest counted day rolls off.
//!
//! ## Core Concepts
//!
//! - **Marked days**: a set of calendar days, stored at day granularity
//! - **Reference date**: the right edge of the window, either today or a simulated day
//! - **Rolling window**: the 365 days ending on and including the reference date
//! - **Roll-off**: the oldest day in the window plus 365 days, when the count next drops
//! - **Persistence**: a JSON document in a key-value store, with a legacy list format still readable
//!
//! ## Example
//!
//! ```rust,ignore
//! use usa_day_tracker::*;
//! use chrono::NaiveDate;
//!
//! let config = TrackerConfig {
//!     storage_path: "usa-days.json".into(),
//!     ..TrackerConfig::default()
//! };
//!
//! let mut tracker = open_tracker(&config).unwrap();
//! tracker.add_date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
//! tracker.set_reference_date(NaiveDate::from_ymd_opt(2024, 6, 1));
//!
//! println!("{}", tracker.summary());
//! let months = build_calendar(tracker.engine(), config.months_before, config.months_after);
//! println!("{}", render_calendar(&months));
//! ```

pub mod calendar;
pub mod config;
pub mod engine;
pub mod error;
pub mod gesture;
pub mod schema;
pub mod store;
pub mod summary;
pub mod tracker;
pub mod utils;

pub use calendar::{build_calendar, render_calendar, CalendarCell, CalendarMonth};
pub use config::TrackerConfig;
pub use engine::{
    window_start, Clock, DayAccountingEngine, FixedClock, ReferenceDate, RollOff, SystemClock,
    WINDOW_DAYS,
};
pub use error::{DayTrackerError, Result};
pub use gesture::{toggle, DaySelection, DragGesture, DragMode};
pub use schema::SavedData;
pub use store::{
    JsonFileStore, KeyValueStore, MemoryStore, PersistenceStore, StoredState, LEGACY_KEY,
    PRIMARY_KEY,
};
pub use summary::WindowSummary;
pub use tracker::UsaDayTracker;
pub use utils::IntoDay;

use log::info;

/// Validates `config` and opens a file-backed tracker on the real clock.
pub fn open_tracker(config: &TrackerConfig) -> Result<UsaDayTracker<JsonFileStore>> {
    open_tracker_with_clock(config, SystemClock)
}

pub fn open_tracker_with_clock<C: Clock>(
    config: &TrackerConfig,
    clock: C,
) -> Result<UsaDayTracker<JsonFileStore, C>> {
    config.validate()?;
    info!("Using storage file {}", config.storage_path.display());

    Ok(UsaDayTracker::open_with_clock(
        config.persistence_store(),
        clock,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_open_tracker_rejects_invalid_config() {
        let config = TrackerConfig {
            legacy_key: String::new(),
            ..TrackerConfig::default()
        };
        assert!(matches!(
            open_tracker(&config),
            Err(DayTrackerError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_end_to_end_in_memory() {
        let mut tracker = UsaDayTracker::open_with_clock(
            PersistenceStore::new(MemoryStore::new()),
            FixedClock(d(2024, 6, 1)),
        );

        let mut drag = DragGesture::new();
        drag.start(&mut tracker, d(2024, 5, 1));
        for day in 2..=5 {
            drag.enter(&mut tracker, d(2024, 5, day));
        }
        drag.stop();
        toggle(&mut tracker, d(2024, 5, 3));

        let summary = tracker.summary();
        assert_eq!(summary.days_in_window, 4);
        assert_eq!(summary.remaining_days, 361);
        assert_eq!(summary.next_roll_off, Some(d(2025, 5, 1)));

        let months = build_calendar(tracker.engine(), 0, 0);
        assert_eq!(months.len(), 1);
        assert_eq!(months[0].days().filter(|c| c.marked).count(), 0);

        let months = build_calendar(tracker.engine(), 1, 0);
        assert_eq!(months[0].days().filter(|c| c.marked).count(), 4);
    }
}
