use crate::engine::{Clock, DayAccountingEngine, ReferenceDate, RollOff, WINDOW_DAYS};
use crate::utils::us_short_date;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Snapshot of the window statistics shown next to the calendar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowSummary {
    pub reference_date: NaiveDate,
    pub reference: ReferenceDate,
    pub days_in_window: usize,
    pub remaining_days: u32,
    /// All marked days, including those outside the window.
    pub total_days: usize,
    pub next_roll_off: Option<NaiveDate>,
    pub roll_off: Option<RollOff>,
    /// Share of the window that is used, 0.0 to 100.0.
    pub timeline_percentage: f64,
}

impl WindowSummary {
    pub fn from_engine<C: Clock>(engine: &DayAccountingEngine<C>) -> Self {
        Self::at(engine, engine.current_reference_date())
    }

    pub fn at<C: Clock>(engine: &DayAccountingEngine<C>, reference_date: NaiveDate) -> Self {
        let days_in_window = engine.days_in_window_at(reference_date).len();

        Self {
            reference_date,
            reference: engine.reference_state(),
            days_in_window,
            remaining_days: engine.remaining_days_at(reference_date),
            total_days: engine.total_days(),
            next_roll_off: engine.next_roll_off_date_at(reference_date),
            roll_off: engine.days_until_roll_off_at(reference_date),
            timeline_percentage: days_in_window as f64 / WINDOW_DAYS as f64 * 100.0,
        }
    }

    /// `"12 days"`, `"Today"`, or `"-"` when nothing is in the window.
    pub fn roll_off_label(&self) -> String {
        match self.roll_off {
            Some(RollOff::InDays(days)) => format!("{} days", days),
            Some(RollOff::Today) => "Today".to_string(),
            None => "-".to_string(),
        }
    }

    pub fn simulation_status(&self) -> String {
        match self.reference {
            ReferenceDate::Simulated(day) => format!("Simulating: {}", us_short_date(day)),
            ReferenceDate::Real => "Using actual current date".to_string(),
        }
    }
}

impl fmt::Display for WindowSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.simulation_status())?;
        writeln!(f, "Days in window:  {}", self.days_in_window)?;
        writeln!(f, "Days remaining:  {}", self.remaining_days)?;
        writeln!(f, "Total days:      {}", self.total_days)?;
        writeln!(f, "Next roll-off:   {}", self.roll_off_label())?;
        write!(f, "Window used:     {:.1}%", self.timeline_percentage)
    }
}
