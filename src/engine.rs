use crate::utils::{days_between, parse_day_key, IntoDay};
use chrono::{Days, Local, NaiveDate};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Length of the rolling window, reference day included.
pub const WINDOW_DAYS: u32 = 365;

/// Days a marked day stays inside the window after being marked.
const ROLL_OFF_DAYS: u64 = WINDOW_DAYS as u64;

/// Source of the real "today".
pub trait Clock {
    fn today(&self) -> NaiveDate;
}

/// Wall-clock local date.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A clock stuck on one day. Useful for tests and replays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ReferenceDate {
    /// Today according to the engine's clock.
    #[default]
    Real,
    /// A fixed, user-chosen day.
    Simulated(NaiveDate),
}

/// Countdown until the oldest counted day leaves the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RollOff {
    Today,
    InDays(u32),
}

/// Day Accounting Engine.
///
/// Owns the set of marked days and the reference date state, and answers
/// window queries against the trailing 365-day window that ends on (and
/// includes) the reference date. Queries never fail; an empty set simply
/// yields an empty window.
#[derive(Debug, Clone)]
pub struct DayAccountingEngine<C: Clock = SystemClock> {
    marked: HashSet<NaiveDate>,
    reference: ReferenceDate,
    clock: C,
}

impl DayAccountingEngine<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for DayAccountingEngine<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> DayAccountingEngine<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            marked: HashSet::new(),
            reference: ReferenceDate::Real,
            clock,
        }
    }

    /// Builds an engine from previously persisted state.
    pub fn from_parts<I>(clock: C, days: I, simulated: Option<NaiveDate>) -> Self
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        let mut engine = Self::with_clock(clock);
        engine.marked.extend(days);
        engine.set_reference_date(simulated);
        engine
    }

    pub fn add_date(&mut self, date: impl IntoDay) {
        let day = date.into_day();
        if self.marked.insert(day) {
            debug!("Marked {}", day);
        }
    }

    pub fn remove_date(&mut self, date: impl IntoDay) {
        let day = date.into_day();
        if self.marked.remove(&day) {
            debug!("Unmarked {}", day);
        }
    }

    /// Marks the day named by a `YYYY-MM-DD` key. Empty or malformed keys are
    /// ignored. Returns whether the key was usable.
    pub fn add_key(&mut self, key: &str) -> bool {
        match parse_day_key(key) {
            Ok(day) => {
                self.add_date(day);
                true
            }
            Err(_) => false,
        }
    }

    pub fn remove_key(&mut self, key: &str) -> bool {
        match parse_day_key(key) {
            Ok(day) => {
                self.remove_date(day);
                true
            }
            Err(_) => false,
        }
    }

    pub fn clear_all(&mut self) {
        debug!("Clearing {} marked days", self.marked.len());
        self.marked.clear();
    }

    pub fn has(&self, date: impl IntoDay) -> bool {
        self.marked.contains(&date.into_day())
    }

    pub fn total_days(&self) -> usize {
        self.marked.len()
    }

    pub fn marked_set(&self) -> &HashSet<NaiveDate> {
        &self.marked
    }

    /// Every marked day, ascending. Not limited to the window.
    pub fn marked_days(&self) -> Vec<NaiveDate> {
        let mut days: Vec<NaiveDate> = self.marked.iter().copied().collect();
        days.sort_unstable();
        days
    }

    /// `Some` switches to a simulated reference date, `None` returns to the
    /// real current date.
    pub fn set_reference_date(&mut self, date: Option<NaiveDate>) {
        self.reference = match date {
            Some(day) => ReferenceDate::Simulated(day),
            None => ReferenceDate::Real,
        };
        debug!("Reference date is now {:?}", self.reference);
    }

    pub fn reference_state(&self) -> ReferenceDate {
        self.reference
    }

    pub fn simulated_date(&self) -> Option<NaiveDate> {
        match self.reference {
            ReferenceDate::Simulated(day) => Some(day),
            ReferenceDate::Real => None,
        }
    }

    pub fn current_reference_date(&self) -> NaiveDate {
        match self.reference {
            ReferenceDate::Real => self.clock.today(),
            ReferenceDate::Simulated(day) => day,
        }
    }

    pub fn days_in_window(&self) -> Vec<NaiveDate> {
        self.days_in_window_at(self.current_reference_date())
    }

    /// Marked days within `[reference - 364 days, reference]`, ascending.
    pub fn days_in_window_at(&self, reference: NaiveDate) -> Vec<NaiveDate> {
        let window_start = window_start(reference);

        let mut days: Vec<NaiveDate> = self
            .marked
            .iter()
            .copied()
            .filter(|day| *day >= window_start && *day <= reference)
            .collect();
        days.sort_unstable();
        days
    }

    pub fn remaining_days(&self) -> u32 {
        self.remaining_days_at(self.current_reference_date())
    }

    pub fn remaining_days_at(&self, reference: NaiveDate) -> u32 {
        let counted = self.days_in_window_at(reference).len();
        (WINDOW_DAYS as usize).saturating_sub(counted) as u32
    }

    pub fn next_roll_off_date(&self) -> Option<NaiveDate> {
        self.next_roll_off_date_at(self.current_reference_date())
    }

    /// The oldest day in the window plus 365 days, i.e. the first reference
    /// date at which that day no longer counts.
    pub fn next_roll_off_date_at(&self, reference: NaiveDate) -> Option<NaiveDate> {
        let window_start = window_start(reference);
        let oldest = self
            .marked
            .iter()
            .copied()
            .filter(|day| *day >= window_start && *day <= reference)
            .min()?;

        oldest.checked_add_days(Days::new(ROLL_OFF_DAYS))
    }

    pub fn days_until_roll_off(&self) -> Option<RollOff> {
        self.days_until_roll_off_at(self.current_reference_date())
    }

    pub fn days_until_roll_off_at(&self, reference: NaiveDate) -> Option<RollOff> {
        let roll_off = self.next_roll_off_date_at(reference)?;
        let days = days_between(reference, roll_off);

        if days <= 0 {
            Some(RollOff::Today)
        } else {
            Some(RollOff::InDays(u32::try_from(days).unwrap_or(u32::MAX)))
        }
    }
}

/// Oldest day still inside the window that ends on `reference`.
pub fn window_start(reference: NaiveDate) -> NaiveDate {
    reference
        .checked_sub_days(Days::new(u64::from(WINDOW_DAYS - 1)))
        .unwrap_or(NaiveDate::MIN)
}
