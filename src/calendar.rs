//! Month grids for the calendar view.
//!
//! The grids are plain data derived from the engine. Rendering only reads
//! engine state; changes go through [`crate::gesture`].

use crate::engine::{Clock, DayAccountingEngine};
use crate::utils::{first_day_of_month, last_day_of_month, shift_month_start};
use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// Months shown before the reference month by default.
pub const DEFAULT_MONTHS_BEFORE: u32 = 12;
/// Months shown after the reference month by default.
pub const DEFAULT_MONTHS_AFTER: u32 = 11;

/// Longest span accepted on either side of the reference month.
pub const MAX_MONTH_SPAN: u32 = 120;

pub const WEEKDAY_HEADERS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarCell {
    pub date: NaiveDate,
    /// False for leading/trailing days borrowed from adjacent months.
    pub in_month: bool,
    pub marked: bool,
    pub today: bool,
}

impl CalendarCell {
    fn render(&self) -> String {
        if !self.in_month {
            return "    ".to_string();
        }

        let day = self.date.day();
        match (self.marked, self.today) {
            (true, true) => format!("{{{:>2}}}", day),
            (true, false) => format!("[{:>2}]", day),
            (false, true) => format!("({:>2})", day),
            (false, false) => format!(" {:>2} ", day),
        }
    }
}

/// One month laid out in Sunday-first weeks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarMonth {
    pub year: i32,
    pub month: u32,
    pub weeks: Vec<[CalendarCell; 7]>,
}

impl CalendarMonth {
    pub fn build<C: Clock>(engine: &DayAccountingEngine<C>, year: i32, month: u32) -> Option<Self> {
        let first = first_day_of_month(year, month)?;
        let last = last_day_of_month(year, month)?;
        let today = engine.current_reference_date();

        let lead = u64::from(first.weekday().num_days_from_sunday());
        let mut week_start = first.checked_sub_days(Days::new(lead))?;
        let mut weeks = Vec::new();

        while week_start <= last {
            let cells: Vec<CalendarCell> = week_start
                .iter_days()
                .take(7)
                .map(|date| {
                    let in_month = date.year() == year && date.month() == month;
                    CalendarCell {
                        date,
                        in_month,
                        marked: in_month && engine.has(date),
                        today: in_month && date == today,
                    }
                })
                .collect();
            weeks.push(cells.try_into().ok()?);

            week_start = week_start.checked_add_days(Days::new(7))?;
        }

        Some(Self { year, month, weeks })
    }

    /// e.g. `January 2024`
    pub fn title(&self) -> String {
        first_day_of_month(self.year, self.month)
            .map(|first| first.format("%B %Y").to_string())
            .unwrap_or_default()
    }

    /// In-month cells only, in date order.
    pub fn days(&self) -> impl Iterator<Item = &CalendarCell> {
        self.weeks.iter().flatten().filter(|cell| cell.in_month)
    }

    pub fn render(&self) -> String {
        let mut lines = vec![self.title()];
        lines.push(
            WEEKDAY_HEADERS
                .iter()
                .map(|header| format!("{:<4}", header))
                .collect::<Vec<_>>()
                .join(" ")
                .trim_end()
                .to_string(),
        );

        for week in &self.weeks {
            let row = week
                .iter()
                .map(CalendarCell::render)
                .collect::<Vec<_>>()
                .join(" ");
            lines.push(row.trim_end().to_string());
        }

        lines.join("\n")
    }
}

/// Months from `months_before` before the reference month through
/// `months_after` after it. Both spans are capped at [`MAX_MONTH_SPAN`].
pub fn build_calendar<C: Clock>(
    engine: &DayAccountingEngine<C>,
    months_before: u32,
    months_after: u32,
) -> Vec<CalendarMonth> {
    let reference = engine.current_reference_date();
    let before = months_before.min(MAX_MONTH_SPAN) as i32;
    let after = months_after.min(MAX_MONTH_SPAN) as i32;

    (-before..=after)
        .filter_map(|offset| shift_month_start(reference, offset))
        .filter_map(|start| CalendarMonth::build(engine, start.year(), start.month()))
        .collect()
}

pub fn render_calendar(months: &[CalendarMonth]) -> String {
    months
        .iter()
        .map(CalendarMonth::render)
        .collect::<Vec<_>>()
        .join("\n\n")
}
