//! Click and drag handling for calendar cells.

use crate::engine::{Clock, DayAccountingEngine};
use crate::store::KeyValueStore;
use crate::tracker::UsaDayTracker;
use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Serialize};

/// Something whose marked days a gesture can change.
pub trait DaySelection {
    fn is_marked(&self, date: NaiveDate) -> bool;
    fn mark(&mut self, date: NaiveDate);
    fn unmark(&mut self, date: NaiveDate);
}

impl<C: Clock> DaySelection for DayAccountingEngine<C> {
    fn is_marked(&self, date: NaiveDate) -> bool {
        self.has(date)
    }

    fn mark(&mut self, date: NaiveDate) {
        self.add_date(date);
    }

    fn unmark(&mut self, date: NaiveDate) {
        self.remove_date(date);
    }
}

impl<S: KeyValueStore, C: Clock> DaySelection for UsaDayTracker<S, C> {
    fn is_marked(&self, date: NaiveDate) -> bool {
        self.engine().has(date)
    }

    fn mark(&mut self, date: NaiveDate) {
        self.add_date(date);
    }

    fn unmark(&mut self, date: NaiveDate) {
        self.remove_date(date);
    }
}

/// Single click: flips the day's membership. Returns the new state.
pub fn toggle<T: DaySelection + ?Sized>(target: &mut T, date: NaiveDate) -> bool {
    if target.is_marked(date) {
        target.unmark(date);
        false
    } else {
        target.mark(date);
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DragMode {
    Select,
    Deselect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragGesture {
    #[default]
    Idle,
    Dragging {
        mode: DragMode,
        start: NaiveDate,
    },
}

impl DragGesture {
    pub fn new() -> Self {
        Self::Idle
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self, Self::Dragging { .. })
    }

    pub fn mode(&self) -> Option<DragMode> {
        match self {
            Self::Dragging { mode, .. } => Some(*mode),
            Self::Idle => None,
        }
    }

    /// Pointer pressed on `date`. The mode is fixed by that day's state and
    /// applied to it immediately.
    pub fn start<T: DaySelection + ?Sized>(&mut self, target: &mut T, date: NaiveDate) -> DragMode {
        let mode = if target.is_marked(date) {
            DragMode::Deselect
        } else {
            DragMode::Select
        };
        debug!("Drag started on {} in {:?} mode", date, mode);

        *self = Self::Dragging { mode, start: date };
        apply(target, mode, date);
        mode
    }

    /// Pointer entered `date`. Returns whether the day changed.
    pub fn enter<T: DaySelection + ?Sized>(&mut self, target: &mut T, date: NaiveDate) -> bool {
        match self {
            Self::Dragging { mode, .. } => apply(target, *mode, date),
            Self::Idle => false,
        }
    }

    /// Pointer released or left the calendar.
    pub fn stop(&mut self) {
        if let Self::Dragging { start, .. } = self {
            debug!("Drag from {} finished", start);
        }
        *self = Self::Idle;
    }
}

fn apply<T: DaySelection + ?Sized>(target: &mut T, mode: DragMode, date: NaiveDate) -> bool {
    match (mode, target.is_marked(date)) {
        (DragMode::Select, false) => {
            target.mark(date);
            true
        }
        (DragMode::Deselect, true) => {
            target.unmark(date);
            true
        }
        _ => false,
    }
}
