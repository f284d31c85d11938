use crate::engine::{Clock, DayAccountingEngine, SystemClock};
use crate::error::Result;
use crate::store::{KeyValueStore, PersistenceStore, StoredState};
use crate::summary::WindowSummary;
use crate::utils::IntoDay;
use chrono::{DateTime, Days, NaiveDate, Utc};
use log::{info, warn};
use rand::Rng;

/// Number of random days marked by [`UsaDayTracker::load_sample_data`].
pub const SAMPLE_DAY_COUNT: usize = 120;

/// A [`DayAccountingEngine`] bound to durable storage.
///
/// Every mutation is followed by a save. Saving is best effort: a failed write
/// is logged and the in-memory state stays authoritative.
pub struct UsaDayTracker<S: KeyValueStore, C: Clock = SystemClock> {
    engine: DayAccountingEngine<C>,
    store: PersistenceStore<S>,
    last_saved: Option<DateTime<Utc>>,
}

impl<S: KeyValueStore> UsaDayTracker<S, SystemClock> {
    pub fn open(store: PersistenceStore<S>) -> Self {
        Self::open_with_clock(store, SystemClock)
    }
}

impl<S: KeyValueStore, C: Clock> UsaDayTracker<S, C> {
    pub fn open_with_clock(store: PersistenceStore<S>, clock: C) -> Self {
        let StoredState {
            days,
            simulated_date,
        } = store.load();

        info!(
            "Opened tracker with {} marked days{}",
            days.len(),
            simulated_date
                .map(|day| format!(", simulating {}", day))
                .unwrap_or_default()
        );

        Self {
            engine: DayAccountingEngine::from_parts(clock, days, simulated_date),
            store,
            last_saved: None,
        }
    }

    /// Final save, then hands back the underlying store.
    pub fn close(mut self) -> Result<S> {
        self.save()?;
        Ok(self.store.into_inner())
    }

    pub fn engine(&self) -> &DayAccountingEngine<C> {
        &self.engine
    }

    pub fn summary(&self) -> WindowSummary {
        WindowSummary::from_engine(&self.engine)
    }

    /// Timestamp of the last successful save made by this tracker.
    pub fn last_saved(&self) -> Option<DateTime<Utc>> {
        self.last_saved
    }

    pub fn add_date(&mut self, date: impl IntoDay) {
        self.engine.add_date(date);
        self.persist();
    }

    pub fn remove_date(&mut self, date: impl IntoDay) {
        self.engine.remove_date(date);
        self.persist();
    }

    /// String-keyed add. Unusable keys change nothing and trigger no save.
    pub fn add_key(&mut self, key: &str) -> bool {
        let applied = self.engine.add_key(key);
        if applied {
            self.persist();
        }
        applied
    }

    pub fn remove_key(&mut self, key: &str) -> bool {
        let applied = self.engine.remove_key(key);
        if applied {
            self.persist();
        }
        applied
    }

    /// Irreversible. Callers confirm with the user first.
    pub fn clear_all(&mut self) {
        self.engine.clear_all();
        self.persist();
    }

    pub fn set_reference_date(&mut self, date: Option<NaiveDate>) {
        self.engine.set_reference_date(date);
        self.persist();
    }

    /// Marks [`SAMPLE_DAY_COUNT`] random days from the 365 days ending on the
    /// current reference date.
    pub fn load_sample_data<R: Rng>(&mut self, rng: &mut R) {
        let reference = self.engine.current_reference_date();
        for _ in 0..SAMPLE_DAY_COUNT {
            let days_ago: u64 = rng.gen_range(0..365);
            if let Some(day) = reference.checked_sub_days(Days::new(days_ago)) {
                self.engine.add_date(day);
            }
        }
        self.persist();
    }

    pub fn save(&mut self) -> Result<()> {
        let now = Utc::now();
        let state = StoredState {
            days: self.engine.marked_set().clone(),
            simulated_date: self.engine.simulated_date(),
        };

        self.store.save(&state, now)?;
        self.last_saved = Some(now);
        info!("Saved at {}", now.format("%Y-%m-%d %H:%M:%S UTC"));
        Ok(())
    }

    fn persist(&mut self) {
        if let Err(e) = self.save() {
            warn!("Could not save marked days: {}", e);
        }
    }
}
