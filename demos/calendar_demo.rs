use chrono::{Days, NaiveDate};
use rand::rngs::StdRng;
use rand::SeedableRng;
use usa_day_tracker::*;

fn main() {
    println!("🗓️  USA Day Tracker Demo\n");

    let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
    let mut tracker = UsaDayTracker::open_with_clock(
        PersistenceStore::new(MemoryStore::new()),
        FixedClock(today),
    );

    // Random presence over the past year
    let mut rng = StdRng::seed_from_u64(42);
    tracker.load_sample_data(&mut rng);

    // A week-long trip marked with a single drag
    let mut drag = DragGesture::new();
    let trip_start = today - Days::new(20);
    drag.start(&mut tracker, trip_start);
    for offset in 1..7 {
        drag.enter(&mut tracker, trip_start + Days::new(offset));
    }
    drag.stop();

    println!("📊 Status:");
    println!("{}\n", tracker.summary());

    println!("🔮 Three months from now:");
    tracker.set_reference_date(Some(today + Days::new(90)));
    println!("{}\n", tracker.summary());
    tracker.set_reference_date(None);

    let months = build_calendar(tracker.engine(), 2, 0);
    println!("{}", render_calendar(&months));
    println!("\nLegend: [dd] marked, (dd) today, {{dd}} marked today");

    match tracker.close() {
        Ok(store) => {
            let saved = store.get(PRIMARY_KEY).ok().flatten().unwrap_or_default();
            println!("\n💾 Saved document is {} bytes", saved.len());
        }
        Err(e) => eprintln!("Save failed: {}", e),
    }
}
