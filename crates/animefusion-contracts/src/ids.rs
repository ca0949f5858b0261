use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, SubsecRound, Utc};

static LAST_TIME_ID: AtomicI64 = AtomicI64::new(0);

/// Current time at the millisecond precision records are stored with, so a
/// value survives a save and reload unchanged.
pub fn now_millis() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Epoch-millisecond id for `at`, bumped so ids stay strictly increasing
/// (and therefore unique) within the process.
pub fn time_id(at: DateTime<Utc>) -> String {
    let wanted = at.timestamp_millis();
    let mut last = LAST_TIME_ID.load(Ordering::SeqCst);
    loop {
        let next = wanted.max(last + 1);
        match LAST_TIME_ID.compare_exchange(last, next, Ordering::SeqCst, Ordering::SeqCst) {
            Ok(_) => return next.to_string(),
            Err(current) => last = current,
        }
    }
}
