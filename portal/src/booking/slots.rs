//! Candidate slot generation.
//!
//! Slots are not stored. A doctor's candidate times for a date are derived
//! from the weekday alone, then narrowed by whatever has been booked.

use std::collections::HashSet;

use chrono::{Datelike, Days, NaiveDate, Weekday};

use shared::types::SlotTime;

/// Half-hour slots from `start_hour:00`, `count` of them.
fn band(start_hour: u32, count: usize) -> Vec<SlotTime> {
    (0..count)
        .filter_map(|i| {
            let minutes = start_hour * 60 + 30 * i as u32;
            SlotTime::from_hm(minutes / 60, minutes % 60)
        })
        .collect()
}

fn morning() -> Vec<SlotTime> {
    band(9, 6)
}

fn afternoon() -> Vec<SlotTime> {
    band(13, 6)
}

fn evening() -> Vec<SlotTime> {
    band(16, 5)
}

/// Candidate start times for `doctor_id` on `date`, in chronological order.
///
/// Weekdays are indexed from Monday = 0. Even-indexed weekdays get the full
/// day. Odd-indexed ones lose the first morning slot and the last two
/// evening slots. The weekend is morning-heavy.
///
/// Every doctor currently shares the same banding; `doctor_id` is part of
/// the signature so per-doctor schedules can slot in without changing
/// callers.
pub fn candidate_slots(_doctor_id: i64, date: NaiveDate) -> Vec<SlotTime> {
    let weekday = date.weekday();
    match weekday {
        Weekday::Sun => morning().split_off(2),
        Weekday::Sat => {
            let mut slots = morning();
            slots.extend(afternoon().into_iter().take(2));
            slots
        }
        _ if weekday.num_days_from_monday() % 2 == 0 => {
            let mut slots = morning();
            slots.extend(afternoon());
            slots.extend(evening());
            slots
        }
        _ => {
            let mut slots = morning().split_off(1);
            slots.extend(afternoon());
            slots.extend(evening().into_iter().take(3));
            slots
        }
    }
}

/// `candidates` minus `booked`, keeping candidate order.
pub fn available_slots(candidates: Vec<SlotTime>, booked: &HashSet<SlotTime>) -> Vec<SlotTime> {
    candidates
        .into_iter()
        .filter(|slot| !booked.contains(slot))
        .collect()
}

/// Bookable dates: tomorrow through `today + days`.
pub fn booking_window(today: NaiveDate, days: u32) -> Vec<NaiveDate> {
    (1..=u64::from(days))
        .filter_map(|offset| today.checked_add_days(Days::new(offset)))
        .collect()
}
