//! Special-area scheduling decisions
//!
//! An area is due for a tender when its schedule has come round or its
//! accrued volume has reached the area's own threshold, whichever happens
//! first. Whether the accrued volume actually fits a truck class is decided
//! afterwards by the Threshold Table.

use chrono::{DateTime, Utc};

use crate::types::{AreaScheduleUpdate, PickupFrequency, SpecialArea};

/// True when `area` should produce a tender at `now`.
///
/// An area with no `next_tender_date` is only due once its threshold is
/// reached.
pub fn should_generate(area: &SpecialArea, current_volume_tons: f64, now: DateTime<Utc>) -> bool {
    let schedule_due = area.next_tender_date.is_some_and(|next| now >= next);
    let threshold_reached = current_volume_tons >= area.tender_threshold;
    schedule_due || threshold_reached
}

/// Next scheduled generation after one at `generated_at`
pub fn next_tender_date(frequency: PickupFrequency, generated_at: DateTime<Utc>) -> DateTime<Utc> {
    generated_at + frequency.interval()
}

/// Schedule fields to write back once a tender for `area` is persisted
pub fn schedule_after_generation(area: &SpecialArea, now: DateTime<Utc>) -> AreaScheduleUpdate {
    AreaScheduleUpdate {
        last_tender_generated: now,
        next_tender_date: next_tender_date(area.pickup_frequency, now),
    }
}
