// SPDX-License-Identifier: GPL-3.0-or-later
use chrono::{DateTime, Duration, Months, TimeZone, Utc};
use tunelens_domain::{TimeDimension, TimeWindow};

/// Year the all-time window starts at, regardless of `now`.
pub const ALL_TIME_EPOCH_YEAR: i32 = 2006;

pub fn all_time_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(ALL_TIME_EPOCH_YEAR, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Resolve a dimension to the window ending at `now`.
///
/// Month-based dimensions subtract from the month field, so one month before
/// March 31st is the last day of February, not March 1st/2nd. No clamping or
/// timezone normalization is applied to `now`.
pub fn resolve_window(dimension: TimeDimension, now: DateTime<Utc>) -> TimeWindow {
    let start = match dimension {
        TimeDimension::Week => now.checked_sub_signed(Duration::days(7)),
        TimeDimension::Month => now.checked_sub_months(Months::new(1)),
        TimeDimension::ThreeMonths => now.checked_sub_months(Months::new(3)),
        TimeDimension::SixMonths => now.checked_sub_months(Months::new(6)),
        TimeDimension::Year => now.checked_sub_months(Months::new(12)),
        TimeDimension::AllTime => Some(all_time_start()),
    }
    // Only reachable for instants near the representable minimum.
    .unwrap_or_else(all_time_start);

    TimeWindow::new(start, now)
}

pub fn resolve_window_now(dimension: TimeDimension) -> TimeWindow {
    resolve_window(dimension, Utc::now())
}
