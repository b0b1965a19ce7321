// SPDX-License-Identifier: GPL-3.0-or-later
use chrono::{DateTime, Utc};
use tunelens_domain::{TimeDimension, TimeWindow, Timestamped};

use crate::window::resolve_window;

/// Keep the records whose timestamp lies inside `window`, bounds included.
/// Records without a resolvable timestamp are dropped.
pub fn filter_in_window<T>(records: &[T], window: &TimeWindow) -> Vec<T>
where
    T: Timestamped + Clone,
{
    records
        .iter()
        .filter(|record| {
            record
                .timestamp()
                .is_some_and(|instant| window.contains(instant))
        })
        .cloned()
        .collect()
}

pub fn filter_by_window_at<T>(records: &[T], dimension: TimeDimension, now: DateTime<Utc>) -> Vec<T>
where
    T: Timestamped + Clone,
{
    filter_in_window(records, &resolve_window(dimension, now))
}

pub fn filter_by_window<T>(records: &[T], dimension: TimeDimension) -> Vec<T>
where
    T: Timestamped + Clone,
{
    filter_by_window_at(records, dimension, Utc::now())
}
