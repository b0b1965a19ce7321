// SPDX-License-Identifier: GPL-3.0-or-later

//! Pure, synchronous derivations over listening records.
//!
//! Everything in this crate is a function of its inputs and, where a time
//! window is involved, an explicit `now`. The `*_at` variants take `now`
//! directly; the plain variants read the wall clock.

pub mod filter;
pub mod genres;
pub mod quality;
pub mod stats;
pub mod top;
pub mod window;

pub use filter::{filter_by_window, filter_by_window_at, filter_in_window};
pub use genres::{analyze_genres, analyze_genres_with_tracks};
pub use quality::{data_quality_report, DataQualityIssue, DataQualityReport, RecordKind};
pub use stats::{compute_stats, compute_stats_at, RECENT_WINDOW_DAYS};
pub use top::{most_played_artists, most_played_tracks, top_by_popularity};
pub use window::{all_time_start, resolve_window, resolve_window_now, ALL_TIME_EPOCH_YEAR};
