// SPDX-License-Identifier: GPL-3.0-or-later

//! Data-quality checks layered over the aggregation functions.
//!
//! Aggregation tolerates malformed records; this module reports them so a
//! caller can decide what to show.

use serde::Serialize;
use tunelens_domain::{Artist, Track, Validate, ValidationError};

use crate::genres::ratio;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Track,
    Artist,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataQualityIssue {
    pub record: RecordKind,
    pub id: String,
    pub field: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DataQualityReport {
    pub valid_tracks: usize,
    pub invalid_tracks: usize,
    pub valid_artists: usize,
    pub invalid_artists: usize,
    pub issues: Vec<DataQualityIssue>,
}

impl DataQualityReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Share of valid records across tracks and artists, 0.0-1.0.
    pub fn valid_ratio(&self) -> f64 {
        let valid = self.valid_tracks + self.valid_artists;
        let total = valid + self.invalid_tracks + self.invalid_artists;
        ratio(valid as f64, total as f64)
    }
}

pub fn data_quality_report(tracks: &[Track], artists: &[Artist]) -> DataQualityReport {
    let mut report = DataQualityReport::default();

    for track in tracks {
        match track.validate() {
            Ok(()) => report.valid_tracks += 1,
            Err(errors) => {
                report.invalid_tracks += 1;
                push_issues(&mut report, RecordKind::Track, track.id.as_str(), errors);
            }
        }
    }

    for artist in artists {
        match artist.validate() {
            Ok(()) => report.valid_artists += 1,
            Err(errors) => {
                report.invalid_artists += 1;
                push_issues(&mut report, RecordKind::Artist, artist.id.as_str(), errors);
            }
        }
    }

    report
}

fn push_issues(
    report: &mut DataQualityReport,
    record: RecordKind,
    id: &str,
    errors: Vec<ValidationError>,
) {
    report
        .issues
        .extend(errors.into_iter().map(|error| DataQualityIssue {
            record,
            id: id.to_string(),
            field: error.field,
            message: error.message,
        }));
}
