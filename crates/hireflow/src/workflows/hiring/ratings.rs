//! Folds ledger ratings into counts, means and star distributions.

use std::collections::BTreeMap;

use serde::Serialize;

use super::domain::{HireRecord, Principal, Rating};

/// One bar of the star histogram, e.g. `{"label": "5 Star", "value": 2}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RatingBucket {
    pub label: String,
    pub value: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingSummary {
    /// Every hire naming the subject, rated or not.
    pub hire_count: usize,
    pub rating_count: usize,
    /// `0.0` when nothing has been rated yet.
    pub average_rating: f64,
    /// Highest star first. Star values that never occur are omitted.
    pub distribution: Vec<RatingBucket>,
}

/// Aggregates the ratings `subject` received across `records`.
///
/// Records that do not name the subject are ignored, so callers may pass a wider slice.
pub fn aggregate(subject: Principal, records: &[HireRecord]) -> RatingSummary {
    let mut hire_count = 0;
    let mut counts: BTreeMap<u8, usize> = BTreeMap::new();
    let mut sum = 0u64;

    for record in records.iter().filter(|record| subject.is_party_to(record)) {
        hire_count += 1;
        if let Some(score) = record.rating_received_by(subject) {
            *counts.entry(score).or_default() += 1;
            sum += u64::from(score);
        }
    }

    let rating_count: usize = counts.values().sum();
    let average_rating = if rating_count == 0 {
        0.0
    } else {
        sum as f64 / rating_count as f64
    };

    let distribution = (Rating::MIN..=Rating::MAX)
        .rev()
        .filter_map(|star| {
            counts.get(&star).map(|&value| RatingBucket {
                label: format!("{star} Star"),
                value,
            })
        })
        .collect();

    RatingSummary {
        hire_count,
        rating_count,
        average_rating,
        distribution,
    }
}
