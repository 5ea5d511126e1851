//! Results of a search, folded up the subdivision tree.
//!
//! Request counting and result aggregation are plain folds over the
//! [`SearchOutcome`] values each call returns; nothing is shared between
//! concurrent branches.

use crate::error::FetchError;
use gridsweep_types::place::PlaceRecord;
use gridsweep_types::rect::Rectangle;
use serde::{Deserialize, Serialize};

/// A rectangle whose query failed. Its coverage is unknown.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionFailure {
    pub rectangle: Rectangle,
    pub depth: u32,
    pub error: FetchError,
    /// Records received before the failure, included in the outcome.
    pub records_kept: usize,
}

/// Why a saturated rectangle was not split further.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExhaustReason {
    /// The configured maximum depth was reached.
    MaxDepth,
    /// Children would be smaller than the minimum cell diagonal.
    MinCellSize,
    /// Floating-point precision cannot split the rectangle further.
    Unsplittable,
}

/// A saturated rectangle the termination guard refused to split. Only its
/// capped results are included, so coverage is incomplete there.
#[derive(Debug, Clone, PartialEq)]
pub struct ExhaustedRegion {
    pub rectangle: Rectangle,
    pub depth: u32,
    pub reason: ExhaustReason,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchOutcome {
    pub records: Vec<PlaceRecord>,
    /// Logical requests issued by this call and all of its descendants.
    pub requests_issued: u64,
    /// Rectangles whose results were accepted as complete. Failed and
    /// exhausted rectangles are not leaves.
    pub leaves: u64,
    /// Deepest subdivision level that was queried.
    pub max_depth: u32,
    pub failures: Vec<RegionFailure>,
    pub exhausted: Vec<ExhaustedRegion>,
    /// Rectangles with no results because the sweep was cancelled.
    pub cancelled: Vec<Rectangle>,
}

impl SearchOutcome {
    /// A rectangle whose results are complete.
    pub fn leaf(records: Vec<PlaceRecord>, depth: u32) -> Self {
        Self {
            records,
            requests_issued: 1,
            leaves: 1,
            max_depth: depth,
            ..Self::default()
        }
    }

    /// A rectangle whose query failed part-way; `records` holds what arrived.
    pub fn failed(
        rectangle: Rectangle,
        depth: u32,
        records: Vec<PlaceRecord>,
        error: FetchError,
    ) -> Self {
        let records_kept = records.len();
        Self {
            failures: vec![RegionFailure {
                rectangle,
                depth,
                error,
                records_kept,
            }],
            leaves: 0,
            ..Self::leaf(records, depth)
        }
    }

    /// A saturated rectangle kept as-is because it may not be split.
    pub fn exhausted(
        rectangle: Rectangle,
        depth: u32,
        records: Vec<PlaceRecord>,
        reason: ExhaustReason,
    ) -> Self {
        Self {
            exhausted: vec![ExhaustedRegion {
                rectangle,
                depth,
                reason,
            }],
            leaves: 0,
            ..Self::leaf(records, depth)
        }
    }

    /// A rectangle abandoned on cancellation. `requests_issued` is 1 when its
    /// query was already in flight.
    pub fn cancelled(rectangle: Rectangle, requests_issued: u64) -> Self {
        Self {
            requests_issued,
            cancelled: vec![rectangle],
            ..Self::default()
        }
    }

    /// A saturated rectangle replaced by its children. The parent's own
    /// records are discarded; only its request is counted.
    pub fn subdivided(children: impl IntoIterator<Item = SearchOutcome>) -> Self {
        let mut outcome: SearchOutcome = children.into_iter().collect();
        outcome.requests_issued += 1;
        outcome
    }

    pub fn merge(&mut self, other: SearchOutcome) {
        self.records.extend(other.records);
        self.requests_issued += other.requests_issued;
        self.leaves += other.leaves;
        self.max_depth = self.max_depth.max(other.max_depth);
        self.failures.extend(other.failures);
        self.exhausted.extend(other.exhausted);
        self.cancelled.extend(other.cancelled);
    }

    /// Number of branches whose coverage cannot be trusted.
    pub fn failed_branches(&self) -> usize {
        self.failures.len()
    }

    /// True when every rectangle was either a clean leaf or fully subdivided.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.exhausted.is_empty() && self.cancelled.is_empty()
    }

    pub fn summary(&self) -> SweepSummary {
        SweepSummary {
            records: self.records.len(),
            requests_issued: self.requests_issued,
            leaves: self.leaves,
            max_depth: self.max_depth,
            failed_regions: self.failures.len(),
            exhausted_regions: self.exhausted.len(),
            cancelled_regions: self.cancelled.len(),
        }
    }
}

impl FromIterator<SearchOutcome> for SearchOutcome {
    fn from_iter<I: IntoIterator<Item = SearchOutcome>>(iter: I) -> Self {
        iter.into_iter()
            .fold(SearchOutcome::default(), |mut acc, outcome| {
                acc.merge(outcome);
                acc
            })
    }
}

/// Counters describing a finished sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepSummary {
    pub records: usize,
    pub requests_issued: u64,
    pub leaves: u64,
    pub max_depth: u32,
    pub failed_regions: usize,
    pub exhausted_regions: usize,
    pub cancelled_regions: usize,
}

impl std::fmt::Display for SweepSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} records from {} requests ({} leaves, max depth {}, {} failed, {} exhausted, {} cancelled)",
            self.records,
            self.requests_issued,
            self.leaves,
            self.max_depth,
            self.failed_regions,
            self.exhausted_regions,
            self.cancelled_regions
        )
    }
}
