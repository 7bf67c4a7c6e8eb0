// src/graph/range.rs
use super::channel::Sample;

/// Inclusive bounds of the samples that fall inside the scope window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IndexRange {
    pub first: usize,
    pub last: usize,
}

impl IndexRange {
    /// Number of samples covered. An inverted range covers nothing.
    pub fn count(&self) -> usize {
        if self.last < self.first {
            0
        } else {
            (self.last - self.first).saturating_add(1)
        }
    }

    /// `(first, last)` as signed indices, `(-1, -1)` when nothing is in range.
    pub fn signed(range: Option<IndexRange>) -> (i64, i64) {
        match range {
            Some(r) => (r.first as i64, r.last as i64),
            None => (-1, -1),
        }
    }
}

/// Finds the inclusive run of `samples` whose value lies in `[x_min, x_max]`.
///
/// `samples` must be sorted by value in non-decreasing order, which holds for
/// the timestamp channel. On plateaus `first` is the smallest index with
/// `value >= x_min` and `last` the largest with `value <= x_max`.
pub fn resolve_index_range(samples: &[Sample], x_min: f32, x_max: f32) -> Option<IndexRange> {
    let (head, tail) = match samples {
        [] => return None,
        [only] => {
            return (x_min <= only.value && only.value <= x_max)
                .then_some(IndexRange { first: 0, last: 0 });
        }
        [head, .., tail] => (head, tail),
    };
    if tail.value < x_min || x_max < head.value {
        return None;
    }

    let first = if x_min <= head.value {
        0
    } else {
        samples.partition_point(|s| s.value < x_min)
    };

    // Everything before `first` is already below x_min, so the search for the
    // upper edge can start there.
    let last = if tail.value <= x_max {
        samples.len() - 1
    } else {
        first + samples[first..].partition_point(|s| s.value <= x_max) - 1
    };

    // A window narrower than the gap between two samples selects nothing.
    (first <= last).then_some(IndexRange { first, last })
}
