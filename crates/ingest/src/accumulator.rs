//! Per-chunk partial aggregates produced by a worker (spec.md §4.3) and
//! the coordinator-side pending maps they are merged into (spec.md
//! §4.5). Both accumulator types are plain value types so they can
//! cross the worker/coordinator boundary by value with no shared
//! mutable state.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use store::Owner;

/// Per-directory non-recursive delta produced by one worker for one
/// chunk, keyed by parent path until Pass 2a resolves it to a `dir_id`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirStatsAccumulator {
    pub nr_count: u64,
    pub nr_size: u64,
    pub nr_atime_max: Option<NaiveDateTime>,
    pub nr_dirs: u64,
    pub owner_uid: Owner,
    pub owner_gid: Owner,
}

impl DirStatsAccumulator {
    /// Merges `other` into `self` in place using the rules of spec.md
    /// §4.5 step 2: integer addition, null-safe max, and lattice join.
    /// Commutative and associative, so merge order never affects the
    /// result.
    pub fn merge(&mut self, other: &DirStatsAccumulator) {
        self.nr_count += other.nr_count;
        self.nr_size += other.nr_size;
        self.nr_dirs += other.nr_dirs;
        self.nr_atime_max = max_atime(self.nr_atime_max, other.nr_atime_max);
        self.owner_uid = self.owner_uid.join(other.owner_uid);
        self.owner_gid = self.owner_gid.join(other.owner_gid);
    }
}

/// Null-safe max where `None` (absent) is `<=` any present value.
#[must_use]
pub fn max_atime(a: Option<NaiveDateTime>, b: Option<NaiveDateTime>) -> Option<NaiveDateTime> {
    match (a, b) {
        (None, x) | (x, None) => x,
        (Some(a), Some(b)) => Some(a.max(b)),
    }
}

/// Two ten-element bucket vectors (count, total allocated bytes) for
/// one owner, accumulated across both histogram families.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistAccumulator {
    pub atime_count: [u64; store::BUCKET_COUNT],
    pub atime_size: [u64; store::BUCKET_COUNT],
    pub size_count: [u64; store::BUCKET_COUNT],
    pub size_size: [u64; store::BUCKET_COUNT],
}

impl HistAccumulator {
    /// Records one file's contribution to both histograms.
    pub fn record(&mut self, atime_bucket: usize, size_bucket: usize, allocated: u64) {
        self.atime_count[atime_bucket] += 1;
        self.atime_size[atime_bucket] += allocated;
        self.size_count[size_bucket] += 1;
        self.size_size[size_bucket] += allocated;
    }

    /// Elementwise addition of `other` into `self` across all four
    /// vectors (spec.md §4.5 step 4).
    pub fn merge(&mut self, other: &HistAccumulator) {
        for i in 0..store::BUCKET_COUNT {
            self.atime_count[i] += other.atime_count[i];
            self.atime_size[i] += other.atime_size[i];
            self.size_count[i] += other.size_count[i];
            self.size_size[i] += other.size_size[i];
        }
    }
}

/// One worker's output for one chunk of lines in `filter = "files"`
/// mode (Pass 2a): a map from parent path to its non-recursive delta
/// and a map from uid to its histogram delta. Owner/group summary
/// totals are not pre-aggregated per chunk: Pass 3 derives them with a
/// single `GROUP BY owner_uid` query over the finished `directory_stats`
/// table instead (spec.md §4.7).
#[derive(Debug, Clone, Default)]
pub struct FileChunkResult {
    pub dir_deltas: HashMap<String, DirStatsAccumulator>,
    pub hist_deltas: HashMap<u32, HistAccumulator>,
    pub lines_in_chunk: usize,
    /// Entries with an absent or epoch atime, folded into this chunk's
    /// share of [`crate::IngestReport::timestamp_anomalies`].
    pub timestamp_anomalies: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(secs: i64) -> NaiveDateTime {
        chrono::DateTime::from_timestamp(secs, 0).unwrap().naive_utc()
    }

    #[test]
    fn merge_adds_counts_and_sizes() {
        let mut a = DirStatsAccumulator {
            nr_count: 1,
            nr_size: 100,
            ..Default::default()
        };
        let b = DirStatsAccumulator {
            nr_count: 2,
            nr_size: 50,
            ..Default::default()
        };
        a.merge(&b);
        assert_eq!(a.nr_count, 3);
        assert_eq!(a.nr_size, 150);
    }

    #[test]
    fn merge_takes_max_atime_null_safe() {
        let mut a = DirStatsAccumulator {
            nr_atime_max: Some(dt(100)),
            ..Default::default()
        };
        let b = DirStatsAccumulator {
            nr_atime_max: Some(dt(200)),
            ..Default::default()
        };
        a.merge(&b);
        assert_eq!(a.nr_atime_max, Some(dt(200)));

        let mut c = DirStatsAccumulator {
            nr_atime_max: None,
            ..Default::default()
        };
        c.merge(&DirStatsAccumulator {
            nr_atime_max: Some(dt(5)),
            ..Default::default()
        });
        assert_eq!(c.nr_atime_max, Some(dt(5)));
    }

    #[test]
    fn merge_joins_owner_lattice() {
        let mut a = DirStatsAccumulator {
            owner_uid: Owner::Single(7),
            ..Default::default()
        };
        a.merge(&DirStatsAccumulator {
            owner_uid: Owner::Single(9),
            ..Default::default()
        });
        assert_eq!(a.owner_uid, Owner::Multiple);
    }

    #[test]
    fn merge_is_order_independent() {
        let deltas = [
            DirStatsAccumulator {
                nr_count: 1,
                owner_uid: Owner::Single(1),
                ..Default::default()
            },
            DirStatsAccumulator {
                nr_count: 2,
                owner_uid: Owner::Single(2),
                ..Default::default()
            },
            DirStatsAccumulator {
                nr_count: 3,
                owner_uid: Owner::Single(1),
                ..Default::default()
            },
        ];
        let mut forward = DirStatsAccumulator::default();
        for d in &deltas {
            forward.merge(d);
        }
        let mut backward = DirStatsAccumulator::default();
        for d in deltas.iter().rev() {
            backward.merge(d);
        }
        assert_eq!(forward, backward);
    }

    #[test]
    fn histogram_record_and_merge() {
        let mut h = HistAccumulator::default();
        h.record(0, 1, 4096);
        h.record(0, 1, 8192);
        assert_eq!(h.atime_count[0], 2);
        assert_eq!(h.atime_size[0], 12288);
        assert_eq!(h.size_count[1], 2);

        let mut other = HistAccumulator::default();
        other.record(0, 1, 1000);
        h.merge(&other);
        assert_eq!(h.atime_count[0], 3);
        assert_eq!(h.atime_size[0], 13288);
    }
}
