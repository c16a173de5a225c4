//! Fixed histogram bucket boundaries (spec.md §6), frozen as part of the
//! external contract: changing a boundary is a breaking format version.

/// Number of bucket slots in each histogram, matching the persisted
/// schema's `bucket_index IN [0, 9]` primary key range.
pub const BUCKET_COUNT: usize = 10;

/// Access-age bucket upper bounds in days since `scan_date`, one entry
/// per populated bucket (indexes 0..=5); indexes 6..=9 are reserved.
/// `< 30`, `30-180`, `180-365`, `365-1095`, `1095-1825`, `>= 1825`.
pub const ATIME_BUCKET_BOUNDS_DAYS: [i64; 5] = [30, 180, 365, 3 * 365, 5 * 365];

/// Index of the oldest access-age bucket; used as the degraded-mode
/// classification when no `scan_date` is available and for entries
/// with no atime at all.
pub const OLDEST_ATIME_BUCKET: usize = ATIME_BUCKET_BOUNDS_DAYS.len();

const MIB: u64 = 1024 * 1024;
const GIB: u64 = 1024 * MIB;

/// File-size (`allocated`, bytes) bucket upper bounds, indexes 0..=8;
/// index 9 is the open-ended terminal bucket (`>= 64 GiB`), folding the
/// three highest boundaries spec.md's source lists (`64-128 GiB`,
/// `128-256 GiB`, `>= 256 GiB`) since the persisted schema caps
/// `bucket_index` at 9.
pub const SIZE_BUCKET_BOUNDS_BYTES: [u64; 9] = [
    128 * MIB,
    512 * MIB,
    GIB,
    2 * GIB,
    4 * GIB,
    8 * GIB,
    16 * GIB,
    32 * GIB,
    64 * GIB,
];

/// Classifies an age in days since `scan_date` into `0..=9`. Callers
/// without a `scan_date` must pass [`OLDEST_ATIME_BUCKET`] directly
/// rather than calling this (see the degraded-mode note in §4.5).
#[must_use]
pub fn classify_atime_bucket(age_days: i64) -> usize {
    ATIME_BUCKET_BOUNDS_DAYS
        .iter()
        .position(|&bound| age_days < bound)
        .unwrap_or(OLDEST_ATIME_BUCKET)
}

/// Classifies an `allocated` byte count into `0..=9`.
#[must_use]
pub fn classify_size_bucket(allocated_bytes: u64) -> usize {
    SIZE_BUCKET_BOUNDS_BYTES
        .iter()
        .position(|&bound| allocated_bytes < bound)
        .unwrap_or(SIZE_BUCKET_BOUNDS_BYTES.len())
}
