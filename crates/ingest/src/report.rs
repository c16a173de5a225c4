/// Counters for conditions that are recovered locally rather than
/// aborting the run (spec.md §7: `ParseSkip`, `HostLookupMiss`,
/// `TimestampAnomaly`, and the anomalous-attribution drop of §4.5
/// step 1 / S6).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Total lines read from the input.
    pub lines_total: u64,
    /// Directory entries discovered in Pass 1.
    pub directories: u64,
    /// File entries whose parent directory was known and so were
    /// attributed to it in Pass 2a.
    pub files_attributed: u64,
    /// File entries whose parent directory was never announced as a
    /// directory entry; their delta is dropped (§4.5 step 1, S6).
    pub files_dropped_anomalous: u64,
    /// Entries with an absent or epoch atime, treated as absent for
    /// `max_atime` purposes.
    pub timestamp_anomalies: u64,
    /// Distinct uids/gids that failed host passwd/group resolution in
    /// Pass 3.
    pub host_lookup_misses: u64,
}

impl IngestReport {
    /// True when every file entry was attributed to a known parent.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.files_dropped_anomalous == 0
    }
}
