/// Limits used when deriving alerts and rankings.
///
/// Defaults match the values the reports have always used; settings files
/// and `PIPETIMER_*` environment variables can override them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thresholds {
    /// A run longer than this (milliseconds) gets a long-run alert.
    pub long_run_threshold_ms: i64,
    /// Entries kept in each notable-run list.
    pub notable_runs: usize,
    /// Characters of a run's error message quoted in its failure alert.
    pub error_excerpt_chars: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            long_run_threshold_ms: 2 * 60 * 60 * 1000,
            notable_runs: 3,
            error_excerpt_chars: 200,
        }
    }
}
