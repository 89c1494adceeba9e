use super::report::Granularity;
use super::resolver::TieBreakPolicy;

pub const DEFAULT_WORKERS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanConfig {
    pub workers: usize,
    pub tie_break: TieBreakPolicy,
    /// Extra lines of redacted context captured around each call.
    pub context_lines: usize,
    pub granularity: Granularity,
}

impl ScanConfig {
    pub fn new() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            tie_break: TieBreakPolicy::default(),
            context_lines: 0,
            granularity: Granularity::default(),
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_tie_break(mut self, tie_break: TieBreakPolicy) -> Self {
        self.tie_break = tie_break;
        self
    }

    pub fn with_context_lines(mut self, context_lines: usize) -> Self {
        self.context_lines = context_lines;
        self
    }

    pub fn with_granularity(mut self, granularity: Granularity) -> Self {
        self.granularity = granularity;
        self
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self::new()
    }
}
