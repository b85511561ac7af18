//! Optimistic concurrency token for store commits.

/// Optimistic concurrency expectation for a commit.
///
/// The store version increases by one per successful commit. A writer that
/// validated its decision against version `v` commits with `Exact(v)`; any
/// intervening commit makes the check fail and the writer must re-decide.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExpectedVersion {
    /// Skip version checking (blind writes that re-validate inside the store).
    Any,
    /// Require the store to be at an exact version.
    Exact(u64),
}

impl ExpectedVersion {
    pub fn matches(self, actual: u64) -> bool {
        match self {
            ExpectedVersion::Any => true,
            ExpectedVersion::Exact(v) => v == actual,
        }
    }
}
