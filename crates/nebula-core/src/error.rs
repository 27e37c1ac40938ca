// ── Sync error types ──
//
// A run fails either because the primary could not be read, or because one
// or more replicas could not be updated. Replica failures are aggregated so
// a single run result names every affected appliance.

use std::fmt;

use thiserror::Error;

/// One replica that could not be brought up to date.
#[derive(Debug)]
pub struct ReplicaFailure {
    /// Replica base address.
    pub target: String,
    /// Last error seen for this replica.
    pub source: nebula_api::Error,
}

impl fmt::Display for ReplicaFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.target, self.source)
    }
}

#[derive(Debug, Error)]
pub enum SyncError {
    /// The primary could not be authenticated, read or exported. Replicas
    /// that had already failed before the pass stopped are kept.
    #[error("primary {target} failed: {source}{}", replica_suffix(.failures))]
    Primary {
        target: String,
        #[source]
        source: nebula_api::Error,
        failures: Vec<ReplicaFailure>,
    },

    /// At least one replica failed; the others kept their changes.
    #[error("{} replica(s) failed: {}", .failures.len(), join_failures(.failures))]
    Replicas { failures: Vec<ReplicaFailure> },
}

impl SyncError {
    /// Replica addresses that failed in this run.
    pub fn failed_targets(&self) -> Vec<&str> {
        let (Self::Primary { failures, .. } | Self::Replicas { failures }) = self;
        failures.iter().map(|f| f.target.as_str()).collect()
    }
}

fn replica_suffix(failures: &[ReplicaFailure]) -> String {
    if failures.is_empty() {
        String::new()
    } else {
        format!(" ({} replica(s) failed: {})", failures.len(), join_failures(failures))
    }
}

fn join_failures(failures: &[ReplicaFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
