use once_cell::sync::Lazy;
use plano_ids::{NodeId, ToolId};
use std::collections::HashSet;
use std::sync::Mutex;
use thiserror::Error;

/// Fatal configuration faults. Expected control flow (illegal placements,
/// unresolvable chains) never goes through this type; those surface as
/// `Legality` values and `None` results.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A required collaborator was not supplied for an operation that
    /// cannot proceed without it. Fatal for the session.
    #[error("required collaborator missing: {0}")]
    MissingCollaborator(&'static str),

    /// The catalog has no entry for a tool an operation was asked to
    /// place. Fatal for the session.
    #[error("unknown tool {0}")]
    UnknownTool(ToolId),

    #[error("arena slot already occupied for node {0}")]
    ArenaSlotOccupied(NodeId),

    #[error("stale handle for node {0}")]
    StaleHandle(NodeId),
}

static REPORTED: Lazy<Mutex<HashSet<String>>> = Lazy::new(|| Mutex::new(HashSet::new()));

/// Report a fatal misconfiguration once per session. Repeat reports for
/// the same key are suppressed so a broken collaborator does not flood
/// the log on every evaluation pass.
pub fn report_fatal(key: &str, err: &CoreError) {
    let mut seen = match REPORTED.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    if seen.insert(key.to_string()) {
        log::error!("fatal configuration error [{}]: {}", key, err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_fatal_is_idempotent() {
        let err = CoreError::MissingCollaborator("catalog");
        report_fatal("test-catalog", &err);
        report_fatal("test-catalog", &err);
        let seen = REPORTED.lock().unwrap();
        assert!(seen.contains("test-catalog"));
    }
}
