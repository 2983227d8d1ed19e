use plano_ids::NodeId;
use serde::{Deserialize, Serialize};

/// How a set of generated placements is judged as a whole.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SatisfyPolicy {
    /// Stop at the first success; an empty result is acceptable
    FirstOrNone,
    /// Stop at the first success; no success fails the whole set
    FirstOrFail,
    /// Keep whatever succeeded
    #[default]
    AllOrPartial,
    /// Every slot must succeed or the whole set rolls back
    AllOrFail,
}

/// Result of one placement slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlacementOutcome {
    /// A new node was synthesized and logged
    Placed(NodeId),
    /// An already-present matching node covers the slot
    ExistingMatch(NodeId),
    Failed,
}

impl PlacementOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, PlacementOutcome::Failed)
    }

    pub fn node(&self) -> Option<NodeId> {
        match self {
            PlacementOutcome::Placed(id) | PlacementOutcome::ExistingMatch(id) => Some(*id),
            PlacementOutcome::Failed => None,
        }
    }
}

/// Verdict of the policy evaluator over a finished set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PolicyDecision {
    Accept,
    /// Discard every placement made in this pass
    Rollback,
}

/// Aggregate report handed back to the rule that drove the pass.
#[derive(Clone, Debug, Default)]
pub struct PlacementReport {
    pub outcomes: Vec<PlacementOutcome>,
    pub decision: Option<PolicyDecision>,
}

impl PlacementReport {
    pub fn accepted(&self) -> bool {
        self.decision == Some(PolicyDecision::Accept)
    }

    pub fn successes(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }
}

/// Whether generation may stop after the first success under `policy`.
pub fn stops_at_first_success(policy: SatisfyPolicy) -> bool {
    matches!(
        policy,
        SatisfyPolicy::FirstOrNone | SatisfyPolicy::FirstOrFail
    )
}

/// Judge a finished outcome set against the policy.
pub fn evaluate(policy: SatisfyPolicy, outcomes: &[PlacementOutcome]) -> PolicyDecision {
    let successes = outcomes.iter().filter(|o| o.is_success()).count();
    let failures = outcomes.len() - successes;

    match policy {
        SatisfyPolicy::FirstOrNone | SatisfyPolicy::AllOrPartial => PolicyDecision::Accept,
        SatisfyPolicy::FirstOrFail => {
            if successes > 0 {
                PolicyDecision::Accept
            } else {
                PolicyDecision::Rollback
            }
        }
        SatisfyPolicy::AllOrFail => {
            if failures == 0 {
                PolicyDecision::Accept
            } else {
                PolicyDecision::Rollback
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placed() -> PlacementOutcome {
        PlacementOutcome::Placed(NodeId::new())
    }

    #[test]
    fn test_first_or_none_accepts_empty() {
        assert_eq!(evaluate(SatisfyPolicy::FirstOrNone, &[]), PolicyDecision::Accept);
        assert_eq!(
            evaluate(SatisfyPolicy::FirstOrNone, &[PlacementOutcome::Failed]),
            PolicyDecision::Accept
        );
    }

    #[test]
    fn test_first_or_fail_needs_one_success() {
        assert_eq!(
            evaluate(SatisfyPolicy::FirstOrFail, &[PlacementOutcome::Failed]),
            PolicyDecision::Rollback
        );
        assert_eq!(
            evaluate(SatisfyPolicy::FirstOrFail, &[PlacementOutcome::Failed, placed()]),
            PolicyDecision::Accept
        );
    }

    #[test]
    fn test_all_or_fail_rejects_partial() {
        assert_eq!(
            evaluate(SatisfyPolicy::AllOrFail, &[placed(), PlacementOutcome::Failed]),
            PolicyDecision::Rollback
        );
        assert_eq!(
            evaluate(SatisfyPolicy::AllOrFail, &[placed(), placed()]),
            PolicyDecision::Accept
        );
    }

    #[test]
    fn test_existing_match_counts_as_success() {
        let outcome = PlacementOutcome::ExistingMatch(NodeId::new());
        assert!(outcome.is_success());
        assert_eq!(
            evaluate(SatisfyPolicy::AllOrFail, &[outcome]),
            PolicyDecision::Accept
        );
    }
}
