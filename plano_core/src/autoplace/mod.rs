//! Collision-driven auto-placement: span filling along a parent's
//! bounds and single placements that recover from blocked spots.

mod collision_add;
mod policy;
mod span_fill;

pub use collision_add::{auto_add_by_collision, CollisionAddParams};
pub use policy::{
    evaluate, stops_at_first_success, PlacementOutcome, PlacementReport, PolicyDecision,
    SatisfyPolicy,
};
pub use span_fill::auto_add_by_span;
