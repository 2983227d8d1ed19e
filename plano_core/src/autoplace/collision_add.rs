use crate::arena::Scene;
use crate::autoplace::policy::PlacementOutcome;
use crate::chain;
use crate::collab::{Collaborators, ToolSpec};
use crate::collision;
use crate::context::EvaluationContext;
use crate::error::{report_fatal, CoreError};
use crate::geometry;
use crate::node::Axis;
use crate::resolver::{QueryMode, Resolver};
use plano_ids::NodeId;
use plano_structs::{AxisAngle, Vector3};

const NUDGE_EPS: f32 = 1e-4;

/// One collision-driven placement request.
#[derive(Clone, Debug)]
pub struct CollisionAddParams {
    pub tool: plano_ids::ToolId,
    pub parent: NodeId,
    /// Requested position in the parent's local frame
    pub position: Vector3,
    pub rotation: AxisAngle,
    /// Allow nudging the placement sideways when the requested spot is
    /// blocked
    pub force_fit: bool,
    /// Furthest a force-fit nudge may move the placement per axis
    pub max_force_fit_offset: f32,
}

impl CollisionAddParams {
    pub fn new(tool: plano_ids::ToolId, parent: NodeId, position: Vector3) -> Self {
        Self {
            tool,
            parent,
            position,
            rotation: AxisAngle::IDENTITY,
            force_fit: false,
            max_force_fit_offset: 0.0,
        }
    }
}

/// Place one product, recovering from an illegal spot in stages.
///
/// The requested position is tried first. When the analysis rejects it,
/// an already-present node of the same classification under the same
/// parent stands in for the placement. Failing that, force-fit nudges
/// the placement flush against each blocker's far edge, then its near
/// edge, along X and Z within the offset limit. Finally the tool's
/// size variants are tried in place, largest first. Every rejected
/// attempt rolls its commands back before the next stage runs.
pub fn auto_add_by_collision(
    scene: &mut Scene,
    ctx: &mut EvaluationContext,
    collab: Option<&Collaborators>,
    params: &CollisionAddParams,
) -> Result<PlacementOutcome, CoreError> {
    let Some(collab) = collab else {
        let err = CoreError::MissingCollaborator("collision add");
        report_fatal("auto_add_by_collision", &err);
        return Err(err);
    };
    let Some(tool) = collab.catalog.find_tool(params.tool) else {
        let err = CoreError::UnknownTool(params.tool);
        report_fatal("auto_add_by_collision.tool", &err);
        return Err(err);
    };
    let mut tool = tool.clone();

    // A rotated request switches to the orientation variant when the
    // catalog carries one.
    if params.rotation.angle.abs() > NUDGE_EPS {
        if let Some(variant_id) = tool.orientation_variant {
            match collab.catalog.find_tool(variant_id) {
                Some(variant) => tool = variant.clone(),
                None => log::warn!(
                    "orientation variant {} of tool {} not in catalog",
                    variant_id,
                    params.tool
                ),
            }
        }
    }

    let watermark = ctx.log.watermark();

    let (attempt, legality) =
        try_place(scene, ctx, collab, &tool, params.parent, params.position, params.rotation);
    if legality.is_legal() {
        if let Some(id) = attempt {
            return Ok(PlacementOutcome::Placed(id));
        }
    }

    // The failed analysis left the overlap partitioning in the match
    // set; an existing node of the same classification under the same
    // parent covers the request.
    let existing = existing_match(scene, ctx, &tool, params.parent);
    let blockers: Vec<NodeId> = attempt
        .map(|id| collision::perform_collision_check(scene, ctx, id))
        .unwrap_or_default();
    ctx.rollback_to(scene, watermark);

    if let Some(id) = existing {
        return Ok(PlacementOutcome::ExistingMatch(id));
    }

    if params.force_fit && !blockers.is_empty() {
        for position in
            nudge_candidates(scene, ctx, &tool, params, &blockers)
        {
            let (id, legality) =
                try_place(scene, ctx, collab, &tool, params.parent, position, params.rotation);
            if legality.is_legal() {
                if let Some(id) = id {
                    return Ok(PlacementOutcome::Placed(id));
                }
            }
            ctx.rollback_to(scene, watermark);
        }
    }

    // Best-size fallback: step down through the smaller alternates.
    for variant_id in &tool.size_variants {
        let Some(variant) = collab.catalog.find_tool(*variant_id) else {
            log::warn!("size variant {} of tool {} not in catalog", variant_id, tool.id);
            continue;
        };
        let variant = variant.clone();
        let (id, legality) =
            try_place(scene, ctx, collab, &variant, params.parent, params.position, params.rotation);
        if legality.is_legal() {
            if let Some(id) = id {
                return Ok(PlacementOutcome::Placed(id));
            }
        }
        ctx.rollback_to(scene, watermark);
    }

    ctx.rollback_to(scene, watermark);
    Ok(PlacementOutcome::Failed)
}

/// Speculatively insert and analyze one attempt. The attempt stays in
/// the arena either way; the caller rolls back rejected ones.
fn try_place(
    scene: &mut Scene,
    ctx: &mut EvaluationContext,
    collab: &Collaborators,
    tool: &ToolSpec,
    parent: NodeId,
    position: Vector3,
    rotation: AxisAngle,
) -> (Option<NodeId>, collision::Legality) {
    let mut node = collab.factory.create_node(tool, position, rotation);
    node.auto_placed = true;
    match ctx.insert_speculative(scene, node, parent) {
        Some(id) => {
            let legality = collision::perform_collision_analysis(scene, ctx, id);
            (Some(id), legality)
        }
        None => (None, collision::Legality::Illegal),
    }
}

/// An already-present node under `parent` carrying the tool's
/// classification, taken from the current match set. The partitioning
/// does not matter here; the candidate's own descriptors rarely name
/// its own classification, so same-kind overlaps usually sit in the
/// illegal partition.
fn existing_match(
    scene: &Scene,
    ctx: &EvaluationContext,
    tool: &ToolSpec,
    parent: NodeId,
) -> Option<NodeId> {
    let r = Resolver::new(scene, &ctx.log);
    ctx.match_set
        .classified_ids()
        .chain(ctx.match_set.illegal.iter().copied())
        .find(|id| {
            scene
                .get(*id)
                .is_some_and(|n| n.has_tag(&tool.classification))
                && r.resolve_parent(*id, QueryMode::Exact) == Some(parent)
        })
}

/// Candidate nudged positions, flush against each blocker along X and
/// Z: far edge first (past the blocker), then near edge (short of it).
/// Candidates beyond the offset limit are dropped.
fn nudge_candidates(
    scene: &Scene,
    ctx: &EvaluationContext,
    tool: &ToolSpec,
    params: &CollisionAddParams,
    blockers: &[NodeId],
) -> Vec<Vector3> {
    let Some(parent_mat) = chain::scene_transform(scene, &ctx.log, params.parent, QueryMode::Exact)
    else {
        return Vec::new();
    };
    let inv = parent_mat.inverse();

    let mut out = Vec::new();
    for axis in [Axis::X, Axis::Z] {
        let dir = axis.unit();
        let half = (tool.size * 0.5).axis(axis.index());
        let requested = params.position.axis(axis.index());

        for blocker in blockers {
            let Some(volume) = geometry::oriented_box(scene, ctx, *blocker, true, QueryMode::Exact)
            else {
                continue;
            };
            let local = volume.transformed(&inv);
            let (b_min, b_max) = local.extent_on(dir);

            // Far edge: jump past the blocker. Near edge: back off.
            let far = b_max + half + NUDGE_EPS;
            let near = b_min - half - NUDGE_EPS;
            for coord in [far, near] {
                if (coord - requested).abs() > params.max_force_fit_offset {
                    continue;
                }
                let mut candidate = params.position;
                candidate.set_axis(axis.index(), coord);
                out.push(candidate);
            }
        }
    }
    out
}
