use crate::arena::Scene;
use crate::autoplace::policy::{self, PlacementOutcome, PlacementReport, PolicyDecision};
use crate::collab::Collaborators;
use crate::collision;
use crate::context::EvaluationContext;
use crate::error::{report_fatal, CoreError};
use crate::geometry;
use crate::node::SpanConfig;
use crate::resolver::{QueryMode, Resolver};
use plano_ids::NodeId;
use plano_structs::Vector3;

/// Fill a parent's span with auto-placed products.
///
/// The span runs along the configured axis of the parent's local
/// bounds, pulled in by the edge offsets. Existing auto-placed children
/// built from the span's tool count as matches wherever they sit; they
/// are sorted along the axis and each uncovered sub-segment around them
/// (edge to first match, between matches when the gap exceeds the step,
/// last match to edge) is filled with evenly spaced placements, enough
/// that no uncovered run exceeds the step. With no matches the span is
/// a single free run and placements sit one step apart from the
/// negative edge, both extremes included when the length divides
/// evenly. Every placement is a speculative insert, collision-analyzed
/// in place and rolled back individually when illegal; the policy then
/// judges the finished set and may roll the whole pass back.
pub fn auto_add_by_span(
    scene: &mut Scene,
    ctx: &mut EvaluationContext,
    collab: Option<&Collaborators>,
    parent: NodeId,
) -> Result<PlacementReport, CoreError> {
    let Some(parent_node) = scene.get(parent) else {
        return Ok(PlacementReport::default());
    };
    let Some(span) = parent_node.span.clone() else {
        return Ok(PlacementReport {
            outcomes: Vec::new(),
            decision: Some(PolicyDecision::Accept),
        });
    };

    let Some(collab) = collab else {
        let err = CoreError::MissingCollaborator("span fill");
        report_fatal("auto_add_by_span", &err);
        return Err(err);
    };
    let Some(tool) = collab.catalog.find_tool(span.tool) else {
        let err = CoreError::UnknownTool(span.tool);
        report_fatal("auto_add_by_span.tool", &err);
        return Err(err);
    };
    let tool = tool.clone();

    let axis = span.axis;
    let Some(bounds) = geometry::local_bounds(scene, ctx, parent, QueryMode::Exact) else {
        return Ok(PlacementReport::default());
    };
    let neg_edge = bounds.min.axis(axis.index()) + span.negative_offset;
    let pos_edge = bounds.max.axis(axis.index()) - span.positive_offset;

    let matches = existing_matches(scene, ctx, parent, &span);
    let slots = plan_slots(neg_edge, pos_edge, &span, &matches);

    let pass_watermark = ctx.log.watermark();
    let mut report = PlacementReport::default();

    // Matches cover their position outright; then the planned slots,
    // positive edge first.
    for (_, id) in matches.iter().rev() {
        report.outcomes.push(PlacementOutcome::ExistingMatch(*id));
        if policy::stops_at_first_success(span.policy) {
            let decision = policy::evaluate(span.policy, &report.outcomes);
            report.decision = Some(decision);
            return Ok(report);
        }
    }

    for coord in slots.iter().rev() {
        let mut position = Vector3::ZERO;
        position.set_axis(axis.index(), *coord);

        let slot_watermark = ctx.log.watermark();
        let mut node = collab
            .factory
            .create_node(&tool, position, plano_structs::AxisAngle::IDENTITY);
        node.auto_placed = true;

        let outcome = match ctx.insert_speculative(scene, node, parent) {
            Some(id) => {
                if collision::perform_collision_analysis(scene, ctx, id).is_legal() {
                    PlacementOutcome::Placed(id)
                } else {
                    ctx.rollback_to(scene, slot_watermark);
                    PlacementOutcome::Failed
                }
            }
            None => PlacementOutcome::Failed,
        };

        let success = outcome.is_success();
        report.outcomes.push(outcome);
        if success && policy::stops_at_first_success(span.policy) {
            break;
        }
    }

    let decision = policy::evaluate(span.policy, &report.outcomes);
    if decision == PolicyDecision::Rollback {
        ctx.rollback_to(scene, pass_watermark);
    }
    report.decision = Some(decision);
    Ok(report)
}

/// Span-axis coordinates of auto-placed children built from the span's
/// tool, wherever they sit, sorted along the axis.
fn existing_matches(
    scene: &Scene,
    ctx: &EvaluationContext,
    parent: NodeId,
    span: &SpanConfig,
) -> Vec<(f32, NodeId)> {
    let r = Resolver::new(scene, &ctx.log);
    let mut out = Vec::new();
    for child in r.resolve_children(parent, QueryMode::Exact) {
        let Some(node) = scene.get(child) else { continue };
        if !node.auto_placed || node.tool != span.tool {
            continue;
        }
        let Some(position) = r.resolve_position(child, QueryMode::Exact) else {
            continue;
        };
        out.push((position.axis(span.axis.index()), child));
    }
    out.sort_by(|a, b| a.0.total_cmp(&b.0));
    out
}

/// Coordinates needing a placement, ascending.
fn plan_slots(
    neg_edge: f32,
    pos_edge: f32,
    span: &SpanConfig,
    matches: &[(f32, NodeId)],
) -> Vec<f32> {
    let mut slots = Vec::new();
    if span.step <= 0.0 || pos_edge < neg_edge {
        return slots;
    }

    if matches.is_empty() {
        fill_free_run(&mut slots, neg_edge, pos_edge, span);
        return slots;
    }

    let first = matches[0].0;
    let last = matches[matches.len() - 1].0;

    fill_to_edge(&mut slots, first, neg_edge, span.step);
    for pair in matches.windows(2) {
        fill_between(&mut slots, pair[0].0, pair[1].0, span.step);
    }
    fill_to_edge(&mut slots, last, pos_edge, span.step);

    slots.sort_by(f32::total_cmp);
    slots
}

/// No matches: one step apart from the negative edge, both extremes
/// included when the length divides evenly. `min_count` overflow
/// spreads the slots evenly across the span instead.
fn fill_free_run(slots: &mut Vec<f32>, neg_edge: f32, pos_edge: f32, span: &SpanConfig) {
    let length = pos_edge - neg_edge;
    let natural = (length / span.step).floor() as u32 + 1;
    let count = natural.max(span.min_count);
    if count <= 1 {
        slots.push(neg_edge + length * 0.5);
        return;
    }
    let spacing = if count > natural {
        length / (count - 1) as f32
    } else {
        span.step
    };
    for i in 0..count {
        slots.push(neg_edge + i as f32 * spacing);
    }
}

/// Free run between a match and a span edge: enough placements that no
/// sub-run exceeds the step, spread evenly, the edge extreme included,
/// the match end excluded.
fn fill_to_edge(slots: &mut Vec<f32>, from_match: f32, edge: f32, step: f32) {
    let distance = (edge - from_match).abs();
    if distance <= f32::EPSILON {
        return;
    }
    let count = (distance / step).ceil() as u32;
    let spacing = (edge - from_match) / count as f32;
    for i in 1..=count {
        slots.push(from_match + i as f32 * spacing);
    }
}

/// Run between two matches: filled only when the gap exceeds the step,
/// with interior placements spread so no sub-run exceeds it.
fn fill_between(slots: &mut Vec<f32>, lo: f32, hi: f32, step: f32) {
    let gap = hi - lo;
    if gap <= step {
        return;
    }
    let count = (gap / step).ceil() as u32 - 1;
    let spacing = gap / (count + 1) as f32;
    for i in 1..=count {
        slots.push(lo + i as f32 * spacing);
    }
}
