use crate::arena::Scene;
use crate::chain;
use crate::context::EvaluationContext;
use crate::node::{Axis, NodeKind};
use crate::resolver::{QueryMode, Resolver};
use plano_ids::NodeId;
use plano_structs::{Aabb, OrientedBox, Vector3};

/// Signed edge-to-edge separation between two volumes along one axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Gap {
    /// Positive: clear space between the facing edges. Negative:
    /// penetration depth. Sign of the direction follows the
    /// center-to-center vector on the tested axis.
    pub distance: f32,
    /// +1 when the target lies on the positive side of the source
    pub direction: f32,
    /// Point on the source's facing edge, in the source's parent frame
    pub closest_point: Vector3,
}

/// Local-space bounds of a node.
///
/// Ordinary nodes are a size x scale box centered on the origin offset.
/// Extruded nodes derive extents from their swept cross-section. Wall
/// segments span their endpoints (endpoints are stored in the wall
/// node's local frame) by max endpoint height by thickness.
pub fn local_bounds(
    scene: &Scene,
    ctx: &EvaluationContext,
    id: NodeId,
    mode: QueryMode,
) -> Option<Aabb> {
    let node = scene.get(id)?;
    let r = Resolver::new(scene, &ctx.log);
    let scale = r.resolve_scale(id, mode).unwrap_or(node.scale);

    if node.kind == NodeKind::WallSegment {
        if let Some(wall) = &node.wall {
            return Some(wall.oriented_box().to_aabb());
        }
    }

    if let Some(profile) = &node.profile {
        return Some(profile.swept_bounds(node.size.z * scale.z));
    }

    let half = node.size * scale * 0.5;
    Some(Aabb::from_center_half_extents(node.origin_offset, half))
}

/// Oriented volume of a node, in its parent frame or in scene
/// coordinates. Surrogate overrides win: a registered stand-in is
/// returned as-is so hypothetical edits are collision-tested in place
/// of the node's real geometry.
pub fn oriented_box(
    scene: &Scene,
    ctx: &EvaluationContext,
    id: NodeId,
    in_scene: bool,
    mode: QueryMode,
) -> Option<OrientedBox> {
    if let Some(surrogate) = ctx.surrogate_for(id) {
        return Some(*surrogate);
    }

    let node = scene.get(id)?;
    let base = if node.kind == NodeKind::WallSegment {
        match &node.wall {
            Some(wall) => wall.oriented_box(),
            None => OrientedBox::from_aabb(&local_bounds(scene, ctx, id, mode)?),
        }
    } else {
        OrientedBox::from_aabb(&local_bounds(scene, ctx, id, mode)?)
    };

    let mat = if in_scene {
        chain::scene_transform(scene, &ctx.log, id, mode)?
    } else {
        let r = Resolver::new(scene, &ctx.log);
        let position = r.resolve_position(id, mode)?;
        let rotation = r.resolve_rotation(id, mode)?;
        glam::Mat4::from_rotation_translation(rotation.to_quat(), position.into())
    };

    Some(base.transformed(&mat))
}

/// Union box of a node set, expressed in an ancestor's local frame.
pub fn cumulative_bounds(
    scene: &Scene,
    ctx: &EvaluationContext,
    ids: &[NodeId],
    ancestor: NodeId,
) -> Option<Aabb> {
    let ancestor_mat = chain::scene_transform(scene, &ctx.log, ancestor, QueryMode::Exact)?;
    let inv = ancestor_mat.inverse();

    let mut out = Aabb::EMPTY;
    for id in ids {
        let volume = oriented_box(scene, ctx, *id, true, QueryMode::Exact)?;
        out = out.union(&volume.transformed(&inv).to_aabb());
    }
    if out.is_empty() { None } else { Some(out) }
}

/// Edge-to-edge gap between two nodes along an axis, computed in the
/// source's parent coordinate frame by sorting the four extent values.
pub fn gap(
    scene: &Scene,
    ctx: &EvaluationContext,
    source: NodeId,
    target: NodeId,
    axis: Axis,
) -> Option<Gap> {
    let parent_mat = chain::parent_transform(scene, &ctx.log, source, QueryMode::Exact)?;
    let inv = parent_mat.inverse();

    let sbox = oriented_box(scene, ctx, source, true, QueryMode::Exact)?.transformed(&inv);
    let tbox = oriented_box(scene, ctx, target, true, QueryMode::Exact)?.transformed(&inv);

    let dir_vec = axis.unit();
    let (s_min, s_max) = sbox.extent_on(dir_vec);
    let (t_min, t_max) = tbox.extent_on(dir_vec);

    // Sorted extents: [a, b, c, d]. The middle pair carries the gap
    // (separation) or the overlap (penetration).
    let mut extents = [s_min, s_max, t_min, t_max];
    extents.sort_by(|a, b| a.total_cmp(b));

    let separated = s_max < t_min || t_max < s_min;
    let magnitude = extents[2] - extents[1];
    let distance = if separated { magnitude } else { -magnitude };

    let direction = if tbox.center.axis(axis.index()) >= sbox.center.axis(axis.index()) {
        1.0
    } else {
        -1.0
    };

    let mut closest_point = sbox.center;
    closest_point.set_axis(
        axis.index(),
        if direction >= 0.0 { s_max } else { s_min },
    );

    Some(Gap {
        distance,
        direction,
        closest_point,
    })
}

/// Overhang legality: how far a node's edges extend beyond the union of
/// its supports along an axis. Illegal when either edge's overhang
/// exceeds `max_overhang` or falls under `min_overhang`.
pub fn check_overhang_limit(
    scene: &Scene,
    ctx: &EvaluationContext,
    supports: &[NodeId],
    id: NodeId,
    axis: Axis,
    max_overhang: f32,
    min_overhang: f32,
) -> bool {
    let r = Resolver::new(scene, &ctx.log);
    let Some(parent) = r.resolve_parent(id, QueryMode::Exact) else {
        return false; // cannot determine, be conservative
    };
    let Some(support_bounds) = cumulative_bounds(scene, ctx, supports, parent) else {
        return false;
    };
    let Some(parent_mat) = chain::scene_transform(scene, &ctx.log, parent, QueryMode::Exact)
    else {
        return false;
    };
    let Some(volume) = oriented_box(scene, ctx, id, true, QueryMode::Exact) else {
        return false;
    };
    let own = volume.transformed(&parent_mat.inverse()).to_aabb();

    let i = axis.index();
    let negative_overhang = support_bounds.min.axis(i) - own.min.axis(i);
    let positive_overhang = own.max.axis(i) - support_bounds.max.axis(i);

    for overhang in [negative_overhang, positive_overhang] {
        if overhang > max_overhang || overhang < min_overhang {
            return false;
        }
    }
    true
}
