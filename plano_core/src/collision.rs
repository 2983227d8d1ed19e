use crate::arena::Scene;
use crate::context::EvaluationContext;
use crate::geometry;
use crate::match_set::MatchSet;
use crate::node::{NodeKind, SceneNode};
use crate::relationship::{
    Cmp, Relationship, TAG_FLOOR, TAG_MODEL_ZONE, TAG_WALL, TAG_ZONE,
};
use crate::resolver::QueryMode;
use plano_ids::NodeId;
use smallvec::SmallVec;

/// Ternary legality of a candidate placement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Legality {
    /// Nothing needed checking: the candidate declares no relationship
    /// descriptors, or it is a model-zone overlapping nothing but its
    /// replace targets. The latter case means a model-zone with
    /// descriptors still maps to -1 through `as_index`.
    NothingToCheck,
    /// Descriptors exist and none is satisfied
    Illegal,
    /// The descriptor at this declared index is satisfied
    Satisfied(usize),
}

impl Legality {
    pub fn is_legal(&self) -> bool {
        !matches!(self, Legality::Illegal)
    }

    /// Sentinel form for host interop: -1 nothing-to-check, -2 illegal,
    /// i >= 0 satisfied-at-index.
    pub fn as_index(&self) -> i32 {
        match self {
            Legality::NothingToCheck => -1,
            Legality::Illegal => -2,
            Legality::Satisfied(i) => *i as i32,
        }
    }
}

/// Raw spatial overlap set for a candidate: every live node whose scene
/// volume intersects the candidate's, minus the candidate itself, the
/// root, nodes scheduled for removal in the pending log, and the
/// explicit ignore set.
pub fn perform_collision_check(
    scene: &Scene,
    ctx: &EvaluationContext,
    candidate: NodeId,
) -> Vec<NodeId> {
    let Some(candidate_box) = geometry::oriented_box(scene, ctx, candidate, true, QueryMode::Exact)
    else {
        return Vec::new();
    };

    let mut out = Vec::new();
    for (id, node) in scene.arena.iter() {
        if id == candidate || node.kind == NodeKind::Root {
            continue;
        }
        if ctx.is_ignored(id) || ctx.log.is_removed(id) {
            continue;
        }
        let Some(volume) = geometry::oriented_box(scene, ctx, id, true, QueryMode::Exact) else {
            continue;
        };
        if candidate_box.intersects(&volume) {
            out.push(id);
        }
    }
    out
}

/// Classify the overlap set against the candidate's relationship
/// descriptors, populating the context's match set as a side effect.
///
/// Classification order: replace matches are pulled out first, then
/// kind partitions claim walls/floors/zones, then ordinary nodes are
/// claimed by the first descriptor tag (declared order) present in
/// their tag set. Per-partition descriptor satisfaction runs before the
/// cross-category fallback.
pub fn perform_collision_analysis(
    scene: &Scene,
    ctx: &mut EvaluationContext,
    candidate: NodeId,
) -> Legality {
    let overlaps = perform_collision_check(scene, ctx, candidate);

    let Some(node) = scene.get(candidate) else {
        log::warn!("collision analysis target {} missing", candidate);
        ctx.match_set.clear();
        return Legality::Illegal;
    };
    let descriptors: SmallVec<[Relationship; 4]> = node.relationships.clone();
    let replace_tag = node.replace_tag.clone();
    let candidate_kind = node.kind;
    let object_tags = descriptor_object_tags(&descriptors);

    let mut set = MatchSet::new();
    for id in overlaps {
        let Some(other) = scene.get(id) else { continue };
        if let Some(tag) = &replace_tag {
            if other.has_tag(tag) {
                set.replace.push(id);
                continue;
            }
        }
        match other.kind {
            NodeKind::Floor => set.floors.push(id),
            NodeKind::WallSegment => set.walls.push(id),
            NodeKind::ModelZone => set.model_zones.push(id),
            NodeKind::Zone => set.zones.push(id),
            NodeKind::Object => match object_tags.iter().find(|t| other.has_tag(t)) {
                Some(tag) => set.add_object(tag, id),
                None => set.illegal.push(id),
            },
            NodeKind::Root => {}
        }
    }

    let result = classify(scene, &set, &descriptors, candidate_kind);
    ctx.match_set = set;
    result
}

fn classify(
    scene: &Scene,
    set: &MatchSet,
    descriptors: &[Relationship],
    candidate_kind: NodeKind,
) -> Legality {
    if descriptors.is_empty() {
        return Legality::NothingToCheck;
    }

    // Model-zones are legal sitting in empty space even when they
    // declare descriptors for the populated case. Callers reading the
    // index out of `NothingToCheck` must not take it to mean the
    // candidate declared no rules; an overlapping model-zone lands
    // here too whenever nothing but replace targets sits under it.
    if candidate_kind == NodeKind::ModelZone && set.non_replace_count() == 0 {
        return Legality::NothingToCheck;
    }

    // Every overlap must be explained: an unclaimed node poisons the
    // placement no matter which descriptor its siblings satisfy
    if !set.illegal.is_empty() {
        return Legality::Illegal;
    }

    for (i, descriptor) in descriptors.iter().enumerate() {
        if satisfied_in_partition(set, descriptor) {
            return Legality::Satisfied(i);
        }
    }

    // Cross-category fallback: a compound may be satisfied by summing
    // matches across all partitions, so "one wall or one floor" style
    // constructs succeed without per-partition duplication
    if set.classified_count() > 0 {
        for (i, descriptor) in descriptors.iter().enumerate() {
            if let Relationship::Compound(terms) = descriptor {
                let ok = terms
                    .iter()
                    .all(|t| Cmp::AtLeast.satisfied(cross_count(scene, set, &t.tag), t.count));
                if ok {
                    return Legality::Satisfied(i);
                }
            }
        }
    }

    Legality::Illegal
}

/// Ordinary-object tags referenced by the descriptor list, in declared
/// order; reserved kind tags are handled by their own partitions.
fn descriptor_object_tags(descriptors: &[Relationship]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut push = |tag: &str| {
        if !is_reserved(tag) && !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    };
    for d in descriptors {
        match d {
            Relationship::None => {}
            Relationship::Single { tag, .. } => push(tag),
            Relationship::Compound(terms) => {
                for t in terms {
                    push(&t.tag);
                }
            }
        }
    }
    out
}

fn is_reserved(tag: &str) -> bool {
    matches!(tag, TAG_WALL | TAG_FLOOR | TAG_ZONE | TAG_MODEL_ZONE)
}

fn partition_count(set: &MatchSet, tag: &str) -> usize {
    match tag {
        TAG_WALL => set.walls.len(),
        TAG_FLOOR => set.floors.len(),
        TAG_ZONE => set.zones.len(),
        TAG_MODEL_ZONE => set.model_zones.len(),
        _ => set.object_count(tag),
    }
}

fn satisfied_in_partition(set: &MatchSet, descriptor: &Relationship) -> bool {
    match descriptor {
        Relationship::None => set.non_replace_count() == 0,
        Relationship::Single { tag, count, cmp } => {
            cmp.satisfied(partition_count(set, tag), *count)
        }
        Relationship::Compound(terms) => terms
            .iter()
            .all(|t| Cmp::AtLeast.satisfied(partition_count(set, &t.tag), t.count)),
    }
}

/// Matches for a tag summed across every partition: a node counts when
/// its own tag set carries the tag or its kind partition is the tag.
fn cross_count(scene: &Scene, set: &MatchSet, tag: &str) -> usize {
    let kind_for_tag = |node: &SceneNode| match node.kind {
        NodeKind::WallSegment => tag == TAG_WALL,
        NodeKind::Floor => tag == TAG_FLOOR,
        NodeKind::Zone => tag == TAG_ZONE,
        NodeKind::ModelZone => tag == TAG_MODEL_ZONE,
        _ => false,
    };
    set.classified_ids()
        .filter_map(|id| scene.get(id))
        .filter(|n| n.has_tag(tag) || kind_for_tag(n))
        .count()
}

/// Whether the candidate's placement violates its descriptors.
pub fn has_illegal_collisions(
    scene: &Scene,
    ctx: &mut EvaluationContext,
    candidate: NodeId,
) -> bool {
    perform_collision_analysis(scene, ctx, candidate) == Legality::Illegal
}

/// Sentinel-index form of the analysis result for host interop.
pub fn get_legal_relationship_index(
    scene: &Scene,
    ctx: &mut EvaluationContext,
    candidate: NodeId,
) -> i32 {
    perform_collision_analysis(scene, ctx, candidate).as_index()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::SceneNode;
    use plano_structs::{Vector3, WallGeometry};

    fn wall_node(x: f32) -> SceneNode {
        let mut wall = SceneNode::new(NodeKind::WallSegment);
        wall.position = Vector3::new(x, 0.0, 0.0);
        wall.wall = Some(WallGeometry::new(
            Vector3::ZERO,
            Vector3::new(4.0, 0.0, 0.0),
            2.4,
            2.4,
            0.2,
        ));
        wall
    }

    fn bracket_at(x: f32, y: f32) -> SceneNode {
        SceneNode::new(NodeKind::Object)
            .with_position(Vector3::new(x, y, 0.0))
            .with_size(Vector3::new(0.2, 0.2, 0.4))
            .with_tag("bracket")
            .with_relationship(Relationship::single(TAG_WALL, 1))
    }

    #[test]
    fn test_wall_descriptor_satisfied_at_index_zero() {
        let mut scene = Scene::new();
        let root = scene.root;
        scene.attach(wall_node(0.0), root).unwrap();
        let bracket = scene.attach(bracket_at(2.0, 1.0), root).unwrap();

        let mut ctx = EvaluationContext::new();
        assert_eq!(get_legal_relationship_index(&scene, &mut ctx, bracket), 0);
        assert_eq!(ctx.match_set.walls.len(), 1);
    }

    #[test]
    fn test_removing_wall_makes_illegal() {
        let mut scene = Scene::new();
        let root = scene.root;
        let bracket = scene.attach(bracket_at(2.0, 1.0), root).unwrap();

        let mut ctx = EvaluationContext::new();
        // No wall in the scene: descriptor exists, overlap set empty
        assert_eq!(get_legal_relationship_index(&scene, &mut ctx, bracket), -2);
        assert!(has_illegal_collisions(&scene, &mut ctx, bracket));
    }

    #[test]
    fn test_no_descriptors_is_permissive() {
        let mut scene = Scene::new();
        let root = scene.root;
        let a = scene
            .attach(
                SceneNode::new(NodeKind::Object).with_size(Vector3::ONE),
                root,
            )
            .unwrap();
        let _b = scene
            .attach(
                SceneNode::new(NodeKind::Object).with_size(Vector3::ONE),
                root,
            )
            .unwrap();

        let mut ctx = EvaluationContext::new();
        assert_eq!(get_legal_relationship_index(&scene, &mut ctx, a), -1);
    }

    #[test]
    fn test_none_descriptor_legalizes_empty_space() {
        let mut scene = Scene::new();
        let root = scene.root;
        let node = scene
            .attach(
                SceneNode::new(NodeKind::Object)
                    .with_relationship(Relationship::None)
                    .with_relationship(Relationship::single(TAG_FLOOR, 1)),
                root,
            )
            .unwrap();

        let mut ctx = EvaluationContext::new();
        assert_eq!(get_legal_relationship_index(&scene, &mut ctx, node), 0);
    }

    #[test]
    fn test_first_satisfied_descriptor_wins() {
        let mut scene = Scene::new();
        let root = scene.root;
        scene.attach(wall_node(0.0), root).unwrap();
        let node = scene
            .attach(
                bracket_at(2.0, 1.0)
                    .with_relationship(Relationship::single(TAG_WALL, 1)), // duplicate at index 1
                root,
            )
            .unwrap();

        let mut ctx = EvaluationContext::new();
        assert_eq!(get_legal_relationship_index(&scene, &mut ctx, node), 0);
    }

    #[test]
    fn test_pending_removal_excluded_from_overlaps() {
        let mut scene = Scene::new();
        let root = scene.root;
        let wall = scene.attach(wall_node(0.0), root).unwrap();
        let bracket = scene.attach(bracket_at(2.0, 1.0), root).unwrap();

        let mut ctx = EvaluationContext::new();
        ctx.log.push(crate::command::Command::new(
            ctx.txn,
            wall,
            crate::command::CommandKind::RemoveChild {
                parent_before: root,
            },
        ));
        assert_eq!(get_legal_relationship_index(&scene, &mut ctx, bracket), -2);
    }

    #[test]
    fn test_compound_across_kind_partitions() {
        let mut scene = Scene::new();
        let root = scene.root;
        // A floor zone overlapping the candidate
        let floor = SceneNode::new(NodeKind::Floor)
            .with_size(Vector3::new(10.0, 0.1, 10.0));
        scene.attach(floor, root).unwrap();
        scene.attach(wall_node(0.0), root).unwrap();

        // Compound "wall:1+floor:1": each term counts in its own partition
        let node = scene
            .attach(
                SceneNode::new(NodeKind::Object)
                    .with_position(Vector3::new(2.0, 0.5, 0.0))
                    .with_size(Vector3::new(0.5, 2.0, 0.5))
                    .with_relationship(Relationship::compound([
                        (TAG_WALL.to_string(), 1),
                        (TAG_FLOOR.to_string(), 1),
                    ])),
                root,
            )
            .unwrap();

        let mut ctx = EvaluationContext::new();
        assert_eq!(get_legal_relationship_index(&scene, &mut ctx, node), 0);
    }

    #[test]
    fn test_cross_category_fallback_sums_partitions() {
        let mut scene = Scene::new();
        let root = scene.root;
        // One ordinary support plus a wall that is also tagged "support":
        // within the object partition the count is 1, but summed across
        // partitions it reaches the required 2.
        scene
            .attach(
                SceneNode::new(NodeKind::Object)
                    .with_size(Vector3::ONE)
                    .with_tag("support"),
                root,
            )
            .unwrap();
        scene
            .attach(wall_node(0.0).with_tag("support"), root)
            .unwrap();

        let node = scene
            .attach(
                SceneNode::new(NodeKind::Object)
                    .with_position(Vector3::new(0.0, 0.5, 0.0))
                    .with_size(Vector3::new(1.0, 2.0, 1.0))
                    .with_relationship(Relationship::compound([("support".to_string(), 2)])),
                root,
            )
            .unwrap();

        let mut ctx = EvaluationContext::new();
        assert_eq!(get_legal_relationship_index(&scene, &mut ctx, node), 0);
    }

    #[test]
    fn test_replace_matches_reported_separately() {
        let mut scene = Scene::new();
        let root = scene.root;
        let old = scene
            .attach(
                SceneNode::new(NodeKind::Object)
                    .with_size(Vector3::ONE)
                    .with_tag("endcap"),
                root,
            )
            .unwrap();

        let mut candidate = SceneNode::new(NodeKind::Object)
            .with_size(Vector3::ONE)
            .with_relationship(Relationship::None);
        candidate.replace_tag = Some("endcap".to_string());
        let candidate = scene.attach(candidate, root).unwrap();

        let mut ctx = EvaluationContext::new();
        // The endcap overlap is pulled into the replace partition, so the
        // None descriptor is satisfied
        assert_eq!(get_legal_relationship_index(&scene, &mut ctx, candidate), 0);
        assert_eq!(ctx.match_set.replace, vec![old]);
    }

    #[test]
    fn test_unclaimed_overlap_lands_in_illegal_partition() {
        let mut scene = Scene::new();
        let root = scene.root;
        let _stranger = scene
            .attach(
                SceneNode::new(NodeKind::Object)
                    .with_size(Vector3::ONE)
                    .with_tag("plant"),
                root,
            )
            .unwrap();
        let node = scene
            .attach(
                SceneNode::new(NodeKind::Object)
                    .with_size(Vector3::ONE)
                    .with_relationship(Relationship::single("bracket", 1)),
                root,
            )
            .unwrap();

        let mut ctx = EvaluationContext::new();
        assert_eq!(get_legal_relationship_index(&scene, &mut ctx, node), -2);
        assert_eq!(ctx.match_set.illegal.len(), 1);
    }

    #[test]
    fn test_model_zone_defaults_legal_with_zero_overlap() {
        let mut scene = Scene::new();
        let root = scene.root;
        let zone = scene
            .attach(
                SceneNode::new(NodeKind::ModelZone)
                    .with_position(Vector3::new(50.0, 0.0, 0.0))
                    .with_relationship(Relationship::single(TAG_FLOOR, 1)),
                root,
            )
            .unwrap();

        let mut ctx = EvaluationContext::new();
        assert_eq!(get_legal_relationship_index(&scene, &mut ctx, zone), -1);
    }
}
