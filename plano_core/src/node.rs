use crate::autoplace::SatisfyPolicy;
use crate::relationship::Relationship;
use plano_ids::{NodeId, ToolId};
use plano_structs::{AxisAngle, Profile2D, Vector3, WallGeometry};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Which of a node's kinds it is, for partitioning and traversal rules.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// An ordinary placed object (product, shelf, bracket, ...)
    Object,
    /// One segment of a wall run
    WallSegment,
    /// A floor zone
    Floor,
    /// A generic zone
    Zone,
    /// A zone backed by a 3D model
    ModelZone,
    /// The content root; exactly one per scene
    Root,
}

impl NodeKind {
    /// Kinds that terminate an ancestor-zone query
    pub fn is_zone(&self) -> bool {
        matches!(self, NodeKind::Floor | NodeKind::Zone | NodeKind::ModelZone)
    }
}

/// World axis selector for span and gap queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    #[inline]
    pub fn index(&self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    #[inline]
    pub fn unit(&self) -> Vector3 {
        match self {
            Axis::X => Vector3::X,
            Axis::Y => Vector3::Y,
            Axis::Z => Vector3::Z,
        }
    }
}

/// Configuration for span-fill auto-placement on a parent node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpanConfig {
    /// Tool placed into each uncovered slot
    pub tool: ToolId,
    /// Axis the span runs along, in the parent's local frame
    pub axis: Axis,
    /// Maximum uncovered run before another placement is required
    pub step: f32,
    /// Span start is pulled in by this much from the negative edge
    pub negative_offset: f32,
    /// Span end is pulled in by this much from the positive edge
    pub positive_offset: f32,
    /// Placements required even when the span is shorter than one step
    pub min_count: u32,
    /// How partial failure across the generated set is judged
    pub policy: SatisfyPolicy,
}

/// A node in the scene graph: a placed object, wall segment, floor or
/// zone. Nodes are arena-resident and mutated only by committing
/// commands; the core reads them through the transactional resolver.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SceneNode {
    pub id: NodeId,
    pub name: String,
    pub kind: NodeKind,

    /// Committed parent; nil when detached
    pub parent: NodeId,
    /// Parent a speculative (not yet committed) add will attach to.
    /// Nil once the add commits.
    pub pending_parent: NodeId,
    /// Committed children, in insertion order
    pub children: Vec<NodeId>,

    // ------------------ Geometry ------------------
    pub size: Vector3,
    pub scale: Vector3,
    /// Local offset of the bounds center from the node origin
    pub origin_offset: Vector3,
    pub position: Vector3,
    pub rotation: AxisAngle,

    /// Wall-segment geometry; only meaningful when kind == WallSegment
    pub wall: Option<WallGeometry>,
    /// Extruded cross-section; overrides size-box bounds when present
    pub profile: Option<Profile2D>,

    // ------------------ Rules ------------------
    /// Classification tags describing what category this node is
    pub tags: FxHashSet<String>,
    /// Relationship descriptors, in priority order
    pub relationships: SmallVec<[Relationship; 4]>,
    /// Overlapping nodes carrying this tag are subsumed, not rejected
    pub replace_tag: Option<String>,
    /// Span-fill configuration for dependent children
    pub span: Option<SpanConfig>,

    /// Catalog tool this node was built from; nil for structural nodes
    pub tool: ToolId,
    /// True when this node was synthesized by auto-placement
    pub auto_placed: bool,
}

impl SceneNode {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            id: NodeId::nil(),
            name: String::new(),
            kind,
            parent: NodeId::nil(),
            pending_parent: NodeId::nil(),
            children: Vec::new(),
            size: Vector3::ONE,
            scale: Vector3::ONE,
            origin_offset: Vector3::ZERO,
            position: Vector3::ZERO,
            rotation: AxisAngle::IDENTITY,
            wall: None,
            profile: None,
            tags: FxHashSet::default(),
            relationships: SmallVec::new(),
            replace_tag: None,
            span: None,
            tool: ToolId::nil(),
            auto_placed: false,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_position(mut self, position: Vector3) -> Self {
        self.position = position;
        self
    }

    pub fn with_size(mut self, size: Vector3) -> Self {
        self.size = size;
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn with_relationship(mut self, rel: Relationship) -> Self {
        self.relationships.push(rel);
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// A node still waiting on its first commit has a pending parent and
    /// no committed one.
    pub fn is_speculative(&self) -> bool {
        self.parent.is_nil() && !self.pending_parent.is_nil()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_node_is_detached() {
        let n = SceneNode::new(NodeKind::Object);
        assert!(n.parent.is_nil());
        assert!(!n.is_speculative());
        assert!(n.children.is_empty());
    }

    #[test]
    fn test_speculative_flag() {
        let mut n = SceneNode::new(NodeKind::Object);
        n.pending_parent = NodeId::new();
        assert!(n.is_speculative());
        n.parent = NodeId::new();
        assert!(!n.is_speculative());
    }

    #[test]
    fn test_zone_kinds() {
        assert!(NodeKind::Floor.is_zone());
        assert!(NodeKind::Zone.is_zone());
        assert!(NodeKind::ModelZone.is_zone());
        assert!(!NodeKind::Object.is_zone());
        assert!(!NodeKind::Root.is_zone());
    }
}
