use crate::node::{SceneNode, SpanConfig};
use crate::relationship::Relationship;
use plano_ids::ToolId;
use plano_structs::{AxisAngle, Profile2D, Vector3};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// A catalog tool: everything needed to construct and judge a placement
/// of one product.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolSpec {
    pub id: ToolId,
    pub name: String,
    /// Primary classification tag of nodes built from this tool
    pub classification: String,
    pub size: Vector3,
    /// Relationship descriptors copied onto constructed nodes
    pub relationships: SmallVec<[Relationship; 4]>,
    /// Span-fill configuration copied onto constructed nodes
    pub span: Option<SpanConfig>,
    /// Extruded cross-section for profile-driven products
    pub profile: Option<Profile2D>,
    /// Tool used instead when the placement is rotated onto a wall
    pub orientation_variant: Option<ToolId>,
    /// Progressively smaller alternates along the step-down axis,
    /// largest first; consulted by the best-size fallback
    pub size_variants: Vec<ToolId>,
    /// Overlapping nodes with this tag are replaced by the placement
    pub replace_tag: Option<String>,
}

impl ToolSpec {
    pub fn new(id: ToolId, name: impl Into<String>, classification: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            classification: classification.into(),
            size: Vector3::ONE,
            relationships: SmallVec::new(),
            span: None,
            profile: None,
            orientation_variant: None,
            size_variants: Vec::new(),
            replace_tag: None,
        }
    }

    pub fn with_size(mut self, size: Vector3) -> Self {
        self.size = size;
        self
    }

    pub fn with_relationship(mut self, rel: Relationship) -> Self {
        self.relationships.push(rel);
        self
    }
}

/// Catalog lookup, owned by the host editor.
pub trait ToolCatalog {
    fn find_tool(&self, id: ToolId) -> Option<&ToolSpec>;
}

/// Entity construction, owned by the host editor. The returned node is
/// detached; the caller inserts it speculatively and logs the add.
pub trait EntityFactory {
    fn create_node(&self, tool: &ToolSpec, position: Vector3, rotation: AxisAngle) -> SceneNode;
}

/// The collaborator bundle auto-placement needs. Call sites receive
/// `Option<&Collaborators>` so a missing bundle can surface as the
/// fatal-configuration error it is.
pub struct Collaborators<'a> {
    pub catalog: &'a dyn ToolCatalog,
    pub factory: &'a dyn EntityFactory,
}

/// Straightforward factory used by the core's own tests and available
/// to hosts without custom construction needs: copies the tool spec
/// onto a fresh object node.
#[derive(Debug, Default)]
pub struct BasicFactory;

impl EntityFactory for BasicFactory {
    fn create_node(&self, tool: &ToolSpec, position: Vector3, rotation: AxisAngle) -> SceneNode {
        let mut node = crate::node::SceneNode::new(crate::node::NodeKind::Object)
            .with_name(tool.name.clone())
            .with_position(position)
            .with_size(tool.size)
            .with_tag(tool.classification.clone());
        node.id = plano_ids::NodeId::new();
        node.rotation = rotation;
        node.relationships = tool.relationships.clone();
        node.span = tool.span.clone();
        node.profile = tool.profile.clone();
        node.replace_tag = tool.replace_tag.clone();
        node.tool = tool.id;
        node
    }
}

/// In-memory catalog keyed by tool id; hosts with external catalogs
/// implement `ToolCatalog` themselves.
#[derive(Default)]
pub struct BasicCatalog {
    tools: rustc_hash::FxHashMap<ToolId, ToolSpec>,
}

impl BasicCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: ToolSpec) {
        self.tools.insert(tool.id, tool);
    }
}

impl ToolCatalog for BasicCatalog {
    fn find_tool(&self, id: ToolId) -> Option<&ToolSpec> {
        self.tools.get(&id)
    }
}
