use crate::error::CoreError;
use crate::node::{NodeKind, SceneNode};
use plano_ids::NodeId;

/// Arena-based storage for scene nodes.
/// Uses generation-checked slots indexed by NodeId for O(1) lookups.
/// NodeIds are issued sequentially and 0 is reserved, so the id value
/// maps directly to a slot index (minus 1, with bounds checking).
pub struct NodeArena {
    slots: Vec<Slot>,
    live: u32,
}

struct Slot {
    generation: u32,
    node: Option<SceneNode>,
}

/// A handle pinning a node id to the arena generation it was issued in.
/// Resolving a handle after the slot was recycled fails instead of
/// silently reading a different node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeHandle {
    pub id: NodeId,
    pub generation: u32,
}

impl NodeArena {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            live: 0,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            live: 0,
        }
    }

    fn index_of(id: NodeId) -> Option<usize> {
        let id_val = id.as_uid32().as_u32();
        if id_val == 0 {
            return None; // NodeId 0 is reserved (nil)
        }
        Some((id_val as usize) - 1)
    }

    /// Insert a node under its own id.
    pub fn insert(&mut self, node: SceneNode) -> Result<NodeHandle, CoreError> {
        let id = node.id;
        let idx = Self::index_of(id).ok_or(CoreError::StaleHandle(id))?;

        if idx >= self.slots.len() {
            self.slots.resize_with(idx + 1, || Slot {
                generation: 0,
                node: None,
            });
        }

        let slot = &mut self.slots[idx];
        if slot.node.is_some() {
            return Err(CoreError::ArenaSlotOccupied(id));
        }

        slot.generation += 1;
        slot.node = Some(node);
        self.live += 1;
        Ok(NodeHandle {
            id,
            generation: slot.generation,
        })
    }

    #[inline]
    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        let idx = Self::index_of(id)?;
        self.slots.get(idx)?.node.as_ref()
    }

    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        let idx = Self::index_of(id)?;
        self.slots.get_mut(idx)?.node.as_mut()
    }

    /// Resolve a generation-checked handle.
    pub fn get_checked(&self, handle: NodeHandle) -> Result<&SceneNode, CoreError> {
        let idx = Self::index_of(handle.id).ok_or(CoreError::StaleHandle(handle.id))?;
        let slot = self
            .slots
            .get(idx)
            .ok_or(CoreError::StaleHandle(handle.id))?;
        if slot.generation != handle.generation {
            return Err(CoreError::StaleHandle(handle.id));
        }
        slot.node
            .as_ref()
            .ok_or(CoreError::StaleHandle(handle.id))
    }

    /// Remove a node, leaving a hole (`None`).
    #[inline]
    pub fn remove(&mut self, id: NodeId) -> Option<SceneNode> {
        let idx = Self::index_of(id)?;
        let slot = self.slots.get_mut(idx)?;
        let out = slot.node.take()?;
        self.live -= 1;
        Some(out)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.live as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Iterate over all live nodes.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &SceneNode)> {
        self.slots.iter().enumerate().filter_map(|(idx, slot)| {
            slot.node
                .as_ref()
                .map(|node| (NodeId::from_u32((idx + 1) as u32), node))
        })
    }

    pub fn keys(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.iter().map(|(id, _)| id)
    }

    pub fn values(&self) -> impl Iterator<Item = &SceneNode> {
        self.slots.iter().filter_map(|slot| slot.node.as_ref())
    }

    #[inline]
    pub fn contains_key(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }
}

impl Default for NodeArena {
    fn default() -> Self {
        Self::new()
    }
}

/// The committed scene graph: a node arena plus the content root.
///
/// The core never mutates this directly during an evaluation pass; the
/// only write paths are `EvaluationContext::commit` and the speculative
/// insert/remove pair that brackets a pass.
pub struct Scene {
    pub arena: NodeArena,
    pub root: NodeId,
}

impl Scene {
    pub fn new() -> Self {
        let mut arena = NodeArena::new();
        let mut root = SceneNode::new(NodeKind::Root).with_name("root");
        root.id = NodeId::new();
        let root_id = root.id;
        arena
            .insert(root)
            .expect("fresh arena cannot have an occupied root slot");
        Self {
            arena,
            root: root_id,
        }
    }

    #[inline]
    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.arena.get(id)
    }

    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.arena.get_mut(id)
    }

    /// Insert a node and commit it as a child of `parent` in one step.
    /// Used for scene setup; interactive edits go through commands.
    pub fn attach(&mut self, mut node: SceneNode, parent: NodeId) -> Result<NodeId, CoreError> {
        if !self.arena.contains_key(parent) {
            return Err(CoreError::StaleHandle(parent));
        }
        if node.id.is_nil() {
            node.id = NodeId::new();
        }
        let id = node.id;
        node.parent = parent;
        self.arena.insert(node)?;
        if let Some(p) = self.arena.get_mut(parent) {
            p.children.push(id);
        }
        Ok(id)
    }

    /// All committed descendants of a node, depth-first.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = match self.get(id) {
            Some(n) => n.children.clone(),
            None => return out,
        };
        while let Some(next) = stack.pop() {
            if let Some(n) = self.get(next) {
                stack.extend_from_slice(&n.children);
            }
            out.push(next);
        }
        out
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeKind;

    fn node() -> SceneNode {
        let mut n = SceneNode::new(NodeKind::Object);
        n.id = NodeId::new();
        n
    }

    #[test]
    fn test_insert_get_remove() {
        let mut arena = NodeArena::new();
        let n = node();
        let id = n.id;
        arena.insert(n).unwrap();
        assert_eq!(arena.len(), 1);
        assert!(arena.get(id).is_some());
        assert!(arena.remove(id).is_some());
        assert!(arena.get(id).is_none());
        assert!(arena.is_empty());
    }

    #[test]
    fn test_double_insert_is_rejected() {
        let mut arena = NodeArena::new();
        let n = node();
        let copy = n.clone();
        arena.insert(n).unwrap();
        assert!(matches!(
            arena.insert(copy),
            Err(CoreError::ArenaSlotOccupied(_))
        ));
    }

    #[test]
    fn test_nil_id_is_never_stored() {
        let mut arena = NodeArena::new();
        let n = SceneNode::new(NodeKind::Object); // id stays nil
        assert!(arena.insert(n).is_err());
        assert!(arena.get(NodeId::nil()).is_none());
    }

    #[test]
    fn test_stale_handle_rejected_after_recycle() {
        let mut arena = NodeArena::new();
        let n = node();
        let id = n.id;
        let handle = arena.insert(n).unwrap();
        assert!(arena.get_checked(handle).is_ok());

        let removed = arena.remove(id).unwrap();
        arena.insert(removed).unwrap(); // same slot, new generation
        assert!(matches!(
            arena.get_checked(handle),
            Err(CoreError::StaleHandle(_))
        ));
    }

    #[test]
    fn test_scene_attach_links_children() {
        let mut scene = Scene::new();
        let id = scene.attach(SceneNode::new(NodeKind::Floor), scene.root).unwrap();
        let child = scene.attach(SceneNode::new(NodeKind::Object), id).unwrap();
        assert_eq!(scene.get(child).unwrap().parent, id);
        assert!(scene.get(id).unwrap().children.contains(&child));
        assert_eq!(scene.descendants(scene.root).len(), 2);
    }

    #[test]
    fn test_scene_attach_rejects_missing_parent() {
        let mut scene = Scene::new();
        let bogus = NodeId::new();
        let before = scene.arena.len();
        assert!(matches!(
            scene.attach(SceneNode::new(NodeKind::Object), bogus),
            Err(CoreError::StaleHandle(id)) if id == bogus
        ));
        assert_eq!(scene.arena.len(), before);
    }
}
