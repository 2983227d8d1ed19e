use crate::arena::Scene;
use crate::command::{Command, CommandKind, PendingLog};
use crate::match_set::MatchSet;
use crate::node::SceneNode;
use plano_ids::{NodeId, TxnId};
use plano_structs::OrientedBox;
use rustc_hash::{FxHashMap, FxHashSet};

/// All per-pass mutable evaluation state: the pending command log, the
/// match set, surrogate geometry overrides and the ignore set.
///
/// Exactly one context is in flight at a time. It is constructed when an
/// edit proposal arrives and consumed by `commit` or `abort`; nothing in
/// it outlives the pass, so no state leaks into the next evaluation.
pub struct EvaluationContext {
    pub txn: TxnId,
    pub log: PendingLog,
    pub match_set: MatchSet,
    surrogates: FxHashMap<NodeId, OrientedBox>,
    ignore: FxHashSet<NodeId>,
    /// Nodes inserted into the arena speculatively during this pass;
    /// removed again on abort or rollback
    speculative: FxHashSet<NodeId>,
}

impl EvaluationContext {
    pub fn new() -> Self {
        Self {
            txn: TxnId::new(),
            log: PendingLog::new(),
            match_set: MatchSet::new(),
            surrogates: FxHashMap::default(),
            ignore: FxHashSet::default(),
            speculative: FxHashSet::default(),
        }
    }

    // ------------------ Surrogates ------------------

    /// Register a temporary geometric stand-in so a hypothetical edit
    /// can be collision-tested before any command exists for it.
    pub fn set_surrogate(&mut self, id: NodeId, volume: OrientedBox) {
        self.surrogates.insert(id, volume);
    }

    pub fn clear_surrogate(&mut self, id: NodeId) {
        self.surrogates.remove(&id);
    }

    pub fn surrogate_for(&self, id: NodeId) -> Option<&OrientedBox> {
        self.surrogates.get(&id)
    }

    // ------------------ Ignore set ------------------

    pub fn ignore_node(&mut self, id: NodeId) {
        self.ignore.insert(id);
    }

    /// Ignore a node and its whole committed subtree; used so a moving
    /// branch does not collide with itself.
    pub fn ignore_branch(&mut self, scene: &Scene, id: NodeId) {
        self.ignore.insert(id);
        for descendant in scene.descendants(id) {
            self.ignore.insert(descendant);
        }
    }

    pub fn is_ignored(&self, id: NodeId) -> bool {
        self.ignore.contains(&id)
    }

    // ------------------ Speculative nodes ------------------

    /// Insert a not-yet-committed node into the arena and log its add.
    /// The node carries `pending_parent` until the pass commits; the
    /// parent's committed child list is untouched until then.
    pub fn insert_speculative(
        &mut self,
        scene: &mut Scene,
        mut node: SceneNode,
        parent: NodeId,
    ) -> Option<NodeId> {
        if node.id.is_nil() {
            node.id = NodeId::new();
        }
        let id = node.id;
        node.parent = NodeId::nil();
        node.pending_parent = parent;
        let position = node.position;
        let rotation = node.rotation;

        if let Err(err) = scene.arena.insert(node) {
            log::warn!("speculative insert failed for {}: {}", id, err);
            return None;
        }
        self.speculative.insert(id);
        self.log.push(Command::new(
            self.txn,
            id,
            CommandKind::AddChild {
                parent,
                position,
                rotation,
            },
        ));
        Some(id)
    }

    pub fn is_speculative(&self, id: NodeId) -> bool {
        self.speculative.contains(&id)
    }

    // ------------------ Rollback / commit / abort ------------------

    /// Roll the log back to `watermark`, reversing speculative inserts
    /// made after it.
    pub fn rollback_to(&mut self, scene: &mut Scene, watermark: usize) {
        let rolled = self.log.truncate_to(watermark);
        for cmd in rolled {
            if matches!(cmd.kind, CommandKind::AddChild { .. })
                && self.speculative.remove(&cmd.target)
            {
                scene.arena.remove(cmd.target);
            }
        }
    }

    /// Discard the whole pass. Speculative nodes leave the arena and the
    /// log is dropped; committed state is untouched.
    pub fn abort(mut self, scene: &mut Scene) {
        self.rollback_to(scene, 0);
    }

    /// Apply the pending log to committed state, oldest first, and end
    /// the pass. Transient moves are cursor tracking only and are not
    /// committed.
    pub fn commit(mut self, scene: &mut Scene) {
        for cmd in self.log.drain() {
            apply_command(scene, &cmd);
        }
    }
}

impl Default for EvaluationContext {
    fn default() -> Self {
        Self::new()
    }
}

fn apply_command(scene: &mut Scene, cmd: &Command) {
    let target = cmd.target;
    match &cmd.kind {
        CommandKind::AddChild {
            parent,
            position,
            rotation,
        } => {
            if let Some(node) = scene.get_mut(target) {
                node.parent = *parent;
                node.pending_parent = NodeId::nil();
                node.position = *position;
                node.rotation = *rotation;
            } else {
                log::warn!("commit: add target {} not in arena", target);
                return;
            }
            if let Some(p) = scene.get_mut(*parent) {
                if !p.children.contains(&target) {
                    p.children.push(target);
                }
            }
        }
        CommandKind::RemoveChild { parent_before } => {
            if let Some(p) = scene.get_mut(*parent_before) {
                p.children.retain(|c| *c != target);
            }
            scene.arena.remove(target);
        }
        CommandKind::Move { to, transient, .. } => {
            if *transient {
                return;
            }
            if let Some(node) = scene.get_mut(target) {
                node.position = *to;
            }
        }
        CommandKind::Scale { to, .. } => {
            if let Some(node) = scene.get_mut(target) {
                node.scale = *to;
            }
        }
        CommandKind::Rotate { to, .. } => {
            if let Some(node) = scene.get_mut(target) {
                node.rotation = *to;
            }
        }
        CommandKind::Reparent {
            parent_before,
            parent_after,
            position_after,
            ..
        } => {
            if let Some(p) = scene.get_mut(*parent_before) {
                p.children.retain(|c| *c != target);
            }
            if let Some(node) = scene.get_mut(target) {
                node.parent = *parent_after;
                node.pending_parent = NodeId::nil();
                node.position = *position_after;
            }
            if let Some(p) = scene.get_mut(*parent_after) {
                if !p.children.contains(&target) {
                    p.children.push(target);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{NodeKind, SceneNode};
    use plano_structs::Vector3;

    #[test]
    fn test_speculative_insert_and_abort() {
        let mut scene = Scene::new();
        let root = scene.root;
        let mut ctx = EvaluationContext::new();

        let id = ctx
            .insert_speculative(&mut scene, SceneNode::new(NodeKind::Object), root)
            .unwrap();
        assert!(scene.get(id).unwrap().is_speculative());
        assert!(!scene.get(root).unwrap().children.contains(&id));

        ctx.abort(&mut scene);
        assert!(scene.get(id).is_none());
    }

    #[test]
    fn test_commit_links_speculative_node() {
        let mut scene = Scene::new();
        let root = scene.root;
        let mut ctx = EvaluationContext::new();

        let node = SceneNode::new(NodeKind::Object).with_position(Vector3::new(1.0, 0.0, 0.0));
        let id = ctx.insert_speculative(&mut scene, node, root).unwrap();
        ctx.commit(&mut scene);

        let committed = scene.get(id).unwrap();
        assert_eq!(committed.parent, root);
        assert!(committed.pending_parent.is_nil());
        assert!(scene.get(root).unwrap().children.contains(&id));
    }

    #[test]
    fn test_rollback_removes_only_later_inserts() {
        let mut scene = Scene::new();
        let root = scene.root;
        let mut ctx = EvaluationContext::new();

        let first = ctx
            .insert_speculative(&mut scene, SceneNode::new(NodeKind::Object), root)
            .unwrap();
        let mark = ctx.log.watermark();
        let second = ctx
            .insert_speculative(&mut scene, SceneNode::new(NodeKind::Object), root)
            .unwrap();

        ctx.rollback_to(&mut scene, mark);
        assert!(scene.get(first).is_some());
        assert!(scene.get(second).is_none());
        assert_eq!(ctx.log.len(), 1);
    }

    #[test]
    fn test_commit_skips_transient_moves() {
        let mut scene = Scene::new();
        let root = scene.root;
        let id = scene
            .attach(SceneNode::new(NodeKind::Object), root)
            .unwrap();

        let mut ctx = EvaluationContext::new();
        ctx.log.push(Command::new(
            ctx.txn,
            id,
            CommandKind::Move {
                from: Vector3::ZERO,
                to: Vector3::new(5.0, 0.0, 0.0),
                transient: true,
            },
        ));
        ctx.commit(&mut scene);
        assert_eq!(scene.get(id).unwrap().position, Vector3::ZERO);
    }
}
