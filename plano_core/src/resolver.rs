use crate::arena::Scene;
use crate::command::{CommandKind, PendingLog};
use plano_ids::NodeId;
use plano_structs::{AxisAngle, Vector3};
use rustc_hash::FxHashSet;

/// Whether a query sees the pending command log.
///
/// `Exact` answers "what will the scene look like after the in-flight
/// edit commits"; `Loose` sees only the last committed frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueryMode {
    Exact,
    Loose,
}

/// Speculative scene-graph resolution: committed state overlaid with the
/// pending log, most-recent-command-wins per node.
///
/// Every query is total. A broken chain, a missing node or a cycle
/// yields `None`/empty — callers treat that as "cannot determine, be
/// conservative".
pub struct Resolver<'a> {
    pub scene: &'a Scene,
    pub log: &'a PendingLog,
}

impl<'a> Resolver<'a> {
    pub fn new(scene: &'a Scene, log: &'a PendingLog) -> Self {
        Self { scene, log }
    }

    /// Effective parent. The newest pending command with parenting
    /// semantics is authoritative; pure property changes and transient
    /// moves are skipped. Falls back to committed state, then to the
    /// pending-initial-parent override carried by speculative adds.
    pub fn resolve_parent(&self, id: NodeId, mode: QueryMode) -> Option<NodeId> {
        if mode == QueryMode::Exact {
            for cmd in self.log.commands_for(id) {
                if cmd.has_parenting_effect() {
                    let p = cmd.parent_after()?;
                    return if p.is_nil() { None } else { Some(p) };
                }
            }
        }

        let node = self.scene.get(id)?;
        if !node.parent.is_nil() {
            return Some(node.parent);
        }
        if mode == QueryMode::Exact && !node.pending_parent.is_nil() {
            return Some(node.pending_parent);
        }
        None
    }

    /// Effective children: committed children minus nodes reparented
    /// away or removed in the log, plus nodes reparented or added in.
    pub fn resolve_children(&self, id: NodeId, mode: QueryMode) -> Vec<NodeId> {
        let committed: Vec<NodeId> = match self.scene.get(id) {
            Some(n) => n.children.clone(),
            None => return Vec::new(),
        };

        if mode == QueryMode::Loose {
            return committed;
        }

        let mut out: Vec<NodeId> = committed
            .into_iter()
            .filter(|c| self.resolve_parent(*c, QueryMode::Exact) == Some(id))
            .collect();

        // Nodes moved or added into this parent but not yet committed
        for cmd in self.log.iter() {
            let Some(parent_after) = cmd.parent_after() else {
                continue;
            };
            if parent_after != id || out.contains(&cmd.target) {
                continue;
            }
            if self.resolve_parent(cmd.target, QueryMode::Exact) == Some(id) {
                out.push(cmd.target);
            }
        }

        out
    }

    /// Nearest effective ancestor that is a zone (floor, generic zone or
    /// model-zone). `None` when the chain breaks, loops, or reaches the
    /// root without one.
    pub fn resolve_zone(&self, id: NodeId, mode: QueryMode) -> Option<NodeId> {
        let mut visited: FxHashSet<NodeId> = FxHashSet::default();
        let mut current = self.resolve_parent(id, mode)?;

        loop {
            if !visited.insert(current) {
                log::warn!("parent chain loops at {}", current);
                return None;
            }
            let node = self.scene.get(current)?;
            if node.kind.is_zone() {
                return Some(current);
            }
            if node.kind == crate::node::NodeKind::Root {
                return None;
            }
            current = self.resolve_parent(current, mode)?;
        }
    }

    /// Effective position. Transient moves count here: position queries
    /// are what track the cursor mid-drag.
    pub fn resolve_position(&self, id: NodeId, mode: QueryMode) -> Option<Vector3> {
        if mode == QueryMode::Exact {
            for cmd in self.log.commands_for(id) {
                match &cmd.kind {
                    CommandKind::Move { to, .. } => return Some(*to),
                    CommandKind::AddChild { position, .. } => return Some(*position),
                    CommandKind::Reparent { position_after, .. } => return Some(*position_after),
                    _ => {}
                }
            }
        }
        self.scene.get(id).map(|n| n.position)
    }

    pub fn resolve_rotation(&self, id: NodeId, mode: QueryMode) -> Option<AxisAngle> {
        if mode == QueryMode::Exact {
            for cmd in self.log.commands_for(id) {
                match &cmd.kind {
                    CommandKind::Rotate { to, .. } => return Some(*to),
                    CommandKind::AddChild { rotation, .. } => return Some(*rotation),
                    _ => {}
                }
            }
        }
        self.scene.get(id).map(|n| n.rotation)
    }

    pub fn resolve_scale(&self, id: NodeId, mode: QueryMode) -> Option<Vector3> {
        if mode == QueryMode::Exact {
            for cmd in self.log.commands_for(id) {
                if let CommandKind::Scale { to, .. } = &cmd.kind {
                    return Some(*to);
                }
            }
        }
        self.scene.get(id).map(|n| n.scale)
    }
}
