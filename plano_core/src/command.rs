use plano_ids::{NodeId, TxnId};
use plano_structs::{AxisAngle, Vector3};
use serde::{Deserialize, Serialize};

/// One recorded state transition. Commands are immutable; committed node
/// state only ever changes by applying them in log order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub txn: TxnId,
    pub target: NodeId,
    pub kind: CommandKind,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum CommandKind {
    /// Attach a (speculative) node under `parent`
    AddChild {
        parent: NodeId,
        position: Vector3,
        rotation: AxisAngle,
    },
    /// Detach and destroy the target
    RemoveChild { parent_before: NodeId },
    /// Reposition within the current parent. Transient moves track the
    /// cursor during a drag and carry no parenting semantics.
    Move {
        from: Vector3,
        to: Vector3,
        transient: bool,
    },
    Scale { from: Vector3, to: Vector3 },
    Rotate { from: AxisAngle, to: AxisAngle },
    /// Move the target to a new parent, repositioning it in the new frame
    Reparent {
        parent_before: NodeId,
        parent_after: NodeId,
        position_before: Vector3,
        position_after: Vector3,
    },
}

impl Command {
    pub fn new(txn: TxnId, target: NodeId, kind: CommandKind) -> Self {
        Self { txn, target, kind }
    }

    /// Whether this command decides the target's effective parent.
    pub fn has_parenting_effect(&self) -> bool {
        matches!(
            self.kind,
            CommandKind::AddChild { .. }
                | CommandKind::RemoveChild { .. }
                | CommandKind::Reparent { .. }
        )
    }

    /// The parent this command leaves the target under, if it has one.
    pub fn parent_after(&self) -> Option<NodeId> {
        match &self.kind {
            CommandKind::AddChild { parent, .. } => Some(*parent),
            CommandKind::Reparent { parent_after, .. } => Some(*parent_after),
            CommandKind::RemoveChild { .. } => Some(NodeId::nil()),
            _ => None,
        }
    }
}

/// The ordered, uncommitted edits of one evaluation pass.
///
/// Append-only while the pass runs; `truncate_to` rolls back to a saved
/// watermark when a multi-step operation fails partway.
#[derive(Clone, Debug, Default)]
pub struct PendingLog {
    commands: Vec<Command>,
}

impl PendingLog {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    pub fn push(&mut self, command: Command) {
        self.commands.push(command);
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Oldest-first, the order commits apply in.
    pub fn iter(&self) -> impl Iterator<Item = &Command> {
        self.commands.iter()
    }

    /// Newest-first, the order speculative resolution scans in.
    pub fn iter_newest_first(&self) -> impl Iterator<Item = &Command> {
        self.commands.iter().rev()
    }

    /// Newest-first commands targeting one node.
    pub fn commands_for(&self, target: NodeId) -> impl Iterator<Item = &Command> {
        self.iter_newest_first().filter(move |c| c.target == target)
    }

    /// Whether the log schedules this node for removal.
    pub fn is_removed(&self, target: NodeId) -> bool {
        // A later re-add supersedes an earlier remove
        for cmd in self.commands_for(target) {
            match cmd.kind {
                CommandKind::RemoveChild { .. } => return true,
                CommandKind::AddChild { .. } | CommandKind::Reparent { .. } => return false,
                _ => {}
            }
        }
        false
    }

    /// Rollback watermark for multi-step operations.
    pub fn watermark(&self) -> usize {
        self.commands.len()
    }

    /// Drop every command appended after `watermark`, returning them
    /// newest-first so the caller can reverse their side effects.
    pub fn truncate_to(&mut self, watermark: usize) -> Vec<Command> {
        let mut rolled: Vec<Command> = self.commands.split_off(watermark);
        rolled.reverse();
        rolled
    }

    pub fn drain(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mv(target: NodeId, x: f32) -> Command {
        Command::new(
            TxnId::new(),
            target,
            CommandKind::Move {
                from: Vector3::ZERO,
                to: Vector3::new(x, 0.0, 0.0),
                transient: false,
            },
        )
    }

    #[test]
    fn test_newest_first_order() {
        let target = NodeId::new();
        let mut log = PendingLog::new();
        log.push(mv(target, 1.0));
        log.push(mv(target, 2.0));

        let newest = log.commands_for(target).next().unwrap();
        match newest.kind {
            CommandKind::Move { to, .. } => assert_eq!(to.x, 2.0),
            _ => panic!("expected move"),
        }
    }

    #[test]
    fn test_removal_superseded_by_readd() {
        let target = NodeId::new();
        let parent = NodeId::new();
        let mut log = PendingLog::new();
        log.push(Command::new(
            TxnId::new(),
            target,
            CommandKind::RemoveChild {
                parent_before: parent,
            },
        ));
        assert!(log.is_removed(target));

        log.push(Command::new(
            TxnId::new(),
            target,
            CommandKind::AddChild {
                parent,
                position: Vector3::ZERO,
                rotation: AxisAngle::IDENTITY,
            },
        ));
        assert!(!log.is_removed(target));
    }

    #[test]
    fn test_truncate_returns_rolled_back_newest_first() {
        let target = NodeId::new();
        let mut log = PendingLog::new();
        log.push(mv(target, 1.0));
        let mark = log.watermark();
        log.push(mv(target, 2.0));
        log.push(mv(target, 3.0));

        let rolled = log.truncate_to(mark);
        assert_eq!(rolled.len(), 2);
        match rolled[0].kind {
            CommandKind::Move { to, .. } => assert_eq!(to.x, 3.0),
            _ => panic!("expected move"),
        }
        assert_eq!(log.len(), 1);
    }
}
