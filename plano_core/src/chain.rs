use crate::arena::Scene;
use crate::command::PendingLog;
use crate::node::NodeKind;
use crate::resolver::{QueryMode, Resolver};
use glam::{Mat4, Quat};
use plano_ids::NodeId;
use plano_structs::Vector3;
use rustc_hash::FxHashSet;
use std::f32::consts::FRAC_PI_2;

/// Children of a wall segment live on the wall plane: their "up" is the
/// wall normal. Crossing a wall container applies this fixed correction.
fn wall_axis_correction() -> Mat4 {
    Mat4::from_quat(Quat::from_rotation_x(FRAC_PI_2))
}

/// Translation+rotation of one node in its parent frame.
///
/// Scale deliberately does not enter the chain: scaling a shelf resizes
/// its bounds, it does not resize the products standing on it. Bounds
/// bake size x scale instead (see `geometry::local_bounds`).
fn local_transform(r: &Resolver<'_>, id: NodeId, mode: QueryMode) -> Option<Mat4> {
    let position = r.resolve_position(id, mode)?;
    let rotation = r.resolve_rotation(id, mode)?;
    Some(Mat4::from_rotation_translation(
        rotation.to_quat(),
        position.into(),
    ))
}

/// Accumulated local-to-scene matrix for a node, walking the effective
/// parent chain up to the content root. `None` on a broken or cyclic
/// chain.
pub fn scene_transform(
    scene: &Scene,
    log: &PendingLog,
    id: NodeId,
    mode: QueryMode,
) -> Option<Mat4> {
    let r = Resolver::new(scene, log);
    let mut mat = Mat4::IDENTITY;
    let mut visited: FxHashSet<NodeId> = FxHashSet::default();
    let mut current = id;

    loop {
        if !visited.insert(current) {
            log::warn!("transform chain loops at {}", current);
            return None;
        }
        let node = scene.get(current)?;
        if node.kind == NodeKind::Root {
            // The content root's own frame is the scene frame
            return Some(mat);
        }
        mat = local_transform(&r, current, mode)? * mat;

        let parent = r.resolve_parent(current, mode)?;
        if let Some(container) = scene.get(parent) {
            if container.kind == NodeKind::WallSegment {
                mat = wall_axis_correction() * mat;
            }
        }
        current = parent;
    }
}

/// Matrix of the node's effective parent frame.
pub fn parent_transform(
    scene: &Scene,
    log: &PendingLog,
    id: NodeId,
    mode: QueryMode,
) -> Option<Mat4> {
    let r = Resolver::new(scene, log);
    let parent = r.resolve_parent(id, mode)?;
    scene_transform(scene, log, parent, mode)
}

/// Convert a point from a node's local frame to scene coordinates.
pub fn to_scene(
    scene: &Scene,
    log: &PendingLog,
    point: Vector3,
    id: NodeId,
    mode: QueryMode,
) -> Option<Vector3> {
    let mat = scene_transform(scene, log, id, mode)?;
    Some(mat.transform_point3(point.into()).into())
}

/// Convert a scene-coordinate point into a node's local frame.
pub fn to_local(
    scene: &Scene,
    log: &PendingLog,
    point: Vector3,
    id: NodeId,
    mode: QueryMode,
) -> Option<Vector3> {
    let mat = scene_transform(scene, log, id, mode)?;
    let inv = mat.inverse();
    Some(inv.transform_point3(point.into()).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::SceneNode;
    use plano_structs::AxisAngle;

    fn deep_scene() -> (Scene, NodeId) {
        let mut scene = Scene::new();
        let root = scene.root;
        let floor = scene
            .attach(
                SceneNode::new(NodeKind::Floor).with_position(Vector3::new(1.0, 0.0, 0.0)),
                root,
            )
            .unwrap();
        let shelf = scene
            .attach(
                SceneNode::new(NodeKind::Object).with_position(Vector3::new(0.0, 2.0, 0.0)),
                floor,
            )
            .unwrap();
        (scene, shelf)
    }

    #[test]
    fn test_chain_accumulates_translations() {
        let (scene, shelf) = deep_scene();
        let log = PendingLog::new();
        let p = to_scene(&scene, &log, Vector3::ZERO, shelf, QueryMode::Exact).unwrap();
        assert!((p - Vector3::new(1.0, 2.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_round_trip_to_local() {
        let (scene, shelf) = deep_scene();
        let log = PendingLog::new();
        let original = Vector3::new(0.3, -0.7, 2.5);
        let there = to_scene(&scene, &log, original, shelf, QueryMode::Exact).unwrap();
        let back = to_local(&scene, &log, there, shelf, QueryMode::Exact).unwrap();
        assert!((back - original).length() < 1e-4);
    }

    #[test]
    fn test_detached_node_has_no_transform() {
        let mut scene = Scene::new();
        let mut orphan = SceneNode::new(NodeKind::Object);
        orphan.id = NodeId::new();
        let id = orphan.id;
        scene.arena.insert(orphan).unwrap();

        let log = PendingLog::new();
        assert!(scene_transform(&scene, &log, id, QueryMode::Exact).is_none());
    }

    #[test]
    fn test_wall_child_gets_axis_correction() {
        let mut scene = Scene::new();
        let root = scene.root;
        let wall = scene
            .attach(SceneNode::new(NodeKind::WallSegment), root)
            .unwrap();
        let bracket = scene
            .attach(
                SceneNode::new(NodeKind::Object).with_position(Vector3::new(0.0, 1.0, 0.0)),
                wall,
            )
            .unwrap();

        let log = PendingLog::new();
        let p = to_scene(&scene, &log, Vector3::ZERO, bracket, QueryMode::Exact).unwrap();
        // The bracket's local +Y offset rotates onto the wall plane (-Z up
        // swaps with Y under the 90-degree X correction)
        assert!(p.y.abs() < 1e-5, "y was {}", p.y);
        assert!((p.z - 1.0).abs() < 1e-5, "z was {}", p.z);
    }

    #[test]
    fn test_rotated_parent_rotates_children() {
        let mut scene = Scene::new();
        let root = scene.root;
        let mut zone = SceneNode::new(NodeKind::Zone);
        zone.rotation = AxisAngle::around_y(std::f32::consts::FRAC_PI_2);
        let zone = scene.attach(zone, root).unwrap();
        let item = scene
            .attach(
                SceneNode::new(NodeKind::Object).with_position(Vector3::new(1.0, 0.0, 0.0)),
                zone,
            )
            .unwrap();

        let log = PendingLog::new();
        let p = to_scene(&scene, &log, Vector3::ZERO, item, QueryMode::Exact).unwrap();
        assert!((p - Vector3::new(0.0, 0.0, -1.0)).length() < 1e-5);
    }
}
