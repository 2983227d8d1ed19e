use plano_structs::{OrientedBox, Vector3};

/// Hard cap guaranteeing termination no matter the tolerance.
pub const MAX_BISECTION_ITERS: usize = 32;

fn collides_at(volume: &OrientedBox, center: Vector3, targets: &[OrientedBox]) -> bool {
    let probe = OrientedBox::new(center, volume.half_extents, volume.rotation);
    targets.iter().any(|t| probe.intersects(t))
}

/// Bisection search for the closest legal point on the segment from a
/// known-legal start to a colliding end.
///
/// The returned point is always on the legal side: the lower bound of
/// the bisection, never the midpoint under test. Runs at most
/// `MAX_BISECTION_ITERS` rounds, stopping early once the bracket is
/// shorter than `tolerance`.
pub fn divide_and_conquer_position(
    volume: &OrientedBox,
    legal_start: Vector3,
    illegal_end: Vector3,
    targets: &[OrientedBox],
    tolerance: f32,
) -> Vector3 {
    let mut lo = legal_start;
    let mut hi = illegal_end;

    for _ in 0..MAX_BISECTION_ITERS {
        if (hi - lo).length() <= tolerance {
            break;
        }
        let mid = Vector3::lerp(lo, hi, 0.5);
        if collides_at(volume, mid, targets) {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    lo
}

/// One sliding step: take the clamped target outright when it is clear,
/// otherwise bisect toward it.
fn slide(
    volume: &OrientedBox,
    from: Vector3,
    toward: Vector3,
    targets: &[OrientedBox],
    tolerance: f32,
) -> Vector3 {
    if (toward - from).length() <= tolerance {
        return from;
    }
    if !collides_at(volume, toward, targets) {
        return toward;
    }
    divide_and_conquer_position(volume, from, toward, targets, tolerance)
}

/// Axis-sliding closest legal position near the cursor.
///
/// First the full 3D segment is bisected, then the search re-runs with
/// the Y component pinned (recovering lateral travel on the floor
/// plane), then with X pinned as well (recovering depth travel). The
/// result hugs the cursor instead of retreating along the worst-case
/// diagonal.
pub fn closest_legal_position(
    volume: &OrientedBox,
    legal_start: Vector3,
    cursor_end: Vector3,
    targets: &[OrientedBox],
    tolerance: f32,
) -> Vector3 {
    if !collides_at(volume, cursor_end, targets) {
        return cursor_end;
    }

    let mut p = divide_and_conquer_position(volume, legal_start, cursor_end, targets, tolerance);

    // Y-clamped: slide in X/Z toward the cursor
    let y_clamped = Vector3::new(cursor_end.x, p.y, cursor_end.z);
    p = slide(volume, p, y_clamped, targets, tolerance);

    // X-clamped as well: slide the remaining Z toward the cursor
    let x_clamped = Vector3::new(p.x, p.y, cursor_end.z);
    p = slide(volume, p, x_clamped, targets, tolerance);

    p
}
