pub mod vector3;
pub use vector3::*;

pub mod rotation;
pub use rotation::*;

pub mod transform_3d;
pub use transform_3d::*;

pub mod aabb;
pub use aabb::*;

pub mod obb;
pub use obb::*;

pub mod profile;
pub use profile::*;

pub mod wall;
pub use wall::*;
