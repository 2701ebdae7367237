mod bitmask;
mod plane;
mod shape;

pub use bitmask::BinaryGrid;
pub use bitmask::{decode_bitmask, encode_bitmask};

pub use plane::Plane;
pub use plane::composite_plane;

pub use shape::{Mask, Polygon, Roi, Shape, ShapeKind};
