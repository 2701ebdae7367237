pub mod contours;
pub mod points;

pub use contours::{find_contours, find_plane_contours, longest_contour};
pub use points::{decimate, decimate_xy, format_points, to_xy};
