// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use crate::constant::MIN_POLYGON_POINTS;

/// Keep every `stride`-th point of a contour, starting at the first
///
/// A stride of 0 is treated as 1.
///
/// # Examples
///
/// ```
/// use roicopy_core::cv::decimate;
///
/// let contour: Vec<[f64; 2]> = (0..10).map(|i| [i as f64, 0.0]).collect();
/// let kept = decimate(&contour, 4);
///
/// assert_eq!(kept, vec![[0.0, 0.0], [4.0, 0.0], [8.0, 0.0]]);
/// ```
pub fn decimate(contour: &[[f64; 2]], stride: usize) -> Vec<[f64; 2]> {
    contour.iter().step_by(stride.max(1)).copied().collect()
}

/// Convert (row, col) points to translated (x, y) points
pub fn to_xy(points: &[[f64; 2]], x_offset: f64, y_offset: f64) -> Vec<[f64; 2]> {
    points
        .iter()
        .map(|[row, col]| [col + x_offset, row + y_offset])
        .collect()
}

/// Decimate a (row, col) contour into translated (x, y) polygon points
///
/// Returns an empty vector when fewer than two points survive decimation,
/// as such a contour cannot form a polygon.
///
/// # Arguments
///
/// * `contour` - Ordered (row, col) points
/// * `stride` - Keep every nth point
/// * `x_offset` - Translation added to each column
/// * `y_offset` - Translation added to each row
///
/// # Examples
///
/// ```
/// use roicopy_core::cv::decimate_xy;
///
/// let contour: Vec<[f64; 2]> = (0..10).map(|i| [i as f64, 0.5]).collect();
///
/// assert_eq!(decimate_xy(&contour, 4, 0.0, 0.0).len(), 3);
/// assert!(decimate_xy(&contour[..1], 4, 0.0, 0.0).is_empty());
/// ```
pub fn decimate_xy(contour: &[[f64; 2]], stride: usize, x_offset: f64, y_offset: f64) -> Vec<[f64; 2]> {
    let coords = decimate(contour, stride);

    if coords.len() < MIN_POLYGON_POINTS {
        return Vec::new();
    }

    to_xy(&coords, x_offset, y_offset)
}

/// Render (x, y) points as an OMERO polygon points string
///
/// # Examples
///
/// ```
/// use roicopy_core::cv::format_points;
///
/// assert_eq!(format_points(&[[10.0, 20.5], [3.25, 4.0]]), "10.0,20.5, 3.25,4.0");
/// ```
pub fn format_points(points: &[[f64; 2]]) -> String {
    points
        .iter()
        .map(|[x, y]| format!("{},{}", format_coord(*x), format_coord(*y)))
        .collect::<Vec<String>>()
        .join(", ")
}

/// Shortest round-trip float formatting that always keeps a fractional part
fn format_coord(value: f64) -> String {
    format!("{:?}", value)
}

#[cfg(test)]
mod test {

    use super::*;

    fn line(n: usize) -> Vec<[f64; 2]> {
        (0..n).map(|i| [i as f64, i as f64 * 2.0]).collect()
    }

    #[test]
    fn test_decimate_ten_points() {
        let kept = decimate(&line(10), 4);
        assert_eq!(kept, vec![[0.0, 0.0], [4.0, 8.0], [8.0, 16.0]]);
    }

    #[test]
    fn test_decimate_single_point() {
        assert_eq!(decimate(&line(1), 4).len(), 1);
        assert!(decimate(&[], 4).is_empty());
    }

    #[test]
    fn test_decimate_exact_multiple() {
        assert_eq!(decimate(&line(8), 4).len(), 2);
        assert_eq!(decimate(&line(9), 4).len(), 3);
    }

    #[test]
    fn test_decimate_zero_stride() {
        assert_eq!(decimate(&line(3), 0).len(), 3);
    }

    #[test]
    fn test_decimate_xy_thin_contour_is_empty() {
        assert!(decimate_xy(&line(1), 4, 0.0, 0.0).is_empty());
        // 5 points keep indices 0 and 4
        assert_eq!(
            decimate_xy(&line(5), 4, 0.0, 0.0),
            vec![[0.0, 0.0], [8.0, 4.0]]
        );
    }

    #[test]
    fn test_to_xy_swaps_and_offsets() {
        let xy = to_xy(&[[1.0, 2.0], [3.5, 4.5]], 10.0, -1.0);
        assert_eq!(xy, vec![[12.0, 0.0], [14.5, 2.5]]);
    }

    #[test]
    fn test_format_coord() {
        assert_eq!(format_coord(2.0), "2.0");
        assert_eq!(format_coord(3.5), "3.5");
        assert_eq!(format_coord(-0.5), "-0.5");
    }
}
