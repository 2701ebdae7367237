// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use crate::constant::{CONTOUR_LEVEL, POINT_STRIDE};
use crate::cv::{find_plane_contours, longest_contour};
use crate::error::RoiCopyError;
use crate::im::{Mask, Polygon, composite_plane};

/// Settings for converting a mask into a polygon
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOptions {
    /// Keep every nth contour point
    pub stride: usize,
    /// Iso-value used to trace the composited plane
    pub level: f64,
    /// Translation applied to polygon x coordinates
    pub x_offset: f64,
    /// Translation applied to polygon y coordinates
    pub y_offset: f64,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            stride: POINT_STRIDE,
            level: CONTOUR_LEVEL,
            x_offset: 0.0,
            y_offset: 0.0,
        }
    }
}

/// Result of converting one mask
#[derive(Debug, Clone, PartialEq)]
pub enum Conversion {
    /// The longest contour produced a polygon
    Polygon(Polygon),
    /// The mask had no foreground boundary
    NoContour,
    /// The longest contour had fewer than two points after decimation
    TooThin,
}

impl Conversion {
    pub fn into_polygon(self) -> Option<Polygon> {
        match self {
            Conversion::Polygon(polygon) => Some(polygon),
            _ => None,
        }
    }
}

/// Convert a bit-packed mask into a polygon on a full-size image plane
///
/// The mask is decoded, composited at its own bounding-box offset inside
/// a blank `plane_width` x `plane_height` plane, and traced at the option
/// level. Only the longest contour is kept, decimated by the option stride
/// and translated by the option offset. The polygon inherits the mask's
/// z and t indices.
///
/// # Arguments
///
/// * `mask` - Source mask shape
/// * `plane_width` - Width of the image the mask belongs to
/// * `plane_height` - Height of the image the mask belongs to
/// * `options` - Stride, level and output offset
///
/// # Examples
///
/// ```
/// use roicopy_core::im::{BinaryGrid, Mask};
/// use roicopy_core::pipeline::{Conversion, PipelineOptions, mask_to_polygon};
///
/// let mask = Mask::from_grid(&BinaryGrid::ones(4, 4), 2.0, 2.0);
/// let conversion = mask_to_polygon(&mask, 8, 8, &PipelineOptions::default()).unwrap();
///
/// assert!(matches!(conversion, Conversion::Polygon(_)));
/// ```
pub fn mask_to_polygon(
    mask: &Mask,
    plane_width: usize,
    plane_height: usize,
    options: &PipelineOptions,
) -> Result<Conversion, RoiCopyError> {
    let grid = mask.decode()?;
    let (x0, y0) = mask.offset();
    let plane = composite_plane(plane_width, plane_height, &grid, x0, y0)?;

    let contours = find_plane_contours(&plane, options.level);

    let Some(contour) = longest_contour(&contours) else {
        return Ok(Conversion::NoContour);
    };

    let polygon = Polygon::from_contour(
        contour,
        options.stride,
        options.x_offset,
        options.y_offset,
        mask.the_z,
        mask.the_t,
    );

    Ok(polygon.map_or(Conversion::TooThin, Conversion::Polygon))
}

#[cfg(test)]
mod test {

    use super::*;
    use crate::im::BinaryGrid;

    #[test]
    fn test_block_mask_to_polygon() {
        let mut mask = Mask::from_grid(&BinaryGrid::ones(4, 4), 2.0, 2.0);
        mask.the_z = Some(1);
        mask.the_t = Some(2);
        mask.the_c = Some(0);

        let polygon = mask_to_polygon(&mask, 8, 8, &PipelineOptions::default())
            .unwrap()
            .into_polygon()
            .unwrap();

        // 17 contour points keep indices 0, 4, 8, 12 and 16
        assert_eq!(
            polygon.points,
            "5.0,5.5, 1.5,5.0, 2.0,1.5, 5.5,2.0, 5.0,5.5"
        );
        assert_eq!(polygon.the_z, Some(1));
        assert_eq!(polygon.the_t, Some(2));
        assert_eq!(polygon.stroke_color, Some(-1));
    }

    #[test]
    fn test_polygon_keeps_plane_coordinates() {
        let mask = Mask::from_grid(&BinaryGrid::ones(2, 2), 5.0, 1.0);
        let polygon = mask_to_polygon(&mask, 10, 10, &PipelineOptions::default())
            .unwrap()
            .into_polygon()
            .unwrap();

        for [x, y] in polygon.vertices() {
            assert!((4.5..=6.5).contains(&x));
            assert!((0.5..=2.5).contains(&y));
        }
    }

    #[test]
    fn test_empty_mask_has_no_contour() {
        let grid = BinaryGrid::new(2, 2, vec![0, 0, 0, 0]).unwrap();
        let mask = Mask::from_grid(&grid, 0.0, 0.0);
        let conversion = mask_to_polygon(&mask, 4, 4, &PipelineOptions::default()).unwrap();
        assert_eq!(conversion, Conversion::NoContour);
    }

    #[test]
    fn test_corner_pixel_is_too_thin() {
        let mask = Mask::from_grid(&BinaryGrid::ones(1, 1), 0.0, 0.0);
        let conversion = mask_to_polygon(&mask, 8, 8, &PipelineOptions::default()).unwrap();
        assert_eq!(conversion, Conversion::TooThin);
    }

    #[test]
    fn test_mask_outside_plane() {
        let mask = Mask::from_grid(&BinaryGrid::ones(4, 4), 6.0, 0.0);
        let err = mask_to_polygon(&mask, 8, 8, &PipelineOptions::default()).unwrap_err();
        assert!(matches!(err, RoiCopyError::OutOfBoundsError { .. }));
    }

    #[test]
    fn test_truncated_mask_bytes() {
        let mut mask = Mask::from_grid(&BinaryGrid::ones(4, 4), 0.0, 0.0);
        mask.bytes.truncate(1);
        let err = mask_to_polygon(&mask, 8, 8, &PipelineOptions::default()).unwrap_err();
        assert!(matches!(err, RoiCopyError::MalformedMaskError { bits: 8, .. }));
    }

    #[test]
    fn test_huge_mask_size_is_malformed() {
        let mut mask = Mask::from_grid(&BinaryGrid::ones(4, 2), 0.0, 0.0);
        mask.width = 1e20;
        mask.height = 1e20;
        let err = mask_to_polygon(&mask, 8, 8, &PipelineOptions::default()).unwrap_err();
        assert!(matches!(err, RoiCopyError::MalformedMaskError { bits: 8, .. }));
    }

    #[test]
    fn test_negative_mask_size_is_malformed() {
        let mut mask = Mask::from_grid(&BinaryGrid::ones(4, 2), 0.0, 0.0);
        mask.width = -4.0;
        let err = mask_to_polygon(&mask, 8, 8, &PipelineOptions::default()).unwrap_err();
        assert!(matches!(err, RoiCopyError::MalformedMaskError { .. }));
    }
}
