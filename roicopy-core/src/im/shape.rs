// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use std::fmt;

use crate::constant::{SHAPE_MASK, SHAPE_POLYGON, STROKE_RGBA};
use crate::cv::points::{decimate_xy, format_points};
use crate::error::RoiCopyError;
use crate::im::bitmask::{BinaryGrid, decode_bitmask, encode_bitmask};
use crate::ut::color::rgba_to_int;

/// Discriminator over the shape variants a ROI can hold
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapeKind {
    Mask,
    Polygon,
    Other(String),
}

impl ShapeKind {
    /// Resolve a kind from an OME type name such as `Mask` or `...#Mask`
    pub fn from_type_name(name: &str) -> Self {
        let name = name.rsplit('#').next().unwrap_or(name);
        match name {
            SHAPE_MASK => ShapeKind::Mask,
            SHAPE_POLYGON => ShapeKind::Polygon,
            other => ShapeKind::Other(other.to_string()),
        }
    }

    pub fn type_name(&self) -> &str {
        match self {
            ShapeKind::Mask => SHAPE_MASK,
            ShapeKind::Polygon => SHAPE_POLYGON,
            ShapeKind::Other(name) => name,
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

/// A bit-packed binary mask shape
///
/// The packed bytes hold one bit per pixel in row-major order with the
/// most significant bit first. Only the first `width * height` bits are
/// meaningful.
#[derive(Debug, Clone, PartialEq)]
pub struct Mask {
    pub id: Option<i64>,
    pub roi_id: Option<i64>,
    pub the_t: Option<i32>,
    pub the_c: Option<i32>,
    pub the_z: Option<i32>,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub bytes: Vec<u8>,
}

impl Mask {
    /// Build a mask from a dense grid placed at (x, y)
    pub fn from_grid(grid: &BinaryGrid, x: f64, y: f64) -> Self {
        Self {
            id: None,
            roi_id: None,
            the_t: None,
            the_c: None,
            the_z: None,
            x,
            y,
            width: grid.width() as f64,
            height: grid.height() as f64,
            bytes: encode_bitmask(grid),
        }
    }

    /// Unpack the mask bytes into a dense grid
    ///
    /// Fails if the declared size is negative, not finite or needs more
    /// bits than the mask holds.
    pub fn decode(&self) -> Result<BinaryGrid, RoiCopyError> {
        let valid = |v: f64| v.is_finite() && v >= 0.0;

        if !valid(self.width) || !valid(self.height) {
            return Err(RoiCopyError::MalformedMaskError {
                bits: self.bytes.len().saturating_mul(8),
                width: self.width.max(0.0) as usize,
                height: self.height.max(0.0) as usize,
            });
        }

        decode_bitmask(&self.bytes, self.width as usize, self.height as usize)
    }

    /// Integer pixel offset of the bounding box
    pub fn offset(&self) -> (i64, i64) {
        (self.x as i64, self.y as i64)
    }
}

/// A polygon shape with vertices encoded as `"x,y, x,y, ..."`
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub id: Option<i64>,
    pub the_t: Option<i32>,
    pub the_z: Option<i32>,
    pub points: String,
    pub stroke_color: Option<i32>,
}

impl Polygon {
    /// Build a polygon from a (row, col) contour
    ///
    /// Every `stride`-th point is kept, translated by the offset and
    /// emitted as (x, y). Returns `None` if fewer than two points remain.
    ///
    /// # Arguments
    ///
    /// * `contour` - Ordered (row, col) points
    /// * `stride` - Keep every nth point
    /// * `x_offset` - Translation added to each column
    /// * `y_offset` - Translation added to each row
    /// * `the_z` - Optional z-plane index
    /// * `the_t` - Optional timepoint index
    ///
    /// # Examples
    ///
    /// ```
    /// use roicopy_core::im::Polygon;
    ///
    /// let contour = vec![[0.5, 1.0], [0.5, 2.0], [1.0, 2.5], [2.0, 2.5], [2.5, 2.0]];
    /// let polygon = Polygon::from_contour(&contour, 4, 0.0, 0.0, Some(0), None).unwrap();
    ///
    /// assert_eq!(polygon.points, "1.0,0.5, 2.0,2.5");
    /// assert_eq!(polygon.stroke_color, Some(-1));
    ///
    /// assert!(Polygon::from_contour(&contour[..1], 4, 0.0, 0.0, None, None).is_none());
    /// ```
    pub fn from_contour(
        contour: &[[f64; 2]],
        stride: usize,
        x_offset: f64,
        y_offset: f64,
        the_z: Option<i32>,
        the_t: Option<i32>,
    ) -> Option<Self> {
        let coords = decimate_xy(contour, stride, x_offset, y_offset);

        if coords.is_empty() {
            return None;
        }

        let [r, g, b, a] = STROKE_RGBA;

        Some(Self {
            id: None,
            the_t,
            the_z,
            points: format_points(&coords),
            stroke_color: Some(rgba_to_int(r, g, b, a)),
        })
    }

    /// Parse the vertex string back into (x, y) pairs
    pub fn vertices(&self) -> Vec<[f64; 2]> {
        self.points
            .split(' ')
            .filter(|s| !s.is_empty())
            .filter_map(|pair| {
                let mut xy = pair.trim_end_matches(',').split(',');
                let x = xy.next()?.trim().parse().ok()?;
                let y = xy.next()?.trim().parse().ok()?;
                Some([x, y])
            })
            .collect()
    }
}

/// A shape attached to a ROI
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Mask(Mask),
    Polygon(Polygon),
    Other {
        id: Option<i64>,
        kind: String,
    },
}

impl Shape {
    pub fn kind(&self) -> ShapeKind {
        match self {
            Shape::Mask(_) => ShapeKind::Mask,
            Shape::Polygon(_) => ShapeKind::Polygon,
            Shape::Other { kind, .. } => ShapeKind::Other(kind.clone()),
        }
    }

    /// The mask payload if this shape is a mask
    pub fn as_mask(&self) -> Option<&Mask> {
        match self {
            Shape::Mask(mask) => Some(mask),
            _ => None,
        }
    }

    pub fn as_polygon(&self) -> Option<&Polygon> {
        match self {
            Shape::Polygon(polygon) => Some(polygon),
            _ => None,
        }
    }
}

/// A region of interest: an ordered collection of shapes on one image
#[derive(Debug, Clone, PartialEq)]
pub struct Roi {
    pub id: Option<i64>,
    pub image_id: i64,
    pub shapes: Vec<Shape>,
}

impl Roi {
    /// A new, unsaved ROI on the given image
    pub fn new(image_id: i64) -> Self {
        Self {
            id: None,
            image_id,
            shapes: Vec::new(),
        }
    }

    pub fn add_shape(&mut self, shape: Shape) {
        self.shapes.push(shape);
    }

    /// Mask shapes only, in order
    pub fn masks(&self) -> impl Iterator<Item = &Mask> {
        self.shapes.iter().filter_map(Shape::as_mask)
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn test_shape_kind_from_type_name() {
        assert_eq!(
            ShapeKind::from_type_name("http://www.openmicroscopy.org/Schemas/OME/2016-06#Mask"),
            ShapeKind::Mask
        );
        assert_eq!(ShapeKind::from_type_name("Polygon"), ShapeKind::Polygon);
        assert_eq!(
            ShapeKind::from_type_name("#Ellipse"),
            ShapeKind::Other("Ellipse".to_string())
        );
    }

    #[test]
    fn test_roi_masks_filters_other_shapes() {
        let mut roi = Roi::new(1);
        roi.add_shape(Shape::Other {
            id: Some(3),
            kind: "Rectangle".to_string(),
        });
        roi.add_shape(Shape::Mask(Mask::from_grid(&BinaryGrid::ones(2, 2), 0.0, 0.0)));

        assert_eq!(roi.len(), 2);
        assert_eq!(roi.masks().count(), 1);
        assert_eq!(roi.shapes[0].kind(), ShapeKind::Other("Rectangle".to_string()));
        assert!(roi.shapes[1].as_mask().is_some());
    }

    #[test]
    fn test_mask_from_grid_decodes() {
        let grid = BinaryGrid::new(3, 2, vec![1, 0, 1, 0, 1, 0]).unwrap();
        let mask = Mask::from_grid(&grid, 5.0, 6.0);
        assert_eq!(mask.decode().unwrap(), grid);
        assert_eq!(mask.offset(), (5, 6));
    }

    #[test]
    fn test_mask_decode_rejects_bad_size() {
        let mut mask = Mask::from_grid(&BinaryGrid::ones(4, 2), 0.0, 0.0);

        for (width, height) in [(-4.0, 2.0), (4.0, f64::NAN), (f64::INFINITY, 2.0), (1e20, 1e20)] {
            mask.width = width;
            mask.height = height;
            assert!(
                matches!(mask.decode(), Err(RoiCopyError::MalformedMaskError { bits: 8, .. })),
                "{}x{}",
                width,
                height
            );
        }
    }

    #[test]
    fn test_polygon_vertices() {
        let polygon = Polygon {
            id: None,
            the_t: None,
            the_z: None,
            points: "1.0,0.5, 2.0,2.5, 3.5,4.0".to_string(),
            stroke_color: None,
        };
        assert_eq!(polygon.vertices(), vec![[1.0, 0.5], [2.0, 2.5], [3.5, 4.0]]);
    }

    #[test]
    fn test_polygon_offset_applied() {
        let contour = vec![[1.0, 2.0], [9.0, 9.0], [3.0, 4.0]];
        let polygon = Polygon::from_contour(&contour, 2, 10.0, 20.0, None, Some(3)).unwrap();
        assert_eq!(polygon.vertices(), vec![[12.0, 21.0], [14.0, 23.0]]);
        assert_eq!(polygon.the_t, Some(3));
        assert_eq!(polygon.the_z, None);
    }
}
