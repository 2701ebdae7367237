// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

// Iso-value used to trace binary 0/1 planes
pub const CONTOUR_LEVEL: f64 = 0.5;

// Keep every nth contour point when building polygons
pub const POINT_STRIDE: usize = 4;

// Number of ROIs requested per page when reading a source image
pub const ROI_PAGE_SIZE: usize = 50;

// A polygon needs at least this many points to be emitted
pub const MIN_POLYGON_POINTS: usize = 2;

// Stroke color (RGBA) given to every generated polygon
pub const STROKE_RGBA: [u8; 4] = [255, 255, 255, 255];

// Shape type names as they appear in the OME schema
pub const OME_SCHEMA: &str = "http://www.openmicroscopy.org/Schemas/OME/2016-06";
pub const SHAPE_MASK: &str = "Mask";
pub const SHAPE_POLYGON: &str = "Polygon";
pub const ROI_TYPE: &str = "ROI";
pub const IMAGE_TYPE: &str = "Image";
