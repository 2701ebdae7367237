// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use crate::error::RoiCopyError;
use crate::im::bitmask::BinaryGrid;

/// A full-resolution single plane of an image in row-major order
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    width: usize,
    height: usize,
    data: Vec<f64>,
}

impl Plane {
    /// A blank plane with `height` rows and `width` columns
    pub fn zeros(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn as_raw(&self) -> &[f64] {
        &self.data
    }

    /// Value at row `r` and column `c`
    pub fn get(&self, r: usize, c: usize) -> f64 {
        self.data[r * self.width + c]
    }

    /// Copy a binary grid into the plane with its top-left corner at (x0, y0)
    ///
    /// Cells outside `[y0:y0+h, x0:x0+w]` are left untouched.
    ///
    /// # Arguments
    ///
    /// * `grid` - Decoded mask
    /// * `x0` - Column offset of the mask within the plane
    /// * `y0` - Row offset of the mask within the plane
    ///
    /// # Examples
    ///
    /// ```
    /// use roicopy_core::im::{BinaryGrid, Plane};
    ///
    /// let mut plane = Plane::zeros(4, 4);
    /// plane.composite(&BinaryGrid::ones(2, 2), 1, 1).unwrap();
    ///
    /// assert_eq!(plane.get(1, 1), 1.0);
    /// assert_eq!(plane.get(0, 0), 0.0);
    /// assert!(plane.composite(&BinaryGrid::ones(2, 2), 3, 3).is_err());
    /// ```
    pub fn composite(&mut self, grid: &BinaryGrid, x0: i64, y0: i64) -> Result<(), RoiCopyError> {
        let out_of_bounds = RoiCopyError::OutOfBoundsError {
            x: x0,
            y: y0,
            width: grid.width(),
            height: grid.height(),
            plane_width: self.width,
            plane_height: self.height,
        };

        if x0 < 0 || y0 < 0 {
            return Err(out_of_bounds);
        }

        let (x0, y0) = (x0 as usize, y0 as usize);

        match (x0.checked_add(grid.width()), y0.checked_add(grid.height())) {
            (Some(x1), Some(y1)) if x1 <= self.width && y1 <= self.height => {}
            _ => return Err(out_of_bounds),
        }

        for r in 0..grid.height() {
            let start = (y0 + r) * self.width + x0;
            let row = &mut self.data[start..start + grid.width()];
            for (c, value) in row.iter_mut().enumerate() {
                *value = grid.get(r, c) as f64;
            }
        }

        Ok(())
    }
}

/// Place a decoded mask inside a blank plane of the full image size
pub fn composite_plane(
    plane_width: usize,
    plane_height: usize,
    grid: &BinaryGrid,
    x0: i64,
    y0: i64,
) -> Result<Plane, RoiCopyError> {
    let mut plane = Plane::zeros(plane_width, plane_height);
    plane.composite(grid, x0, y0)?;
    Ok(plane)
}
