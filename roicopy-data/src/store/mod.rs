// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use roicopy_core::error::RoiCopyError;
use roicopy_core::im::Roi;

mod memory;
mod omero;

pub use memory::{MemorySnapshot, MemoryStore};
pub use omero::{OmeroClient, OmeroLogin};

/// Identity and pixel dimensions of an image
#[derive(Debug, Clone, PartialEq)]
pub struct ImageInfo {
    pub id: i64,
    pub name: String,
    pub size_x: usize,
    pub size_y: usize,
}

impl ImageInfo {
    pub fn new(id: i64, name: &str, size_x: usize, size_y: usize) -> Self {
        Self {
            id,
            name: name.to_string(),
            size_x,
            size_y,
        }
    }
}

/// Operations a remote image store must provide to copy ROIs
///
/// Implementations block until the remote call has completed. Every
/// failure is reported as a `RoiCopyError::RemoteOperationError`.
pub trait RoiStore {
    /// Look up a single image
    fn image(&self, image_id: i64) -> Result<ImageInfo, RoiCopyError>;

    /// List the images linked to a dataset
    fn dataset_images(&self, dataset_id: i64) -> Result<Vec<ImageInfo>, RoiCopyError>;

    /// Whether any ROI is attached to an image
    ///
    /// Only the existence of a ROI is checked. Shape payloads are never
    /// fetched or decoded.
    fn has_rois(&self, image_id: i64) -> Result<bool, RoiCopyError>;

    /// Fetch one page of the ROIs attached to an image
    fn find_rois(&self, image_id: i64, offset: usize, limit: usize) -> Result<Vec<Roi>, RoiCopyError>;

    /// Persist a new ROI and return its identifier
    fn save_roi(&self, roi: &Roi) -> Result<i64, RoiCopyError>;
}
