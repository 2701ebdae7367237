// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use std::cell::RefCell;
use std::collections::BTreeMap;

use roicopy_core::error::RoiCopyError;
use roicopy_core::im::Roi;

use crate::store::{ImageInfo, RoiStore};

/// Contents of a `MemoryStore`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemorySnapshot {
    pub images: BTreeMap<i64, ImageInfo>,
    pub datasets: BTreeMap<i64, Vec<i64>>,
    pub rois: Vec<Roi>,
}

/// An in-process image store
///
/// Holds images, dataset links and ROIs in memory and hands out ROI
/// identifiers in increasing order.
///
/// # Examples
///
/// ```
/// use roicopy_core::im::Roi;
/// use roicopy_data::store::{ImageInfo, MemoryStore, RoiStore};
///
/// let store = MemoryStore::new();
/// store.add_image(ImageInfo::new(1, "a.tif", 64, 64));
///
/// let id = store.save_roi(&Roi::new(1)).unwrap();
/// assert_eq!(store.find_rois(1, 0, 50).unwrap()[0].id, Some(id));
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RefCell<MemorySnapshot>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: MemorySnapshot) -> Self {
        Self {
            state: RefCell::new(snapshot),
        }
    }

    /// Copy of the current contents
    pub fn snapshot(&self) -> MemorySnapshot {
        self.state.borrow().clone()
    }

    pub fn add_image(&self, image: ImageInfo) {
        self.state.borrow_mut().images.insert(image.id, image);
    }

    /// Link images to a dataset, in order
    pub fn add_dataset(&self, dataset_id: i64, image_ids: &[i64]) {
        self.state
            .borrow_mut()
            .datasets
            .entry(dataset_id)
            .or_default()
            .extend_from_slice(image_ids);
    }

    /// Insert a ROI directly, assigning an id if it has none
    pub fn add_roi(&self, mut roi: Roi) -> i64 {
        let mut state = self.state.borrow_mut();
        let id = roi.id.unwrap_or_else(|| next_roi_id(&state));
        roi.id = Some(id);
        state.rois.push(roi);
        id
    }

    /// All ROIs attached to an image
    pub fn rois_for(&self, image_id: i64) -> Vec<Roi> {
        self.state
            .borrow()
            .rois
            .iter()
            .filter(|roi| roi.image_id == image_id)
            .cloned()
            .collect()
    }
}

fn next_roi_id(state: &MemorySnapshot) -> i64 {
    state
        .rois
        .iter()
        .filter_map(|roi| roi.id)
        .max()
        .unwrap_or(0)
        + 1
}

impl RoiStore for MemoryStore {
    fn image(&self, image_id: i64) -> Result<ImageInfo, RoiCopyError> {
        self.state
            .borrow()
            .images
            .get(&image_id)
            .cloned()
            .ok_or_else(|| RoiCopyError::RemoteOperationError(format!("Image {} not found.", image_id)))
    }

    fn dataset_images(&self, dataset_id: i64) -> Result<Vec<ImageInfo>, RoiCopyError> {
        let state = self.state.borrow();

        let image_ids = state.datasets.get(&dataset_id).ok_or_else(|| {
            RoiCopyError::RemoteOperationError(format!("Dataset {} not found.", dataset_id))
        })?;

        Ok(image_ids
            .iter()
            .filter_map(|id| state.images.get(id).cloned())
            .collect())
    }

    fn has_rois(&self, image_id: i64) -> Result<bool, RoiCopyError> {
        Ok(self
            .state
            .borrow()
            .rois
            .iter()
            .any(|roi| roi.image_id == image_id))
    }

    fn find_rois(&self, image_id: i64, offset: usize, limit: usize) -> Result<Vec<Roi>, RoiCopyError> {
        Ok(self
            .state
            .borrow()
            .rois
            .iter()
            .filter(|roi| roi.image_id == image_id)
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    fn save_roi(&self, roi: &Roi) -> Result<i64, RoiCopyError> {
        if !self.state.borrow().images.contains_key(&roi.image_id) {
            return Err(RoiCopyError::RemoteOperationError(format!(
                "Cannot save ROI on missing image {}.",
                roi.image_id
            )));
        }

        let mut roi = roi.clone();
        roi.id = None;
        Ok(self.add_roi(roi))
    }
}
