// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use std::collections::HashMap;

use kdam::BarExt;

use roicopy_core::constant::ROI_PAGE_SIZE;
use roicopy_core::error::RoiCopyError;
use roicopy_core::im::{Roi, Shape};
use roicopy_core::pipeline::{Conversion, PipelineOptions, mask_to_polygon};
use roicopy_core::ut::track::{progress_counter, progress_log, progress_warn, thousands_format};

use crate::locator::Locator;
use crate::store::RoiStore;

/// Settings for a copy run
#[derive(Debug, Clone)]
pub struct TransferOptions {
    /// ROIs requested per page from the source
    pub page_size: usize,
    /// Mask to polygon conversion settings
    pub pipeline: PipelineOptions,
    /// Convert everything but persist nothing
    pub dry_run: bool,
    pub verbose: bool,
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            page_size: ROI_PAGE_SIZE,
            pipeline: PipelineOptions::default(),
            dry_run: false,
            verbose: false,
        }
    }
}

/// A source image and the target image its ROIs are copied to
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePair {
    pub source_id: i64,
    pub name: Option<String>,
    pub target_id: i64,
}

/// Counts collected while copying
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransferReport {
    pub pairs: usize,
    pub unmatched: Vec<String>,
    pub skipped_targets: Vec<i64>,
    pub rois_read: usize,
    pub masks_read: usize,
    pub polygons_created: usize,
    pub masks_without_contour: usize,
    pub masks_too_thin: usize,
    pub rois_saved: Vec<i64>,
}

impl TransferReport {
    /// One line summary of the run
    pub fn summary(&self) -> String {
        format!(
            "{} image pairs, {} skipped with existing ROIs. {} ROIs read, {} masks converted to {} polygons, {} ROIs saved.",
            thousands_format(self.pairs),
            thousands_format(self.skipped_targets.len()),
            thousands_format(self.rois_read),
            thousands_format(self.masks_read),
            thousands_format(self.polygons_created),
            thousands_format(self.rois_saved.len()),
        )
    }
}

/// Copies mask ROIs from a source store onto target images as polygons
///
/// The source and target stores are independent and may be the same
/// server under different credentials or two different servers.
pub struct RoiTransfer<'a> {
    source: &'a dyn RoiStore,
    target: &'a dyn RoiStore,
    options: TransferOptions,
}

impl<'a> RoiTransfer<'a> {
    pub fn new(source: &'a dyn RoiStore, target: &'a dyn RoiStore, options: TransferOptions) -> Self {
        Self {
            source,
            target,
            options,
        }
    }

    /// Resolve locators, then copy every pair
    ///
    /// Errors from the stores or from mask conversion stop the run and the
    /// remaining pairs are not processed.
    pub fn run(&self, source: &Locator, target: &Locator) -> Result<TransferReport, RoiCopyError> {
        let mut report = TransferReport::default();

        let pairs = self.resolve_pairs(source, target, &mut report)?;
        report.pairs = pairs.len();

        progress_log(
            &format!("Resolved {} image pairs.", thousands_format(pairs.len())),
            self.options.verbose,
        );

        for pair in &pairs {
            self.copy_pair(pair, &mut report)?;
        }

        Ok(report)
    }

    /// Pair source images with target images
    ///
    /// Two image locators form one pair. Two dataset locators pair images
    /// by equal name; source images without a match are recorded in the
    /// report and skipped.
    pub fn resolve_pairs(
        &self,
        source: &Locator,
        target: &Locator,
        report: &mut TransferReport,
    ) -> Result<Vec<ImagePair>, RoiCopyError> {
        match (source, target) {
            (Locator::Image(source_id), Locator::Image(target_id)) => Ok(vec![ImagePair {
                source_id: *source_id,
                name: None,
                target_id: *target_id,
            }]),
            (Locator::Dataset(source_id), Locator::Dataset(target_id)) => {
                let target_index: HashMap<String, i64> = self
                    .target
                    .dataset_images(*target_id)?
                    .into_iter()
                    .map(|image| (image.name, image.id))
                    .collect();

                let mut pairs = Vec::new();
                for image in self.source.dataset_images(*source_id)? {
                    match target_index.get(&image.name) {
                        Some(target_id) => pairs.push(ImagePair {
                            source_id: image.id,
                            name: Some(image.name),
                            target_id: *target_id,
                        }),
                        None => {
                            progress_warn(
                                "transfer",
                                &format!(
                                    "No image named '{}' in target {}. Skipping image {}.",
                                    image.name, target, image.id
                                ),
                            );
                            report.unmatched.push(image.name);
                        }
                    }
                }

                Ok(pairs)
            }
            _ => Err(RoiCopyError::AmbiguousLocatorError(format!(
                "Cannot pair {} with {}, both locators must be images or datasets",
                source, target
            ))),
        }
    }

    /// Copy the mask ROIs of one source image onto its target image
    ///
    /// Targets that already have ROIs are left untouched.
    pub fn copy_pair(&self, pair: &ImagePair, report: &mut TransferReport) -> Result<(), RoiCopyError> {
        if self.target.has_rois(pair.target_id)? {
            progress_log(
                &format!(
                    "Target image {} already has ROIs. Skipping source image {}.",
                    pair.target_id, pair.source_id
                ),
                self.options.verbose,
            );
            report.skipped_targets.push(pair.target_id);
            return Ok(());
        }

        let image = self.source.image(pair.source_id)?;

        progress_log(
            &format!(
                "Copying ROIs from image {} ({}, {}x{}) to image {}.",
                image.id, image.name, image.size_x, image.size_y, pair.target_id
            ),
            self.options.verbose,
        );

        let page_size = self.options.page_size.max(1);
        let mut pb = progress_counter("Reading ROI pages", self.options.verbose);
        let mut offset = 0;

        loop {
            let page = self.source.find_rois(image.id, offset, page_size)?;
            if page.is_empty() {
                break;
            }

            for roi in &page {
                report.rois_read += 1;

                let new_roi =
                    self.convert_roi(roi, image.size_x, image.size_y, pair.target_id, report)?;

                if new_roi.is_empty() {
                    continue;
                }

                if self.options.dry_run {
                    continue;
                }

                let id = self.target.save_roi(&new_roi)?;
                report.rois_saved.push(id);
            }

            pb.update(1)
                .map_err(|err| RoiCopyError::OtherError(err.to_string()))?;

            offset += page_size;
        }

        if self.options.verbose {
            println!();
        }

        Ok(())
    }

    /// Build a new target ROI holding one polygon per convertible mask
    pub fn convert_roi(
        &self,
        roi: &Roi,
        size_x: usize,
        size_y: usize,
        target_id: i64,
        report: &mut TransferReport,
    ) -> Result<Roi, RoiCopyError> {
        let mut new_roi = Roi::new(target_id);

        for mask in roi.masks() {
            report.masks_read += 1;

            match mask_to_polygon(mask, size_x, size_y, &self.options.pipeline)? {
                Conversion::Polygon(polygon) => {
                    report.polygons_created += 1;
                    new_roi.add_shape(Shape::Polygon(polygon));
                }
                Conversion::NoContour => report.masks_without_contour += 1,
                Conversion::TooThin => report.masks_too_thin += 1,
            }
        }

        Ok(new_roi)
    }
}
