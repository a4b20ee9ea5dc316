// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! Training-facing dataset: zero-based class masks with an ignore label.

use crate::{
    Error,
    dataset::{DatasetOptions, Sample, SegmentationDataset},
    palette::Palette,
    transform::SampleTransform,
};
use image::{GrayImage, Rgb32FImage, RgbImage};
use std::{collections::HashMap, path::Path};

/// Class count the underlying category filter is built with.
pub const NUM_CLASSES: usize = 4;

/// Mask value excluded from the training loss.
pub const IGNORE_INDEX: u8 = 255;

/// TI scape segmentation split with the ignore-label mask encoding.
///
/// Masks returned by [`TiscapeSegmentation::get`] hold `0..N-1` for classes
/// and [`IGNORE_INDEX`] for background and unlabelled pixels.
pub struct TiscapeSegmentation {
    base: SegmentationDataset,
    num_classes: usize,
    void_classes: Vec<u8>,
    valid_classes: Vec<u8>,
    class_map: HashMap<u8, u8>,
    palette: Palette,
    transform: Option<Box<dyn SampleTransform>>,
}

impl TiscapeSegmentation {
    /// Load a split.
    ///
    /// The category filter always permits ids `1..=NUM_CLASSES`; a different
    /// `options.num_classes` only changes the class list and palette used for
    /// encoding and visualization.
    pub fn new<P: AsRef<Path>>(
        root: P,
        split: &str,
        options: DatasetOptions,
        transform: Option<Box<dyn SampleTransform>>,
    ) -> Result<Self, Error> {
        let num_classes = options.num_classes;
        if num_classes == 0 || num_classes >= IGNORE_INDEX as usize {
            return Err(Error::InvalidParameters(format!(
                "num_classes must be within 1..{}, got {}",
                IGNORE_INDEX, num_classes
            )));
        }

        let base_options = DatasetOptions {
            num_classes: NUM_CLASSES,
            ..options
        };
        let base = SegmentationDataset::new(root, split, base_options)?;

        let valid_classes: Vec<u8> = (1..=num_classes as u8).collect();
        let class_map = valid_classes.iter().map(|&c| (c, c)).collect();

        Ok(Self {
            base,
            num_classes,
            void_classes: Vec::new(),
            valid_classes,
            class_map,
            palette: Palette::new(num_classes, IGNORE_INDEX),
            transform,
        })
    }

    pub fn len(&self) -> usize {
        self.base.len()
    }

    pub fn is_empty(&self) -> bool {
        self.base.is_empty()
    }

    /// Class counts per output head; this dataset has a single head.
    pub fn num_classes(&self) -> Vec<usize> {
        vec![self.num_classes]
    }

    pub fn base(&self) -> &SegmentationDataset {
        &self.base
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn image_path(&self, idx: usize) -> Result<&Path, Error> {
        self.base.image_path(idx)
    }

    /// Decode sample `idx`, apply the transform, and shift the mask to the
    /// ignore-label encoding.
    pub fn get(&self, idx: usize) -> Result<Sample, Error> {
        let Sample { image, mask } = self.base.get(idx)?;
        let (image, mut mask) = match &self.transform {
            Some(transform) => transform.apply(image, mask)?,
            None => (image, mask),
        };
        shift_to_ignore_label(&mut mask);
        Ok(Sample { image, mask })
    }

    /// Color a zero-based class mask, channels scaled to `[0, 1]`.
    pub fn decode_segmap(&self, mask: &GrayImage) -> Rgb32FImage {
        self.palette.decode(mask)
    }

    /// Color a zero-based class mask as 8-bit RGB.
    pub fn decode_segmap_rgb8(&self, mask: &GrayImage) -> RgbImage {
        self.palette.decode_rgb8(mask)
    }

    /// Map a colored mask produced by [`Self::decode_segmap_rgb8`] back to
    /// class indices; unknown colors become [`IGNORE_INDEX`].
    pub fn encode_colormap(&self, colored: &RgbImage) -> GrayImage {
        self.palette.encode(colored)
    }

    /// Rewrite raw mask values in place: void classes become the ignore
    /// label and valid classes go through the class map.
    pub fn encode_segmap(&self, mask: &mut GrayImage) {
        for &void in &self.void_classes {
            for px in mask.pixels_mut().filter(|p| p[0] == void) {
                px[0] = IGNORE_INDEX;
            }
        }
        for valid in &self.valid_classes {
            let mapped = self.class_map.get(valid).copied().unwrap_or(*valid);
            for px in mask.pixels_mut().filter(|p| p[0] == *valid) {
                px[0] = mapped;
            }
        }
    }
}

impl std::fmt::Debug for TiscapeSegmentation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TiscapeSegmentation")
            .field("split", &self.base.split())
            .field("len", &self.len())
            .field("num_classes", &self.num_classes)
            .field("transform", &self.transform.is_some())
            .finish()
    }
}

/// Background (`0`) becomes [`IGNORE_INDEX`]; every other value except the
/// ignore label itself is decremented to a zero-based class.
pub fn shift_to_ignore_label(mask: &mut GrayImage) {
    for px in mask.pixels_mut() {
        px[0] = match px[0] {
            0 | IGNORE_INDEX => IGNORE_INDEX,
            class => class - 1,
        };
    }
}
