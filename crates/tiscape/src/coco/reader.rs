// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! Loading annotation files from disk.

use super::types::*;
use crate::Error;
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Reader behaviour switches.
#[derive(Debug, Clone, Default)]
pub struct CocoReadOptions {
    /// Reject files whose annotations point at unknown images or
    /// categories, or carry a negative area.
    pub validate: bool,
}

/// Reads annotation files, optionally checking their consistency.
///
/// # Example
///
/// ```rust,no_run
/// use tiscape::coco::CocoReader;
///
/// let reader = CocoReader::new();
/// let dataset = reader.read_json("annotations/stuff_train.json")?;
/// println!("Loaded {} images", dataset.images.len());
/// # Ok::<(), tiscape::Error>(())
/// ```
pub struct CocoReader {
    options: CocoReadOptions,
}

impl CocoReader {
    pub fn new() -> Self {
        Self {
            options: CocoReadOptions::default(),
        }
    }

    pub fn with_options(options: CocoReadOptions) -> Self {
        Self { options }
    }

    /// Parse one annotation file.
    pub fn read_json<P: AsRef<Path>>(&self, path: P) -> Result<CocoDataset, Error> {
        let file = File::open(path.as_ref())?;
        let reader = BufReader::with_capacity(64 * 1024, file);
        let dataset: CocoDataset = serde_json::from_reader(reader)?;

        log::debug!(
            "Read {:?}: {} images, {} annotations, {} categories",
            path.as_ref(),
            dataset.images.len(),
            dataset.annotations.len(),
            dataset.categories.len()
        );

        if self.options.validate {
            validate_dataset(&dataset)?;
        }

        Ok(dataset)
    }

    /// Parse one annotation file and index it.
    pub fn read_index<P: AsRef<Path>>(&self, path: P) -> Result<CocoIndex, Error> {
        let dataset = self.read_json(path)?;
        Ok(CocoIndex::from_dataset(&dataset))
    }
}

impl Default for CocoReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Check that every annotation refers to a known image and category and
/// has a non-negative area.
pub fn validate_dataset(dataset: &CocoDataset) -> Result<(), Error> {
    let known_images: HashSet<u64> = dataset.images.iter().map(|img| img.id).collect();
    let known_categories: HashSet<u32> = dataset.categories.iter().map(|cat| cat.id).collect();

    for ann in &dataset.annotations {
        if !known_images.contains(&ann.image_id) {
            return Err(Error::CocoError(format!(
                "annotation {} points at unknown image {}",
                ann.id, ann.image_id
            )));
        }

        if !known_categories.contains(&ann.category_id) {
            return Err(Error::CocoError(format!(
                "annotation {} points at unknown category {}",
                ann.id, ann.category_id
            )));
        }

        if ann.area < 0.0 {
            return Err(Error::CocoError(format!(
                "annotation {} has negative area {}",
                ann.id, ann.area
            )));
        }
    }

    Ok(())
}
