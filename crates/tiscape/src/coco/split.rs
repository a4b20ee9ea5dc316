// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! Train/validation partitioning of a sorted COCO annotation file.

use super::types::{CocoDataset, CocoImage};
use crate::Error;
use std::{collections::HashSet, fmt, str::FromStr};

/// Dataset split recognised by the loaders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Split {
    Train,
    Val,
}

impl Split {
    /// Both splits, in the order they are materialised.
    pub const ALL: [Split; 2] = [Split::Train, Split::Val];

    pub fn as_str(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Val => "val",
        }
    }

    /// Annotation file name for this split, e.g. `stuff_train.json`.
    pub fn annotation_file(&self, prefix: &str) -> String {
        format!("{}_{}.json", prefix, self.as_str())
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Split {
    type Err = Error;

    /// Accepts `train`/`val` and names starting with them (`train2017`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.starts_with("train") {
            Ok(Split::Train)
        } else if s.starts_with("val") {
            Ok(Split::Val)
        } else {
            Err(Error::UnknownSplit(s.to_string()))
        }
    }
}

/// The two halves produced by [`split_dataset`].
#[derive(Debug, Clone, Default)]
pub struct SplitDatasets {
    pub train: CocoDataset,
    pub val: CocoDataset,
}

impl SplitDatasets {
    pub fn get(&self, split: Split) -> &CocoDataset {
        match split {
            Split::Train => &self.train,
            Split::Val => &self.val,
        }
    }
}

/// Partition a dataset into train and validation halves.
///
/// Images keep their file order: the trailing `round(len * val_fraction)`
/// images form the validation half. Annotations follow their image; info,
/// licenses, and categories are copied into both halves.
pub fn split_dataset(dataset: &CocoDataset, val_fraction: f64) -> Result<SplitDatasets, Error> {
    if !(0.0..=1.0).contains(&val_fraction) {
        return Err(Error::InvalidParameters(format!(
            "val_fraction must be within [0, 1], got {}",
            val_fraction
        )));
    }

    let total = dataset.images.len();
    let num_val = ((total as f64) * val_fraction).round() as usize;
    let num_train = total - num_val.min(total);

    let (train_images, val_images) = dataset.images.split_at(num_train);
    let half = |images: &[CocoImage]| {
        let ids: HashSet<u64> = images.iter().map(|i| i.id).collect();
        CocoDataset {
            info: dataset.info.clone(),
            licenses: dataset.licenses.clone(),
            images: images.to_vec(),
            annotations: dataset
                .annotations
                .iter()
                .filter(|a| ids.contains(&a.image_id))
                .cloned()
                .collect(),
            categories: dataset.categories.clone(),
        }
    };

    let split = SplitDatasets {
        train: half(train_images),
        val: half(val_images),
    };

    log::info!(
        "Split {} images into {} train / {} val",
        total,
        split.train.images.len(),
        split.val.images.len()
    );

    Ok(split)
}
