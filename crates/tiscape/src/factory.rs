// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! Build the train and validation datasets from a sorted annotation file.

use crate::{
    Error,
    coco::{CocoReader, CocoWriter, Split, split_dataset},
    config::DatasetConfig,
    segmentation::TiscapeSegmentation,
    transform::SampleTransform,
};
use std::path::{Path, PathBuf};

/// Per-split transforms handed to [`tiscape_segmentation`].
#[derive(Default)]
pub struct Transforms {
    pub train: Option<Box<dyn SampleTransform>>,
    pub val: Option<Box<dyn SampleTransform>>,
}

/// Outcome of materialising one split file.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitFile {
    pub split: Split,
    pub path: PathBuf,
    /// False when an existing file was kept.
    pub written: bool,
    /// Images in the freshly computed split.
    pub images: usize,
}

/// Split `annotations/<prefix>_sorted.json` and write
/// `annotations/<prefix>_{train,val}.json` where they do not exist yet.
pub fn write_splits<P: AsRef<Path>>(
    config: &DatasetConfig,
    root: P,
) -> Result<Vec<SplitFile>, Error> {
    let annotations_dir = root.as_ref().join("annotations");
    let sorted = annotations_dir.join(format!("{}_sorted.json", config.annotation_prefix));
    let dataset = CocoReader::new().read_json(&sorted)?;
    let halves = split_dataset(&dataset, config.val_fraction)?;

    let writer = CocoWriter::new();
    Split::ALL
        .iter()
        .map(|&split| {
            let half = halves.get(split);
            let path = annotations_dir.join(split.annotation_file(&config.annotation_prefix));
            let written = writer.write_json_if_absent(half, &path)?;
            Ok(SplitFile {
                split,
                path,
                written,
                images: half.images.len(),
            })
        })
        .collect()
}

/// Materialise the split files and load both splits.
///
/// # Example
///
/// ```rust,no_run
/// use tiscape::{DatasetConfig, Transforms, tiscape_segmentation};
///
/// let config = DatasetConfig::load(None)?;
/// let (train, val) = tiscape_segmentation(&config, "data/tiscape", Transforms::default())?;
/// println!("{} train / {} val samples", train.len(), val.len());
/// # Ok::<(), tiscape::Error>(())
/// ```
pub fn tiscape_segmentation<P: AsRef<Path>>(
    config: &DatasetConfig,
    root: P,
    transforms: Transforms,
) -> Result<(TiscapeSegmentation, TiscapeSegmentation), Error> {
    config.validate()?;
    let root = root.as_ref();
    write_splits(config, root)?;

    let Transforms { train, val } = transforms;
    let train = TiscapeSegmentation::new(
        root,
        Split::Train.as_str(),
        config.dataset_options(),
        train,
    )?;
    let val = TiscapeSegmentation::new(root, Split::Val.as_str(), config.dataset_options(), val)?;

    Ok((train, val))
}
