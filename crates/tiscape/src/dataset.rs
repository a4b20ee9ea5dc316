// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! Segmentation dataset over a COCO annotation file.
//!
//! Construction indexes the annotation file and drops images without enough
//! annotated area; masks are rasterized on every [`SegmentationDataset::get`]
//! call and never cached.

use crate::{
    Error,
    category::CategoryMap,
    coco::{CocoAnnotation, CocoIndex, CocoReader, Split},
    mask::segmentation_to_bitmap,
};
use image::{GrayImage, RgbImage};
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use std::path::{Path, PathBuf};

/// Images whose annotated area does not exceed this many pixels are dropped.
pub const MIN_ANNOTATED_AREA: f64 = 1000.0;

/// How overlapping instances are resolved when merging into one mask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OverlapPolicy {
    /// The higher category id wins.
    #[default]
    MaxCategory,
    /// Pixels covered by two or more instances get the ignore label (255).
    Ignore,
}

/// Options for [`SegmentationDataset::new`].
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetOptions {
    /// Permitted category ids are `1..=num_classes`.
    pub num_classes: usize,
    /// Annotation files are named `<prefix>_<split>.json`.
    pub annotation_prefix: String,
    /// Shuffle seed; `None` keeps file order.
    pub shuffle: Option<u64>,
    /// Keep at most this many images.
    pub num_imgs: Option<usize>,
    /// Minimum total annotated area (exclusive) for an image to be kept.
    pub min_area: f64,
    pub overlap: OverlapPolicy,
}

impl Default for DatasetOptions {
    fn default() -> Self {
        Self {
            num_classes: 4,
            annotation_prefix: "stuff".to_string(),
            shuffle: None,
            num_imgs: None,
            min_area: MIN_ANNOTATED_AREA,
            overlap: OverlapPolicy::MaxCategory,
        }
    }
}

/// A decoded image and its class-index mask.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub image: RgbImage,
    pub mask: GrayImage,
}

/// Image/mask dataset backed by a COCO annotation file.
///
/// Expects the layout:
///
/// ```text
/// root/
/// ├── annotations/<prefix>_<split>.json
/// └── images/...        (optional; file names resolve against root otherwise)
/// ```
///
/// # Example
///
/// ```rust,no_run
/// use tiscape::{DatasetOptions, SegmentationDataset};
///
/// let dataset = SegmentationDataset::new("data/tiscape", "train", DatasetOptions::default())?;
/// let sample = dataset.get(0)?;
/// println!("{}x{} image", sample.image.width(), sample.image.height());
/// # Ok::<(), tiscape::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct SegmentationDataset {
    split: Split,
    image_dir: PathBuf,
    index: CocoIndex,
    categories: CategoryMap,
    image_ids: Vec<u64>,
    image_paths: Vec<PathBuf>,
    options: DatasetOptions,
}

impl SegmentationDataset {
    /// Index `root/annotations/<prefix>_<split>.json` and select usable
    /// images.
    pub fn new<P: AsRef<Path>>(root: P, split: &str, options: DatasetOptions) -> Result<Self, Error> {
        let root = root.as_ref();
        let split_kind: Split = split.parse()?;

        let annotations_dir = root.join("annotations");
        if !annotations_dir.is_dir() {
            return Err(Error::InvalidDataset(format!(
                "missing annotations folder in {:?}",
                root
            )));
        }

        let images_dir = root.join("images");
        let image_dir = if images_dir.is_dir() {
            images_dir
        } else {
            root.to_path_buf()
        };

        let annotation_file =
            annotations_dir.join(format!("{}_{}.json", options.annotation_prefix, split));
        let index = CocoReader::new().read_index(&annotation_file)?;
        let categories = CategoryMap::new(options.num_classes)?;

        let total = index.image_ids().len();
        let mut image_ids: Vec<u64> = index
            .image_ids()
            .iter()
            .copied()
            .filter(|&id| {
                let permitted =
                    categories.filter_annotations(index.annotations_for_image(id, None));
                has_valid_annotation(&permitted, options.min_area)
            })
            .collect();

        if let Some(seed) = options.shuffle {
            let mut rng = StdRng::seed_from_u64(seed);
            image_ids.shuffle(&mut rng);
        }
        if let Some(limit) = options.num_imgs {
            image_ids.truncate(limit);
        }

        let image_paths = image_ids
            .iter()
            .map(|id| {
                index
                    .image(*id)
                    .map(|img| image_dir.join(&img.file_name))
                    .ok_or_else(|| Error::CocoError(format!("no image record for id {}", id)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        log::info!(
            "Loaded {} split from {:?}: {} of {} images have valid annotations",
            split_kind,
            annotation_file,
            image_ids.len(),
            total
        );

        Ok(Self {
            split: split_kind,
            image_dir,
            index,
            categories,
            image_ids,
            image_paths,
            options,
        })
    }

    pub fn len(&self) -> usize {
        self.image_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.image_ids.is_empty()
    }

    pub fn split(&self) -> Split {
        self.split
    }

    /// Folder that image file names resolve against.
    pub fn image_dir(&self) -> &Path {
        &self.image_dir
    }

    /// Kept image ids, in sample order.
    pub fn image_ids(&self) -> &[u64] {
        &self.image_ids
    }

    pub fn num_classes(&self) -> usize {
        self.categories.len()
    }

    pub fn category_map(&self) -> &CategoryMap {
        &self.categories
    }

    pub fn index(&self) -> &CocoIndex {
        &self.index
    }

    pub fn options(&self) -> &DatasetOptions {
        &self.options
    }

    /// Path of the image behind sample `idx`, without decoding it.
    pub fn image_path(&self, idx: usize) -> Result<&Path, Error> {
        self.image_paths
            .get(idx)
            .map(PathBuf::as_path)
            .ok_or(Error::IndexOutOfRange {
                index: idx,
                len: self.len(),
            })
    }

    /// Decode sample `idx` and rasterize its mask.
    ///
    /// Mask values are `0` for background and `1..=N` for the remapped
    /// categories.
    pub fn get(&self, idx: usize) -> Result<Sample, Error> {
        let path = self.image_path(idx)?;
        let image_id = self.image_ids[idx];

        let image = image::open(path)?.to_rgb8();
        let (width, height) = image.dimensions();
        if let Some(record) = self.index.image(image_id)
            && (record.width, record.height) != (width, height)
            && record.width != 0
        {
            log::debug!(
                "Image {} is {}x{} on disk but {}x{} in annotations",
                image_id,
                width,
                height,
                record.width,
                record.height
            );
        }

        let annotations = self
            .categories
            .filter_and_remap(self.index.annotations_for_image(image_id, None));
        let mask = convert_polys_to_mask(&annotations, width, height, self.options.overlap)?;

        log::debug!(
            "Sample {} (image {}): {} annotations",
            idx,
            image_id,
            annotations.len()
        );

        Ok(Sample { image, mask })
    }

    /// Iterate over every sample in order.
    pub fn iter(&self) -> impl Iterator<Item = Result<Sample, Error>> + '_ {
        (0..self.len()).map(move |idx| self.get(idx))
    }
}

/// An image is usable when it has at least one annotation and their areas
/// sum to more than `min_area` pixels.
pub fn has_valid_annotation(annotations: &[&CocoAnnotation], min_area: f64) -> bool {
    if annotations.is_empty() {
        return false;
    }
    annotations.iter().map(|a| a.area).sum::<f64>() > min_area
}

/// Rasterize annotations (already remapped to dense ids) into one mask.
///
/// Each pixel takes the largest category among the instances covering it.
/// Annotations without a segmentation contribute nothing.
pub fn convert_polys_to_mask(
    annotations: &[CocoAnnotation],
    width: u32,
    height: u32,
    overlap: OverlapPolicy,
) -> Result<GrayImage, Error> {
    let pixels = (width as usize) * (height as usize);
    let mut target = vec![0u8; pixels];
    let mut coverage = match overlap {
        OverlapPolicy::Ignore => vec![0u8; pixels],
        OverlapPolicy::MaxCategory => Vec::new(),
    };

    for ann in annotations {
        let Some(segmentation) = &ann.segmentation else {
            log::warn!("Annotation {} has no segmentation, skipping", ann.id);
            continue;
        };
        let category = u8::try_from(ann.category_id).map_err(|_| {
            Error::InvalidParameters(format!(
                "category {} of annotation {} does not fit in an 8-bit mask",
                ann.category_id, ann.id
            ))
        })?;

        let bitmap = segmentation_to_bitmap(segmentation, height, width)?;
        for (px, _) in target
            .iter_mut()
            .zip(&bitmap)
            .filter(|(_, bit)| **bit != 0)
        {
            *px = (*px).max(category);
        }
        if overlap == OverlapPolicy::Ignore {
            for (count, _) in coverage
                .iter_mut()
                .zip(&bitmap)
                .filter(|(_, bit)| **bit != 0)
            {
                *count = count.saturating_add(1);
            }
        }
    }

    if overlap == OverlapPolicy::Ignore {
        for (px, _) in target.iter_mut().zip(&coverage).filter(|(_, c)| **c > 1) {
            *px = crate::IGNORE_INDEX;
        }
    }

    GrayImage::from_raw(width, height, target).ok_or_else(|| {
        Error::InvalidParameters(format!("cannot build {}x{} mask", width, height))
    })
}
