// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! Serde model of COCO annotation files.
//!
//! Covers the subset of the format used by segmentation datasets: images,
//! categories, and polygon or RLE instance annotations. Keypoints, captions,
//! and panoptic segmentation are not modelled.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A whole annotation file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CocoDataset {
    /// Free-form metadata; absent in many exports.
    #[serde(default)]
    pub info: CocoInfo,
    #[serde(default)]
    pub licenses: Vec<CocoLicense>,
    /// Image records, in file order.
    pub images: Vec<CocoImage>,
    /// One record per object instance.
    #[serde(default)]
    pub annotations: Vec<CocoAnnotation>,
    #[serde(default)]
    pub categories: Vec<CocoCategory>,
}

/// The `info` block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CocoInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contributor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_created: Option<String>,
}

/// One entry of the `licenses` block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CocoLicense {
    pub id: u32,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// One image record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CocoImage {
    pub id: u64,
    /// Width recorded in the file; `0` when missing.
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    /// Filename, relative to the images folder.
    pub file_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_captured: Option<String>,
}

/// One category record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CocoCategory {
    pub id: u32,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supercategory: Option<String>,
}

/// One object instance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CocoAnnotation {
    pub id: u64,
    pub image_id: u64,
    /// Raw category id as written in the file.
    pub category_id: u32,
    /// `[x, y, w, h]`; unused by mask generation.
    #[serde(default)]
    pub bbox: [f64; 4],
    /// Pixel area as recorded in the file; used by the validity filter.
    #[serde(default)]
    pub area: f64,
    /// Non-zero for crowd regions.
    #[serde(default)]
    pub iscrowd: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segmentation: Option<CocoSegmentation>,
}

/// The shapes a `segmentation` field may take.
///
/// Variant order matters for untagged deserialization: nested polygon
/// lists are tried before the flat single-polygon form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CocoSegmentation {
    /// `[[x0, y0, x1, y1, ...], ...]`, one list per disjoint part.
    Polygon(Vec<Vec<f64>>),
    /// One polygon without the outer list, as the TI scape exports write it.
    FlatPolygon(Vec<f64>),
    /// `{"counts": [..], "size": [h, w]}`
    Rle(CocoRle),
    /// `{"counts": "..", "size": [h, w]}` as written by the COCO mask API.
    CompressedRle(CocoCompressedRle),
}

/// Uncompressed RLE segmentation.
///
/// Runs alternate background/foreground, start with background, and are
/// column-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CocoRle {
    pub counts: Vec<u32>,
    /// `[height, width]`
    pub size: [u32; 2],
}

/// Compressed RLE segmentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CocoCompressedRle {
    /// Encoded counts string.
    pub counts: String,
    /// `[height, width]`
    pub size: [u32; 2],
}

/// Lookup tables over a `CocoDataset`.
///
/// Image and category ids keep the order they appear in the annotation file,
/// so iteration over [`CocoIndex::image_ids`] is deterministic.
#[derive(Debug, Clone, Default)]
pub struct CocoIndex {
    pub images: HashMap<u64, CocoImage>,
    pub categories: HashMap<u32, CocoCategory>,
    /// Annotations grouped by image, in file order within each image.
    pub annotations_by_image: HashMap<u64, Vec<CocoAnnotation>>,
    image_ids: Vec<u64>,
    category_ids: Vec<u32>,
}

impl CocoIndex {
    /// Index a parsed file. Duplicate image or category ids keep the last
    /// record but their first position.
    pub fn from_dataset(dataset: &CocoDataset) -> Self {
        let mut images = HashMap::with_capacity(dataset.images.len());
        let mut image_ids = Vec::with_capacity(dataset.images.len());
        for img in &dataset.images {
            if images.insert(img.id, img.clone()).is_none() {
                image_ids.push(img.id);
            }
        }

        let mut categories = HashMap::with_capacity(dataset.categories.len());
        let mut category_ids = Vec::with_capacity(dataset.categories.len());
        for cat in &dataset.categories {
            if categories.insert(cat.id, cat.clone()).is_none() {
                category_ids.push(cat.id);
            }
        }

        let mut annotations_by_image: HashMap<u64, Vec<CocoAnnotation>> = HashMap::new();
        for ann in &dataset.annotations {
            annotations_by_image
                .entry(ann.image_id)
                .or_default()
                .push(ann.clone());
        }

        Self {
            images,
            categories,
            annotations_by_image,
            image_ids,
            category_ids,
        }
    }

    /// All image ids, in file order.
    pub fn image_ids(&self) -> &[u64] {
        &self.image_ids
    }

    /// All category ids, in file order.
    pub fn category_ids(&self) -> &[u32] {
        &self.category_ids
    }

    pub fn image(&self, image_id: u64) -> Option<&CocoImage> {
        self.images.get(&image_id)
    }

    pub fn category_name(&self, category_id: u32) -> Option<&str> {
        self.categories.get(&category_id).map(|c| c.name.as_str())
    }

    /// Annotations of one image. `iscrowd` of `None` returns every annotation; `Some(flag)` keeps only
    /// the annotations whose crowd flag matches.
    pub fn annotations_for_image(
        &self,
        image_id: u64,
        iscrowd: Option<bool>,
    ) -> Vec<&CocoAnnotation> {
        self.annotations_by_image
            .get(&image_id)
            .map(|anns| {
                anns.iter()
                    .filter(|a| iscrowd.is_none_or(|crowd| (a.iscrowd != 0) == crowd))
                    .collect()
            })
            .unwrap_or_default()
    }
}
