// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! # COCO Annotation Support
//!
//! Reading, indexing, splitting, and writing of COCO-style annotation files
//! as used by the TI scape segmentation datasets.
//!
//! ## Example
//!
//! ```rust,no_run
//! use tiscape::coco::{CocoReader, CocoIndex};
//!
//! let reader = CocoReader::new();
//! let dataset = reader.read_json("annotations/stuff_train.json")?;
//! let index = CocoIndex::from_dataset(&dataset);
//! for image_id in index.image_ids() {
//!     let annotations = index.annotations_for_image(*image_id, None);
//!     println!("{}: {} annotations", image_id, annotations.len());
//! }
//! # Ok::<(), tiscape::Error>(())
//! ```

mod reader;
mod split;
mod types;
mod writer;

pub use types::{
    CocoAnnotation, CocoCategory, CocoCompressedRle, CocoDataset, CocoImage, CocoIndex, CocoInfo,
    CocoLicense, CocoRle, CocoSegmentation,
};

pub use reader::{CocoReadOptions, CocoReader, validate_dataset};
pub use split::{Split, SplitDatasets, split_dataset};
pub use writer::{CocoWriteOptions, CocoWriter};

#[cfg(test)]
mod tests;
