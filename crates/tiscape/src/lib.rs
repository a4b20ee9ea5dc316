// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! # TI Scape Segmentation Datasets
//!
//! Loads COCO-annotated image collections as semantic segmentation datasets.
//! Each sample is an RGB image together with a single-channel mask holding
//! one class index per pixel, rasterized on demand from the polygon or RLE
//! annotations.
//!
//! ## Features
//!
//! - **COCO I/O**: Typed annotation model, indexed lookups, and a
//!   deterministic train/validation split writer
//! - **Rasterization**: Polygon and RLE decoding matching the COCO reference
//!   tools
//! - **Class filtering**: Keep a fixed set of categories and remap them to
//!   dense ids
//! - **Ignore label**: Zero-based class masks with `255` for background
//! - **Palette**: Deterministic colors for visualizing and re-encoding masks
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tiscape::{DatasetConfig, Error, Transforms, tiscape_segmentation};
//!
//! fn main() -> Result<(), Error> {
//!     let config = DatasetConfig::load(None)?;
//!     let (train, val) = tiscape_segmentation(&config, "data/tiscape", Transforms::default())?;
//!
//!     let sample = train.get(0)?;
//!     let colored = train.decode_segmap_rgb8(&sample.mask);
//!     println!(
//!         "{} train, {} val, first sample {:?}",
//!         train.len(),
//!         val.len(),
//!         colored.dimensions()
//!     );
//!     Ok(())
//! }
//! ```

mod category;
mod config;
mod dataset;
mod error;
mod factory;
mod segmentation;
mod transform;

pub mod coco;
pub mod mask;
pub mod palette;

pub use crate::{
    category::CategoryMap,
    config::{DatasetConfig, ENV_PREFIX},
    dataset::{
        DatasetOptions, MIN_ANNOTATED_AREA, OverlapPolicy, Sample, SegmentationDataset,
        convert_polys_to_mask, has_valid_annotation,
    },
    error::Error,
    factory::{SplitFile, Transforms, tiscape_segmentation, write_splits},
    palette::Palette,
    segmentation::{IGNORE_INDEX, NUM_CLASSES, TiscapeSegmentation, shift_to_ignore_label},
    transform::SampleTransform,
};
