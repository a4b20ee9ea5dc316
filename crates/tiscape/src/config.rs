// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! Layered dataset configuration.
//!
//! Values come from, in increasing priority: built-in defaults, an optional
//! configuration file (TOML, JSON, or YAML by extension), and `TISCAPE_*`
//! environment variables such as `TISCAPE_NUM_CLASSES=4`.

use crate::{
    Error,
    dataset::{DatasetOptions, MIN_ANNOTATED_AREA, OverlapPolicy},
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable prefix read by [`DatasetConfig::load`].
pub const ENV_PREFIX: &str = "TISCAPE";

/// Dataset configuration shared by both splits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Number of permitted categories (ids `1..=num_classes`).
    pub num_classes: usize,
    /// Annotation files are named `<prefix>_<split>.json`.
    pub annotation_prefix: String,
    /// Share of the sorted annotation file assigned to validation.
    pub val_fraction: f64,
    /// Shuffle seed; `None` keeps file order.
    pub shuffle: Option<u64>,
    /// Keep at most this many images per split.
    pub num_imgs: Option<usize>,
    /// An image is kept only if its annotated area exceeds this.
    pub min_area: f64,
    /// Write the ignore label where instances overlap instead of letting
    /// the higher category win.
    pub discard_overlaps: bool,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            num_classes: 4,
            annotation_prefix: "stuff".to_string(),
            val_fraction: 0.2,
            shuffle: None,
            num_imgs: None,
            min_area: MIN_ANNOTATED_AREA,
            discard_overlaps: false,
        }
    }
}

impl DatasetConfig {
    /// Load configuration from defaults, an optional file, and the
    /// environment.
    pub fn load(path: Option<&Path>) -> Result<Self, Error> {
        Self::load_with_prefix(path, ENV_PREFIX)
    }

    /// As [`DatasetConfig::load`] with a custom environment prefix.
    pub fn load_with_prefix(path: Option<&Path>, env_prefix: &str) -> Result<Self, Error> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }
        builder = builder.add_source(
            config::Environment::with_prefix(env_prefix)
                .prefix_separator("_")
                .try_parsing(true),
        );

        let config: DatasetConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        log::debug!("Loaded dataset configuration: {:?}", config);
        Ok(config)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), Error> {
        if self.num_classes == 0 || self.num_classes >= u8::MAX as usize {
            return Err(Error::InvalidParameters(format!(
                "num_classes must be within 1..{}, got {}",
                u8::MAX,
                self.num_classes
            )));
        }
        if !(0.0..=1.0).contains(&self.val_fraction) {
            return Err(Error::InvalidParameters(format!(
                "val_fraction must be within [0, 1], got {}",
                self.val_fraction
            )));
        }
        if self.annotation_prefix.is_empty() {
            return Err(Error::InvalidParameters(
                "annotation_prefix must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Per-split loader options derived from this configuration.
    pub fn dataset_options(&self) -> DatasetOptions {
        DatasetOptions {
            num_classes: self.num_classes,
            annotation_prefix: self.annotation_prefix.clone(),
            shuffle: self.shuffle,
            num_imgs: self.num_imgs,
            min_area: self.min_area,
            overlap: if self.discard_overlaps {
                OverlapPolicy::Ignore
            } else {
                OverlapPolicy::MaxCategory
            },
        }
    }
}
