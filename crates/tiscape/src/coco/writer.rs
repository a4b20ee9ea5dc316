// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! Writing annotation files, used to materialise the train/val splits.

use super::types::CocoDataset;
use crate::Error;
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

/// Writer behaviour switches.
#[derive(Debug, Clone, Default)]
pub struct CocoWriteOptions {
    /// Indent the output; compact when false.
    pub pretty: bool,
}

/// Serializes a [`CocoDataset`] back to an annotation file.
///
/// # Example
///
/// ```rust,no_run
/// use tiscape::coco::{CocoDataset, CocoWriter};
///
/// let writer = CocoWriter::new();
/// let dataset = CocoDataset::default();
/// writer.write_json(&dataset, "annotations/stuff_val.json")?;
/// # Ok::<(), tiscape::Error>(())
/// ```
pub struct CocoWriter {
    options: CocoWriteOptions,
}

impl CocoWriter {
    pub fn new() -> Self {
        Self {
            options: CocoWriteOptions::default(),
        }
    }

    pub fn with_options(options: CocoWriteOptions) -> Self {
        Self { options }
    }

    /// Write `dataset` to `path`, creating missing parent folders and
    /// replacing any existing file.
    pub fn write_json<P: AsRef<Path>>(&self, dataset: &CocoDataset, path: P) -> Result<(), Error> {
        if let Some(parent) = path.as_ref().parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let file = File::create(path.as_ref())?;
        let mut writer = BufWriter::with_capacity(64 * 1024, file);

        if self.options.pretty {
            serde_json::to_writer_pretty(&mut writer, dataset)?;
        } else {
            serde_json::to_writer(&mut writer, dataset)?;
        }
        writer.flush()?;

        Ok(())
    }

    /// Write COCO dataset to a JSON file unless a readable file is already
    /// there.
    ///
    /// Returns `true` when the file was written, `false` when an existing
    /// file was kept untouched.
    pub fn write_json_if_absent<P: AsRef<Path>>(
        &self,
        dataset: &CocoDataset,
        path: P,
    ) -> Result<bool, Error> {
        let path = path.as_ref();
        if path.is_file() && File::open(path).is_ok() {
            log::debug!("Keeping existing annotation file {:?}", path);
            return Ok(false);
        }

        self.write_json(dataset, path)?;
        log::info!(
            "Wrote {:?} ({} images, {} annotations)",
            path,
            dataset.images.len(),
            dataset.annotations.len()
        );
        Ok(true)
    }
}

impl Default for CocoWriter {
    fn default() -> Self {
        Self::new()
    }
}
