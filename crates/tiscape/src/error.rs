// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

/// Error type for dataset loading, mask generation, and configuration.
///
/// Wraps the errors of the underlying libraries (I/O, JSON, image decoding,
/// configuration) alongside the dataset-specific failure conditions.
#[derive(Debug)]
pub enum Error {
    /// Reading or writing a file failed.
    IoError(std::io::Error),
    /// An annotation file is not valid JSON for the COCO model.
    JsonError(serde_json::Error),
    /// The layered configuration could not be loaded.
    ConfigError(config::ConfigError),
    /// Image decoding or encoding error.
    ImageError(image::ImageError),
    /// Inconsistent or malformed COCO annotation data.
    CocoError(String),
    /// The dataset root does not have the expected layout.
    InvalidDataset(String),
    /// Split name is neither `train` nor `val`.
    UnknownSplit(String),
    /// Sample index is past the end of the dataset.
    IndexOutOfRange { index: usize, len: usize },
    /// A caller-supplied value is out of range.
    InvalidParameters(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::JsonError(err)
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::ConfigError(err)
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::ImageError(err)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::IoError(e) => write!(f, "I/O error: {}", e),
            Error::JsonError(e) => write!(f, "JSON error: {}", e),
            Error::ConfigError(e) => write!(f, "Configuration error: {}", e),
            Error::ImageError(e) => write!(f, "Image error: {}", e),
            Error::CocoError(s) => write!(f, "COCO error: {}", s),
            Error::InvalidDataset(s) => write!(f, "Invalid dataset: {}", s),
            Error::UnknownSplit(s) => write!(f, "Unknown split: {}", s),
            Error::IndexOutOfRange { index, len } => {
                write!(f, "Index {} out of range for dataset of {} samples", index, len)
            }
            Error::InvalidParameters(s) => write!(f, "Invalid parameters: {}", s),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(e) => Some(e),
            Error::JsonError(e) => Some(e),
            Error::ConfigError(e) => Some(e),
            Error::ImageError(e) => Some(e),
            _ => None,
        }
    }
}
