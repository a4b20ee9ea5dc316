// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! Hook for augmentation applied to a sample before the ignore-label shift.

use crate::Error;
use image::{GrayImage, RgbImage};

/// Transform applied jointly to an image and its class mask.
///
/// The mask handed to the transform still uses the raw encoding
/// (`0` = background, `1..=N` = class), so transforms that pad or warp
/// should fill the mask with `0`.
pub trait SampleTransform {
    fn apply(&self, image: RgbImage, mask: GrayImage) -> Result<(RgbImage, GrayImage), Error>;
}

impl<F> SampleTransform for F
where
    F: Fn(RgbImage, GrayImage) -> Result<(RgbImage, GrayImage), Error>,
{
    fn apply(&self, image: RgbImage, mask: GrayImage) -> Result<(RgbImage, GrayImage), Error> {
        self(image, mask)
    }
}
