// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! Color palettes for visualizing class-index masks.

use image::{GrayImage, Luma, Rgb, Rgb32FImage, RgbImage};
use std::collections::HashMap;

/// Number of entries in a full palette.
pub const PALETTE_SIZE: usize = 256;

const WHITE: [u8; 3] = [255, 255, 255];

/// Build a 256-entry palette whose first `num_colors` entries are spread
/// evenly over an RGB grid.
///
/// The grid step per channel is `floor(256 / cbrt(num_colors))`; entries are
/// picked at evenly spaced grid positions (rounded half to even), topped up
/// from the end of the grid if that runs short, and padded with white.
pub fn color_palette(num_colors: usize) -> Vec<[u8; 3]> {
    let num_colors = num_colors.max(1);
    let delta = (256.0 / (num_colors as f64).powf(1.0 / 3.0)) as usize;
    let delta = delta.max(1);

    let mut grid: Vec<[u8; 3]> = Vec::new();
    for r in (0..256).step_by(delta) {
        for g in (0..256).step_by(delta) {
            for b in (0..256).step_by(delta) {
                grid.push([r as u8, g as u8, b as u8]);
            }
        }
    }

    let step = grid.len() as f64 / num_colors as f64;
    let mut colors: Vec<[u8; 3]> = Vec::with_capacity(PALETTE_SIZE.max(num_colors));
    for i in 0..num_colors {
        let from = (step * i as f64).round_ties_even() as usize;
        match grid.get(from) {
            Some(color) => colors.push(*color),
            None => break,
        }
    }

    let shortage = num_colors - colors.len();
    if shortage > 0 {
        colors.extend_from_slice(&grid[grid.len().saturating_sub(shortage)..]);
    }
    if colors.len() < PALETTE_SIZE {
        colors.resize(PALETTE_SIZE, WHITE);
    }
    colors
}

/// Colors for class indices `0..num_classes`.
///
/// Uses a palette sized for `num_classes + 1` entries and skips its first
/// (black) entry, which is reserved for background.
pub fn label_colours(num_classes: usize) -> Vec<[u8; 3]> {
    color_palette(num_classes + 1)
        .into_iter()
        .cycle()
        .skip(1)
        .take(num_classes)
        .collect()
}

/// Class-index ↔ color lookup for zero-based class masks.
#[derive(Debug, Clone)]
pub struct Palette {
    colors: Vec<[u8; 3]>,
    lookup: HashMap<[u8; 3], u8>,
    unknown: u8,
}

impl Palette {
    /// Palette for `num_classes` classes; colors that match no class encode
    /// to `unknown`.
    pub fn new(num_classes: usize, unknown: u8) -> Self {
        Self::from_colors(label_colours(num_classes), unknown)
    }

    pub fn from_colors(colors: Vec<[u8; 3]>, unknown: u8) -> Self {
        let mut lookup = HashMap::with_capacity(colors.len());
        for (class, color) in colors.iter().enumerate() {
            lookup.entry(*color).or_insert(class as u8);
        }
        Self {
            colors,
            lookup,
            unknown,
        }
    }

    pub fn colors(&self) -> &[[u8; 3]] {
        &self.colors
    }

    pub fn color(&self, class: u8) -> Option<[u8; 3]> {
        self.colors.get(class as usize).copied()
    }

    /// Color a class mask with values scaled to `[0, 1]`.
    ///
    /// Pixels outside `0..num_classes` (such as the ignore label) keep their
    /// raw value on every channel.
    pub fn decode(&self, mask: &GrayImage) -> Rgb32FImage {
        Rgb32FImage::from_fn(mask.width(), mask.height(), |x, y| {
            let [r, g, b] = self.pixel_color(mask.get_pixel(x, y)[0]);
            Rgb([r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0])
        })
    }

    /// Color a class mask as 8-bit RGB.
    pub fn decode_rgb8(&self, mask: &GrayImage) -> RgbImage {
        RgbImage::from_fn(mask.width(), mask.height(), |x, y| {
            Rgb(self.pixel_color(mask.get_pixel(x, y)[0]))
        })
    }

    /// Map palette colors back to class indices.
    pub fn encode(&self, colored: &RgbImage) -> GrayImage {
        GrayImage::from_fn(colored.width(), colored.height(), |x, y| {
            let color = colored.get_pixel(x, y).0;
            Luma([self.lookup.get(&color).copied().unwrap_or(self.unknown)])
        })
    }

    fn pixel_color(&self, value: u8) -> [u8; 3] {
        self.color(value).unwrap_or([value; 3])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_size() {
        for n in [1, 2, 5, 20, 100] {
            assert_eq!(color_palette(n).len(), PALETTE_SIZE);
        }
        assert_eq!(color_palette(300).len(), 300);
    }

    #[test]
    fn test_label_colours() {
        assert_eq!(
            label_colours(4),
            vec![[0, 149, 0], [0, 149, 149], [149, 0, 149], [149, 149, 0]]
        );
        assert_eq!(label_colours(1), vec![[203, 0, 0]]);
        assert_eq!(label_colours(8)[7], [246, 246, 0]);
        assert_eq!(label_colours(19)[0], [0, 0, 94]);
        assert_eq!(label_colours(19)[18], [188, 188, 188]);
    }

    #[test]
    fn test_decode_encode_roundtrip() {
        let palette = Palette::new(4, 255);
        let mask = GrayImage::from_raw(3, 2, vec![0, 1, 2, 3, 255, 0]).unwrap();

        let colored = palette.decode_rgb8(&mask);
        assert_eq!(colored.get_pixel(1, 0).0, [0, 149, 149]);
        assert_eq!(colored.get_pixel(1, 1).0, [255, 255, 255]);

        assert_eq!(palette.encode(&colored), mask);
    }

    #[test]
    fn test_decode_scaled() {
        let palette = Palette::new(4, 255);
        let mask = GrayImage::from_raw(2, 1, vec![3, 255]).unwrap();
        let rgb = palette.decode(&mask);

        let class3 = rgb.get_pixel(0, 0).0;
        assert!((class3[0] - 149.0 / 255.0).abs() < 1e-6);
        assert!((class3[1] - 149.0 / 255.0).abs() < 1e-6);
        assert_eq!(class3[2], 0.0);
        assert_eq!(rgb.get_pixel(1, 0).0, [1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_encode_unknown_color() {
        let palette = Palette::new(2, 255);
        let colored = RgbImage::from_pixel(1, 1, Rgb([1, 2, 3]));
        assert_eq!(palette.encode(&colored).get_pixel(0, 0)[0], 255);
    }
}
