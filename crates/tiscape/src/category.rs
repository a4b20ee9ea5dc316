// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! Permitted category ids and their dense remapping.

use crate::{Error, coco::CocoAnnotation};
use itertools::Itertools;

/// Ordered set of permitted category ids, remapped onto `1..=N`.
///
/// The dense id of a category is its position in the permitted list plus
/// one, so `0` stays free for background.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryMap {
    ids: Vec<u32>,
}

impl CategoryMap {
    /// Permit category ids `1..=num_classes`.
    pub fn new(num_classes: usize) -> Result<Self, Error> {
        Self::from_ids(1..=num_classes as u32)
    }

    /// Permit an explicit list of category ids, in remapping order.
    ///
    /// Ids must be unique and fit, once remapped, in an 8-bit mask with
    /// room left for the ignore label.
    pub fn from_ids(ids: impl IntoIterator<Item = u32>) -> Result<Self, Error> {
        let ids: Vec<u32> = ids.into_iter().collect();
        if ids.is_empty() {
            return Err(Error::InvalidParameters(
                "at least one category is required".to_string(),
            ));
        }
        if ids.len() >= u8::MAX as usize {
            return Err(Error::InvalidParameters(format!(
                "{} categories do not fit in an 8-bit mask",
                ids.len()
            )));
        }
        if let Some(dup) = ids.iter().duplicates().next() {
            return Err(Error::InvalidParameters(format!(
                "category id {} listed twice",
                dup
            )));
        }
        Ok(Self { ids })
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[u32] {
        &self.ids
    }

    pub fn contains(&self, category_id: u32) -> bool {
        self.ids.contains(&category_id)
    }

    /// Dense id (`1..=N`) for a permitted category.
    pub fn remap(&self, category_id: u32) -> Option<u8> {
        self.ids
            .iter()
            .position(|&id| id == category_id)
            .map(|pos| (pos + 1) as u8)
    }

    /// Keep only annotations with a permitted category.
    pub fn filter_annotations<'a, I>(&self, annotations: I) -> Vec<&'a CocoAnnotation>
    where
        I: IntoIterator<Item = &'a CocoAnnotation>,
    {
        annotations
            .into_iter()
            .filter(|a| self.contains(a.category_id))
            .collect()
    }

    /// Keep permitted annotations and rewrite their category to the dense id.
    ///
    /// Returns copies; the indexed records are left untouched.
    pub fn filter_and_remap<'a, I>(&self, annotations: I) -> Vec<CocoAnnotation>
    where
        I: IntoIterator<Item = &'a CocoAnnotation>,
    {
        annotations
            .into_iter()
            .filter_map(|a| {
                self.remap(a.category_id).map(|dense| CocoAnnotation {
                    category_id: dense as u32,
                    ..a.clone()
                })
            })
            .collect()
    }
}
