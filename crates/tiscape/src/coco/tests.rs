// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! Integration tests for COCO annotation handling.

#[cfg(test)]
mod integration_tests {
    use super::super::*;
    use crate::mask::{Rle, segmentation_to_bitmap, segmentation_to_rle};
    use tempfile::TempDir;

    const MIXED_SEGMENTATIONS: &str = r#"{
        "info": {"description": "TI scape sample", "year": 2021},
        "images": [
            {"id": 7, "width": 10, "height": 10, "file_name": "a.jpg"},
            {"id": 3, "width": 10, "height": 10, "file_name": "b.jpg"}
        ],
        "categories": [
            {"id": 1, "name": "road"},
            {"id": 2, "name": "vehicle"},
            {"id": 9, "name": "sky"}
        ],
        "annotations": [
            {"id": 1, "image_id": 7, "category_id": 1, "area": 25.0, "iscrowd": 0,
             "bbox": [2, 2, 5, 5],
             "segmentation": [[2, 2, 7, 2, 7, 7, 2, 7]]},
            {"id": 2, "image_id": 7, "category_id": 2, "area": 25.0, "iscrowd": 0,
             "segmentation": [2, 2, 7, 2, 7, 7, 2, 7]},
            {"id": 3, "image_id": 3, "category_id": 9, "area": 25.0, "iscrowd": 1,
             "segmentation": {"counts": [22, 5, 5, 5, 5, 5, 5, 5, 5, 5, 33], "size": [10, 10]}},
            {"id": 4, "image_id": 3, "category_id": 1, "area": 25.0, "iscrowd": 1,
             "segmentation": {"counts": "f0550000000l0", "size": [10, 10]}}
        ]
    }"#;

    fn write_mixed(temp_dir: &TempDir) -> std::path::PathBuf {
        let path = temp_dir.path().join("stuff_sorted.json");
        std::fs::write(&path, MIXED_SEGMENTATIONS).unwrap();
        path
    }

    #[test]
    fn test_every_segmentation_form_rasterizes_to_same_square() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_mixed(&temp_dir);

        let dataset = CocoReader::new().read_json(&path).unwrap();
        assert_eq!(dataset.annotations.len(), 4);
        assert!(matches!(
            dataset.annotations[0].segmentation,
            Some(CocoSegmentation::Polygon(_))
        ));
        assert!(matches!(
            dataset.annotations[1].segmentation,
            Some(CocoSegmentation::FlatPolygon(_))
        ));
        assert!(matches!(
            dataset.annotations[2].segmentation,
            Some(CocoSegmentation::Rle(_))
        ));
        assert!(matches!(
            dataset.annotations[3].segmentation,
            Some(CocoSegmentation::CompressedRle(_))
        ));

        let bitmaps: Vec<Vec<u8>> = dataset
            .annotations
            .iter()
            .map(|ann| segmentation_to_bitmap(ann.segmentation.as_ref().unwrap(), 10, 10).unwrap())
            .collect();
        for bitmap in &bitmaps {
            assert_eq!(bitmap, &bitmaps[0]);
            assert_eq!(bitmap.iter().filter(|&&b| b != 0).count(), 25);
        }

        let rle = segmentation_to_rle(dataset.annotations[0].segmentation.as_ref().unwrap(), 10, 10)
            .unwrap();
        assert_eq!(rle.to_compressed(), "f0550000000l0");
    }

    #[test]
    fn test_index_keeps_file_order_and_crowd_filter() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_mixed(&temp_dir);

        let index = CocoReader::new().read_index(&path).unwrap();
        assert_eq!(index.image_ids(), &[7, 3]);
        assert_eq!(index.category_ids(), &[1, 2, 9]);
        assert_eq!(index.category_name(9), Some("sky"));
        assert_eq!(index.image(3).unwrap().file_name, "b.jpg");

        assert_eq!(index.annotations_for_image(3, None).len(), 2);
        assert_eq!(index.annotations_for_image(3, Some(true)).len(), 2);
        assert!(index.annotations_for_image(3, Some(false)).is_empty());
        assert_eq!(index.annotations_for_image(7, Some(false)).len(), 2);
        assert!(index.annotations_for_image(42, None).is_empty());
    }

    #[test]
    fn test_split_write_and_reload() {
        let temp_dir = TempDir::new().unwrap();
        let images = (1..=10)
            .map(|id| CocoImage {
                id,
                width: 64,
                height: 48,
                file_name: format!("{:03}.jpg", id),
                ..Default::default()
            })
            .collect();
        let annotations = (1..=10)
            .flat_map(|image_id| {
                (0..2).map(move |k| CocoAnnotation {
                    id: image_id * 10 + k,
                    image_id,
                    category_id: 1,
                    area: 1500.0,
                    segmentation: Some(CocoSegmentation::FlatPolygon(vec![
                        0.0, 0.0, 40.0, 0.0, 40.0, 40.0, 0.0, 40.0,
                    ])),
                    ..Default::default()
                })
            })
            .collect();
        let dataset = CocoDataset {
            images,
            annotations,
            categories: vec![CocoCategory {
                id: 1,
                name: "road".to_string(),
                supercategory: None,
            }],
            ..Default::default()
        };

        let halves = split_dataset(&dataset, 0.2).unwrap();
        let writer = CocoWriter::new();
        let reader = CocoReader::with_options(CocoReadOptions { validate: true });

        for split in Split::ALL {
            let path = temp_dir.path().join(split.annotation_file("stuff"));
            assert!(writer.write_json_if_absent(halves.get(split), &path).unwrap());

            let reloaded = reader.read_json(&path).unwrap();
            assert_eq!(reloaded.images.len(), halves.get(split).images.len());
            assert_eq!(reloaded.categories.len(), 1);
            for ann in &reloaded.annotations {
                assert!(reloaded.images.iter().any(|img| img.id == ann.image_id));
            }
        }

        let val = reader
            .read_json(temp_dir.path().join("stuff_val.json"))
            .unwrap();
        let val_ids: Vec<u64> = val.images.iter().map(|img| img.id).collect();
        assert_eq!(val_ids, vec![9, 10]);
        assert_eq!(val.annotations.len(), 4);

        // A second pass must not rewrite the files.
        let empty = SplitDatasets {
            train: CocoDataset::default(),
            val: CocoDataset::default(),
        };
        for split in Split::ALL {
            let path = temp_dir.path().join(split.annotation_file("stuff"));
            assert!(!writer.write_json_if_absent(empty.get(split), &path).unwrap());
        }
        let train = reader
            .read_json(temp_dir.path().join("stuff_train.json"))
            .unwrap();
        assert_eq!(train.images.len(), 8);
    }

    #[test]
    fn test_union_of_instances_matches_area() {
        let a = Rle::from_polygon(&[1.0, 1.0, 5.0, 1.0, 5.0, 5.0, 1.0, 5.0], 8, 8);
        let b = Rle::from_polygon(&[3.0, 3.0, 7.0, 3.0, 7.0, 7.0, 3.0, 7.0], 8, 8);
        let merged = Rle::union(&[a.clone(), b]).unwrap().unwrap();

        assert_eq!(a.area(), 16);
        assert_eq!(merged.area(), 28);
    }
}
