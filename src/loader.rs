use image::GrayImage;
use log::{debug, warn};
use rayon::prelude::*;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::types::{AnnotationFile, AnnotationRecord, MaskSource, Region, POLYGON_GEOMETRY};
use crate::utils::{file_stem_string, list_files_sorted, read_and_parse_json};

/// Output of the first pass over a structured annotation directory.
#[derive(Debug, Clone, Default)]
pub struct LoadedAnnotations {
    /// Records in sorted file-name order
    pub records: Vec<AnnotationRecord>,
    /// Every distinct class title seen in the corpus
    pub labels: BTreeSet<String>,
    /// Files that could not be read or parsed
    pub unreadable: Vec<PathBuf>,
    /// Objects dropped for a missing class, non-polygon geometry or no points
    pub dropped_objects: usize,
}

/// Turn one parsed annotation file into a record.
///
/// Returns the record, the class titles it mentions and the number of
/// objects that were dropped.
pub fn build_record(
    image_id: String,
    source_path: PathBuf,
    file: AnnotationFile,
) -> (AnnotationRecord, BTreeSet<String>, usize) {
    let mut labels = BTreeSet::new();
    let mut regions = Vec::with_capacity(file.objects.len());
    let mut dropped = 0;

    for object in file.objects {
        let class_title = object.class_title.filter(|title| !title.is_empty());
        if let Some(title) = &class_title {
            labels.insert(title.clone());
        }

        let is_polygon = object.geometry_type.as_deref() == Some(POLYGON_GEOMETRY);
        match class_title {
            Some(label) if is_polygon && !object.points.exterior.is_empty() => {
                regions.push(Region {
                    label,
                    vertices: object.points.exterior,
                });
            }
            _ => {
                debug!("Dropping object in {}: missing class or polygon", image_id);
                dropped += 1;
            }
        }
    }

    let (width, height) = file.size.pixels();
    let record = AnnotationRecord {
        image_id,
        source_path,
        width,
        height,
        regions,
    };
    (record, labels, dropped)
}

/// Read every `*.json` annotation file in `ann_dir`.
///
/// Parsing runs in parallel but the collected records keep the sorted
/// file-name order. Unreadable files are reported and skipped.
pub fn load_polygon_annotations(ann_dir: &Path) -> Result<LoadedAnnotations> {
    let paths = list_files_sorted(ann_dir, "json")?;

    let parsed: Vec<_> = paths
        .into_par_iter()
        .map(|path| {
            let parsed = read_and_parse_json::<AnnotationFile>(&path);
            (path, parsed)
        })
        .collect();

    let mut loaded = LoadedAnnotations::default();
    for (path, parsed) in parsed {
        match parsed {
            Ok(file) => {
                let image_id = file_stem_string(&path);
                let (record, labels, dropped) = build_record(image_id, path, file);
                loaded.labels.extend(labels);
                loaded.dropped_objects += dropped;
                loaded.records.push(record);
            }
            Err(e) => {
                warn!("Skipping unreadable annotation {}: {}", path.display(), e);
                loaded.unreadable.push(path);
            }
        }
    }
    Ok(loaded)
}

/// List the `*.png` masks in `mask_dir` in sorted file-name order.
pub fn list_masks(mask_dir: &Path) -> Result<Vec<MaskSource>> {
    Ok(list_files_sorted(mask_dir, "png")?
        .into_iter()
        .map(|path| MaskSource {
            image_id: file_stem_string(&path),
            path,
        })
        .collect())
}

/// Decode a mask raster as 8-bit grayscale.
pub fn read_mask(path: &Path) -> Result<GrayImage> {
    Ok(image::open(path)?.into_luma8())
}
