use log::{info, warn};
use std::path::{Path, PathBuf};

use crate::catalog::ClassCatalog;
use crate::config::{ConversionConfig, Format};
use crate::contour::extract_polygons;
use crate::conversion::reduce;
use crate::dataset::split_annotations;
use crate::error::{ConvertError, Result};
use crate::io::{
    create_dataset_yaml, materialize_image, resolve_image_path, setup_output_directories,
    write_label_file, OutputDirs,
};
use crate::loader::{list_masks, load_polygon_annotations, read_mask};
use crate::types::{AnnotationRecord, MaskSource, ProcessingStats, Split, SplitData, MASK_CLASS_NAME};
use crate::utils::{create_progress_bar, require_dir};

pub const ANNOTATION_DIR: &str = "ann";
pub const MASK_DIR: &str = "masks_human";
pub const IMAGE_DIR: &str = "img";

/// What a finished conversion produced.
#[derive(Debug, Clone)]
pub struct ConversionSummary {
    pub output_root: PathBuf,
    pub manifest_path: PathBuf,
    pub class_names: Vec<String>,
    pub stats: ProcessingStats,
    /// Ids of the images actually written to each split
    pub written: SplitData<String>,
}

/// Label lines for one image plus the counts of what was left out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageLabels {
    pub lines: Vec<String>,
    /// Regions too small or degenerate to keep
    pub filtered: usize,
    /// Regions whose class is not in the catalog
    pub dropped: usize,
}

fn check_image_size(record: &AnnotationRecord) -> Result<()> {
    if record.width == 0 || record.height == 0 {
        return Err(ConvertError::ZeroImageSize {
            id: record.image_id.clone(),
        });
    }
    Ok(())
}

/// Convert the regions of one structured annotation record into label lines.
pub fn record_label_lines(
    record: &AnnotationRecord,
    catalog: &ClassCatalog,
    format: Format,
) -> Result<ImageLabels> {
    check_image_size(record)?;

    let mut labels = ImageLabels::default();
    for region in &record.regions {
        let Some(class_id) = catalog.id_of(&region.label) else {
            labels.dropped += 1;
            continue;
        };
        match reduce(
            &record.image_id,
            &region.vertices,
            record.width,
            record.height,
            format,
        )? {
            Some(label) => labels.lines.push(label.to_line(class_id)),
            None => labels.filtered += 1,
        }
    }
    Ok(labels)
}

/// Trace a mask and convert its blobs into label lines for class 0.
pub fn mask_label_lines(
    image_id: &str,
    mask: &image::GrayImage,
    min_area: f64,
    format: Format,
) -> Result<ImageLabels> {
    let (width, height) = mask.dimensions();
    if width == 0 || height == 0 {
        return Err(ConvertError::ZeroImageSize {
            id: image_id.to_string(),
        });
    }

    let contours = extract_polygons(mask, min_area);
    let mut labels = ImageLabels {
        filtered: contours.filtered,
        ..ImageLabels::default()
    };
    for polygon in &contours.polygons {
        match reduce(image_id, polygon, width, height, format)? {
            Some(label) => labels.lines.push(label.to_line(0)),
            None => labels.filtered += 1,
        }
    }
    Ok(labels)
}

// Write the label file first, then copy the image if it is not there yet
fn write_image_output(
    output_dirs: &OutputDirs,
    split: Split,
    image_path: &Path,
    lines: &[String],
) -> std::io::Result<()> {
    write_label_file(output_dirs.labels_dir(split), image_path, lines)?;
    materialize_image(image_path, output_dirs.images_dir(split))?;
    Ok(())
}

/// Per-image work shared by both pipelines. Returns `true` when the image and
/// its label file were written.
fn convert_one<F>(
    image_id: &str,
    image_dir: &Path,
    split: Split,
    output_dirs: &OutputDirs,
    config: &ConversionConfig,
    stats: &mut ProcessingStats,
    label_lines: F,
) -> bool
where
    F: FnOnce(&mut ProcessingStats) -> Option<Result<ImageLabels>>,
{
    let Some(image_path) = resolve_image_path(image_dir, image_id, &config.image_extensions)
    else {
        warn!("Skipping missing image for {}", image_id);
        stats.increment_skipped_missing_image();
        return false;
    };

    let labels = match label_lines(&mut *stats) {
        Some(Ok(labels)) => labels,
        Some(Err(e)) => {
            warn!("Skipping image {}: {}", image_id, e);
            stats.increment_failed();
            return false;
        }
        None => return false,
    };
    stats.add_filtered_regions(labels.filtered);
    stats.add_dropped_objects(labels.dropped);

    if let Err(e) = write_image_output(output_dirs, split, &image_path, &labels.lines) {
        warn!("Failed to write output for {}: {}", image_id, e);
        stats.increment_failed();
        return false;
    }
    stats.increment_written();
    true
}

/// Convert `<dataset>/ann/*.json` polygon annotations into a YOLO dataset.
///
/// Pass 1 loads every record and the class titles they mention; the catalog
/// is built from that set before the split so ids are global. Pass 2 writes
/// labels and images split by split.
pub fn process_polygon_dataset(config: &ConversionConfig) -> Result<ConversionSummary> {
    let ann_dir = config.dataset_dir.join(ANNOTATION_DIR);
    let image_dir = config.dataset_dir.join(IMAGE_DIR);
    require_dir("Annotation", &ann_dir)?;
    require_dir("Image", &image_dir)?;

    info!("Pass 1: loading annotations from {}", ann_dir.display());
    let loaded = load_polygon_annotations(&ann_dir)?;
    info!(
        "Loaded {} annotation files, found {} unique labels.",
        loaded.records.len(),
        loaded.labels.len()
    );

    let catalog = if config.label_list.is_empty() {
        ClassCatalog::from_labels(&loaded.labels)
    } else {
        ClassCatalog::from_ordered(config.label_list.iter().cloned())
    };

    let mut stats = ProcessingStats::new();
    stats.total_items = loaded.records.len() + loaded.unreadable.len();
    for _ in &loaded.unreadable {
        stats.increment_skipped_unreadable_annotation();
    }
    stats.add_dropped_objects(loaded.dropped_objects);

    let records: Vec<&AnnotationRecord> = loaded.records.iter().collect();
    let split_data = split_annotations(&records, config.split_ratio, config.seed);
    let output_dirs = setup_output_directories(&config.output_root)?;

    info!("Pass 2: writing labels and images...");
    let mut written = SplitData {
        train: Vec::new(),
        val: Vec::new(),
    };
    for (split, records) in split_data.iter() {
        let pb = create_progress_bar(records.len() as u64, split.display_name());
        for record in records {
            let ok = convert_one(
                &record.image_id,
                &image_dir,
                split,
                &output_dirs,
                config,
                &mut stats,
                |_| Some(record_label_lines(record, &catalog, config.format)),
            );
            if ok {
                push_written(&mut written, split, &record.image_id);
            }
            pb.inc(1);
        }
        pb.finish_with_message(format!("{} processing complete", split.display_name()));
    }

    finish(config, &output_dirs, catalog, stats, written)
}

/// Convert `<dataset>/masks_human/*.png` damage masks into a YOLO dataset
/// with the single class `damage`.
pub fn process_mask_dataset(config: &ConversionConfig) -> Result<ConversionSummary> {
    let mask_dir = config.dataset_dir.join(MASK_DIR);
    let image_dir = config.dataset_dir.join(IMAGE_DIR);
    require_dir("Mask", &mask_dir)?;
    require_dir("Image", &image_dir)?;

    let masks = list_masks(&mask_dir)?;
    info!("Found {} masks in {}", masks.len(), mask_dir.display());

    let catalog = ClassCatalog::single(MASK_CLASS_NAME);
    let mut stats = ProcessingStats::new();
    stats.total_items = masks.len();

    let split_data = split_annotations(&masks, config.split_ratio, config.seed);
    let output_dirs = setup_output_directories(&config.output_root)?;

    let mut written = SplitData {
        train: Vec::new(),
        val: Vec::new(),
    };
    for (split, masks) in split_data.iter() {
        let pb = create_progress_bar(masks.len() as u64, split.display_name());
        for MaskSource { image_id, path } in masks {
            let ok = convert_one(
                image_id,
                &image_dir,
                split,
                &output_dirs,
                config,
                &mut stats,
                |stats| match read_mask(path) {
                    Ok(mask) => Some(mask_label_lines(
                        image_id,
                        &mask,
                        config.min_area,
                        config.format,
                    )),
                    Err(e) => {
                        warn!("Skipping unreadable mask {}: {}", path.display(), e);
                        stats.increment_skipped_unreadable_mask();
                        None
                    }
                },
            );
            if ok {
                push_written(&mut written, split, image_id);
            }
            pb.inc(1);
        }
        pb.finish_with_message(format!("{} processing complete", split.display_name()));
    }

    finish(config, &output_dirs, catalog, stats, written)
}

fn push_written(written: &mut SplitData<String>, split: Split, image_id: &str) {
    match split {
        Split::Train => written.train.push(image_id.to_string()),
        Split::Val => written.val.push(image_id.to_string()),
    }
}

fn finish(
    config: &ConversionConfig,
    output_dirs: &OutputDirs,
    catalog: ClassCatalog,
    stats: ProcessingStats,
    written: SplitData<String>,
) -> Result<ConversionSummary> {
    info!("Creating data.yaml file...");
    let manifest_path = create_dataset_yaml(&output_dirs.root, &catalog)?;
    stats.print_summary();

    Ok(ConversionSummary {
        output_root: config.output_root.clone(),
        manifest_path,
        class_names: catalog.names().to_vec(),
        stats,
        written,
    })
}
