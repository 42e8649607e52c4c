use serde::Deserialize;
use std::path::PathBuf;

/// Geometry type an annotation object must declare to be converted
pub const POLYGON_GEOMETRY: &str = "polygon";

/// Synthetic class for mask-derived regions; masks carry no class information
pub const MASK_CLASS_NAME: &str = "damage";

/// A vertex in source pixel units
pub type Point = (f64, f64);

// Image size block of a structured annotation file; any JSON number is accepted
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct ImageSize {
    pub width: f64,
    pub height: f64,
}

impl ImageSize {
    /// Width and height in whole pixels. Values that are not finite and
    /// positive become 0, which fails the image later as zero-sized.
    pub fn pixels(&self) -> (u32, u32) {
        (whole_pixels(self.width), whole_pixels(self.height))
    }
}

fn whole_pixels(value: f64) -> u32 {
    if value.is_finite() && value > 0.0 {
        value.round().min(u32::MAX as f64) as u32
    } else {
        0
    }
}

// Outer ring of a polygon object. Interior rings (holes) are not converted.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ObjectPoints {
    #[serde(default)]
    pub exterior: Vec<Point>,
}

// One object declared in a structured annotation file
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationObject {
    pub class_title: Option<String>,
    pub geometry_type: Option<String>,
    #[serde(default)]
    pub points: ObjectPoints,
}

// The structured annotation file for one image
#[derive(Debug, Deserialize, Clone)]
pub struct AnnotationFile {
    pub size: ImageSize,
    #[serde(default)]
    pub objects: Vec<AnnotationObject>,
}

/// One labelled object in an image.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub label: String,
    pub vertices: Vec<Point>,
}

/// Parsed ground truth for one image. Never mutated after loading.
#[derive(Debug, Clone)]
pub struct AnnotationRecord {
    pub image_id: String,
    pub source_path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub regions: Vec<Region>,
}

/// A mask file waiting to be decoded; the stem is the image id.
#[derive(Debug, Clone)]
pub struct MaskSource {
    pub image_id: String,
    pub path: PathBuf,
}

/// The two partitions of the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
    Train,
    Val,
}

impl Split {
    pub fn dir_name(self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Val => "val",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Split::Train => "Train",
            Split::Val => "Val",
        }
    }
}

// Struct to hold the split datasets for training and validation
#[derive(Debug, Clone, PartialEq)]
pub struct SplitData<T> {
    pub train: Vec<T>,
    pub val: Vec<T>,
}

impl<T> SplitData<T> {
    pub fn iter(&self) -> impl Iterator<Item = (Split, &[T])> {
        [(Split::Train, self.train.as_slice()), (Split::Val, self.val.as_slice())].into_iter()
    }
}

// Struct to hold processing statistics
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProcessingStats {
    pub total_items: usize,
    pub written_images: usize,
    pub skipped_missing_image: usize,
    pub skipped_unreadable_mask: usize,
    pub skipped_unreadable_annotation: usize,
    pub failed_images: usize,
    pub dropped_objects: usize,
    pub filtered_regions: usize,
}

impl ProcessingStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_written(&mut self) {
        self.written_images += 1;
    }

    pub fn increment_skipped_missing_image(&mut self) {
        self.skipped_missing_image += 1;
    }

    pub fn increment_skipped_unreadable_mask(&mut self) {
        self.skipped_unreadable_mask += 1;
    }

    pub fn increment_skipped_unreadable_annotation(&mut self) {
        self.skipped_unreadable_annotation += 1;
    }

    pub fn increment_failed(&mut self) {
        self.failed_images += 1;
    }

    pub fn add_dropped_objects(&mut self, count: usize) {
        self.dropped_objects += count;
    }

    pub fn add_filtered_regions(&mut self, count: usize) {
        self.filtered_regions += count;
    }

    pub fn total_skipped(&self) -> usize {
        self.skipped_missing_image
            + self.skipped_unreadable_mask
            + self.skipped_unreadable_annotation
            + self.failed_images
    }

    pub fn print_summary(&self) {
        log::info!("=== Processing Summary ===");
        log::info!("Total source items: {}", self.total_items);
        log::info!("Images written: {}", self.written_images);
        log::info!("Skipped (missing image file): {}", self.skipped_missing_image);
        log::info!("Skipped (unreadable mask): {}", self.skipped_unreadable_mask);
        log::info!(
            "Skipped (unreadable annotation): {}",
            self.skipped_unreadable_annotation
        );
        log::info!("Failed (zero size or write error): {}", self.failed_images);
        log::info!("Objects dropped: {}", self.dropped_objects);
        log::info!("Regions filtered (below thresholds): {}", self.filtered_regions);

        let total_skipped = self.total_skipped();
        if total_skipped > 0 {
            log::warn!(
                "Total skipped images: {} (missing image: {}, unreadable mask: {}, unreadable annotation: {}, failed: {})",
                total_skipped,
                self.skipped_missing_image,
                self.skipped_unreadable_mask,
                self.skipped_unreadable_annotation,
                self.failed_images
            );
        }
    }
}
