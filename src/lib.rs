//! Damage annotation to YOLO dataset converter
//!
//! This library turns polygon JSON annotations and binary damage masks into
//! YOLO detection or segmentation datasets with a seeded train/val split.

pub mod catalog;
pub mod config;
pub mod contour;
pub mod conversion;
pub mod dataset;
pub mod error;
pub mod io;
pub mod loader;
pub mod types;
pub mod utils;
pub mod yolo_dataset;

// Re-export commonly used types and functions
pub use catalog::ClassCatalog;
pub use config::{Args, ConversionConfig, Format};
pub use error::ConvertError;
pub use types::{AnnotationRecord, ProcessingStats, Region, Split, SplitData};
pub use yolo_dataset::{process_mask_dataset, process_polygon_dataset, ConversionSummary};
