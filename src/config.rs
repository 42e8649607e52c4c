use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::str::FromStr;

/// Image suffixes probed, in order, when the image id is not itself a file name
pub const DEFAULT_IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".png", ".jpeg"];

/// Contours enclosing less than this many square pixels are treated as noise
pub const DEFAULT_MIN_AREA: f64 = 10.0;

pub const DEFAULT_SPLIT_RATIO: f64 = 0.8;
pub const DEFAULT_SEED: u64 = 42;

/// Command-line arguments shared by the polygon and mask converters.
#[derive(Parser, Debug, Clone)]
#[command(version, long_about = None)]
pub struct Args {
    /// Root directory containing the source datasets
    #[arg(long = "data_root")]
    pub data_root: String,

    /// Dataset directory under data_root holding ann/, masks_human/ and img/
    #[arg(long = "dataset", default_value = "Car damages dataset/File1")]
    pub dataset: String,

    /// Output directory for the YOLO dataset
    #[arg(long = "output_root")]
    pub output_root: String,

    /// Proportion of the images assigned to the training split
    #[arg(
        long = "split_ratio",
        visible_alias = "split",
        default_value_t = DEFAULT_SPLIT_RATIO,
        value_parser = validate_ratio
    )]
    pub split_ratio: f64,

    /// Seed for the train/val shuffle
    #[arg(long = "seed", default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Output format for YOLO labels: 'bbox' or 'polygon'
    #[arg(long = "output_format", visible_alias = "format", value_enum)]
    pub output_format: Option<Format>,

    /// Ordered suffixes tried when locating an image file
    #[arg(
        long = "image_extensions",
        value_delimiter = ',',
        default_value = ".jpg,.png,.jpeg"
    )]
    pub image_extensions: Vec<String>,

    /// Minimum contour area (square pixels) kept from a mask
    #[arg(long = "min_area", default_value_t = DEFAULT_MIN_AREA)]
    pub min_area: f64,

    /// Ordered class list; classes not listed are dropped
    #[arg(value_delimiter = ',')]
    pub label_list: Vec<String>,
}

// Enumeration for the YOLO output format
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
pub enum Format {
    Polygon,
    Bbox,
}

/// Resolved settings for one conversion run.
#[derive(Debug, Clone)]
pub struct ConversionConfig {
    pub dataset_dir: PathBuf,
    pub output_root: PathBuf,
    pub split_ratio: f64,
    pub seed: u64,
    pub format: Format,
    pub image_extensions: Vec<String>,
    pub min_area: f64,
    pub label_list: Vec<String>,
}

impl ConversionConfig {
    pub fn new(dataset_dir: impl Into<PathBuf>, output_root: impl Into<PathBuf>) -> Self {
        Self {
            dataset_dir: dataset_dir.into(),
            output_root: output_root.into(),
            split_ratio: DEFAULT_SPLIT_RATIO,
            seed: DEFAULT_SEED,
            format: Format::Bbox,
            image_extensions: DEFAULT_IMAGE_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            min_area: DEFAULT_MIN_AREA,
            label_list: Vec::new(),
        }
    }

    pub fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }
}

impl Args {
    /// Build the run configuration, falling back to `default_format` when
    /// no output format was given on the command line.
    pub fn to_config(&self, default_format: Format) -> ConversionConfig {
        ConversionConfig {
            dataset_dir: PathBuf::from(&self.data_root).join(&self.dataset),
            output_root: PathBuf::from(&self.output_root),
            split_ratio: self.split_ratio,
            seed: self.seed,
            format: self.output_format.unwrap_or(default_format),
            image_extensions: self.image_extensions.clone(),
            min_area: self.min_area,
            label_list: self.label_list.clone(),
        }
    }
}

// Validate that the ratio is between 0.0 and 1.0
pub fn validate_ratio(s: &str) -> Result<f64, String> {
    match f64::from_str(s) {
        Ok(val) if (0.0..=1.0).contains(&val) => Ok(val),
        _ => Err("RATIO must be between 0.0 and 1.0".to_string()),
    }
}
