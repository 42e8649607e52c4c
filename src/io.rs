use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::catalog::ClassCatalog;
use crate::types::Split;
use crate::utils::create_output_directory;

pub const MANIFEST_FILE_NAME: &str = "data.yaml";

// Struct to hold the paths to the output directories for train/val splits
#[derive(Debug, Clone)]
pub struct OutputDirs {
    pub root: PathBuf,
    pub train_labels_dir: PathBuf,
    pub val_labels_dir: PathBuf,
    pub train_images_dir: PathBuf,
    pub val_images_dir: PathBuf,
}

impl OutputDirs {
    pub fn labels_dir(&self, split: Split) -> &Path {
        match split {
            Split::Train => &self.train_labels_dir,
            Split::Val => &self.val_labels_dir,
        }
    }

    pub fn images_dir(&self, split: Split) -> &Path {
        match split {
            Split::Train => &self.train_images_dir,
            Split::Val => &self.val_images_dir,
        }
    }
}

/// Set up `images/{train,val}` and `labels/{train,val}` under `output_root`.
pub fn setup_output_directories(output_root: &Path) -> std::io::Result<OutputDirs> {
    let labels_dir = output_root.join("labels");
    let images_dir = output_root.join("images");

    Ok(OutputDirs {
        root: create_output_directory(output_root)?,
        train_labels_dir: create_output_directory(&labels_dir.join(Split::Train.dir_name()))?,
        val_labels_dir: create_output_directory(&labels_dir.join(Split::Val.dir_name()))?,
        train_images_dir: create_output_directory(&images_dir.join(Split::Train.dir_name()))?,
        val_images_dir: create_output_directory(&images_dir.join(Split::Val.dir_name()))?,
    })
}

/// Locate the image file for `image_id` in `image_dir`.
///
/// The id is first tried as a literal file name, then with each suffix of
/// `extensions` appended, in order. The first existing file wins.
pub fn resolve_image_path(image_dir: &Path, image_id: &str, extensions: &[String]) -> Option<PathBuf> {
    std::iter::once(image_dir.join(image_id))
        .chain(
            extensions
                .iter()
                .map(|ext| image_dir.join(format!("{}{}", image_id, ext))),
        )
        .find(|candidate| candidate.is_file())
}

/// Write the label lines for one image, replacing any earlier file.
///
/// The file is created even when `lines` is empty: an empty label file means
/// the image holds no regions.
pub fn write_label_file(labels_dir: &Path, image_path: &Path, lines: &[String]) -> std::io::Result<PathBuf> {
    let stem = image_path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    // Dotted stems such as `car.v1` must keep every segment
    let label_path = labels_dir.join(format!("{}.txt", sanitize_filename::sanitize(stem)));

    let mut writer = BufWriter::new(File::create(&label_path)?);
    writer.write_all(lines.join("\n").as_bytes())?;
    writer.flush()?;
    Ok(label_path)
}

/// Copy the image into `images_dir` unless a file of that name already exists.
///
/// Returns `true` when a copy was made.
pub fn materialize_image(image_path: &Path, images_dir: &Path) -> std::io::Result<bool> {
    let file_name = image_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let image_output_path = images_dir.join(sanitize_filename::sanitize(file_name));
    if image_output_path.exists() {
        return Ok(false);
    }
    fs::copy(image_path, &image_output_path)?;
    Ok(true)
}

// Emit a YAML scalar, quoting names a YAML parser would not read back verbatim
fn yaml_scalar(value: &str) -> String {
    let needs_quotes = value.is_empty()
        || value.trim() != value
        || value.contains(|c: char| ":#{}[],&*!|>'\"%@`".contains(c))
        || value.starts_with(['-', '?'])
        || matches!(
            value.to_ascii_lowercase().as_str(),
            "true" | "false" | "yes" | "no" | "null" | "~"
        )
        || value.parse::<f64>().is_ok();
    if needs_quotes {
        serde_json::to_string(value).unwrap_or_else(|_| format!("\"{}\"", value))
    } else {
        value.to_string()
    }
}

/// Build the `data.yaml` content for a dataset rooted at `root`.
pub fn dataset_yaml_content(root: &Path, catalog: &ClassCatalog) -> String {
    let mut yaml_content = format!(
        "path: {}\ntrain: images/train\nval: images/val\nnc: {}\nnames:\n",
        root.to_string_lossy(),
        catalog.len()
    );
    for name in catalog.names() {
        yaml_content.push_str(&format!("  - {}\n", yaml_scalar(name)));
    }
    yaml_content
}

/// Create the data.yaml file for YOLO training, overwriting any earlier one.
pub fn create_dataset_yaml(output_root: &Path, catalog: &ClassCatalog) -> std::io::Result<PathBuf> {
    let dataset_yaml_path = output_root.join(MANIFEST_FILE_NAME);
    let absolute_path = fs::canonicalize(output_root)?;
    let mut dataset_yaml = BufWriter::new(File::create(&dataset_yaml_path)?);
    dataset_yaml.write_all(dataset_yaml_content(&absolute_path, catalog).as_bytes())?;
    dataset_yaml.flush()?;
    Ok(dataset_yaml_path)
}
