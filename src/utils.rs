use glob::{glob, Pattern};
use indicatif::{ProgressBar, ProgressStyle};
use serde::de::DeserializeOwned;
use std::fs;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::error::{ConvertError, Result};

/// Parse a JSON file straight from a buffered file stream.
pub fn read_and_parse_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = fs::File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

/// List the files in `dir` (not recursive) with the given extension, sorted
/// by file name.
pub fn list_files_sorted(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let pattern = format!(
        "{}/*.{}",
        Pattern::escape(&dir.to_string_lossy()),
        extension
    );
    let mut files: Vec<PathBuf> = glob(&pattern)?
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                log::warn!("Failed to read directory entry: {}", e);
                None
            }
        })
        .filter(|path| path.is_file())
        .collect();
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// File stem as an owned string, used as the image identifier.
pub fn file_stem_string(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Fail with [`ConvertError::MissingDirectory`] unless `path` is a directory.
pub fn require_dir(kind: &'static str, path: &Path) -> Result<()> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(ConvertError::MissingDirectory {
            kind,
            path: path.to_path_buf(),
        })
    }
}

/// Create a progress bar with the given length and label
pub fn create_progress_bar(len: u64, label: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{}] [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} ({{eta}})",
                label
            ))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb
}

/// Create an output directory if needed. Existing content is kept so that
/// re-runs against the same output root are non-destructive.
pub fn create_output_directory(path: &Path) -> std::io::Result<PathBuf> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(path.to_path_buf())
}
