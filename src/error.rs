use std::path::PathBuf;

/// Errors raised while converting annotations into a YOLO dataset.
///
/// Only [`ConvertError::MissingDirectory`] and failures to create the output
/// tree abort a run; everything else is reported per item by the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("{kind} dir not found: {}", path.display())]
    MissingDirectory { kind: &'static str, path: PathBuf },

    #[error("image {id} has zero width or height")]
    ZeroImageSize { id: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to decode image: {0}")]
    Image(#[from] image::ImageError),

    #[error("invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),
}

pub type Result<T> = std::result::Result<T, ConvertError>;
