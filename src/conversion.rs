use crate::config::Format;
use crate::error::{ConvertError, Result};
use crate::types::Point;

/// A region expressed as fractions of the image width and height.
///
/// Values are not clamped: geometry lying outside the declared image bounds
/// yields coordinates outside `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizedLabel {
    Bbox {
        x_center: f64,
        y_center: f64,
        width: f64,
        height: f64,
    },
    Polygon(Vec<Point>),
}

impl NormalizedLabel {
    /// Render as one YOLO label line with six decimal digits per value.
    pub fn to_line(&self, class_id: usize) -> String {
        match self {
            NormalizedLabel::Bbox {
                x_center,
                y_center,
                width,
                height,
            } => format!(
                "{} {:.6} {:.6} {:.6} {:.6}",
                class_id, x_center, y_center, width, height
            ),
            NormalizedLabel::Polygon(points) => {
                let mut line = String::with_capacity(points.len() * 18 + 4);
                line.push_str(&class_id.to_string());
                for &(x, y) in points {
                    line.push_str(&format!(" {:.6} {:.6}", x, y));
                }
                line
            }
        }
    }
}

/// Axis-aligned bounds `(x_min, y_min, x_max, y_max)` of a vertex list.
pub fn bounding_box(points: &[Point]) -> (f64, f64, f64, f64) {
    points.iter().fold(
        (f64::MAX, f64::MAX, f64::MIN, f64::MIN),
        |(x_min, y_min, x_max, y_max), &(x, y)| {
            (x_min.min(x), y_min.min(y), x_max.max(x), y_max.max(y))
        },
    )
}

/// Center and size of a pixel box, divided by the image dimensions.
pub fn normalize_bbox(
    (x_min, y_min, x_max, y_max): (f64, f64, f64, f64),
    image_width: f64,
    image_height: f64,
) -> NormalizedLabel {
    NormalizedLabel::Bbox {
        x_center: (x_min + x_max) / 2.0 / image_width,
        y_center: (y_min + y_max) / 2.0 / image_height,
        width: (x_max - x_min) / image_width,
        height: (y_max - y_min) / image_height,
    }
}

/// Divide every vertex by the image dimensions, keeping vertex order.
pub fn normalize_polygon(points: &[Point], image_width: f64, image_height: f64) -> NormalizedLabel {
    NormalizedLabel::Polygon(
        points
            .iter()
            .map(|&(x, y)| (x / image_width, y / image_height))
            .collect(),
    )
}

/// Reduce a region's vertices to the requested label geometry.
///
/// Returns `Ok(None)` when the region is too small to keep: fewer than three
/// vertices for polygon output, or a box with zero width or height. A zero
/// image dimension is an error for the whole image.
pub fn reduce(
    image_id: &str,
    points: &[Point],
    image_width: u32,
    image_height: u32,
    format: Format,
) -> Result<Option<NormalizedLabel>> {
    if image_width == 0 || image_height == 0 {
        return Err(ConvertError::ZeroImageSize {
            id: image_id.to_string(),
        });
    }
    let (w, h) = (f64::from(image_width), f64::from(image_height));

    match format {
        Format::Polygon => {
            if points.len() < 3 {
                return Ok(None);
            }
            Ok(Some(normalize_polygon(points, w, h)))
        }
        Format::Bbox => {
            if points.is_empty() {
                return Ok(None);
            }
            let bounds = bounding_box(points);
            let (x_min, y_min, x_max, y_max) = bounds;
            if x_max - x_min <= 0.0 || y_max - y_min <= 0.0 {
                return Ok(None);
            }
            Ok(Some(normalize_bbox(bounds, w, h)))
        }
    }
}

/// Enclosed area of a closed ring (shoelace formula), orientation ignored.
pub fn polygon_area(points: &[Point]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let doubled: f64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(&(x1, y1), &(x2, y2))| x1 * y2 - x2 * y1)
        .sum();
    doubled.abs() / 2.0
}
