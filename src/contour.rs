//! Contour extraction: turn a binary damage mask into polygon regions.
//!
//! Only the outermost border of each foreground blob is kept; holes and
//! blobs nested inside holes are not emitted. Border points are compressed
//! to the end points of straight runs before the vertex-count and area
//! filters are applied.

use image::GrayImage;
use imageproc::contours::{find_contours, BorderType, Contour};

use crate::conversion::polygon_area;
use crate::types::Point;

/// Result of tracing one mask.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedContours {
    pub polygons: Vec<Vec<Point>>,
    /// Outer borders discarded for having fewer than three points or too
    /// little area.
    pub filtered: usize,
}

/// Trace the external contours of every blob with a pixel value `> 0`.
///
/// Contours with fewer than three compressed points or an enclosed area
/// below `min_area` are dropped as noise.
pub fn extract_polygons(mask: &GrayImage, min_area: f64) -> ExtractedContours {
    let contours: Vec<Contour<u32>> = find_contours(mask);

    let mut result = ExtractedContours::default();
    for contour in contours
        .into_iter()
        .filter(|c| matches!(c.border_type, BorderType::Outer) && c.parent.is_none())
    {
        let polygon = compress_chain(&contour);
        if polygon.len() < 3 || polygon_area(&polygon) < min_area {
            result.filtered += 1;
            continue;
        }
        result.polygons.push(polygon);
    }
    result
}

/// Drop border points lying in the middle of a horizontal, vertical or
/// diagonal run, treating the border as a closed ring.
fn compress_chain(contour: &Contour<u32>) -> Vec<Point> {
    let mut ring: Vec<(i64, i64)> = contour
        .points
        .iter()
        .map(|p| (i64::from(p.x), i64::from(p.y)))
        .collect();
    ring.dedup();
    if ring.len() > 1 && ring.first() == ring.last() {
        ring.pop();
    }

    let n = ring.len();
    let to_point = |&(x, y): &(i64, i64)| (x as f64, y as f64);
    if n < 3 {
        return ring.iter().map(to_point).collect();
    }

    let step = |from: usize, to: usize| {
        let (dx, dy) = (ring[to].0 - ring[from].0, ring[to].1 - ring[from].1);
        (dx.signum(), dy.signum())
    };

    (0..n)
        .filter(|&i| step((i + n - 1) % n, i) != step(i, (i + 1) % n))
        .map(|i| to_point(&ring[i]))
        .collect()
}
