//! Render pass output
//!
//! A `Frame` is everything a presentation layer needs to paint one state of
//! the session: the processed preview image, where it sits in the viewport,
//! and an ordered list of overlay instructions.
use image::{imageops, imageops::FilterType, GrayImage, Rgb, RgbImage};

use super::canvas::{DisplayMapping, Point, ViewTransform};
use super::roi::RoiMask;
use crate::measure::adjust::apply_adjustments;
use crate::raw::CalibratedImage;
use crate::state::edit::AdjustmentSettings;

/// Color of pixels above threshold in the overlay
pub const OVERLAY_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// Half-length of the crosshair arms, display pixels
pub const CROSSHAIR_SIZE: f64 = 15.0;

/// Radius of an ROI vertex marker, display pixels
pub const VERTEX_RADIUS: f64 = 3.0;

/// One overlay instruction, display coordinates
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    /// Marker on a captured ROI vertex
    Vertex { at: Point, radius: f64 },
    /// Edge between two consecutive ROI vertices
    Edge { from: Point, to: Point },
    /// Outline of a finalized ROI, closing edge included
    Outline { points: Vec<Point> },
    /// Dashed zoom rectangle while selecting
    ZoomBand { from: Point, to: Point },
    /// Cursor replacement in Draw and ZoomSelect modes
    Crosshair { at: Point, size: f64 },
}

/// A complete render pass
#[derive(Debug, Clone)]
pub struct Frame {
    /// Processed preview at display size
    pub image: RgbImage,
    /// Layout the preview was produced with
    pub mapping: DisplayMapping,
    /// Overlay drawn on top of the image, in order
    pub ops: Vec<DrawOp>,
}

/// Crop, run the adjustment pipeline at image resolution, then resize to
/// display size
///
/// Blur radius and the contrast mean are in calibrated-image pixels, the
/// same units the measurement uses.
pub fn render_preview(
    calibrated: &CalibratedImage,
    view: &ViewTransform,
    settings: &AdjustmentSettings,
) -> (GrayImage, DisplayMapping) {
    let mapping = view.mapping();
    let crop = mapping.crop;
    let cropped = imageops::crop_imm(calibrated.pixels(), crop.x, crop.y, crop.width, crop.height).to_image();
    let processed = apply_adjustments(&cropped, settings);
    let resized = imageops::resize(
        &processed,
        mapping.display_width,
        mapping.display_height,
        FilterType::Triangle,
    );
    (resized, mapping)
}

/// Gray preview to RGB, painting pixels above `threshold` in the overlay color
pub fn colorize(preview: &GrayImage, threshold: Option<f64>) -> RgbImage {
    RgbImage::from_fn(preview.width(), preview.height(), |x, y| {
        let v = preview.get_pixel(x, y)[0];
        match threshold {
            Some(t) if f64::from(v) > t => OVERLAY_COLOR,
            _ => Rgb([v, v, v]),
        }
    })
}

/// Repaint the overlay inside a finalized ROI from the measured pixels
///
/// Every preview pixel whose center maps into the ROI mask takes its
/// overlay decision from `processed` (the adjusted bounding box the index
/// is computed from): red when the value is non-zero and above
/// `threshold`, the preview gray otherwise.
pub fn paint_roi_overlay(
    image: &mut RgbImage,
    preview: &GrayImage,
    mapping: &DisplayMapping,
    roi: &RoiMask,
    processed: &GrayImage,
    threshold: f64,
) {
    let bbox = roi.bbox;
    for (x, y, pixel) in image.enumerate_pixels_mut() {
        let center = Point::new(
            mapping.offset.x + f64::from(x) + 0.5,
            mapping.offset.y + f64::from(y) + 0.5,
        );
        let p = mapping.display_to_image(center);
        let (ix, iy) = (p.x.floor(), p.y.floor());
        if ix < f64::from(bbox.x) || iy < f64::from(bbox.y) {
            continue;
        }
        let (lx, ly) = (ix as u32 - bbox.x, iy as u32 - bbox.y);
        if lx >= bbox.width || ly >= bbox.height || !roi.get(lx, ly) {
            continue;
        }

        let v = processed.get_pixel(lx, ly)[0];
        *pixel = if v > 0 && f64::from(v) > threshold {
            OVERLAY_COLOR
        } else {
            let g = preview.get_pixel(x, y)[0];
            Rgb([g, g, g])
        };
    }
}

/// Overlay instructions for ROI points
///
/// Polygon mode draws each edge as it is added; freehand draws the trace.
/// A finalized shape adds its closed outline.
pub fn roi_ops(points: &[Point], finalized: bool) -> Vec<DrawOp> {
    let mut ops: Vec<DrawOp> = points
        .iter()
        .map(|&at| DrawOp::Vertex {
            at,
            radius: VERTEX_RADIUS,
        })
        .collect();
    ops.extend(points.windows(2).map(|pair| DrawOp::Edge {
        from: pair[0],
        to: pair[1],
    }));
    if finalized {
        ops.push(DrawOp::Outline {
            points: points.to_vec(),
        });
    }
    ops
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::canvas::Viewport;
    use image::Luma;

    #[test]
    fn test_preview_matches_display_size() {
        let cal = CalibratedImage::from_gray(GrayImage::from_pixel(100, 50, Luma([60])));
        let view = ViewTransform::new(100, 50, Viewport::new(400, 400));
        let (preview, mapping) = render_preview(&cal, &view, &AdjustmentSettings::default());
        assert_eq!(preview.dimensions(), (400, 200));
        assert_eq!(mapping.offset, Point::new(0.0, 100.0));
        assert!(preview.pixels().all(|p| (59..=61).contains(&p[0])));
    }

    #[test]
    fn test_colorize_marks_only_above_threshold() {
        let preview = GrayImage::from_fn(3, 1, |x, _| Luma([[10, 128, 200][x as usize]]));
        let rgb = colorize(&preview, Some(128.0));
        assert_eq!(*rgb.get_pixel(0, 0), Rgb([10, 10, 10]));
        assert_eq!(*rgb.get_pixel(1, 0), Rgb([128, 128, 128]));
        assert_eq!(*rgb.get_pixel(2, 0), OVERLAY_COLOR);
        assert_eq!(*colorize(&preview, None).get_pixel(2, 0), Rgb([200, 200, 200]));
    }

    #[test]
    fn test_roi_overlay_follows_processed_pixels() {
        // 4x4 image shown at scale 4; ROI is the right half
        let view = ViewTransform::new(4, 4, Viewport::new(16, 16));
        let mapping = view.mapping();
        let roi = RoiMask::from_polygon(
            &[Point::new(2.0, 0.0), Point::new(4.0, 0.0), Point::new(4.0, 4.0), Point::new(2.0, 4.0)],
            4,
            4,
        );
        let preview = GrayImage::from_pixel(16, 16, Luma([200]));
        let mut image = colorize(&preview, Some(100.0));
        let processed = GrayImage::from_fn(2, 4, |_, y| Luma([if y < 2 { 50 } else { 150 }]));

        paint_roi_overlay(&mut image, &preview, &mapping, &roi, &processed, 100.0);
        assert_eq!(*image.get_pixel(0, 0), OVERLAY_COLOR);
        assert_eq!(*image.get_pixel(10, 2), Rgb([200, 200, 200]));
        assert_eq!(*image.get_pixel(10, 14), OVERLAY_COLOR);
    }

    #[test]
    fn test_roi_ops() {
        let pts = [Point::new(0.0, 0.0), Point::new(5.0, 0.0), Point::new(5.0, 5.0)];
        let open = roi_ops(&pts, false);
        assert_eq!(open.len(), 5);
        let closed = roi_ops(&pts, true);
        assert!(matches!(closed.last(), Some(DrawOp::Outline { points }) if points.len() == 3));
    }
}
