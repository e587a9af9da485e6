//! View transform between the display canvas and the calibrated image
//!
//! The visible window is a crop rectangle stored in absolute image
//! coordinates. Every zoom composes with the image, never with a previous
//! crop buffer, so coordinates cannot drift however many zooms precede a
//! measurement. The display scale is recomputed on every render pass from
//! the current viewport.
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{InnervationError, Result};

/// Canvas size used when the presentation layer reports a collapsed viewport
pub const FALLBACK_VIEWPORT: Viewport = Viewport {
    width: 800,
    height: 600,
};

/// Minimum side length of a zoom rectangle, in image pixels
pub const MIN_ZOOM_SIZE: f64 = 10.0;

/// Default zoom-out expansion factor
pub const ZOOM_OUT_FACTOR: f64 = 1.5;

/// A point in display or image coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Display canvas size in display pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        FALLBACK_VIEWPORT
    }
}

impl Viewport {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Viewport actually used for layout
    ///
    /// A canvas narrower than 10 pixels has not been laid out yet.
    pub fn effective(self) -> Self {
        if self.width < 10 || self.height == 0 {
            FALLBACK_VIEWPORT
        } else {
            self
        }
    }
}

/// Axis-aligned pixel rectangle in calibrated-image coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Exclusive bottom edge
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }
}

/// Result of one layout pass: how the crop is placed on the canvas
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayMapping {
    /// Display pixels per image pixel
    pub scale: f64,
    /// Top-left of the drawn image inside the viewport
    pub offset: Point,
    /// Size of the drawn image in display pixels
    pub display_width: u32,
    pub display_height: u32,
    /// Crop the mapping was computed for
    pub crop: CropRect,
}

impl DisplayMapping {
    /// `(p - offset) / scale + cropOrigin`
    pub fn display_to_image(&self, p: Point) -> Point {
        Point::new(
            (p.x - self.offset.x) / self.scale + f64::from(self.crop.x),
            (p.y - self.offset.y) / self.scale + f64::from(self.crop.y),
        )
    }

    /// Inverse of `display_to_image`, used for drawing
    pub fn image_to_display(&self, p: Point) -> Point {
        Point::new(
            (p.x - f64::from(self.crop.x)) * self.scale + self.offset.x,
            (p.y - f64::from(self.crop.y)) * self.scale + self.offset.y,
        )
    }
}

/// Crop window and scale over the calibrated image
#[derive(Debug, Clone)]
pub struct ViewTransform {
    image_width: u32,
    image_height: u32,
    crop: CropRect,
    viewport: Viewport,
}

impl ViewTransform {
    /// Full-extent view of an image
    pub fn new(image_width: u32, image_height: u32, viewport: Viewport) -> Self {
        Self {
            image_width,
            image_height,
            crop: CropRect::new(0, 0, image_width, image_height),
            viewport,
        }
    }

    /// Crop = full calibrated image
    pub fn reset(&mut self) {
        self.crop = self.full_extent();
    }

    pub fn crop(&self) -> CropRect {
        self.crop
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn full_extent(&self) -> CropRect {
        CropRect::new(0, 0, self.image_width, self.image_height)
    }

    pub fn is_full_extent(&self) -> bool {
        self.crop.width >= self.image_width && self.crop.height >= self.image_height
    }

    /// Fit the crop into the viewport preserving aspect ratio, centered
    pub fn mapping(&self) -> DisplayMapping {
        let vp = self.viewport.effective();
        let (cw, ch) = (f64::from(self.crop.width), f64::from(self.crop.height));
        let scale = (f64::from(vp.width) / cw).min(f64::from(vp.height) / ch);
        let display_width = ((cw * scale) as u32).max(1);
        let display_height = ((ch * scale) as u32).max(1);
        let offset = Point::new(
            f64::from(vp.width.saturating_sub(display_width) / 2),
            f64::from(vp.height.saturating_sub(display_height) / 2),
        );

        DisplayMapping {
            scale,
            offset,
            display_width,
            display_height,
            crop: self.crop,
        }
    }

    pub fn display_to_image(&self, p: Point) -> Point {
        self.mapping().display_to_image(p)
    }

    pub fn image_to_display(&self, p: Point) -> Point {
        self.mapping().image_to_display(p)
    }

    /// Zoom to the rectangle spanned by two display corners
    ///
    /// The corners are clamped to the current crop. A rectangle narrower or
    /// shorter than `min_size` image pixels leaves the view unchanged and
    /// returns `DegenerateSelection`.
    pub fn zoom_in(&mut self, start: Point, end: Point, min_size: f64) -> Result<CropRect> {
        let mapping = self.mapping();
        let a = mapping.display_to_image(start);
        let b = mapping.display_to_image(end);

        let (left, right) = (f64::from(self.crop.x), f64::from(self.crop.right()));
        let (top, bottom) = (f64::from(self.crop.y), f64::from(self.crop.bottom()));
        let (x1, x2) = ordered(a.x.clamp(left, right), b.x.clamp(left, right));
        let (y1, y2) = ordered(a.y.clamp(top, bottom), b.y.clamp(top, bottom));

        if x2 - x1 < min_size || y2 - y1 < min_size {
            return Err(InnervationError::DegenerateSelection(format!(
                "zoom rectangle {:.1}x{:.1} is below {} px",
                x2 - x1,
                y2 - y1,
                min_size
            )));
        }

        let (x1, x2) = (x1.round() as u32, x2.round() as u32);
        let (y1, y2) = (y1.round() as u32, y2.round() as u32);
        self.crop = CropRect::new(x1, y1, x2 - x1, y2 - y1);
        debug!("🔍 Zoom in → {:?}", self.crop);
        Ok(self.crop)
    }

    /// Grow the crop by `factor` around its center, clamping each edge
    ///
    /// Returns `false` (no-op) when the view already shows the full image.
    pub fn zoom_out(&mut self, factor: f64) -> bool {
        if self.is_full_extent() {
            return false;
        }

        let (w, h) = (i64::from(self.crop.width), i64::from(self.crop.height));
        // Both edges move by at least one pixel per step
        let new_w = ((w as f64 * factor) as i64).max(w + 2);
        let new_h = ((h as f64 * factor) as i64).max(h + 2);
        let center_x = i64::from(self.crop.x) + w / 2;
        let center_y = i64::from(self.crop.y) + h / 2;
        let new_x = center_x - new_w / 2;
        let new_y = center_y - new_h / 2;

        let x1 = new_x.max(0);
        let y1 = new_y.max(0);
        let x2 = (new_x + new_w).min(i64::from(self.image_width));
        let y2 = (new_y + new_h).min(i64::from(self.image_height));

        let before = self.crop;
        self.crop = CropRect::new(x1 as u32, y1 as u32, (x2 - x1) as u32, (y2 - y1) as u32);
        debug!("🔍 Zoom out → {:?}", self.crop);
        self.crop != before
    }
}

#[inline]
fn ordered(a: f64, b: f64) -> (f64, f64) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}
