//! ROI capture and rasterization
//!
//! Points are captured in display coordinates while the user draws. A
//! finalized shape is rasterized through the display mapping it was drawn
//! under into a boolean mask that covers only the shape's bounding box.
use log::debug;
use serde::{Deserialize, Serialize};

use super::canvas::{CropRect, DisplayMapping, Point};
use crate::error::{InnervationError, Result};

/// Minimum number of vertices of a usable shape
pub const MIN_ROI_POINTS: usize = 3;

/// How points are captured, fixed for a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RoiMode {
    /// One vertex per primary click, closed by a secondary or modifier click
    #[default]
    Polygon,
    /// Vertices follow the pointer while dragging, closed on release
    Freehand,
}

/// A finalized region, display coordinates, at least three vertices
#[derive(Debug, Clone, PartialEq)]
pub struct RoiShape {
    points: Vec<Point>,
}

impl RoiShape {
    /// Build a shape, rejecting fewer than three vertices
    pub fn new(points: Vec<Point>) -> Result<Self> {
        if points.len() < MIN_ROI_POINTS {
            return Err(InnervationError::DegenerateSelection(format!(
                "ROI needs {} points, got {}",
                MIN_ROI_POINTS,
                points.len()
            )));
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Vertices in calibrated-image coordinates
    pub fn to_image(&self, mapping: &DisplayMapping) -> Vec<Point> {
        self.points.iter().map(|&p| mapping.display_to_image(p)).collect()
    }

    /// Rasterize into an image-space mask
    pub fn rasterize(&self, mapping: &DisplayMapping, image_width: u32, image_height: u32) -> RoiMask {
        RoiMask::from_polygon(&self.to_image(mapping), image_width, image_height)
    }
}

/// Boolean mask over the ROI bounding box, row-major
///
/// `mask[y * bbox.width + x]` corresponds to image pixel
/// `(bbox.x + x, bbox.y + y)`.
#[derive(Debug, Clone, PartialEq)]
pub struct RoiMask {
    pub bbox: CropRect,
    pub mask: Vec<bool>,
}

impl RoiMask {
    /// Even-odd fill of a polygon in image coordinates
    ///
    /// The bounding box spans `floor(min)..ceil(max)` of the vertices with
    /// both ends clamped to the image. A pixel is inside when its center is.
    pub fn from_polygon(vertices: &[Point], image_width: u32, image_height: u32) -> Self {
        let bbox = bounding_box(vertices, image_width, image_height);
        let (w, h) = (bbox.width as usize, bbox.height as usize);
        let mut mask = vec![false; w * h];
        if w == 0 || h == 0 || vertices.len() < MIN_ROI_POINTS {
            return Self { bbox, mask };
        }

        let x0 = f64::from(bbox.x);
        let mut crossings = Vec::with_capacity(vertices.len());
        for row in 0..h {
            let yc = f64::from(bbox.y) + row as f64 + 0.5;
            crossings.clear();
            for (a, b) in edges(vertices) {
                if (a.y > yc) != (b.y > yc) {
                    crossings.push(a.x + (yc - a.y) * (b.x - a.x) / (b.y - a.y));
                }
            }
            crossings.sort_by(f64::total_cmp);

            // Center xc is inside when xs[2k] < xc <= xs[2k+1]
            for pair in crossings.chunks_exact(2) {
                let first = ((pair[0] - x0 - 0.5).floor() + 1.0).max(0.0);
                let last = (pair[1] - x0 - 0.5).floor().min(w as f64 - 1.0);
                if last < first {
                    continue;
                }
                let row_start = row * w;
                for col in first as usize..=last as usize {
                    mask[row_start + col] = true;
                }
            }
        }

        Self { bbox, mask }
    }

    /// Number of selected pixels
    pub fn count(&self) -> usize {
        self.mask.iter().filter(|&&m| m).count()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Whether bounding-box-local pixel `(x, y)` is selected
    pub fn get(&self, x: u32, y: u32) -> bool {
        self.mask[y as usize * self.bbox.width as usize + x as usize]
    }
}

/// Consecutive edges plus the closing edge back to the first vertex
fn edges(vertices: &[Point]) -> impl Iterator<Item = (Point, Point)> + '_ {
    let n = vertices.len();
    (0..n).map(move |i| (vertices[i], vertices[(i + 1) % n]))
}

fn bounding_box(vertices: &[Point], image_width: u32, image_height: u32) -> CropRect {
    if vertices.is_empty() {
        return CropRect::new(0, 0, 0, 0);
    }
    let min_x = vertices.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
    let min_y = vertices.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
    let max_x = vertices.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
    let max_y = vertices.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);

    let (iw, ih) = (f64::from(image_width), f64::from(image_height));
    let x1 = min_x.floor().clamp(0.0, iw) as u32;
    let y1 = min_y.floor().clamp(0.0, ih) as u32;
    let x2 = max_x.ceil().clamp(0.0, iw) as u32;
    let y2 = max_y.ceil().clamp(0.0, ih) as u32;

    CropRect::new(x1, y1, x2.saturating_sub(x1), y2.saturating_sub(y1))
}

/// Pointer input routed to the editor
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RoiInput {
    /// Primary click (adds a vertex / starts a freehand stroke)
    Press(Point),
    /// Pointer moved with the primary button held
    Drag(Point),
    /// Primary button released
    Release(Point),
    /// Secondary click or modifier+click
    Close,
}

/// What an input did to the editor
#[derive(Debug, Clone, PartialEq)]
pub enum RoiEvent {
    Ignored,
    PointAdded,
    Finalized,
    /// Closing gesture with too few points, nothing recorded
    Rejected,
}

/// Point capture state for one drawing session
#[derive(Debug, Clone, Default)]
pub struct RoiEditor {
    mode: RoiMode,
    points: Vec<Point>,
    shape: Option<RoiShape>,
    stroke_active: bool,
}

impl RoiEditor {
    pub fn new(mode: RoiMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn mode(&self) -> RoiMode {
        self.mode
    }

    /// Points of the shape in progress (or of the finalized shape)
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn shape(&self) -> Option<&RoiShape> {
        self.shape.as_ref()
    }

    /// Drop in-progress points and any finalized shape
    pub fn clear(&mut self) {
        self.points.clear();
        self.shape = None;
        self.stroke_active = false;
    }

    /// Feed one pointer input
    pub fn handle(&mut self, input: RoiInput) -> RoiEvent {
        match (self.mode, input) {
            (RoiMode::Polygon, RoiInput::Press(p)) => {
                if self.shape.is_some() {
                    self.clear();
                }
                self.points.push(p);
                RoiEvent::PointAdded
            }
            (RoiMode::Polygon, RoiInput::Close) => self.finalize(),
            (RoiMode::Freehand, RoiInput::Press(p)) => {
                self.clear();
                self.stroke_active = true;
                self.points.push(p);
                RoiEvent::PointAdded
            }
            (RoiMode::Freehand, RoiInput::Drag(p)) if self.stroke_active => {
                self.points.push(p);
                RoiEvent::PointAdded
            }
            (RoiMode::Freehand, RoiInput::Release(_)) if self.stroke_active => {
                self.stroke_active = false;
                self.finalize()
            }
            _ => RoiEvent::Ignored,
        }
    }

    fn finalize(&mut self) -> RoiEvent {
        match RoiShape::new(self.points.clone()) {
            Ok(shape) => {
                debug!("✏️  ROI finalized with {} points", shape.points().len());
                self.shape = Some(shape);
                RoiEvent::Finalized
            }
            Err(err) => {
                debug!("✏️  ROI rejected: {}", err);
                self.clear();
                RoiEvent::Rejected
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::canvas::{ViewTransform, Viewport};

    /// Even-odd test of a single point, used as a reference for the scanline fill
    fn polygon_contains(vertices: &[Point], p: Point) -> bool {
        let mut inside = false;
        for (a, b) in edges(vertices) {
            if (a.y > p.y) != (b.y > p.y) {
                let x = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
                if x < p.x {
                    inside = !inside;
                }
            }
        }
        inside
    }

    fn square(x: f64, y: f64, side: f64) -> Vec<Point> {
        vec![
            Point::new(x, y),
            Point::new(x + side, y),
            Point::new(x + side, y + side),
            Point::new(x, y + side),
        ]
    }

    #[test]
    fn test_square_mask_counts_pixel_centers() {
        let mask = RoiMask::from_polygon(&square(2.0, 3.0, 10.0), 100, 100);
        assert_eq!(mask.bbox, CropRect::new(2, 3, 10, 10));
        assert_eq!(mask.count(), 100);
    }

    #[test]
    fn test_fractional_vertices_use_floor_and_ceil() {
        let mask = RoiMask::from_polygon(&square(2.4, 3.6, 4.0), 100, 100);
        assert_eq!(mask.bbox, CropRect::new(2, 3, 5, 5));
        // Centers 2.5..5.5 fall inside [2.4, 6.4] on x, 4.5..7.5 inside [3.6, 7.6] on y
        assert_eq!(mask.count(), 16);
    }

    #[test]
    fn test_bbox_clamped_on_both_ends() {
        let mask = RoiMask::from_polygon(&square(-20.0, 90.0, 40.0), 50, 100);
        assert_eq!(mask.bbox, CropRect::new(0, 90, 20, 10));
        assert_eq!(mask.count(), 200);
    }

    #[test]
    fn test_scanline_matches_point_test() {
        let poly = vec![
            Point::new(1.3, 1.1),
            Point::new(17.8, 4.2),
            Point::new(9.1, 9.7),
            Point::new(15.2, 18.9),
            Point::new(2.2, 14.4),
            Point::new(7.7, 8.0),
        ];
        let mask = RoiMask::from_polygon(&poly, 32, 32);
        for y in 0..mask.bbox.height {
            for x in 0..mask.bbox.width {
                let center = Point::new(
                    f64::from(mask.bbox.x + x) + 0.5,
                    f64::from(mask.bbox.y + y) + 0.5,
                );
                assert_eq!(mask.get(x, y), polygon_contains(&poly, center), "pixel {x},{y}");
            }
        }
    }

    #[test]
    fn test_self_intersecting_uses_even_odd() {
        // Bow-tie: the two lobes are filled, nothing else
        let poly = vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(10.0, 0.0),
            Point::new(0.0, 10.0),
        ];
        let mask = RoiMask::from_polygon(&poly, 10, 10);
        assert!(mask.get(0, 5));
        assert!(mask.get(9, 5));
        assert!(!mask.get(5, 1));
        assert!(!mask.get(5, 8));
    }

    #[test]
    fn test_polygon_needs_close_gesture() {
        let mut editor = RoiEditor::new(RoiMode::Polygon);
        for p in square(10.0, 10.0, 50.0) {
            assert_eq!(editor.handle(RoiInput::Press(p)), RoiEvent::PointAdded);
        }
        assert!(editor.shape().is_none());
        assert_eq!(editor.handle(RoiInput::Close), RoiEvent::Finalized);
        assert_eq!(editor.shape().unwrap().points().len(), 4);
    }

    #[test]
    fn test_two_points_produce_no_shape() {
        let mut editor = RoiEditor::new(RoiMode::Polygon);
        editor.handle(RoiInput::Press(Point::new(1.0, 1.0)));
        editor.handle(RoiInput::Press(Point::new(5.0, 1.0)));
        assert_eq!(editor.handle(RoiInput::Close), RoiEvent::Rejected);
        assert!(editor.shape().is_none());
        assert!(editor.points().is_empty());
    }

    #[test]
    fn test_freehand_stroke_finalizes_on_release() {
        let mut editor = RoiEditor::new(RoiMode::Freehand);
        assert_eq!(editor.handle(RoiInput::Drag(Point::new(0.0, 0.0))), RoiEvent::Ignored);
        editor.handle(RoiInput::Press(Point::new(0.0, 0.0)));
        for p in [Point::new(10.0, 0.0), Point::new(10.0, 10.0), Point::new(0.0, 10.0)] {
            editor.handle(RoiInput::Drag(p));
        }
        assert_eq!(editor.handle(RoiInput::Release(Point::new(0.0, 10.0))), RoiEvent::Finalized);
        assert_eq!(editor.shape().unwrap().points().len(), 4);
    }

    #[test]
    fn test_freehand_click_without_drag_is_rejected() {
        let mut editor = RoiEditor::new(RoiMode::Freehand);
        editor.handle(RoiInput::Press(Point::new(3.0, 3.0)));
        assert_eq!(editor.handle(RoiInput::Release(Point::new(3.0, 3.0))), RoiEvent::Rejected);
        assert!(editor.shape().is_none());
    }

    #[test]
    fn test_rasterize_through_zoomed_view() {
        let mut view = ViewTransform::new(200, 200, Viewport::new(400, 400));
        view.zoom_in(Point::new(100.0, 100.0), Point::new(300.0, 300.0), 10.0).unwrap();
        // Crop (50,50) 100x100 shown at scale 4; display (40,40)-(80,80) is image (60,60)-(70,70)
        let mapping = view.mapping();
        let shape = RoiShape::new(square(40.0, 40.0, 40.0)).unwrap();
        let mask = shape.rasterize(&mapping, 200, 200);
        assert_eq!(mask.bbox, CropRect::new(60, 60, 10, 10));
        assert_eq!(mask.count(), 100);
    }
}
