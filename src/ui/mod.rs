/// Presentation-facing core
///
/// Nothing here touches a window toolkit. The canvas maps coordinates, the
/// ROI editor captures shapes, and the frame module emits draw instructions
/// for whatever layer paints them.

pub mod canvas;
pub mod roi;
pub mod frame;

pub use canvas::{CropRect, DisplayMapping, Point, ViewTransform, Viewport};
pub use frame::{DrawOp, Frame};
pub use roi::{RoiEditor, RoiMask, RoiMode, RoiShape};
