//! ArrangeService: edit-mode element moves and resizes.
//!
//! Layouts store geometry as viewport fractions, but drags happen in canvas
//! pixels.  This use case converts a gesture to pixel space, runs it through
//! the placement engine in `deck-core`, and writes the winning geometry back
//! as fractions.  It holds no state of its own beyond the placement
//! parameters; the caller owns the layout being edited.

use deck_core::{clamp_resize, place, Layout, PlacementParams, Point, Rect, Size};
use thiserror::Error;
use tracing::debug;

/// Error type for edit-mode operations.
#[derive(Debug, Error, PartialEq)]
pub enum ArrangeError {
    /// The element id does not exist in the layout being edited.
    #[error("no element with id {0:?} in layout")]
    UnknownElement(String),
    /// The canvas has no area; fractions cannot be derived.
    #[error("canvas has zero width or height")]
    EmptyCanvas,
}

/// Applies moves and resizes to a layout under placement rules.
pub struct ArrangeService {
    params: PlacementParams,
}

impl ArrangeService {
    pub fn new(params: PlacementParams) -> Self {
        Self { params }
    }

    /// Moves an element towards `desired_px`, settling on the nearest
    /// collision-free grid position, and writes the result back as
    /// fractions of `canvas`.
    ///
    /// Returns the final pixel position.
    pub fn move_element(
        &self,
        layout: &mut Layout,
        element_id: &str,
        desired_px: Point,
        canvas: Size,
    ) -> Result<Point, ArrangeError> {
        check_canvas(canvas)?;
        let current = self.pixel_rect(layout, element_id, canvas)?;
        let footprint = Size {
            width: current.w,
            height: current.h,
        };
        let others = other_rects(layout, element_id, canvas);

        let settled = place(desired_px, footprint, &others, canvas, &self.params);
        debug!(element = element_id, x = settled.x, y = settled.y, "element moved");

        let element = layout
            .element_mut(element_id)
            .ok_or_else(|| ArrangeError::UnknownElement(element_id.to_string()))?;
        element.x = settled.x / canvas.width;
        element.y = settled.y / canvas.height;
        Ok(settled)
    }

    /// Resizes an element towards `desired_px`, clamped to the minimum
    /// footprint and the canvas space remaining from its origin, and writes
    /// the result back as fractions.
    ///
    /// Returns the final pixel size.
    pub fn resize_element(
        &self,
        layout: &mut Layout,
        element_id: &str,
        desired_px: Size,
        canvas: Size,
    ) -> Result<Size, ArrangeError> {
        check_canvas(canvas)?;
        let current = self.pixel_rect(layout, element_id, canvas)?;
        let origin = Point {
            x: current.x,
            y: current.y,
        };

        let clamped = clamp_resize(origin, desired_px, canvas, &self.params);
        debug!(
            element = element_id,
            width = clamped.width,
            height = clamped.height,
            "element resized"
        );

        let element = layout
            .element_mut(element_id)
            .ok_or_else(|| ArrangeError::UnknownElement(element_id.to_string()))?;
        element.w = clamped.width / canvas.width;
        element.h = clamped.height / canvas.height;
        Ok(clamped)
    }

    fn pixel_rect(
        &self,
        layout: &Layout,
        element_id: &str,
        canvas: Size,
    ) -> Result<Rect, ArrangeError> {
        layout
            .element(element_id)
            .map(|e| e.resolve_px(canvas))
            .ok_or_else(|| ArrangeError::UnknownElement(element_id.to_string()))
    }
}

impl Default for ArrangeService {
    fn default() -> Self {
        Self::new(PlacementParams::default())
    }
}

fn check_canvas(canvas: Size) -> Result<(), ArrangeError> {
    if canvas.width <= 0.0 || canvas.height <= 0.0 {
        return Err(ArrangeError::EmptyCanvas);
    }
    Ok(())
}

/// Pixel rects of every element except the one being edited.
fn other_rects(layout: &Layout, element_id: &str, canvas: Size) -> Vec<Rect> {
    layout
        .elements
        .iter()
        .filter(|e| e.id != element_id)
        .map(|e| e.resolve_px(canvas))
        .collect()
}
