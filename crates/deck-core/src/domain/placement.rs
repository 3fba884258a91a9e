//! Collision-aware element placement for edit mode.
//!
//! When the user drags or adds an element on the editing canvas, the desired
//! position is snapped to a grid, clamped to the canvas, and tested against
//! every other element with a minimum clearance gap.  If the spot is taken,
//! an expanding-ring search probes the 8 compass directions at growing
//! grid-step radii and returns the first free position.
//!
//! Placement never fails and never hangs: past the bounded search radius the
//! snapped, clamped original candidate is returned even if it overlaps.
//! A visible overlap is an acceptable degraded outcome; a stuck drag is not.
//!
//! All geometry here is in pixel space.  The caller converts the winning
//! position back to viewport fractions before storing it.

use serde::{Deserialize, Serialize};

/// A point in canvas pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

/// A size in canvas pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

/// An axis-aligned rectangle in canvas pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    /// Returns the rightmost X coordinate (exclusive).
    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    /// Returns the bottommost Y coordinate (exclusive).
    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    /// Returns `true` if this rect overlaps with `other`.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    /// Returns this rect grown by `amount` on every side.
    pub fn inflate(&self, amount: f32) -> Rect {
        Rect {
            x: self.x - amount,
            y: self.y - amount,
            w: self.w + 2.0 * amount,
            h: self.h + 2.0 * amount,
        }
    }
}

/// Tunables for the placement search.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementParams {
    /// Grid quantum in pixels; candidate origins snap to multiples of this.
    pub grid_step: f32,
    /// Minimum clearance between elements.  Both the candidate and each
    /// existing rect are inflated by half of this before the overlap test.
    pub min_gap: f32,
    /// Smallest allowed element footprint when resizing.
    pub min_size: Size,
    /// Maximum search radius in grid-step multiples.
    pub max_ring: u32,
}

impl Default for PlacementParams {
    fn default() -> Self {
        Self {
            grid_step: 8.0,
            min_gap: 4.0,
            min_size: Size { width: 32.0, height: 32.0 },
            max_ring: 24,
        }
    }
}

/// The 8 compass-direction unit offsets probed at each ring radius.
const COMPASS: [(f32, f32); 8] = [
    (1.0, 0.0),
    (-1.0, 0.0),
    (0.0, 1.0),
    (0.0, -1.0),
    (1.0, 1.0),
    (1.0, -1.0),
    (-1.0, 1.0),
    (-1.0, -1.0),
];

/// Computes a collision-free top-left position for an element.
///
/// `desired` is where the user wants the element; `footprint` is its fixed
/// size; `others` are the pixel rects of every *other* element on the canvas.
///
/// Always returns some position within the canvas.  The result is
/// overlap-free whenever any probed grid position is free; otherwise it is
/// the snapped, clamped `desired` point.
pub fn place(
    desired: Point,
    footprint: Size,
    others: &[Rect],
    canvas: Size,
    params: &PlacementParams,
) -> Point {
    let start = clamp_origin(snap_point(desired, params.grid_step), footprint, canvas);

    if is_free(start, footprint, others, params.min_gap) {
        return start;
    }

    for ring in 1..=params.max_ring {
        let radius = ring as f32 * params.grid_step;
        for (ux, uy) in COMPASS {
            let candidate = clamp_origin(
                Point {
                    x: start.x + ux * radius,
                    y: start.y + uy * radius,
                },
                footprint,
                canvas,
            );
            if is_free(candidate, footprint, others, params.min_gap) {
                return candidate;
            }
        }
    }

    // Degraded outcome: every probed position is occupied.
    start
}

/// Clamps a desired element size during a resize gesture.
///
/// The footprint is bounded below by `params.min_size` and above by the
/// canvas space remaining from the element's fixed origin.
pub fn clamp_resize(
    origin: Point,
    desired: Size,
    canvas: Size,
    params: &PlacementParams,
) -> Size {
    let max_width = (canvas.width - origin.x).max(params.min_size.width);
    let max_height = (canvas.height - origin.y).max(params.min_size.height);
    Size {
        width: desired.width.clamp(params.min_size.width, max_width),
        height: desired.height.clamp(params.min_size.height, max_height),
    }
}

// ── Private helpers ───────────────────────────────────────────────────────────

/// Rounds a coordinate to the nearest grid multiple.
fn snap(value: f32, step: f32) -> f32 {
    (value / step).round() * step
}

fn snap_point(p: Point, step: f32) -> Point {
    Point {
        x: snap(p.x, step),
        y: snap(p.y, step),
    }
}

/// Clamps an origin so the whole footprint stays inside the canvas.
fn clamp_origin(p: Point, footprint: Size, canvas: Size) -> Point {
    Point {
        x: p.x.clamp(0.0, (canvas.width - footprint.width).max(0.0)),
        y: p.y.clamp(0.0, (canvas.height - footprint.height).max(0.0)),
    }
}

/// Tests a candidate origin against all other rects with the clearance gap.
fn is_free(origin: Point, footprint: Size, others: &[Rect], min_gap: f32) -> bool {
    let half_gap = min_gap / 2.0;
    let candidate = Rect {
        x: origin.x,
        y: origin.y,
        w: footprint.width,
        h: footprint.height,
    }
    .inflate(half_gap);

    others
        .iter()
        .all(|other| !other.inflate(half_gap).overlaps(&candidate))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas() -> Size {
        Size { width: 800.0, height: 480.0 }
    }

    fn footprint() -> Size {
        Size { width: 64.0, height: 64.0 }
    }

    fn rect(x: f32, y: f32, w: f32, h: f32) -> Rect {
        Rect { x, y, w, h }
    }

    // ── Rect geometry ─────────────────────────────────────────────────────────

    #[test]
    fn test_rect_overlaps_when_sharing_area() {
        assert!(rect(0.0, 0.0, 100.0, 100.0).overlaps(&rect(50.0, 50.0, 100.0, 100.0)));
    }

    #[test]
    fn test_rect_does_not_overlap_when_adjacent() {
        assert!(!rect(0.0, 0.0, 100.0, 100.0).overlaps(&rect(100.0, 0.0, 100.0, 100.0)));
    }

    #[test]
    fn test_rect_inflate_grows_all_sides() {
        let r = rect(10.0, 10.0, 20.0, 20.0).inflate(2.0);
        assert_eq!(r, rect(8.0, 8.0, 24.0, 24.0));
    }

    // ── place ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_place_on_empty_canvas_returns_snapped_position() {
        let params = PlacementParams::default();
        let got = place(Point { x: 101.0, y: 99.0 }, footprint(), &[], canvas(), &params);
        // 101 and 99 both snap to 104 / 96 with an 8px grid.
        assert_eq!(got, Point { x: 104.0, y: 96.0 });
    }

    #[test]
    fn test_place_clamps_to_canvas_bounds() {
        let params = PlacementParams::default();
        let got = place(
            Point { x: 10_000.0, y: -50.0 },
            footprint(),
            &[],
            canvas(),
            &params,
        );
        assert_eq!(got.x, canvas().width - footprint().width);
        assert_eq!(got.y, 0.0);
    }

    #[test]
    fn test_place_moves_off_an_occupied_spot() {
        let params = PlacementParams::default();
        let blocker = rect(96.0, 96.0, 64.0, 64.0);
        let got = place(Point { x: 100.0, y: 100.0 }, footprint(), &[blocker], canvas(), &params);

        let placed = rect(got.x, got.y, 64.0, 64.0);
        assert!(
            !placed.inflate(params.min_gap / 2.0).overlaps(&blocker.inflate(params.min_gap / 2.0)),
            "returned position must clear the blocker by the minimum gap"
        );
    }

    #[test]
    fn test_place_respects_minimum_gap() {
        let params = PlacementParams::default();
        let blocker = rect(160.0, 96.0, 64.0, 64.0);
        // Desired position is exactly flush-left of the blocker: touching but
        // not overlapping.  With a 4px gap it must still be rejected.
        let got = place(Point { x: 96.0, y: 96.0 }, footprint(), &[blocker], canvas(), &params);
        let placed = rect(got.x, got.y, 64.0, 64.0);
        assert!(
            placed.right() + params.min_gap <= blocker.x
                || placed.x >= blocker.right() + params.min_gap
                || placed.bottom() + params.min_gap <= blocker.y
                || placed.y >= blocker.bottom() + params.min_gap,
            "gap must separate the placed element from the blocker"
        );
    }

    #[test]
    fn test_place_returns_original_candidate_when_canvas_is_full() {
        let params = PlacementParams::default();
        // One giant blocker covering the whole canvas: no free spot exists.
        let blocker = rect(0.0, 0.0, 800.0, 480.0);
        let got = place(Point { x: 101.0, y: 99.0 }, footprint(), &[blocker], canvas(), &params);
        // Degraded outcome: the snapped, clamped original candidate comes back.
        assert_eq!(got, Point { x: 104.0, y: 96.0 });
    }

    #[test]
    fn test_place_always_terminates_within_bounded_search() {
        let params = PlacementParams { max_ring: 4, ..Default::default() };
        // Dense field of blockers.
        let mut others = Vec::new();
        for row in 0..6 {
            for col in 0..10 {
                others.push(rect(col as f32 * 80.0, row as f32 * 80.0, 72.0, 72.0));
            }
        }
        // Must return *something* without hanging, overlap or not.
        let got = place(Point { x: 200.0, y: 200.0 }, footprint(), &others, canvas(), &params);
        assert!(got.x >= 0.0 && got.y >= 0.0);
    }

    #[test]
    fn test_place_prefers_nearest_ring() {
        let params = PlacementParams::default();
        let blocker = rect(96.0, 96.0, 64.0, 64.0);
        let got = place(Point { x: 96.0, y: 96.0 }, footprint(), &[blocker], canvas(), &params);
        // The first free compass probe is one grid step away in some
        // direction; the result must be within a couple of rings, not at the
        // canvas edge.
        let dist = ((got.x - 96.0).abs()).max((got.y - 96.0).abs());
        assert!(dist <= 16.0 * params.grid_step, "search should stop at the first free ring");
    }

    // ── clamp_resize ──────────────────────────────────────────────────────────

    #[test]
    fn test_clamp_resize_enforces_minimum_size() {
        let params = PlacementParams::default();
        let got = clamp_resize(
            Point { x: 0.0, y: 0.0 },
            Size { width: 1.0, height: 1.0 },
            canvas(),
            &params,
        );
        assert_eq!(got, params.min_size);
    }

    #[test]
    fn test_clamp_resize_limits_to_remaining_canvas_space() {
        let params = PlacementParams::default();
        let got = clamp_resize(
            Point { x: 700.0, y: 400.0 },
            Size { width: 500.0, height: 500.0 },
            canvas(),
            &params,
        );
        assert_eq!(got, Size { width: 100.0, height: 80.0 });
    }

    #[test]
    fn test_clamp_resize_passes_through_a_valid_size() {
        let params = PlacementParams::default();
        let got = clamp_resize(
            Point { x: 100.0, y: 100.0 },
            Size { width: 120.0, height: 90.0 },
            canvas(),
            &params,
        );
        assert_eq!(got, Size { width: 120.0, height: 90.0 });
    }
}
