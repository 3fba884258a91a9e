//! Control-surface domain entities: elements, layouts, and layout resolution.
//!
//! Element geometry is stored as fractions (0.0–1.0) of viewport width and
//! height, which makes a layout resolution-independent: pixel rects are
//! derived per render pass via [`ElementRect::resolve_px`] and never
//! persisted.
//!
//! A control surface ships several named [`Layout`] variants, each with an
//! optional applicability range over viewport width.  [`resolve_layout`]
//! picks the active variant deterministically for a given width.

use serde::{Deserialize, Serialize};

use super::placement::{Rect, Size};
use crate::protocol::frame::Command;

/// Name of the designated fallback layout variant.
pub const DEFAULT_VARIANT: &str = "default";

/// The semantic action bound to a control-surface element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElementAction {
    /// A keyboard key, identified by the host's lowercase key name.
    Key(String),
    /// A mouse button: `left`, `right`, or `middle`.
    MouseButton(String),
}

impl ElementAction {
    /// Returns the command emitted when the element's press begins.
    pub fn press_command(&self) -> Command {
        match self {
            ElementAction::Key(code) => Command::KeyDown(code.clone()),
            ElementAction::MouseButton(button) => Command::MouseDown(button.clone()),
        }
    }

    /// Returns the command emitted when the element's press ends.
    pub fn release_command(&self) -> Command {
        match self {
            ElementAction::Key(code) => Command::KeyUp(code.clone()),
            ElementAction::MouseButton(button) => Command::MouseUp(button.clone()),
        }
    }
}

/// A control-surface element: a button-like rectangle bound to one action.
///
/// All four geometry fields are fractions of the viewport in `0.0..=1.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementRect {
    /// Stable identifier, unique within a layout.
    pub id: String,
    /// Left edge as a fraction of viewport width.
    pub x: f32,
    /// Top edge as a fraction of viewport height.
    pub y: f32,
    /// Width as a fraction of viewport width.
    pub w: f32,
    /// Height as a fraction of viewport height.
    pub h: f32,
    /// The action emitted on press/release.
    pub action: ElementAction,
    /// Whether this element is a shift-like modifier.  While any modifier
    /// element is held, elements with an `alt_label` render that label.
    #[serde(default)]
    pub modifier: bool,
    /// Alternate label shown while a modifier is held.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_label: Option<String>,
}

impl ElementRect {
    /// Returns `true` if the fractional point lies inside this element.
    ///
    /// Left/top edges are inclusive, right/bottom exclusive, so adjacent
    /// elements never both claim a shared edge.
    pub fn contains(&self, fx: f32, fy: f32) -> bool {
        fx >= self.x && fx < self.x + self.w && fy >= self.y && fy < self.y + self.h
    }

    /// Derives the pixel rect for the given viewport size.
    pub fn resolve_px(&self, viewport: Size) -> Rect {
        Rect {
            x: self.x * viewport.width,
            y: self.y * viewport.height,
            w: self.w * viewport.width,
            h: self.h * viewport.height,
        }
    }
}

/// A named collection of elements plus its viewport-width applicability range.
///
/// Either bound may be `None`, meaning unbounded on that side.  Both bounds
/// are inclusive: a layout with `min_width = Some(300)` applies at exactly
/// width 300.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    /// Variant name, unique within a layout set.
    pub name: String,
    /// Elements in stacking order: later entries are topmost for hit testing.
    pub elements: Vec<ElementRect>,
    /// Minimum applicable viewport width (inclusive).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_width: Option<u32>,
    /// Maximum applicable viewport width (inclusive).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_width: Option<u32>,
}

impl Layout {
    /// Returns `true` if this layout's width range contains `width`.
    pub fn applies_to(&self, width: u32) -> bool {
        self.min_width.map_or(true, |min| width >= min)
            && self.max_width.map_or(true, |max| width <= max)
    }

    /// Returns the topmost element containing the fractional point, if any.
    ///
    /// Later elements in the list win on overlap, matching the rule that the
    /// most recently added element sits on top.
    pub fn hit_test(&self, fx: f32, fy: f32) -> Option<&ElementRect> {
        self.elements.iter().rev().find(|e| e.contains(fx, fy))
    }

    /// Looks up an element by its stable id.
    pub fn element(&self, id: &str) -> Option<&ElementRect> {
        self.elements.iter().find(|e| e.id == id)
    }

    /// Mutable lookup, used by the edit-mode arrangement service.
    pub fn element_mut(&mut self, id: &str) -> Option<&mut ElementRect> {
        self.elements.iter_mut().find(|e| e.id == id)
    }

    /// Specificity key for resolution ordering: fewer unbounded sides is more
    /// specific; among equally bounded variants a narrower range wins; the
    /// name is the final stable tiebreak.
    fn specificity(&self) -> (u8, u64, &str) {
        let unbounded_sides =
            self.min_width.is_none() as u8 + self.max_width.is_none() as u8;
        let span = match (self.min_width, self.max_width) {
            (Some(min), Some(max)) => (max.saturating_sub(min)) as u64,
            _ => u64::MAX,
        };
        (unbounded_sides, span, &self.name)
    }
}

/// Selects the active layout for a viewport width.
///
/// Pure and deterministic: candidates are evaluated most width-constrained
/// first and the first whose inclusive range contains `width` is returned.
/// When nothing matches, the variant named [`DEFAULT_VARIANT`] is used, and
/// absent that, the first variant by name.  Returns `None` only for an empty
/// set.
pub fn resolve_layout(layouts: &[Layout], width: u32) -> Option<&Layout> {
    let mut order: Vec<&Layout> = layouts.iter().collect();
    order.sort_by(|a, b| a.specificity().cmp(&b.specificity()));

    if let Some(found) = order.iter().find(|l| l.applies_to(width)) {
        return Some(found);
    }
    layouts
        .iter()
        .find(|l| l.name == DEFAULT_VARIANT)
        .or_else(|| layouts.iter().min_by(|a, b| a.name.cmp(&b.name)))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
