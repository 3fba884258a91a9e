//! Multi-touch input-session tracking.
//!
//! Several fingers can rest on the same element at once, and fingers can be
//! lifted or cancelled in any order.  The host must still see exactly one
//! press command when the first pointer lands on an element and exactly one
//! release when the last pointer leaves it.  [`InputSessionTracker`] enforces
//! that with a per-element press ref count.
//!
//! Each pointer-down records the element's action at bind time, so a layout
//! switch in the middle of a press still produces the matching release.
//!
//! Pointer-cancel is treated exactly like pointer-up: a cancelled touch must
//! never leave a ref count incremented, or the host would hold a key forever.

use std::collections::HashMap;

use tracing::{debug, trace};

use super::surface::{ElementAction, Layout};
use crate::protocol::frame::Command;

/// Identifier of a physical pointer (finger) as reported by the input stack.
pub type PointerId = u64;

/// What a pointer is currently bound to.
#[derive(Debug, Clone)]
struct PointerBinding {
    element_id: String,
    action: ElementAction,
    modifier: bool,
}

/// Tracks live pointer sessions and per-element press ref counts.
#[derive(Debug, Default)]
pub struct InputSessionTracker {
    /// One entry per touching pointer; `None` means the pointer landed on
    /// empty surface and is tracked only so its release is a clean no-op.
    sessions: HashMap<PointerId, Option<PointerBinding>>,
    /// Number of pointers currently bound to each element.
    press_counts: HashMap<String, u32>,
    /// Number of modifier elements currently pressed (not pointers).
    modifiers_pressed: u32,
}

impl InputSessionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles a pointer-down at fractional viewport coordinates.
    ///
    /// Hit-tests against `layout` (topmost element wins on overlap), binds
    /// the pointer, and returns a press command iff the element's ref count
    /// transitioned 0→1.
    ///
    /// A down event for a pointer id that is already tracked is ignored:
    /// events for one pointer arrive in order, so a duplicate down indicates
    /// an upstream glitch and must not skew the counts.
    pub fn pointer_down(
        &mut self,
        pointer: PointerId,
        fx: f32,
        fy: f32,
        layout: &Layout,
    ) -> Option<Command> {
        if self.sessions.contains_key(&pointer) {
            debug!("duplicate down for pointer {pointer}; ignored");
            return None;
        }

        let binding = layout.hit_test(fx, fy).map(|element| PointerBinding {
            element_id: element.id.clone(),
            action: element.action.clone(),
            modifier: element.modifier,
        });

        let command = binding.as_ref().and_then(|b| {
            let count = self.press_counts.entry(b.element_id.clone()).or_insert(0);
            *count += 1;
            trace!("pointer {pointer} bound to {:?} (count {count})", b.element_id);
            if *count == 1 {
                if b.modifier {
                    self.modifiers_pressed += 1;
                }
                Some(b.action.press_command())
            } else {
                None
            }
        });

        self.sessions.insert(pointer, binding);
        command
    }

    /// Handles a pointer-up, returning a release command iff the bound
    /// element's ref count transitioned 1→0.
    ///
    /// An up event for an unknown pointer is a no-op; counts never go
    /// negative.
    pub fn pointer_up(&mut self, pointer: PointerId) -> Option<Command> {
        let binding = match self.sessions.remove(&pointer) {
            Some(binding) => binding?,
            None => {
                debug!("up for untracked pointer {pointer}; ignored");
                return None;
            }
        };

        let count = self.press_counts.entry(binding.element_id.clone()).or_insert(0);
        *count = count.saturating_sub(1);
        trace!(
            "pointer {pointer} released from {:?} (count {count})",
            binding.element_id
        );
        if *count == 0 {
            self.press_counts.remove(&binding.element_id);
            if binding.modifier {
                self.modifiers_pressed = self.modifiers_pressed.saturating_sub(1);
            }
            Some(binding.action.release_command())
        } else {
            None
        }
    }

    /// Handles a pointer-cancel.  Identical to [`pointer_up`]: cancellation
    /// must release whatever the pointer was holding.
    ///
    /// [`pointer_up`]: InputSessionTracker::pointer_up
    pub fn pointer_cancel(&mut self, pointer: PointerId) -> Option<Command> {
        self.pointer_up(pointer)
    }

    /// Returns `true` while at least one modifier element is pressed.
    ///
    /// The render layer uses this to substitute alternate labels.
    pub fn modifier_active(&self) -> bool {
        self.modifiers_pressed > 0
    }

    /// Current press ref count for an element (0 when not pressed).
    pub fn press_count(&self, element_id: &str) -> u32 {
        self.press_counts.get(element_id).copied().unwrap_or(0)
    }

    /// Number of pointers currently touching the surface.
    pub fn active_pointers(&self) -> usize {
        self.sessions.len()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
