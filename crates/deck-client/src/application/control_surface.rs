//! ControlSurfaceService: turns touch events on the deck into host commands.
//!
//! The service owns the layout set, the active-variant selection, and the
//! input session tracker.  Raw pointer events arrive in viewport pixels,
//! are normalised to fractions, hit-tested against the active layout, and
//! the resulting commands are handed to the channel.
//!
//! # Send failures are not fatal
//!
//! The channel rejects commands while disconnected.  The service logs the
//! drop and keeps its session bookkeeping consistent; once the link
//! returns, the host's own all-keys-released baseline makes the next press
//! correct again.  Nothing here retries or queues.

use std::sync::Arc;

use deck_core::{resolve_layout, Command, InputSessionTracker, Layout, Size};
use tracing::{debug, warn};

use crate::infrastructure::network::{ChannelError, ChannelHandle};

/// Outbound seam between the application layer and the channel driver.
///
/// The production implementation is [`ChannelHandle`]; tests inject a
/// recording sink.
pub trait CommandSink: Send + Sync {
    /// Hands one command over for transmission.
    fn submit(&self, command: Command) -> Result<(), ChannelError>;
}

impl CommandSink for ChannelHandle {
    fn submit(&self, command: Command) -> Result<(), ChannelError> {
        self.send(command)
    }
}

/// Pointer identifier as delivered by the touch front end.
pub type PointerId = deck_core::domain::session::PointerId;

/// Orchestrates layouts, input sessions, and the outbound channel.
pub struct ControlSurfaceService {
    layouts: Vec<Layout>,
    viewport: Size,
    active: Option<usize>,
    tracker: InputSessionTracker,
    sink: Arc<dyn CommandSink>,
}

impl ControlSurfaceService {
    /// Creates a service with no viewport yet; no layout is active until
    /// the first [`set_viewport`](Self::set_viewport) call.
    pub fn new(layouts: Vec<Layout>, sink: Arc<dyn CommandSink>) -> Self {
        Self {
            layouts,
            viewport: Size {
                width: 0.0,
                height: 0.0,
            },
            active: None,
            tracker: InputSessionTracker::new(),
            sink,
        }
    }

    /// Applies a viewport change and re-resolves the active layout variant.
    ///
    /// Returns the name of the newly active variant, if any.  Sessions that
    /// are already in flight keep their bindings: a finger that went down
    /// before a rotation still releases the element it pressed.
    pub fn set_viewport(&mut self, width_px: u32, height_px: u32) -> Option<&str> {
        self.viewport = Size {
            width: width_px as f32,
            height: height_px as f32,
        };
        let resolved = resolve_layout(&self.layouts, width_px).map(|l| l.name.clone());
        self.active = resolved
            .as_deref()
            .and_then(|name| self.layouts.iter().position(|l| l.name == name));
        match &resolved {
            Some(name) => debug!(layout = %name, width_px, height_px, "layout resolved"),
            None => warn!(width_px, "no layout variant applies to viewport"),
        }
        self.active_layout().map(|l| l.name.as_str())
    }

    /// The currently resolved layout variant.
    pub fn active_layout(&self) -> Option<&Layout> {
        self.active.and_then(|i| self.layouts.get(i))
    }

    /// Handles a finger-down at viewport pixel coordinates.
    pub fn pointer_down(&mut self, pointer: PointerId, x_px: f32, y_px: f32) {
        if self.viewport.width <= 0.0 || self.viewport.height <= 0.0 {
            debug!("pointer down before viewport was set; ignored");
            return;
        }
        let Some(index) = self.active else {
            debug!("pointer down with no active layout; ignored");
            return;
        };
        let fx = x_px / self.viewport.width;
        let fy = y_px / self.viewport.height;
        let layout = &self.layouts[index];
        if let Some(command) = self.tracker.pointer_down(pointer, fx, fy, layout) {
            self.dispatch(command);
        }
    }

    /// Handles a finger-up.
    pub fn pointer_up(&mut self, pointer: PointerId) {
        if let Some(command) = self.tracker.pointer_up(pointer) {
            self.dispatch(command);
        }
    }

    /// Handles a cancelled touch (palm rejection, app backgrounded).
    /// Identical to a lift so ref counts stay balanced.
    pub fn pointer_cancel(&mut self, pointer: PointerId) {
        if let Some(command) = self.tracker.pointer_cancel(pointer) {
            self.dispatch(command);
        }
    }

    /// Whether any modifier element is currently held, for alternate-label
    /// rendering.
    pub fn modifier_active(&self) -> bool {
        self.tracker.modifier_active()
    }

    // ── Macro controls ────────────────────────────────────────────────────────

    /// Asks the host to start replaying the loaded macro.
    pub fn start_macro(&self) {
        self.dispatch(Command::MacroStart);
    }

    /// Asks the host to stop playback.
    pub fn stop_macro(&self) {
        self.dispatch(Command::MacroStop);
    }

    /// Asks the host to re-announce its playback status.
    pub fn query_macro(&self) {
        self.dispatch(Command::MacroQuery);
    }

    fn dispatch(&self, command: Command) {
        if let Err(err) = self.sink.submit(command) {
            warn!(error = %err, "command dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deck_core::{ElementAction, ElementRect};
    use std::sync::Mutex;

    /// Records submitted commands; can simulate a disconnected channel.
    struct RecordingSink {
        sent: Mutex<Vec<Command>>,
        connected: bool,
    }

    impl RecordingSink {
        fn connected() -> Arc<Self> {
            Arc::new(Self {
                sent: Mutex::new(Vec::new()),
                connected: true,
            })
        }

        fn disconnected() -> Arc<Self> {
            Arc::new(Self {
                sent: Mutex::new(Vec::new()),
                connected: false,
            })
        }

        fn commands(&self) -> Vec<Command> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl CommandSink for RecordingSink {
        fn submit(&self, command: Command) -> Result<(), ChannelError> {
            if !self.connected {
                return Err(ChannelError::NotConnected);
            }
            self.sent.lock().unwrap().push(command);
            Ok(())
        }
    }

    fn make_element(id: &str, x: f32, w: f32, code: &str) -> ElementRect {
        ElementRect {
            id: id.to_string(),
            x,
            y: 0.0,
            w,
            h: 1.0,
            action: ElementAction::Key(code.to_string()),
            modifier: false,
            alt_label: None,
        }
    }

    fn make_layouts() -> Vec<Layout> {
        vec![
            Layout {
                name: "compact".to_string(),
                elements: vec![make_element("w", 0.0, 0.5, "w")],
                min_width: None,
                max_width: Some(399),
            },
            Layout {
                name: "wide".to_string(),
                elements: vec![
                    make_element("w", 0.0, 0.5, "w"),
                    make_element("d", 0.5, 0.5, "d"),
                ],
                min_width: Some(400),
                max_width: None,
            },
        ]
    }

    #[test]
    fn test_set_viewport_resolves_variant_by_width() {
        let sink = RecordingSink::connected();
        let mut service = ControlSurfaceService::new(make_layouts(), sink);
        assert_eq!(service.set_viewport(300, 600), Some("compact"));
        assert_eq!(service.set_viewport(800, 600), Some("wide"));
    }

    #[test]
    fn test_pointer_down_and_up_emit_press_and_release() {
        let sink = RecordingSink::connected();
        let mut service = ControlSurfaceService::new(make_layouts(), Arc::clone(&sink) as _);
        service.set_viewport(800, 600);

        service.pointer_down(1, 100.0, 300.0); // left half => "w"
        service.pointer_up(1);

        assert_eq!(
            sink.commands(),
            vec![
                Command::KeyDown("w".to_string()),
                Command::KeyUp("w".to_string()),
            ]
        );
    }

    #[test]
    fn test_second_finger_on_same_element_emits_nothing() {
        let sink = RecordingSink::connected();
        let mut service = ControlSurfaceService::new(make_layouts(), Arc::clone(&sink) as _);
        service.set_viewport(800, 600);

        service.pointer_down(1, 100.0, 300.0);
        service.pointer_down(2, 150.0, 200.0); // same element
        service.pointer_up(1);
        service.pointer_up(2);

        assert_eq!(
            sink.commands(),
            vec![
                Command::KeyDown("w".to_string()),
                Command::KeyUp("w".to_string()),
            ]
        );
    }

    #[test]
    fn test_touch_on_dead_zone_emits_nothing() {
        let sink = RecordingSink::connected();
        let mut service = ControlSurfaceService::new(make_layouts(), Arc::clone(&sink) as _);
        service.set_viewport(300, 600); // compact: right half is empty

        service.pointer_down(1, 250.0, 300.0);
        service.pointer_up(1);

        assert!(sink.commands().is_empty());
    }

    #[test]
    fn test_send_failure_does_not_panic_or_desync_tracker() {
        let sink = RecordingSink::disconnected();
        let mut service = ControlSurfaceService::new(make_layouts(), Arc::clone(&sink) as _);
        service.set_viewport(800, 600);

        service.pointer_down(1, 100.0, 300.0);
        service.pointer_up(1);

        // Nothing got through, and the session fully unwound.
        assert!(sink.commands().is_empty());
        assert!(!service.modifier_active());
    }

    #[test]
    fn test_pointer_down_before_viewport_is_ignored() {
        let sink = RecordingSink::connected();
        let mut service = ControlSurfaceService::new(make_layouts(), Arc::clone(&sink) as _);

        service.pointer_down(1, 100.0, 300.0);
        service.pointer_up(1);

        assert!(sink.commands().is_empty());
    }

    #[test]
    fn test_macro_controls_pass_through() {
        let sink = RecordingSink::connected();
        let service = ControlSurfaceService::new(make_layouts(), Arc::clone(&sink) as _);

        service.start_macro();
        service.stop_macro();
        service.query_macro();

        assert_eq!(
            sink.commands(),
            vec![Command::MacroStart, Command::MacroStop, Command::MacroQuery]
        );
    }

    #[test]
    fn test_layout_switch_mid_press_still_releases() {
        let sink = RecordingSink::connected();
        let mut service = ControlSurfaceService::new(make_layouts(), Arc::clone(&sink) as _);
        service.set_viewport(800, 600);

        service.pointer_down(1, 600.0, 300.0); // "d" on the wide variant
        service.set_viewport(300, 600); // rotate to compact; "d" no longer exists
        service.pointer_up(1);

        assert_eq!(
            sink.commands(),
            vec![
                Command::KeyDown("d".to_string()),
                Command::KeyUp("d".to_string()),
            ]
        );
    }
}
