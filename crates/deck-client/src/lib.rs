//! deck-client library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does deck-client do?
//!
//! Touchdeck turns a phone or tablet into a control surface for a
//! macro-playback host: a small device that replays recorded keyboard and
//! mouse input into a target machine.  The deck shows a grid of touch
//! elements (WASD cluster, mouse buttons, macro controls); each finger on
//! an element becomes a key or button held on the target for exactly as
//! long as the finger stays down.
//!
//! The client application:
//!
//! 1. Maintains one WebSocket control channel to the host, with
//!    heartbeat-based liveness and automatic jittered reconnects.
//! 2. Translates multi-touch events into press/release commands, with
//!    per-element reference counting so overlapping fingers never repeat
//!    or lose a press.
//! 3. Resolves which layout variant fits the current viewport and lets
//!    the user rearrange elements on a collision-checked editing canvas.

/// Application layer: use cases for the companion app.
pub mod application;

/// Infrastructure layer: network transport, storage, and UI bridge.
pub mod infrastructure;
