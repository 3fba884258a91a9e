//! # deck-core
//!
//! Shared library for Touchdeck containing the wire frame codec, the
//! control-surface domain model, and the input-session tracker.
//!
//! This crate is used by the client application and by its tests.
//! It has zero dependencies on OS APIs, UI frameworks, or network sockets.
//!
//! # Architecture overview
//!
//! Touchdeck is a companion client for a macro-playback host: a touch device
//! shows a grid of configurable buttons ("elements"), and every touch is
//! translated into a semantic key-press command that the host replays as real
//! HID input.  This crate is the pure foundation underneath that:
//!
//! - **`protocol`** – How text travels over the channel.  Commands are
//!   encoded into compact pipe-delimited frames (`key|down|w`,
//!   `ping|<nonce>`) and inbound frames are parsed back into typed
//!   broadcasts on this side.
//!
//! - **`domain`** – Pure business logic with no I/O.  The control surface
//!   (elements, layouts, width-based layout resolution), the collision-aware
//!   placement engine used while editing, and the multi-touch session
//!   tracker that turns overlapping pointers into exactly one press/release
//!   pair per element.

pub mod domain;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `deck_core::Command` instead of `deck_core::protocol::frame::Command`.
pub use domain::placement::{place, clamp_resize, PlacementParams, Point, Rect, Size};
pub use domain::session::InputSessionTracker;
pub use domain::surface::{resolve_layout, ElementAction, ElementRect, Layout};
pub use protocol::frame::{Broadcast, Command, FrameError};
