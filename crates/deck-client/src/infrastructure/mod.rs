//! Infrastructure layer for the companion app.
//!
//! Contains the outward-facing adapters: the WebSocket channel driver,
//! file-system configuration storage, and the observable-state bridge for
//! a render layer.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `deck_core`, but MUST NOT be imported by the domain layer.

pub mod network;
pub mod storage;
pub mod ui_bridge;
