//! Application layer use cases for the companion app.
//!
//! Use cases orchestrate the pure domain types from `deck-core` to fulfil a
//! user goal, and depend on abstractions rather than concrete
//! infrastructure so they stay unit-testable:
//!
//! - **`control_surface`** – Translates touch input on the deck into
//!   commands for the playback host.  This is the hot path; it runs on
//!   every finger-down and finger-up.
//!
//! - **`arrange`** – Edit-mode moves and resizes: converts between
//!   fractional layout space and canvas pixels and delegates collision
//!   handling to the placement engine.

pub mod arrange;
pub mod control_surface;
