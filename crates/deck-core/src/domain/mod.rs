//! Pure control-surface business logic.
//!
//! Nothing in this module performs I/O.  The client application feeds raw
//! pointer and viewport events in and forwards the resulting commands to the
//! channel.

pub mod placement;
pub mod session;
pub mod surface;
