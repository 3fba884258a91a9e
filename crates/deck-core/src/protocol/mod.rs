//! Wire protocol for the channel to the macro-playback host.
//!
//! The protocol is deliberately simple: each WebSocket text message carries
//! one pipe-delimited frame with fields in a fixed, case-sensitive order.
//! There is no framing layer of our own — the transport already delivers
//! whole messages.

pub mod frame;

pub use frame::{Broadcast, Command, FrameError};
