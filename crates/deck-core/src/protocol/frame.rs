//! Pipe-delimited frame encoding and parsing.
//!
//! The host understands frames such as `key|down|w`, `mouse|up|left`,
//! `hid|move|5|-3`, `macro|start`, and `ping|<nonce>`.  It answers with
//! `macro|playing`, `macro|stopped`, and `pong|<nonce>`.
//!
//! Two asymmetries are deliberate:
//!
//! - **Encoding can fail** — an empty key code or a code containing the `|`
//!   delimiter is a caller bug and is rejected with [`FrameError`].
//! - **Parsing never fails** — the host ecosystem includes peers that emit
//!   frames this client does not know.  Anything unrecognized becomes
//!   [`Broadcast::Unrecognized`] and is ignored by callers, but it still
//!   counts as channel activity for heartbeat liveness.
//!
//! Key codes are the host's lowercase names (`w`, `space`, `shift`, …) and
//! mouse buttons are `left` / `right` / `middle`; the client treats them as
//! opaque strings and the host's firmware map is the authority.

use thiserror::Error;

/// Errors raised while encoding an outbound frame.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    /// A key or button code was empty.
    #[error("command code must not be empty")]
    EmptyCode,

    /// A key or button code contained the field delimiter.
    #[error("command code {0:?} must not contain '|'")]
    DelimiterInCode(String),

    /// A ping was built with an empty nonce.
    #[error("heartbeat nonce must not be empty")]
    EmptyNonce,
}

/// An outbound command frame, one per user-visible action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `key|down|<code>` — press a keyboard key.
    KeyDown(String),
    /// `key|up|<code>` — release a keyboard key.
    KeyUp(String),
    /// `mouse|down|<button>` — press a mouse button.
    MouseDown(String),
    /// `mouse|up|<button>` — release a mouse button.
    MouseUp(String),
    /// `hid|move|<dx>|<dy>` — relative cursor movement.
    HidMove { dx: i32, dy: i32 },
    /// `macro|start` — begin macro playback on the host.
    MacroStart,
    /// `macro|stop` — stop macro playback.
    MacroStop,
    /// `macro|query` — ask the host for its current playback status.
    MacroQuery,
    /// `ping|<nonce>` — heartbeat probe; the host echoes the nonce back.
    Ping(String),
}

impl Command {
    /// Encodes this command as a wire frame.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError`] when a code or nonce is empty or contains the
    /// `|` delimiter.  These are local usage errors, never wire conditions.
    pub fn encode(&self) -> Result<String, FrameError> {
        match self {
            Command::KeyDown(code) => Ok(format!("key|down|{}", checked_code(code)?)),
            Command::KeyUp(code) => Ok(format!("key|up|{}", checked_code(code)?)),
            Command::MouseDown(button) => Ok(format!("mouse|down|{}", checked_code(button)?)),
            Command::MouseUp(button) => Ok(format!("mouse|up|{}", checked_code(button)?)),
            Command::HidMove { dx, dy } => Ok(format!("hid|move|{dx}|{dy}")),
            Command::MacroStart => Ok("macro|start".to_string()),
            Command::MacroStop => Ok("macro|stop".to_string()),
            Command::MacroQuery => Ok("macro|query".to_string()),
            Command::Ping(nonce) => {
                if nonce.is_empty() {
                    return Err(FrameError::EmptyNonce);
                }
                if nonce.contains('|') {
                    return Err(FrameError::DelimiterInCode(nonce.clone()));
                }
                Ok(format!("ping|{nonce}"))
            }
        }
    }
}

/// Validates a key or button code for embedding in a frame.
fn checked_code(code: &str) -> Result<&str, FrameError> {
    if code.is_empty() {
        return Err(FrameError::EmptyCode);
    }
    if code.contains('|') {
        return Err(FrameError::DelimiterInCode(code.to_string()));
    }
    Ok(code)
}

/// An inbound frame from the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Broadcast {
    /// `macro|playing` — the host reports playback in progress.
    MacroPlaying,
    /// `macro|stopped` — the host reports playback stopped.
    MacroStopped,
    /// `pong|<nonce>` — heartbeat reply carrying the probe nonce.
    Pong(String),
    /// Anything else.  Kept verbatim for debug logging; callers ignore it.
    Unrecognized(String),
}

impl Broadcast {
    /// Parses an inbound frame.
    ///
    /// Parsing is total: malformed or unknown frames are returned as
    /// [`Broadcast::Unrecognized`] rather than an error, because the channel
    /// must keep working against peers that speak newer or older dialects.
    pub fn parse(raw: &str) -> Broadcast {
        let mut fields = raw.split('|');
        match (fields.next(), fields.next(), fields.next()) {
            (Some("macro"), Some("playing"), None) => Broadcast::MacroPlaying,
            (Some("macro"), Some("stopped"), None) => Broadcast::MacroStopped,
            (Some("pong"), Some(nonce), None) if !nonce.is_empty() => {
                Broadcast::Pong(nonce.to_string())
            }
            _ => Broadcast::Unrecognized(raw.to_string()),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── Command encoding ──────────────────────────────────────────────────────

    #[test]
    fn test_encode_key_down_produces_exact_frame() {
        let cmd = Command::KeyDown("w".to_string());
        assert_eq!(cmd.encode().unwrap(), "key|down|w");
    }

    #[test]
    fn test_encode_key_up_produces_exact_frame() {
        let cmd = Command::KeyUp("space".to_string());
        assert_eq!(cmd.encode().unwrap(), "key|up|space");
    }

    #[test]
    fn test_encode_mouse_down_uses_button_name() {
        let cmd = Command::MouseDown("left".to_string());
        assert_eq!(cmd.encode().unwrap(), "mouse|down|left");
    }

    #[test]
    fn test_encode_mouse_up_uses_button_name() {
        let cmd = Command::MouseUp("middle".to_string());
        assert_eq!(cmd.encode().unwrap(), "mouse|up|middle");
    }

    #[test]
    fn test_encode_hid_move_keeps_signed_deltas() {
        let cmd = Command::HidMove { dx: 5, dy: -3 };
        assert_eq!(cmd.encode().unwrap(), "hid|move|5|-3");
    }

    #[test]
    fn test_encode_macro_frames_have_no_trailing_fields() {
        assert_eq!(Command::MacroStart.encode().unwrap(), "macro|start");
        assert_eq!(Command::MacroStop.encode().unwrap(), "macro|stop");
        assert_eq!(Command::MacroQuery.encode().unwrap(), "macro|query");
    }

    #[test]
    fn test_encode_ping_embeds_nonce() {
        let cmd = Command::Ping("a1b2c3".to_string());
        assert_eq!(cmd.encode().unwrap(), "ping|a1b2c3");
    }

    #[test]
    fn test_encode_rejects_empty_key_code() {
        let cmd = Command::KeyDown(String::new());
        assert_eq!(cmd.encode(), Err(FrameError::EmptyCode));
    }

    #[test]
    fn test_encode_rejects_delimiter_in_code() {
        let cmd = Command::KeyDown("a|b".to_string());
        assert!(matches!(cmd.encode(), Err(FrameError::DelimiterInCode(_))));
    }

    #[test]
    fn test_encode_rejects_empty_ping_nonce() {
        let cmd = Command::Ping(String::new());
        assert_eq!(cmd.encode(), Err(FrameError::EmptyNonce));
    }

    // ── Broadcast parsing ─────────────────────────────────────────────────────

    #[test]
    fn test_parse_macro_playing() {
        assert_eq!(Broadcast::parse("macro|playing"), Broadcast::MacroPlaying);
    }

    #[test]
    fn test_parse_macro_stopped() {
        assert_eq!(Broadcast::parse("macro|stopped"), Broadcast::MacroStopped);
    }

    #[test]
    fn test_parse_pong_extracts_nonce() {
        assert_eq!(
            Broadcast::parse("pong|deadbeef"),
            Broadcast::Pong("deadbeef".to_string())
        );
    }

    #[test]
    fn test_parse_is_case_sensitive() {
        // `PONG|x` is not a pong; the protocol is case-sensitive.
        assert_eq!(
            Broadcast::parse("PONG|x"),
            Broadcast::Unrecognized("PONG|x".to_string())
        );
    }

    #[test]
    fn test_parse_pong_with_extra_field_is_unrecognized() {
        assert_eq!(
            Broadcast::parse("pong|a|b"),
            Broadcast::Unrecognized("pong|a|b".to_string())
        );
    }

    #[test]
    fn test_parse_pong_with_empty_nonce_is_unrecognized() {
        assert_eq!(
            Broadcast::parse("pong|"),
            Broadcast::Unrecognized("pong|".to_string())
        );
    }

    #[test]
    fn test_parse_unknown_frame_is_unrecognized_not_error() {
        let raw = "clipboard|set|hello";
        assert_eq!(Broadcast::parse(raw), Broadcast::Unrecognized(raw.to_string()));
    }

    #[test]
    fn test_parse_empty_frame_is_unrecognized() {
        assert_eq!(Broadcast::parse(""), Broadcast::Unrecognized(String::new()));
    }
}
