use bytes::{BufMut, BytesMut};

use crate::error::Rejected;

/// Frame header: identifier (3) + version (1) = 4 bytes.
pub const HEADER_SIZE: usize = 4;

/// Identifier bytes every notification starts with.
pub const IDENTIFIER: [u8; 3] = [0xDE, 0xAD, 0xBE];

/// The only accepted protocol version.
pub const VERSION: u8 = 0x02;

/// ChaCha20-Poly1305 nonce carried after the header.
pub const NONCE_SIZE: usize = 8;

/// Poly1305 authentication tag trailing the ciphertext.
pub const TAG_SIZE: usize = 16;

/// Minimum accepted ciphertext+tag length.
///
/// A production frame carries 34 bytes (18-byte record + tag). The floor is
/// kept slightly lower to tolerate layout variance across firmware.
pub const MIN_CIPHERTEXT_LEN: usize = 32;

/// The fixed 4-byte header of a notification frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Identifier bytes. Always [`IDENTIFIER`] once validated.
    pub identifier: [u8; 3],
    /// Protocol version. Always [`VERSION`] once validated.
    pub version: u8,
}

/// Check a raw datagram's header.
///
/// On success the frame body (nonce, ciphertext, tag) is
/// [`frame_body`]`(payload)`.
pub fn validate(payload: &[u8]) -> Result<FrameHeader, Rejected> {
    if payload.len() < HEADER_SIZE {
        return Err(Rejected::TooShort {
            len: payload.len(),
            min: HEADER_SIZE,
        });
    }

    let identifier = [payload[0], payload[1], payload[2]];
    let version = payload[3];
    if identifier != IDENTIFIER || version != VERSION {
        return Err(Rejected::Unrecognized {
            identifier,
            version,
        });
    }

    Ok(FrameHeader {
        identifier,
        version,
    })
}

/// Everything after the header. Empty if the payload is header-only or shorter.
pub fn frame_body(payload: &[u8]) -> &[u8] {
    payload.get(HEADER_SIZE..).unwrap_or_default()
}

/// Encode a notification frame.
///
/// Wire format:
/// ```text
/// ┌───────────┬─────────┬───────────┬──────────────────────────┐
/// │ Ident (3B)│ Ver (1B)│ Nonce (8B)│ Ciphertext + tag (16B)   │
/// │ DE AD BE  │ 0x02    │           │                          │
/// └───────────┴─────────┴───────────┴──────────────────────────┘
/// ```
pub fn encode_frame(nonce: &[u8; NONCE_SIZE], sealed: &[u8], dst: &mut BytesMut) {
    dst.reserve(HEADER_SIZE + NONCE_SIZE + sealed.len());
    dst.put_slice(&IDENTIFIER);
    dst.put_u8(VERSION);
    dst.put_slice(nonce);
    dst.put_slice(sealed);
}
