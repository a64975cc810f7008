//! Wire validation, authenticated decryption, and event extraction for
//! intercom broadcast notifications.
//!
//! Every notification datagram has the same shape:
//! - A 3-byte identifier (`DE AD BE`) and a 1-byte version (`0x02`)
//! - An 8-byte ChaCha20-Poly1305 nonce
//! - Ciphertext of an 18-byte event record, followed by a 16-byte tag
//!
//! Each stage is a pure function over bytes. Stateful concerns (duplicate
//! suppression, key provisioning, sockets) live in `bhanotify-listener`.

pub mod aead;
pub mod codec;
pub mod error;
pub mod event;
pub mod kind;

pub use aead::{decrypt, seal, CipherSuite, SessionKey, KEY_SIZE};
pub use codec::{
    encode_frame, frame_body, validate, FrameHeader, HEADER_SIZE, IDENTIFIER, MIN_CIPHERTEXT_LEN,
    NONCE_SIZE, TAG_SIZE, VERSION,
};
pub use error::{DecryptFailure, FrameError, ParseFailure, Rejected, Result};
pub use event::{encode_plaintext, extract, identity_prefix, DecryptedEvent, PLAINTEXT_SIZE};
pub use kind::{classify, EventKind};
