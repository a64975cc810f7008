/// A datagram that is not a notification frame at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Rejected {
    /// Fewer bytes than the fixed header.
    #[error("datagram too short ({len} bytes, need at least {min})")]
    TooShort { len: usize, min: usize },

    /// Identifier or version does not match the notification format.
    #[error("unrecognized packet format (identifier {identifier:02x?}, version {version:#04x})")]
    Unrecognized { identifier: [u8; 3], version: u8 },
}

/// Authenticated decryption failures.
///
/// None of these are fatal. `AuthenticationFailed` is the normal outcome for
/// broadcast traffic sealed under some other receiver's key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DecryptFailure {
    /// The frame body is too short to hold the 8-byte nonce.
    #[error("invalid nonce length ({len} bytes, expected 8)")]
    InvalidNonceLength { len: usize },

    /// Ciphertext plus tag is under the minimum safe floor.
    #[error("ciphertext too short ({len} bytes, need at least {min})")]
    CiphertextTooShort { len: usize, min: usize },

    /// The Poly1305 tag did not verify under this key.
    #[error("authentication failed")]
    AuthenticationFailed,
}

/// Structural failures of a decrypted event record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseFailure {
    /// Plaintext is not exactly one event record.
    #[error("bad plaintext length ({len} bytes, expected 18)")]
    BadLength { len: usize },

    /// The event was addressed to a different receiver.
    #[error("intercom id {found:?} does not match {expected:?}")]
    IdentityMismatch { expected: String, found: String },
}

/// Errors from building frames and keys.
///
/// Per-datagram failures are the plain-data types above, not `FrameError`.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// A field does not fit its fixed-width slot when encoding.
    #[error("{field} too long ({len} bytes, max {max})")]
    FieldTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    /// The key material is shorter than a session key.
    #[error("key material too short ({len} bytes, need {min})")]
    KeyTooShort { len: usize, min: usize },

    /// The cipher refused to encrypt.
    #[error("encryption failed")]
    EncryptionFailed,
}

pub type Result<T> = std::result::Result<T, FrameError>;
