use std::net::SocketAddr;
use std::time::Duration;

use bhanotify_frame::{
    classify, decrypt, extract, frame_body, identity_prefix, validate, CipherSuite,
    DecryptFailure, DecryptedEvent, EventKind, ParseFailure, Rejected, SessionKey,
};
use bhanotify_transport::RawFrame;

use crate::dedup::{DuplicateCache, DEFAULT_WINDOW};

/// Pipeline behavior shared by every port.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// AEAD construction frames are sealed with.
    pub suite: CipherSuite,
    /// Duplicate suppression window.
    pub dedup_window: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            suite: CipherSuite::default(),
            dedup_window: DEFAULT_WINDOW,
        }
    }
}

/// A classified event together with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Local port the datagram arrived on.
    pub port: u16,
    /// Device address.
    pub source: SocketAddr,
    /// The decrypted record.
    pub event: DecryptedEvent,
    /// Its classification.
    pub kind: EventKind,
}

/// What happened to one datagram.
///
/// Every variant except `Delivered` means the frame was dropped; none of them
/// are fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    Delivered(Notification),
    Rejected(Rejected),
    Duplicate,
    DecryptFailed(DecryptFailure),
    ParseFailed(ParseFailure),
}

impl FrameOutcome {
    /// The classified event, if the frame produced one.
    pub fn event(&self) -> Option<&EventKind> {
        match self {
            FrameOutcome::Delivered(n) => Some(&n.kind),
            _ => None,
        }
    }

    pub fn into_notification(self) -> Option<Notification> {
        match self {
            FrameOutcome::Delivered(n) => Some(n),
            _ => None,
        }
    }

    /// Short stable label for logs and output.
    pub fn label(&self) -> &'static str {
        match self {
            FrameOutcome::Delivered(_) => "delivered",
            FrameOutcome::Rejected(Rejected::TooShort { .. }) => "too-short",
            FrameOutcome::Rejected(Rejected::Unrecognized { .. }) => "unrecognized",
            FrameOutcome::Duplicate => "duplicate",
            FrameOutcome::DecryptFailed(DecryptFailure::InvalidNonceLength { .. }) => {
                "invalid-nonce-length"
            }
            FrameOutcome::DecryptFailed(DecryptFailure::CiphertextTooShort { .. }) => {
                "ciphertext-too-short"
            }
            FrameOutcome::DecryptFailed(DecryptFailure::AuthenticationFailed) => {
                "authentication-failed"
            }
            FrameOutcome::ParseFailed(ParseFailure::BadLength { .. }) => "bad-length",
            FrameOutcome::ParseFailed(ParseFailure::IdentityMismatch { .. }) => {
                "identity-mismatch"
            }
        }
    }
}

/// Everything one listening port needs to decode its traffic.
///
/// Owns the port's duplicate cache; contexts are never shared between ports.
#[derive(Debug)]
pub struct ListenerContext {
    port: u16,
    key: SessionKey,
    expected_prefix: String,
    config: PipelineConfig,
    cache: DuplicateCache,
}

impl ListenerContext {
    /// Create a context for `port`. `identity` is the receiver's user name;
    /// only its first six characters are matched.
    pub fn new(port: u16, key: SessionKey, identity: &str, config: PipelineConfig) -> Self {
        Self {
            port,
            key,
            expected_prefix: identity_prefix(identity),
            config,
            cache: DuplicateCache::new(),
        }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn expected_prefix(&self) -> &str {
        &self.expected_prefix
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run one datagram through validation, duplicate suppression,
    /// decryption, extraction, and classification.
    ///
    /// Only the duplicate cache is mutated.
    pub fn process_frame(&mut self, raw: &RawFrame) -> FrameOutcome {
        if let Err(rejected) = validate(&raw.payload) {
            return FrameOutcome::Rejected(rejected);
        }

        if self
            .cache
            .is_duplicate(&raw.payload, raw.received_at, self.config.dedup_window)
        {
            return FrameOutcome::Duplicate;
        }

        let plaintext = match decrypt(frame_body(&raw.payload), &self.key, self.config.suite) {
            Ok(plaintext) => plaintext,
            Err(failure) => return FrameOutcome::DecryptFailed(failure),
        };

        let event = match extract(&plaintext, &self.expected_prefix) {
            Ok(event) => event,
            Err(failure) => return FrameOutcome::ParseFailed(failure),
        };

        let kind = classify(&event);
        FrameOutcome::Delivered(Notification {
            port: self.port,
            source: raw.source,
            event,
            kind,
        })
    }
}
