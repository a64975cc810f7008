use std::time::{Duration, Instant};

use bytes::Bytes;

/// Suppression window for byte-identical retransmissions.
pub const DEFAULT_WINDOW: Duration = Duration::from_millis(750);

/// The most recent datagram seen on one socket.
#[derive(Debug, Clone)]
struct CacheEntry {
    last_payload: Bytes,
    last_seen_at: Instant,
}

/// Single-slot duplicate cache for one listening socket.
///
/// Devices broadcast each notification several times in quick succession.
/// The cache remembers only the last raw datagram, which is enough to drop
/// those bursts without keeping a history.
#[derive(Debug, Clone, Default)]
pub struct DuplicateCache {
    entry: Option<CacheEntry>,
}

impl DuplicateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if `payload` repeats the previous datagram and arrived
    /// less than `window` after it.
    ///
    /// The cache is updated on every call, duplicate or not, so a steady
    /// stream of copies keeps extending the window.
    pub fn is_duplicate(&mut self, payload: &Bytes, now: Instant, window: Duration) -> bool {
        let duplicate = match &self.entry {
            Some(entry) => {
                entry.last_payload == *payload
                    && now.saturating_duration_since(entry.last_seen_at) < window
            }
            None => false,
        };

        self.entry = Some(CacheEntry {
            last_payload: payload.clone(),
            last_seen_at: now,
        });

        duplicate
    }

    /// Instant the last datagram was seen, if any.
    pub fn last_seen_at(&self) -> Option<Instant> {
        self.entry.as_ref().map(|e| e.last_seen_at)
    }
}
