//! Event classification.
//!
//! Devices only ever report motion and doorbell presses. Any code other than
//! `motion` is treated as a doorbell press; [`EventKind::Other`] is kept for
//! codes a future policy may want to surface separately.

use crate::event::DecryptedEvent;

/// Event code reported for motion sensor triggers.
pub const MOTION: &str = "motion";

/// Event code reported for doorbell presses.
pub const DOORBELL: &str = "doorbell";

/// A classified notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Motion { timestamp: u32 },
    Doorbell { timestamp: u32 },
    Other { code: String, timestamp: u32 },
}

impl EventKind {
    /// Human-readable kind name.
    pub fn name(&self) -> &str {
        match self {
            EventKind::Motion { .. } => MOTION,
            EventKind::Doorbell { .. } => DOORBELL,
            EventKind::Other { code, .. } => code,
        }
    }

    /// Device timestamp, seconds since the Unix epoch.
    pub fn timestamp(&self) -> u32 {
        match self {
            EventKind::Motion { timestamp }
            | EventKind::Doorbell { timestamp }
            | EventKind::Other { timestamp, .. } => *timestamp,
        }
    }
}

/// Map an event record to its kind.
pub fn classify(event: &DecryptedEvent) -> EventKind {
    let timestamp = event.timestamp;
    if event.event_code.eq_ignore_ascii_case(MOTION) {
        EventKind::Motion { timestamp }
    } else {
        fallback(timestamp)
    }
}

/// Policy for every code that is not motion: a doorbell press.
fn fallback(timestamp: u32) -> EventKind {
    EventKind::Doorbell { timestamp }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn event(code: &str, timestamp: u32) -> DecryptedEvent {
        DecryptedEvent {
            intercom_id: "ABCDEF".to_string(),
            event_code: code.to_string(),
            timestamp,
        }
    }

    #[test]
    fn motion_any_case() {
        for code in ["motion", "MOTION", "Motion", "mOtIoN"] {
            assert_eq!(
                classify(&event(code, 5)),
                EventKind::Motion { timestamp: 5 }
            );
        }
    }

    #[test]
    fn doorbell_and_fallback() {
        for code in ["doorbell", "DOORBELL", "", "1", "unknown", "motions"] {
            assert_eq!(
                classify(&event(code, 9)),
                EventKind::Doorbell { timestamp: 9 }
            );
        }
    }

    #[test]
    fn names_and_timestamps() {
        assert_eq!(EventKind::Motion { timestamp: 1 }.name(), "motion");
        assert_eq!(EventKind::Doorbell { timestamp: 2 }.timestamp(), 2);
        let other = EventKind::Other {
            code: "tamper".to_string(),
            timestamp: 3,
        };
        assert_eq!(other.name(), "tamper");
        assert_eq!(other.timestamp(), 3);
    }

    proptest! {
        #[test]
        fn classification_never_yields_other(code in "[A-Za-z0-9 ]{0,8}", timestamp in any::<u32>()) {
            let kind = classify(&event(&code, timestamp));
            let is_known = matches!(kind, EventKind::Motion { .. } | EventKind::Doorbell { .. });
            prop_assert!(is_known);
            prop_assert_eq!(kind.timestamp(), timestamp);
        }
    }
}
