use crate::error::{FrameError, ParseFailure, Result};

/// Decrypted event record: id (6) + code (8) + timestamp (4) = 18 bytes.
pub const PLAINTEXT_SIZE: usize = 18;

const INTERCOM_ID_LEN: usize = 6;
const EVENT_CODE_LEN: usize = 8;
const EVENT_CODE_END: usize = INTERCOM_ID_LEN + EVENT_CODE_LEN;

/// A decrypted, structurally valid event addressed to this receiver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecryptedEvent {
    /// Receiver identity the device addressed, padding removed.
    pub intercom_id: String,
    /// Event code (e.g. `motion`, `doorbell`), padding removed.
    pub event_code: String,
    /// Seconds since the Unix epoch, as reported by the device.
    pub timestamp: u32,
}

/// The identity prefix a receiver expects in its events: the first six
/// characters of the configured user name.
pub fn identity_prefix(user: &str) -> String {
    user.chars().take(INTERCOM_ID_LEN).collect()
}

/// Parse an 18-byte plaintext and check it is addressed to `expected_prefix`.
///
/// The timestamp is taken as-is; plausibility is the consumer's call.
pub fn extract(
    plaintext: &[u8],
    expected_prefix: &str,
) -> std::result::Result<DecryptedEvent, ParseFailure> {
    if plaintext.len() != PLAINTEXT_SIZE {
        return Err(ParseFailure::BadLength {
            len: plaintext.len(),
        });
    }

    let intercom_id = trim_field(&plaintext[..INTERCOM_ID_LEN]);
    let event_code = trim_field(&plaintext[INTERCOM_ID_LEN..EVENT_CODE_END]);
    let timestamp = u32::from_be_bytes([
        plaintext[EVENT_CODE_END],
        plaintext[EVENT_CODE_END + 1],
        plaintext[EVENT_CODE_END + 2],
        plaintext[EVENT_CODE_END + 3],
    ]);

    let expected = expected_prefix.trim_end_matches(is_padding);
    if intercom_id != expected {
        return Err(ParseFailure::IdentityMismatch {
            expected: expected.to_string(),
            found: intercom_id,
        });
    }

    Ok(DecryptedEvent {
        intercom_id,
        event_code,
        timestamp,
    })
}

/// Build an event record, space-padding the text fields.
pub fn encode_plaintext(
    intercom_id: &str,
    event_code: &str,
    timestamp: u32,
) -> Result<[u8; PLAINTEXT_SIZE]> {
    let mut out = [b' '; PLAINTEXT_SIZE];
    put_field(&mut out[..INTERCOM_ID_LEN], "intercom id", intercom_id)?;
    put_field(&mut out[INTERCOM_ID_LEN..EVENT_CODE_END], "event code", event_code)?;
    out[EVENT_CODE_END..].copy_from_slice(&timestamp.to_be_bytes());
    Ok(out)
}

fn put_field(slot: &mut [u8], field: &'static str, value: &str) -> Result<()> {
    let bytes = value.as_bytes();
    if bytes.len() > slot.len() {
        return Err(FrameError::FieldTooLong {
            field,
            len: bytes.len(),
            max: slot.len(),
        });
    }
    slot[..bytes.len()].copy_from_slice(bytes);
    Ok(())
}

fn trim_field(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw)
        .trim_end_matches(is_padding)
        .to_string()
}

fn is_padding(c: char) -> bool {
    c.is_whitespace() || c == '\0'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &[u8; 6], code: &[u8; 8], timestamp: u32) -> Vec<u8> {
        let mut out = id.to_vec();
        out.extend_from_slice(code);
        out.extend_from_slice(&timestamp.to_be_bytes());
        out
    }

    #[test]
    fn test_extract_motion_record() {
        let event = extract(&record(b"ABCDEF", b"MOTION  ", 1), "ABCDEF").unwrap();
        assert_eq!(event.intercom_id, "ABCDEF");
        assert_eq!(event.event_code, "MOTION");
        assert_eq!(event.timestamp, 1);
    }

    #[test]
    fn test_extract_trims_nul_padding() {
        let event = extract(&record(b"ABCDEF", b"1\0\0\0\0\0\0\0", 7), "ABCDEF").unwrap();
        assert_eq!(event.event_code, "1");
    }

    #[test]
    fn test_extract_blank_event_code() {
        let event = extract(&record(b"ABCDEF", b"        ", 0), "ABCDEF").unwrap();
        assert_eq!(event.event_code, "");
    }

    #[test]
    fn test_extract_full_timestamp_range() {
        let event = extract(&record(b"ABCDEF", b"doorbell", u32::MAX), "ABCDEF").unwrap();
        assert_eq!(event.timestamp, u32::MAX);
        assert_eq!(event.event_code, "doorbell");
    }

    #[test]
    fn test_extract_bad_length() {
        let mut plaintext = record(b"ABCDEF", b"doorbell", 1);
        plaintext.push(0);
        assert_eq!(
            extract(&plaintext, "ABCDEF"),
            Err(ParseFailure::BadLength { len: 19 })
        );
        assert_eq!(
            extract(&plaintext[..17], "ABCDEF"),
            Err(ParseFailure::BadLength { len: 17 })
        );
    }

    #[test]
    fn test_extract_identity_mismatch() {
        let result = extract(&record(b"ZZZZZZ", b"doorbell", 1), "ABCDEF");
        assert_eq!(
            result,
            Err(ParseFailure::IdentityMismatch {
                expected: "ABCDEF".to_string(),
                found: "ZZZZZZ".to_string(),
            })
        );
    }

    #[test]
    fn test_extract_identity_is_case_sensitive() {
        let result = extract(&record(b"abcdef", b"doorbell", 1), "ABCDEF");
        assert!(matches!(result, Err(ParseFailure::IdentityMismatch { .. })));
    }

    #[test]
    fn test_extract_short_identity_is_padded() {
        let event = extract(&record(b"ghx   ", b"doorbell", 1), "ghx").unwrap();
        assert_eq!(event.intercom_id, "ghx");
    }

    #[test]
    fn test_identity_prefix_takes_six_chars() {
        assert_eq!(identity_prefix("ghxyzq0001"), "ghxyzq");
        assert_eq!(identity_prefix("abc"), "abc");
    }

    #[test]
    fn test_encode_plaintext_layout() {
        let plaintext = encode_plaintext("ABCDEF", "MOTION", 1).unwrap();
        assert_eq!(&plaintext, b"ABCDEFMOTION  \x00\x00\x00\x01");
    }

    #[test]
    fn test_encode_plaintext_rejects_long_fields() {
        assert!(matches!(
            encode_plaintext("ABCDEFG", "doorbell", 1),
            Err(FrameError::FieldTooLong { max: 6, .. })
        ));
        assert!(matches!(
            encode_plaintext("ABCDEF", "doorbells", 1),
            Err(FrameError::FieldTooLong { max: 8, .. })
        ));
    }

    #[test]
    fn test_encode_then_extract() {
        let plaintext = encode_plaintext("ghx", "doorbell", 1_700_000_000).unwrap();
        let event = extract(&plaintext, "ghx").unwrap();
        assert_eq!(event.intercom_id, "ghx");
        assert_eq!(event.event_code, "doorbell");
        assert_eq!(event.timestamp, 1_700_000_000);
    }
}
