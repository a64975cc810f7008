use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bhanotify_frame::SessionKey;

use crate::error::{ListenerError, Result};

/// Source of the session key notifications are sealed under.
///
/// Provisioning (the authenticated exchange with the device) happens outside
/// this crate. A failure here is fatal: nothing can be decrypted without a key.
pub trait KeyProvider {
    fn session_key(&self) -> Result<SessionKey>;
}

impl<F> KeyProvider for F
where
    F: Fn() -> Result<SessionKey>,
{
    fn session_key(&self) -> Result<SessionKey> {
        self()
    }
}

/// A key that was provisioned ahead of time.
#[derive(Debug, Clone)]
pub struct StaticKey(SessionKey);

impl StaticKey {
    pub fn new(key: SessionKey) -> Self {
        Self(key)
    }

    /// Parse the device's base64 `NOTIFICATION_ENCRYPTION_KEY`.
    ///
    /// Only the first 32 decoded bytes are used.
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let material = STANDARD.decode(encoded.trim())?;
        Ok(Self(SessionKey::from_material(&material)?))
    }
}

impl KeyProvider for StaticKey {
    fn session_key(&self) -> Result<SessionKey> {
        Ok(self.0.clone())
    }
}

/// Resolve a key from a provider, tagging failures as provisioning errors.
pub fn provision(provider: &dyn KeyProvider) -> Result<SessionKey> {
    provider.session_key().map_err(|err| match err {
        ListenerError::KeyProvisioning(_) => err,
        other => ListenerError::KeyProvisioning(other.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use bhanotify_frame::{FrameError, KEY_SIZE};

    use super::*;

    #[test]
    fn from_base64_truncates_to_key_size() {
        let material: Vec<u8> = (0..48u8).collect();
        let encoded = STANDARD.encode(&material);

        let key = StaticKey::from_base64(&encoded)
            .unwrap()
            .session_key()
            .unwrap();
        assert_eq!(&key.as_bytes()[..], &material[..KEY_SIZE]);
    }

    #[test]
    fn from_base64_ignores_surrounding_whitespace() {
        let encoded = format!("  {}\n", STANDARD.encode([7u8; KEY_SIZE]));
        let key = StaticKey::from_base64(&encoded)
            .unwrap()
            .session_key()
            .unwrap();
        assert_eq!(key.as_bytes(), &[7u8; KEY_SIZE]);
    }

    #[test]
    fn from_base64_rejects_garbage() {
        let result = StaticKey::from_base64("not base64!!");
        assert!(matches!(result, Err(ListenerError::KeyEncoding(_))));
    }

    #[test]
    fn from_base64_rejects_short_material() {
        let result = StaticKey::from_base64(&STANDARD.encode([1u8; 16]));
        assert!(matches!(
            result,
            Err(ListenerError::Frame(FrameError::KeyTooShort { len: 16, .. }))
        ));
    }

    #[test]
    fn closure_provider() {
        let provider = || -> Result<SessionKey> { Ok(SessionKey::from_bytes([3u8; KEY_SIZE])) };
        let key = provision(&provider).unwrap();
        assert_eq!(key.as_bytes(), &[3u8; KEY_SIZE]);
    }

    #[test]
    fn provider_failure_is_provisioning_error() {
        let provider = || -> Result<SessionKey> { Err(ListenerError::SinkClosed) };
        let result = provision(&provider);
        assert!(matches!(result, Err(ListenerError::KeyProvisioning(_))));
    }
}
