use std::fmt;

use chacha20::cipher::{KeyIvInit, StreamCipher};
use chacha20::ChaCha20Legacy;
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::ChaCha20Poly1305;
use poly1305::Poly1305;
use subtle::ConstantTimeEq;
use tracing::trace;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::codec::{MIN_CIPHERTEXT_LEN, NONCE_SIZE, TAG_SIZE};
use crate::error::{DecryptFailure, FrameError, Result};

/// Session key size in bytes.
pub const KEY_SIZE: usize = 32;

/// The 256-bit symmetric key notifications are sealed under.
///
/// Key bytes are wiped on drop and never printed.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SessionKey([u8; KEY_SIZE]);

impl SessionKey {
    /// Create from exactly [`KEY_SIZE`] bytes.
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Create from device key material, keeping the first [`KEY_SIZE`] bytes.
    ///
    /// The device may hand out longer material; only the leading 32 bytes
    /// key the cipher.
    pub fn from_material(material: &[u8]) -> Result<Self> {
        let head = material.get(..KEY_SIZE).ok_or(FrameError::KeyTooShort {
            len: material.len(),
            min: KEY_SIZE,
        })?;
        let mut bytes = [0u8; KEY_SIZE];
        bytes.copy_from_slice(head);
        Ok(Self(bytes))
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SessionKey")
            .field(&format_args!("<redacted:{KEY_SIZE} bytes>"))
            .finish()
    }
}

/// ChaCha20-Poly1305 construction used to seal notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CipherSuite {
    /// Original construction: 64-bit nonce, unpadded MAC input
    /// (`ad || len(ad) || ct || len(ct)`). This is what devices emit.
    #[default]
    Original,
    /// RFC 8439 construction with the 8-byte nonce zero-extended on the left
    /// to 96 bits.
    Ietf,
}

impl CipherSuite {
    pub fn name(self) -> &'static str {
        match self {
            CipherSuite::Original => "chacha20poly1305",
            CipherSuite::Ietf => "chacha20poly1305-ietf",
        }
    }
}

/// Authenticate and decrypt a frame body (`nonce || ciphertext || tag`).
///
/// Length checks run before any cryptographic work. Returns exactly the
/// plaintext the cipher recovers; record length is checked by the extractor.
pub fn decrypt(
    body: &[u8],
    key: &SessionKey,
    suite: CipherSuite,
) -> std::result::Result<Vec<u8>, DecryptFailure> {
    if body.len() < NONCE_SIZE {
        return Err(DecryptFailure::InvalidNonceLength { len: body.len() });
    }
    let (nonce, sealed) = body.split_at(NONCE_SIZE);
    let nonce: &[u8; NONCE_SIZE] = nonce
        .try_into()
        .map_err(|_| DecryptFailure::InvalidNonceLength { len: nonce.len() })?;

    if sealed.len() < MIN_CIPHERTEXT_LEN {
        return Err(DecryptFailure::CiphertextTooShort {
            len: sealed.len(),
            min: MIN_CIPHERTEXT_LEN,
        });
    }

    let plaintext = match suite {
        CipherSuite::Original => open_original(key, nonce, sealed),
        CipherSuite::Ietf => open_ietf(key, nonce, sealed),
    }?;
    trace!(suite = suite.name(), len = plaintext.len(), "frame authenticated");
    Ok(plaintext)
}

/// Encrypt `plaintext` and append the tag. Inverse of [`decrypt`] minus the
/// nonce prefix; pair with [`crate::encode_frame`] to build a full frame.
pub fn seal(
    plaintext: &[u8],
    nonce: &[u8; NONCE_SIZE],
    key: &SessionKey,
    suite: CipherSuite,
) -> Result<Vec<u8>> {
    match suite {
        CipherSuite::Original => {
            let mut cipher = ChaCha20Legacy::new(key.as_bytes().into(), nonce.into());
            let mac_key = poly1305_key(&mut cipher);
            let mut sealed = plaintext.to_vec();
            cipher.apply_keystream(&mut sealed);
            let tag = original_tag(&mac_key, &sealed);
            sealed.extend_from_slice(&tag);
            Ok(sealed)
        }
        CipherSuite::Ietf => ChaCha20Poly1305::new(key.as_bytes().into())
            .encrypt(&ietf_nonce(nonce).into(), plaintext)
            .map_err(|_| FrameError::EncryptionFailed),
    }
}

fn open_original(
    key: &SessionKey,
    nonce: &[u8; NONCE_SIZE],
    sealed: &[u8],
) -> std::result::Result<Vec<u8>, DecryptFailure> {
    let (ciphertext, tag) = sealed.split_at(sealed.len() - TAG_SIZE);

    let mut cipher = ChaCha20Legacy::new(key.as_bytes().into(), nonce.into());
    let mac_key = poly1305_key(&mut cipher);
    let expected = original_tag(&mac_key, ciphertext);
    if !bool::from(expected.as_slice().ct_eq(tag)) {
        return Err(DecryptFailure::AuthenticationFailed);
    }

    let mut plaintext = ciphertext.to_vec();
    cipher.apply_keystream(&mut plaintext);
    Ok(plaintext)
}

fn open_ietf(
    key: &SessionKey,
    nonce: &[u8; NONCE_SIZE],
    sealed: &[u8],
) -> std::result::Result<Vec<u8>, DecryptFailure> {
    ChaCha20Poly1305::new(key.as_bytes().into())
        .decrypt(&ietf_nonce(nonce).into(), sealed)
        .map_err(|_| DecryptFailure::AuthenticationFailed)
}

/// One-time Poly1305 key from keystream block 0. Leaves the cipher positioned
/// at block 1, where the payload keystream starts.
fn poly1305_key(cipher: &mut ChaCha20Legacy) -> poly1305::Key {
    let mut block = [0u8; 64];
    cipher.apply_keystream(&mut block);
    let key = poly1305::Key::clone_from_slice(&block[..KEY_SIZE]);
    block.zeroize();
    key
}

/// Tag over `len(ad) || ct || len(ct)` with empty associated data.
fn original_tag(mac_key: &poly1305::Key, ciphertext: &[u8]) -> [u8; TAG_SIZE] {
    let mut mac_input = Vec::with_capacity(ciphertext.len() + 16);
    mac_input.extend_from_slice(&0u64.to_le_bytes());
    mac_input.extend_from_slice(ciphertext);
    mac_input.extend_from_slice(&(ciphertext.len() as u64).to_le_bytes());

    let tag = Poly1305::new(mac_key).compute_unpadded(&mac_input);
    let mut out = [0u8; TAG_SIZE];
    out.copy_from_slice(tag.as_slice());
    out
}

fn ietf_nonce(nonce: &[u8; NONCE_SIZE]) -> [u8; 12] {
    let mut full = [0u8; 12];
    full[12 - NONCE_SIZE..].copy_from_slice(nonce);
    full
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    const EXAMPLE_NONCE: [u8; NONCE_SIZE] = [0, 1, 2, 3, 4, 5, 6, 7];
    const EXAMPLE_PLAINTEXT: &[u8; 18] = b"ABCDEFMOTION  \x00\x00\x00\x01";
    const EXAMPLE_SEALED: &str =
        "7942c8de63fa78db4a6d0b595caade6689df488bcdd3d2fa22fe9038502d55b68c0f";
    const EXAMPLE_SEALED_IETF: &str =
        "7942c8de63fa78db4a6d0b595caade6689dfa8ac8025590438eb74ba9d35373feb4b";

    fn example_key() -> SessionKey {
        let mut bytes = [0u8; KEY_SIZE];
        for (i, b) in bytes.iter_mut().enumerate() {
            *b = i as u8;
        }
        SessionKey::from_bytes(bytes)
    }

    fn body(nonce: &[u8], sealed: &[u8]) -> Vec<u8> {
        let mut out = nonce.to_vec();
        out.extend_from_slice(sealed);
        out
    }

    #[test]
    fn test_known_answer_original() {
        let sealed = hex::decode(EXAMPLE_SEALED).unwrap();
        let plaintext = decrypt(
            &body(&EXAMPLE_NONCE, &sealed),
            &example_key(),
            CipherSuite::Original,
        )
        .unwrap();
        assert_eq!(plaintext.as_slice(), EXAMPLE_PLAINTEXT);
    }

    #[test]
    fn test_known_answer_ietf() {
        let sealed = hex::decode(EXAMPLE_SEALED_IETF).unwrap();
        let plaintext = decrypt(
            &body(&EXAMPLE_NONCE, &sealed),
            &example_key(),
            CipherSuite::Ietf,
        )
        .unwrap();
        assert_eq!(plaintext.as_slice(), EXAMPLE_PLAINTEXT);
    }

    #[test]
    fn test_seal_matches_known_answers() {
        let key = example_key();
        let original = seal(EXAMPLE_PLAINTEXT, &EXAMPLE_NONCE, &key, CipherSuite::Original).unwrap();
        let ietf = seal(EXAMPLE_PLAINTEXT, &EXAMPLE_NONCE, &key, CipherSuite::Ietf).unwrap();
        assert_eq!(hex::encode(original), EXAMPLE_SEALED);
        assert_eq!(hex::encode(ietf), EXAMPLE_SEALED_IETF);
    }

    #[test]
    fn test_draft_agl_vector_with_associated_data() {
        // draft-agl-tls-chacha20poly1305-04, section 7.
        let key = SessionKey::from_material(
            &hex::decode("4290bcb154173531f314af57f3be3b5006da371ece272afa1b5dbdd1100a1007")
                .unwrap(),
        )
        .unwrap();
        let nonce: [u8; NONCE_SIZE] = hex::decode("cd7cf67be39c794a").unwrap().try_into().unwrap();
        let ad = hex::decode("87e229d4500845a079c0").unwrap();
        let input = hex::decode("86d09974840bded2a5ca").unwrap();

        let mut cipher = ChaCha20Legacy::new(key.as_bytes().into(), (&nonce).into());
        let mac_key = poly1305_key(&mut cipher);
        let mut ciphertext = input.clone();
        cipher.apply_keystream(&mut ciphertext);

        let mut mac_input = ad.clone();
        mac_input.extend_from_slice(&(ad.len() as u64).to_le_bytes());
        mac_input.extend_from_slice(&ciphertext);
        mac_input.extend_from_slice(&(ciphertext.len() as u64).to_le_bytes());
        let tag = Poly1305::new(&mac_key).compute_unpadded(&mac_input);

        let mut output = ciphertext;
        output.extend_from_slice(tag.as_slice());
        assert_eq!(
            hex::encode(output),
            "e3e446f7ede9a19b62a4677dabf4e3d24b876bb284753896e1d6"
        );
    }

    #[test]
    fn test_suites_are_not_interchangeable() {
        let sealed = hex::decode(EXAMPLE_SEALED).unwrap();
        let result = decrypt(
            &body(&EXAMPLE_NONCE, &sealed),
            &example_key(),
            CipherSuite::Ietf,
        );
        assert_eq!(result, Err(DecryptFailure::AuthenticationFailed));
    }

    #[test]
    fn test_wrong_key_fails_authentication() {
        let sealed = hex::decode(EXAMPLE_SEALED).unwrap();
        let other = SessionKey::from_bytes([0x42; KEY_SIZE]);
        let result = decrypt(&body(&EXAMPLE_NONCE, &sealed), &other, CipherSuite::Original);
        assert_eq!(result, Err(DecryptFailure::AuthenticationFailed));
    }

    #[test]
    fn test_short_nonce() {
        let result = decrypt(&[1, 2, 3], &example_key(), CipherSuite::Original);
        assert_eq!(result, Err(DecryptFailure::InvalidNonceLength { len: 3 }));
    }

    #[test]
    fn test_ciphertext_below_floor() {
        let result = decrypt(
            &body(&EXAMPLE_NONCE, &[0u8; 31]),
            &example_key(),
            CipherSuite::Original,
        );
        assert_eq!(
            result,
            Err(DecryptFailure::CiphertextTooShort { len: 31, min: 32 })
        );
    }

    #[test]
    fn test_ciphertext_at_floor_reaches_authentication() {
        let result = decrypt(
            &body(&EXAMPLE_NONCE, &[0u8; 32]),
            &example_key(),
            CipherSuite::Original,
        );
        assert_eq!(result, Err(DecryptFailure::AuthenticationFailed));
    }

    #[test]
    fn test_longer_plaintext_is_returned_whole() {
        let key = example_key();
        let plaintext = [0x5A; 40];
        let sealed = seal(&plaintext, &EXAMPLE_NONCE, &key, CipherSuite::Original).unwrap();
        let opened = decrypt(&body(&EXAMPLE_NONCE, &sealed), &key, CipherSuite::Original).unwrap();
        assert_eq!(opened, plaintext);
    }

    #[test]
    fn test_key_from_material_truncates() {
        let material: Vec<u8> = (0..48u8).collect();
        let key = SessionKey::from_material(&material).unwrap();
        assert_eq!(key.as_bytes(), example_key().as_bytes());
    }

    #[test]
    fn test_key_from_short_material() {
        let result = SessionKey::from_material(&[0u8; 16]);
        assert!(matches!(
            result,
            Err(FrameError::KeyTooShort { len: 16, min: 32 })
        ));
    }

    #[test]
    fn test_key_debug_is_redacted() {
        let rendered = format!("{:?}", SessionKey::from_bytes([0xAB; KEY_SIZE]));
        assert!(rendered.contains("redacted"));
        assert!(!rendered.contains("171"));
    }

    proptest! {
        #[test]
        fn any_single_byte_tamper_fails(index in 0usize..34, flip in 1u8..=255) {
            let mut sealed = hex::decode(EXAMPLE_SEALED).unwrap();
            sealed[index] ^= flip;
            let result = decrypt(&body(&EXAMPLE_NONCE, &sealed), &example_key(), CipherSuite::Original);
            prop_assert_eq!(result, Err(DecryptFailure::AuthenticationFailed));
        }

        #[test]
        fn any_single_byte_tamper_fails_ietf(index in 0usize..34, flip in 1u8..=255) {
            let mut sealed = hex::decode(EXAMPLE_SEALED_IETF).unwrap();
            sealed[index] ^= flip;
            let result = decrypt(&body(&EXAMPLE_NONCE, &sealed), &example_key(), CipherSuite::Ietf);
            prop_assert_eq!(result, Err(DecryptFailure::AuthenticationFailed));
        }

        #[test]
        fn nonce_tamper_fails(index in 0usize..NONCE_SIZE, flip in 1u8..=255) {
            let sealed = hex::decode(EXAMPLE_SEALED).unwrap();
            let mut nonce = EXAMPLE_NONCE;
            nonce[index] ^= flip;
            let result = decrypt(&body(&nonce, &sealed), &example_key(), CipherSuite::Original);
            prop_assert_eq!(result, Err(DecryptFailure::AuthenticationFailed));
        }
    }
}
