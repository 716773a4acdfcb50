//! ChaCha20 and ChaCha20-Poly1305, both with a 256-bit key.

use crate::cipher::validators::{iv_length, key_length_in, random_iv};
use crate::cipher::{AuthCipher, AuthParams, AuthPolicy, CipherOptions, IvCipher};
use crate::config::{CHACHA20_IV_SIZE, CHACHA20_KEY_SIZE, CHACHA20_POLY1305_IV_SIZE, POLY1305_TAG_SIZE};
use crate::error::Result;
use crate::types::Direction;

fn chacha_key(key: &[u8]) -> Result<()> {
    key_length_in(key, &[CHACHA20_KEY_SIZE])
}

fn chacha_iv(_key: &[u8], iv: &[u8]) -> Result<()> {
    iv_length(iv, CHACHA20_IV_SIZE)
}

fn chacha_iv_source(_key: &[u8]) -> Result<Vec<u8>> {
    random_iv(CHACHA20_IV_SIZE)
}

fn poly1305_iv(_key: &[u8], iv: &[u8]) -> Result<()> {
    iv_length(iv, CHACHA20_POLY1305_IV_SIZE)
}

fn poly1305_iv_source(_key: &[u8]) -> Result<Vec<u8>> {
    random_iv(CHACHA20_POLY1305_IV_SIZE)
}

fn resolve(_key_len: usize, mode: &str) -> String {
    if mode.is_empty() { "chacha20".to_owned() } else { format!("chacha20-{mode}") }
}

const POLY1305_POLICY: AuthPolicy = AuthPolicy {
    key_validator: chacha_key,
    iv_validator: poly1305_iv,
    iv_generator: poly1305_iv_source,
    aad_required: false,
    plaintext_length_required: false,
    tag_lengths: &[POLY1305_TAG_SIZE],
    default_tag_length: Some(POLY1305_TAG_SIZE),
    fixed_tag_length: Some(POLY1305_TAG_SIZE),
};

fn poly1305_options<'a>(options: &'a CipherOptions, auth_tag: Option<&'a [u8]>, direction: Direction) -> Result<AuthParams<'a>> {
    POLY1305_POLICY.validate(options, auth_tag, direction)
}

/// Raw ChaCha20. The 16-byte IV is a 4-byte little-endian block counter
/// followed by the 12-byte nonce.
pub static CHACHA20: IvCipher = IvCipher::build("chacha20", "", chacha_key, chacha_iv, chacha_iv_source, resolve);

/// ChaCha20-Poly1305 (RFC 8439). The tag is always 16 bytes.
pub static CHACHA20_POLY1305: AuthCipher = AuthCipher::build("chacha20", "poly1305", chacha_key, poly1305_iv, poly1305_options, poly1305_iv_source, resolve);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cipher::{CipherMode, DecipherOptions};
    use crate::error::Error;

    #[test]
    fn test_names() {
        assert_eq!(CHACHA20.name(), "chacha20");
        assert_eq!(CHACHA20_POLY1305.name(), "chacha20-poly1305");
        assert_eq!(CHACHA20.descriptor().primitive(32), "chacha20");
        assert_eq!(CHACHA20_POLY1305.descriptor().primitive(32), "chacha20-poly1305");
    }

    #[test]
    fn test_rfc8439_keystream_prefix() {
        let key: Vec<u8> = (0u8..32).collect();
        let iv = hex::decode("01000000000000000000004a00000000").unwrap();

        let result = CHACHA20.encrypt(b"Ladies and Gentl", &CipherOptions::new(&key).with_iv(&iv)).unwrap();
        assert_eq!(hex::encode(&result.ciphertext), "6e2e359a2568f98041ba0728dd0d6981");
    }

    #[test]
    fn test_key_must_be_256_bits() {
        for len in [0, 16, 24, 31, 33, 64] {
            assert!(!CHACHA20.validate_key(&vec![0u8; len]));
            assert!(!CHACHA20_POLY1305.validate_key(&vec![0u8; len]));
        }
        assert!(CHACHA20.validate_key(&[0u8; 32]));
        assert!(CHACHA20_POLY1305.validate_key(&[0u8; 32]));
    }

    #[test]
    fn test_poly1305_tag_fixed() {
        let key = [8u8; 32];
        let result = CHACHA20_POLY1305.encrypt(b"fixed tag", &CipherOptions::new(&key).with_auth_tag_length(12).with_aad(b"meta")).unwrap();
        assert_eq!(result.info.auth_tag_length, Some(16));
        assert_eq!(result.info.auth_tag.as_ref().map(Vec::len), Some(16));
        assert_eq!(result.info.iv.as_ref().map(Vec::len), Some(12));

        let options = result.decipher_options(&key);
        assert_eq!(CHACHA20_POLY1305.decrypt(&result.ciphertext, &options).unwrap(), b"fixed tag");

        let short = DecipherOptions::from(options.options.clone()).with_auth_tag(&[0u8; 12]);
        assert!(matches!(CHACHA20_POLY1305.decrypt(&result.ciphertext, &short), Err(Error::AuthTagLengthInvalid { length: 12 })));

        let mut wrong_aad = options;
        wrong_aad.options.aad = Some(b"metA".to_vec());
        assert!(matches!(CHACHA20_POLY1305.decrypt(&result.ciphertext, &wrong_aad), Err(Error::AuthenticationFailed)));
    }
}
