//! # Transform Engine
//!
//! The boundary between the cipher-mode layer and the code that actually
//! runs block and stream primitives. Modes never touch a primitive directly:
//! they name one (`aes-256-gcm`, `chacha20`, ...) and ask an [`Engine`] for a
//! [`Transform`] that consumes input incrementally.
//!
//! ## Transforms
//!
//! - **Block** (ECB, CBC): whole blocks are emitted as they fill up; PKCS#7
//!   auto-padding is on unless switched off.
//! - **Keystream** (CFB, OFB, CTR, ChaCha20, RC4): output mirrors input byte
//!   for byte.
//! - **Sealed** (GCM, CCM, ChaCha20-Poly1305, XTS): the whole message is
//!   processed at finalisation. Authenticated decryption fails there with
//!   [`Error::AuthenticationFailed`] and releases nothing.
//!
//! [`RustCrypto`] is the stock engine. Any other implementation can be
//! plugged into a mode with `with_engine`.

mod block;
mod keystream;
mod primitive;
mod sealed;

use rand::RngCore;
use rand::rngs::OsRng;

pub use primitive::{AesMode, Primitive};

use self::block::BlockTransform;
use self::keystream::KeystreamTransform;
use self::sealed::{AeadKind, AeadTransform, XtsTransform};
use crate::error::{Error, Result};
use crate::types::Direction;

/// Options fixed when a transform is created.
#[derive(Clone, Copy, Debug, Default)]
pub struct TransformOptions {
    /// Tag length for authenticated primitives.
    pub auth_tag_length: Option<usize>,
}

/// An incremental encryption or decryption in progress.
///
/// Configuration calls (`set_*`) must happen before the first
/// [`update`](Transform::update). After [`finalize`](Transform::finalize) the
/// transform is spent and every further call fails.
pub trait Transform: Send {
    /// Toggles PKCS#7 padding. Ignored by modes without padding.
    fn set_auto_padding(&mut self, enabled: bool) -> Result<()> {
        let _ = enabled;
        Ok(())
    }

    /// Sets the additional authenticated data and, for CCM, the message length.
    fn set_aad(&mut self, aad: &[u8], plaintext_length: Option<usize>) -> Result<()> {
        let _ = (aad, plaintext_length);
        Err(Error::engine("this primitive does not take additional authenticated data"))
    }

    /// Supplies the tag to verify at finalisation.
    fn set_auth_tag(&mut self, tag: &[u8]) -> Result<()> {
        let _ = tag;
        Err(Error::engine("this primitive does not take an authentication tag"))
    }

    fn update(&mut self, input: &[u8]) -> Result<Vec<u8>>;

    fn finalize(&mut self) -> Result<Vec<u8>>;

    /// The tag produced by a finalised authenticated encryption.
    fn auth_tag(&self) -> Option<Vec<u8>> {
        None
    }

    /// Feeds `input` and finalises in one call.
    fn run(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        let mut output = self.update(input)?;
        output.extend(self.finalize()?);
        Ok(output)
    }
}

/// Source of transforms and randomness.
pub trait Engine: Send + Sync {
    fn create_forward(&self, primitive: &str, key: &[u8], iv: &[u8], options: &TransformOptions) -> Result<Box<dyn Transform>>;

    fn create_reverse(&self, primitive: &str, key: &[u8], iv: &[u8], options: &TransformOptions) -> Result<Box<dyn Transform>>;

    fn random_bytes(&self, len: usize) -> Result<Vec<u8>> {
        random_bytes(len)
    }

    fn create(&self, direction: Direction, primitive: &str, key: &[u8], iv: &[u8], options: &TransformOptions) -> Result<Box<dyn Transform>> {
        match direction {
            Direction::Encrypt => self.create_forward(primitive, key, iv, options),
            Direction::Decrypt => self.create_reverse(primitive, key, iv, options),
        }
    }
}

/// Fills a fresh buffer from the operating system CSPRNG.
pub fn random_bytes(len: usize) -> Result<Vec<u8>> {
    let mut bytes = vec![0u8; len];
    OsRng.try_fill_bytes(&mut bytes).map_err(|e| Error::engine(format!("random number generator failed: {e}")))?;
    Ok(bytes)
}

/// Engine backed by the RustCrypto block, stream and AEAD crates.
#[derive(Clone, Copy, Debug, Default)]
pub struct RustCrypto;

/// Shared instance used by every catalog mode.
pub const RUST_CRYPTO: &dyn Engine = &RustCrypto;

impl RustCrypto {
    fn open(direction: Direction, id: &str, key: &[u8], iv: &[u8], options: &TransformOptions) -> Result<Box<dyn Transform>> {
        let primitive: Primitive = id.parse()?;
        primitive.check_key(key)?;

        tracing::debug!(%primitive, %direction, iv_len = iv.len(), "opening transform");

        let transform: Box<dyn Transform> = match primitive {
            Primitive::Aes { bits, mode } => match mode {
                AesMode::Ecb | AesMode::Cbc => Box::new(BlockTransform::new(bits, mode, direction, key, iv)?),
                AesMode::Cfb | AesMode::Ofb | AesMode::Ctr => Box::new(KeystreamTransform::aes(bits, mode, direction, key, iv)?),
                AesMode::Xts => Box::new(XtsTransform::new(direction, key, iv)?),
                AesMode::Gcm => Box::new(AeadTransform::new(AeadKind::Gcm, direction, key, iv, options)?),
                AesMode::Ccm => Box::new(AeadTransform::new(AeadKind::Ccm, direction, key, iv, options)?),
            },
            Primitive::ChaCha20 => Box::new(KeystreamTransform::chacha20(key, iv)?),
            Primitive::ChaCha20Poly1305 => Box::new(AeadTransform::new(AeadKind::ChaCha20Poly1305, direction, key, iv, options)?),
            Primitive::Rc4 => Box::new(KeystreamTransform::rc4(key)?),
        };
        Ok(transform)
    }
}

impl Engine for RustCrypto {
    fn create_forward(&self, primitive: &str, key: &[u8], iv: &[u8], options: &TransformOptions) -> Result<Box<dyn Transform>> {
        Self::open(Direction::Encrypt, primitive, key, iv, options)
    }

    fn create_reverse(&self, primitive: &str, key: &[u8], iv: &[u8], options: &TransformOptions) -> Result<Box<dyn Transform>> {
        Self::open(Direction::Decrypt, primitive, key, iv, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_bytes_length_and_freshness() {
        let a = random_bytes(32).unwrap();
        let b = random_bytes(32).unwrap();
        assert_eq!(a.len(), 32);
        assert_ne!(a, b);
        assert!(random_bytes(0).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_primitive() {
        assert!(matches!(RustCrypto.create_forward("aes-128-foo", &[0u8; 16], &[], &TransformOptions::default()), Err(Error::UnsupportedPrimitive(_))));
    }

    #[test]
    fn test_key_width_mismatch_is_refused() {
        let result = RustCrypto.create_forward("aes-256-cbc", &[0u8; 16], &[0u8; 16], &TransformOptions::default());
        assert!(matches!(result, Err(Error::UnsupportedPrimitive(_))));
    }

    #[test]
    fn test_keystream_rejects_aad_and_tag() {
        let mut transform = RustCrypto.create_forward("aes-128-ctr", &[0u8; 16], &[0u8; 16], &TransformOptions::default()).unwrap();
        assert!(transform.set_aad(b"aad", None).is_err());
        assert!(transform.set_auth_tag(&[0u8; 16]).is_err());
    }

    #[test]
    fn test_every_primitive_roundtrips() {
        let cases: &[(&str, usize, usize)] = &[
            ("aes-128-ecb", 16, 0),
            ("aes-192-cbc", 24, 16),
            ("aes-256-cfb", 32, 16),
            ("aes-128-ofb", 16, 16),
            ("aes-192-ctr", 24, 16),
            ("aes-256-xts", 64, 16),
            ("aes-128-gcm", 16, 12),
            ("chacha20", 32, 16),
            ("chacha20-poly1305", 32, 12),
            ("rc4", 5, 0),
        ];
        let plaintext = b"the quick brown fox jumps over the lazy dog";

        for &(id, key_len, iv_len) in cases {
            let key: Vec<u8> = (1..=key_len).map(|i| u8::try_from(i).unwrap()).collect();
            let iv = vec![0x24u8; iv_len];
            let options = TransformOptions::default();

            let mut forward = RustCrypto.create_forward(id, &key, &iv, &options).unwrap();
            let ciphertext = forward.run(plaintext).unwrap();
            assert_ne!(&ciphertext[..], &plaintext[..], "{id}");

            let mut reverse = RustCrypto.create_reverse(id, &key, &iv, &options).unwrap();
            if let Some(tag) = forward.auth_tag() {
                reverse.set_auth_tag(&tag).unwrap();
            }
            assert_eq!(reverse.run(&ciphertext).unwrap(), plaintext, "{id}");
        }
    }
}
