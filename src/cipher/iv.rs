use std::fmt;

use super::descriptor::{IvGenerator, IvParams, IvValidator, KeyValidator, ModeDescriptor, NameResolver, Params};
use super::internal::Strategy;
use super::options::CipherOptions;
use super::validators::reject_auth_options;
use crate::engine::{Engine, RUST_CRYPTO};
use crate::error::{Error, Result};
use crate::types::Direction;

/// Builder for modes that chain from an IV but carry no authentication.
///
/// Encryption without an IV generates one and reports it in the result.
/// Decryption never generates: the exact IV used to encrypt must be given.
/// A well-formed but wrong IV is not detected and yields garbage.
#[derive(Clone, Copy)]
pub struct IvCipher {
    descriptor: ModeDescriptor,
    iv_validator: IvValidator,
    iv_generator: IvGenerator,
    engine: &'static dyn Engine,
}

impl IvCipher {
    pub const fn build(
        algorithm: &'static str,
        mode: &'static str,
        key_validator: KeyValidator,
        iv_validator: IvValidator,
        iv_generator: IvGenerator,
        resolver: NameResolver,
    ) -> Self {
        Self {
            descriptor: ModeDescriptor { algorithm, mode, key_validator, iv_validator: Some(iv_validator), iv_generator: Some(iv_generator), resolver },
            iv_validator,
            iv_generator,
            engine: RUST_CRYPTO,
        }
    }

    #[must_use]
    pub const fn with_engine(self, engine: &'static dyn Engine) -> Self {
        Self { engine, ..self }
    }
}

impl Strategy for IvCipher {
    fn descriptor(&self) -> ModeDescriptor {
        self.descriptor
    }

    fn engine(&self) -> &'static dyn Engine {
        self.engine
    }

    fn resolve<'a>(&self, options: &'a CipherOptions, auth_tag: Option<&'a [u8]>, direction: Direction) -> Result<Params<'a>> {
        let key = options.key.expose_secret();
        (self.descriptor.key_validator)(key)?;

        let iv = match (&options.iv, direction) {
            (Some(iv), _) => {
                (self.iv_validator)(key, iv)?;
                iv.clone()
            }
            (None, Direction::Encrypt) => self.generate_iv(key)?,
            (None, Direction::Decrypt) => return Err(Error::IvFormatInvalid),
        };

        reject_auth_options(&self.descriptor, options, auth_tag)?;

        Ok(Params::Iv(IvParams { key, iv, auto_padding: options.auto_padding }))
    }

    fn check_iv(&self, key: &[u8], iv: &[u8]) -> Result<()> {
        (self.iv_validator)(key, iv)
    }

    fn generate_iv(&self, key: &[u8]) -> Result<Vec<u8>> {
        let iv = (self.iv_generator)(key)?;
        (self.iv_validator)(key, &iv)?;

        tracing::debug!(cipher = %self.descriptor.name(), len = iv.len(), "generated iv");
        Ok(iv)
    }
}

impl fmt::Debug for IvCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IvCipher").field("name", &self.descriptor.name()).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cipher::{CipherMode, DecipherOptions, validators};

    fn ctr() -> IvCipher {
        IvCipher::build(
            "aes",
            "ctr",
            |key| validators::key_length_in(key, &[16, 24, 32]),
            |_, iv| validators::iv_length(iv, 16),
            |_| validators::random_iv(16),
            |len, mode| format!("aes-{}-{mode}", len * 8),
        )
    }

    #[test]
    fn test_generates_iv_on_encrypt() {
        let mode = ctr();
        let key = [4u8; 16];

        let result = mode.encrypt(b"counter mode text", &CipherOptions::new(&key)).unwrap();
        let iv = result.info.iv.clone().unwrap();
        assert_eq!(iv.len(), 16);
        assert!(mode.validate_iv(&key, &iv));
        assert_eq!(result.info.cipher, "aes-128-ctr");

        let plaintext = mode.decrypt(&result.ciphertext, &result.decipher_options(&key)).unwrap();
        assert_eq!(plaintext, b"counter mode text");
    }

    #[test]
    fn test_supplied_iv_is_used_verbatim() {
        let mode = ctr();
        let options = CipherOptions::new(&[4u8; 32]).with_iv(&[8u8; 16]);
        let a = mode.encrypt(b"deterministic", &options).unwrap();
        let b = mode.encrypt(b"deterministic", &options).unwrap();
        assert_eq!(a.ciphertext, b.ciphertext);
        assert_eq!(a.info.iv.as_deref(), Some(&[8u8; 16][..]));
    }

    #[test]
    fn test_decrypt_requires_iv() {
        let mode = ctr();
        assert!(matches!(mode.decrypt(b"abc", &DecipherOptions::new(&[0u8; 16])), Err(Error::IvFormatInvalid)));

        let short = DecipherOptions::from(CipherOptions::new(&[0u8; 16]).with_iv(&[0u8; 8]));
        assert!(matches!(mode.decrypt(b"abc", &short), Err(Error::IvLengthInvalid { length: 8 })));
    }

    #[test]
    fn test_key_checked_before_iv() {
        let mode = ctr();
        let options = DecipherOptions::from(CipherOptions::new(&[0u8; 5]).with_iv(&[0u8; 3]));
        assert!(matches!(mode.decrypt(b"abc", &options), Err(Error::KeyLengthInvalid { length: 5 })));
    }

    #[test]
    fn test_wrong_iv_decrypts_to_garbage() {
        let mode = ctr();
        let key = [2u8; 24];
        let result = mode.encrypt(b"no integrity here", &CipherOptions::new(&key).with_iv(&[1u8; 16])).unwrap();

        let wrong = DecipherOptions::from(CipherOptions::new(&key).with_iv(&[2u8; 16]));
        assert_ne!(mode.decrypt(&result.ciphertext, &wrong).unwrap(), b"no integrity here");
    }

    #[test]
    fn test_aad_rejected() {
        let mode = ctr();
        let options = CipherOptions::new(&[0u8; 16]).with_aad(b"header");
        assert!(matches!(mode.encrypt(b"x", &options), Err(Error::AadFormatInvalid)));
    }
}
