//! # Cipher Modes
//!
//! One interface, [`CipherMode`], over every supported block, stream and
//! authenticated mode. Modes are stateless descriptions; all per-operation
//! state lives in the engine transform created for that operation, so a
//! single mode value can be shared freely between threads.
//!
//! ## Builders
//!
//! Three builders produce modes, one per option shape:
//!
//! - [`PlainCipher`]: key only (AES-ECB, RC4).
//! - [`IvCipher`]: key and IV (AES-CBC/CFB/OFB/CTR/XTS, ChaCha20).
//! - [`AuthCipher`]: key, IV, AAD and tag (AES-GCM/CCM, ChaCha20-Poly1305).
//!
//! Each is a `const fn` taking plain function pointers, so catalog entries
//! are ordinary `static` values.
//!
//! ## Validation
//!
//! Options are checked in a fixed order (key, IV, then the authenticated
//! fields) and the checked result is a new [`Params`] value; the caller's
//! options are never modified. Every validation error is raised before the
//! engine is touched.
//!
//! ## Integrity
//!
//! Only [`AuthCipher`] modes detect tampering. The others decrypt modified
//! ciphertext into garbage without complaint.

mod auth;
pub mod catalog;
mod descriptor;
mod iv;
mod options;
mod plain;
mod stream;
pub mod validators;

pub use auth::{AuthCipher, AuthPolicy};
pub use descriptor::{AuthParams, IvGenerator, IvParams, IvValidator, KeyValidator, ModeDescriptor, NameResolver, OptionsValidator, Params, PlainParams};
pub use iv::IvCipher;
pub use options::{CipherInfo, CipherOptions, DecipherOptions, EncryptionResult};
pub use plain::PlainCipher;
pub use stream::CipherStream;

use crate::engine::{Engine, Transform};
use crate::error::Result;
use crate::types::Direction;

mod internal {
    use super::{CipherOptions, Engine, ModeDescriptor, Params, Result};
    use crate::types::Direction;

    /// What distinguishes one builder from another.
    pub trait Strategy: Clone + Send + Sync + 'static {
        fn descriptor(&self) -> ModeDescriptor;

        fn engine(&self) -> &'static dyn Engine;

        /// Validates `options` in order and returns the resolved parameters.
        fn resolve<'a>(&self, options: &'a CipherOptions, auth_tag: Option<&'a [u8]>, direction: Direction) -> Result<Params<'a>>;

        fn check_iv(&self, key: &[u8], iv: &[u8]) -> Result<()>;

        fn generate_iv(&self, key: &[u8]) -> Result<Vec<u8>>;
    }
}

use internal::Strategy;

/// The uniform operation set every mode exposes.
pub trait CipherMode: Send + Sync {
    fn descriptor(&self) -> ModeDescriptor;

    fn algorithm(&self) -> &'static str {
        self.descriptor().algorithm
    }

    fn mode(&self) -> &'static str {
        self.descriptor().mode
    }

    /// Catalog name, e.g. `aes-gcm` or `rc4`.
    fn name(&self) -> String {
        self.descriptor().name()
    }

    fn validate_key(&self, key: &[u8]) -> bool;

    /// Always `true` for modes without an IV.
    fn validate_iv(&self, key: &[u8], iv: &[u8]) -> bool;

    /// A fresh random IV. Empty for modes without one.
    fn generate_iv(&self, key: &[u8]) -> Result<Vec<u8>>;

    /// Encrypts a whole buffer, generating an IV when none is given.
    ///
    /// # Errors
    ///
    /// Any validation error for bad options, or an engine error.
    fn encrypt(&self, plaintext: &[u8], options: &CipherOptions) -> Result<EncryptionResult>;

    /// Decrypts a whole buffer.
    ///
    /// # Errors
    ///
    /// Validation errors as for [`encrypt`](CipherMode::encrypt), plus
    /// [`crate::Error::AuthenticationFailed`] when an authenticated mode
    /// rejects the input.
    fn decrypt(&self, ciphertext: &[u8], options: &DecipherOptions) -> Result<Vec<u8>>;

    fn create_encryption_stream(&self, options: &CipherOptions) -> Result<CipherStream>;

    fn create_decryption_stream(&self, options: &DecipherOptions) -> Result<CipherStream>;

    /// An independent copy with the same configuration.
    fn clone_fresh_instance(&self) -> Box<dyn CipherMode>;
}

fn open<S: Strategy>(strategy: &S, params: &Params<'_>, direction: Direction) -> Result<(String, Box<dyn Transform>)> {
    let primitive = Strategy::descriptor(strategy).primitive(params.key().len());
    let mut transform = strategy.engine().create(direction, &primitive, params.key(), params.iv(), &params.transform_options())?;

    if let Some(enabled) = params.auto_padding() {
        transform.set_auto_padding(enabled)?;
    }

    if let Params::Auth(auth) = params {
        if auth.aad.is_some() || auth.plaintext_length.is_some() {
            transform.set_aad(auth.aad.unwrap_or_default(), auth.plaintext_length)?;
        }
        if let (Direction::Decrypt, Some(tag)) = (direction, auth.auth_tag) {
            transform.set_auth_tag(tag)?;
        }
    }

    Ok((primitive, transform))
}

impl<S: Strategy> CipherMode for S {
    fn descriptor(&self) -> ModeDescriptor {
        Strategy::descriptor(self)
    }

    fn validate_key(&self, key: &[u8]) -> bool {
        (Strategy::descriptor(self).key_validator)(key).is_ok()
    }

    fn validate_iv(&self, key: &[u8], iv: &[u8]) -> bool {
        self.check_iv(key, iv).is_ok()
    }

    fn generate_iv(&self, key: &[u8]) -> Result<Vec<u8>> {
        Strategy::generate_iv(self, key)
    }

    fn encrypt(&self, plaintext: &[u8], options: &CipherOptions) -> Result<EncryptionResult> {
        let params = self.resolve(options, None, Direction::Encrypt)?;
        let (cipher, mut transform) = open(self, &params, Direction::Encrypt)?;
        let ciphertext = transform.run(plaintext)?;

        tracing::debug!(%cipher, input = plaintext.len(), output = ciphertext.len(), "encrypted buffer");

        Ok(EncryptionResult { ciphertext, info: params.info(cipher, transform.auth_tag()) })
    }

    fn decrypt(&self, ciphertext: &[u8], options: &DecipherOptions) -> Result<Vec<u8>> {
        let params = self.resolve(&options.options, options.auth_tag.as_deref(), Direction::Decrypt)?;
        let (cipher, mut transform) = open(self, &params, Direction::Decrypt)?;
        let plaintext = transform.run(ciphertext)?;

        tracing::debug!(%cipher, input = ciphertext.len(), output = plaintext.len(), "decrypted buffer");

        Ok(plaintext)
    }

    fn create_encryption_stream(&self, options: &CipherOptions) -> Result<CipherStream> {
        let params = self.resolve(options, None, Direction::Encrypt)?;
        let (cipher, transform) = open(self, &params, Direction::Encrypt)?;
        Ok(CipherStream::new(transform, Direction::Encrypt, params.info(cipher, None)))
    }

    fn create_decryption_stream(&self, options: &DecipherOptions) -> Result<CipherStream> {
        let params = self.resolve(&options.options, options.auth_tag.as_deref(), Direction::Decrypt)?;
        let (cipher, transform) = open(self, &params, Direction::Decrypt)?;
        Ok(CipherStream::new(transform, Direction::Decrypt, params.info(cipher, None)))
    }

    fn clone_fresh_instance(&self) -> Box<dyn CipherMode> {
        Box::new(self.clone())
    }
}
