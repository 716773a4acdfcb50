use std::fmt;

use super::descriptor::{AuthParams, IvGenerator, IvValidator, KeyValidator, ModeDescriptor, NameResolver, OptionsValidator, Params};
use super::internal::Strategy;
use super::options::CipherOptions;
use crate::engine::{Engine, RUST_CRYPTO};
use crate::error::{Error, Result};
use crate::types::Direction;

/// Cross-field rules of one authenticated mode.
///
/// [`validate`](AuthPolicy::validate) checks, in order: key, IV (generated
/// when encrypting without one), AAD, tag length, plaintext length and, when
/// decrypting, the tag itself. The first rule broken is the one reported.
///
/// The tag length is resolved as the fixed length if the mode has one, else
/// the explicit `auth_tag_length`, else the length of the supplied tag, else
/// the mode default. With none of these the call fails.
#[derive(Clone, Copy, Debug)]
pub struct AuthPolicy {
    pub key_validator: KeyValidator,
    pub iv_validator: IvValidator,
    pub iv_generator: IvGenerator,
    pub aad_required: bool,
    pub plaintext_length_required: bool,
    pub tag_lengths: &'static [usize],
    pub default_tag_length: Option<usize>,
    pub fixed_tag_length: Option<usize>,
}

impl AuthPolicy {
    pub fn validate<'a>(&self, options: &'a CipherOptions, auth_tag: Option<&'a [u8]>, direction: Direction) -> Result<AuthParams<'a>> {
        let key = options.key.expose_secret();
        (self.key_validator)(key)?;

        let iv = match (&options.iv, direction) {
            (Some(iv), _) => {
                (self.iv_validator)(key, iv)?;
                iv.clone()
            }
            (None, Direction::Encrypt) => {
                let iv = (self.iv_generator)(key)?;
                (self.iv_validator)(key, &iv)?;
                tracing::debug!(len = iv.len(), "generated nonce");
                iv
            }
            (None, Direction::Decrypt) => return Err(Error::IvFormatInvalid),
        };

        let aad = options.aad.as_deref();
        if aad.is_none() && self.aad_required {
            return Err(Error::AadRequired);
        }

        let auth_tag_length = self.tag_length(options.auth_tag_length, auth_tag)?;

        if options.plaintext_length.is_none() && self.plaintext_length_required {
            return Err(Error::PlaintextLengthRequired);
        }

        let auth_tag = match direction {
            Direction::Encrypt => None,
            Direction::Decrypt => {
                let tag = auth_tag.ok_or(Error::AuthTagRequired)?;
                if tag.len() != auth_tag_length {
                    return Err(Error::AuthTagLengthInvalid { length: tag.len() });
                }
                Some(tag)
            }
        };

        Ok(AuthParams { key, iv, aad, plaintext_length: options.plaintext_length, auth_tag_length, auth_tag, auto_padding: options.auto_padding })
    }

    fn tag_length(&self, explicit: Option<usize>, auth_tag: Option<&[u8]>) -> Result<usize> {
        if let Some(fixed) = self.fixed_tag_length {
            if explicit.is_some_and(|length| length != fixed) {
                tracing::debug!(fixed, "ignoring auth_tag_length for a mode with a fixed tag");
            }
            return Ok(fixed);
        }

        let length = explicit.or(auth_tag.map(<[u8]>::len)).or(self.default_tag_length).ok_or(Error::AuthTagLengthRequired)?;
        if self.tag_lengths.contains(&length) { Ok(length) } else { Err(Error::AuthTagLengthInvalid { length }) }
    }
}

/// Builder for authenticated (AEAD) modes.
#[derive(Clone, Copy)]
pub struct AuthCipher {
    descriptor: ModeDescriptor,
    iv_validator: IvValidator,
    iv_generator: IvGenerator,
    options_validator: OptionsValidator,
    engine: &'static dyn Engine,
}

impl AuthCipher {
    pub const fn build(
        algorithm: &'static str,
        mode: &'static str,
        key_validator: KeyValidator,
        iv_validator: IvValidator,
        options_validator: OptionsValidator,
        iv_generator: IvGenerator,
        resolver: NameResolver,
    ) -> Self {
        Self {
            descriptor: ModeDescriptor { algorithm, mode, key_validator, iv_validator: Some(iv_validator), iv_generator: Some(iv_generator), resolver },
            iv_validator,
            iv_generator,
            options_validator,
            engine: RUST_CRYPTO,
        }
    }

    #[must_use]
    pub const fn with_engine(self, engine: &'static dyn Engine) -> Self {
        Self { engine, ..self }
    }
}

impl Strategy for AuthCipher {
    fn descriptor(&self) -> ModeDescriptor {
        self.descriptor
    }

    fn engine(&self) -> &'static dyn Engine {
        self.engine
    }

    fn resolve<'a>(&self, options: &'a CipherOptions, auth_tag: Option<&'a [u8]>, direction: Direction) -> Result<Params<'a>> {
        (self.options_validator)(options, auth_tag, direction).map(Params::Auth)
    }

    fn check_iv(&self, key: &[u8], iv: &[u8]) -> Result<()> {
        (self.iv_validator)(key, iv)
    }

    fn generate_iv(&self, key: &[u8]) -> Result<Vec<u8>> {
        (self.iv_generator)(key)
    }
}

impl fmt::Debug for AuthCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthCipher").field("name", &self.descriptor.name()).finish_non_exhaustive()
    }
}
