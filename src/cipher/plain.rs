use std::fmt;

use super::descriptor::{KeyValidator, ModeDescriptor, NameResolver, Params, PlainParams};
use super::internal::Strategy;
use super::options::CipherOptions;
use super::validators::reject_auth_options;
use crate::engine::{Engine, RUST_CRYPTO};
use crate::error::Result;
use crate::types::Direction;

/// Builder for modes that take a key and nothing else.
#[derive(Clone, Copy)]
pub struct PlainCipher {
    descriptor: ModeDescriptor,
    engine: &'static dyn Engine,
    deprecated: bool,
}

impl PlainCipher {
    pub const fn build(algorithm: &'static str, mode: &'static str, key_validator: KeyValidator, resolver: NameResolver) -> Self {
        Self {
            descriptor: ModeDescriptor { algorithm, mode, key_validator, iv_validator: None, iv_generator: None, resolver },
            engine: RUST_CRYPTO,
            deprecated: false,
        }
    }

    /// Marks the mode as unsafe for new data; every encryption logs a warning.
    #[must_use]
    pub const fn deprecated(self) -> Self {
        Self { deprecated: true, ..self }
    }

    #[must_use]
    pub const fn with_engine(self, engine: &'static dyn Engine) -> Self {
        Self { engine, ..self }
    }

    #[inline]
    pub const fn is_deprecated(&self) -> bool {
        self.deprecated
    }
}

impl Strategy for PlainCipher {
    fn descriptor(&self) -> ModeDescriptor {
        self.descriptor
    }

    fn engine(&self) -> &'static dyn Engine {
        self.engine
    }

    fn resolve<'a>(&self, options: &'a CipherOptions, auth_tag: Option<&'a [u8]>, direction: Direction) -> Result<Params<'a>> {
        let key = options.key.expose_secret();
        (self.descriptor.key_validator)(key)?;
        reject_auth_options(&self.descriptor, options, auth_tag)?;

        if options.iv.is_some() {
            tracing::debug!(cipher = %self.descriptor.name(), "ignoring iv for a mode without one");
        }
        if self.deprecated && direction == Direction::Encrypt {
            tracing::warn!(cipher = %self.descriptor.name(), "encrypting with a deprecated mode");
        }

        Ok(Params::Plain(PlainParams { key, auto_padding: options.auto_padding }))
    }

    fn check_iv(&self, _key: &[u8], _iv: &[u8]) -> Result<()> {
        Ok(())
    }

    fn generate_iv(&self, _key: &[u8]) -> Result<Vec<u8>> {
        Ok(Vec::new())
    }
}

impl fmt::Debug for PlainCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlainCipher").field("name", &self.descriptor.name()).field("deprecated", &self.deprecated).finish_non_exhaustive()
    }
}
