//! PBKDF2 key derivation over HMAC-SHA2.
//!
//! A [`Pbkdf2KeyGenerator`] holds defaults for salt, key width, iteration
//! count and digest. Each derivation may override any of them through
//! [`KeyOptions`]; whatever is still missing after that is an error.

use std::io;

use hmac::Hmac;
use sha2::{Sha224, Sha256, Sha384, Sha512, Sha512_224, Sha512_256};

use crate::error::{Error, Result};
use crate::hash::HashAlgorithm;
use crate::secret::{Passphrase, SecretBytes};

/// Per-call overrides. `None` falls back to the generator's default.
#[derive(Clone, Debug, Default)]
pub struct KeyOptions {
    pub salt: Option<Vec<u8>>,

    /// Key width in bits.
    pub key_width: Option<usize>,

    pub iterations: Option<u32>,

    pub digest: Option<HashAlgorithm>,
}

impl KeyOptions {
    #[must_use]
    pub fn with_salt(mut self, salt: &[u8]) -> Self {
        self.salt = Some(salt.to_vec());
        self
    }

    #[must_use]
    pub fn with_key_width(mut self, bits: usize) -> Self {
        self.key_width = Some(bits);
        self
    }

    #[must_use]
    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = Some(iterations);
        self
    }

    #[must_use]
    pub fn with_digest(mut self, digest: HashAlgorithm) -> Self {
        self.digest = Some(digest);
        self
    }
}

#[derive(Clone, Debug, Default)]
pub struct Pbkdf2KeyGenerator {
    salt: Option<Vec<u8>>,
    key_width: Option<usize>,
    iterations: Option<u32>,
    digest: Option<HashAlgorithm>,
}

impl Pbkdf2KeyGenerator {
    /// Builds a generator, validating every default that is set.
    ///
    /// # Errors
    ///
    /// The same errors as the individual setters.
    pub fn new(defaults: KeyOptions) -> Result<Self> {
        let mut generator = Self::default();
        if let Some(salt) = defaults.salt {
            generator.set_salt(&salt);
        }
        if let Some(bits) = defaults.key_width {
            generator.set_key_width(bits)?;
        }
        if let Some(iterations) = defaults.iterations {
            generator.set_iterations(iterations)?;
        }
        if let Some(digest) = defaults.digest {
            generator.set_digest(digest)?;
        }
        Ok(generator)
    }

    pub fn set_salt(&mut self, salt: &[u8]) -> &mut Self {
        self.salt = Some(salt.to_vec());
        self
    }

    pub fn salt(&self) -> Option<&[u8]> {
        self.salt.as_deref()
    }

    /// # Errors
    ///
    /// [`Error::KeyWidthInvalid`] unless `bits` is at least 8 and a multiple of 8.
    pub fn set_key_width(&mut self, bits: usize) -> Result<&mut Self> {
        self.key_width = Some(check_key_width(bits)?);
        Ok(self)
    }

    pub fn key_width(&self) -> Option<usize> {
        self.key_width
    }

    /// # Errors
    ///
    /// [`Error::IterationsInvalid`] for zero.
    pub fn set_iterations(&mut self, iterations: u32) -> Result<&mut Self> {
        self.iterations = Some(check_iterations(iterations)?);
        Ok(self)
    }

    pub fn iterations(&self) -> Option<u32> {
        self.iterations
    }

    /// # Errors
    ///
    /// [`Error::UnsupportedDigest`] for a digest HMAC cannot be built on.
    pub fn set_digest(&mut self, digest: HashAlgorithm) -> Result<&mut Self> {
        self.digest = Some(check_digest(digest)?);
        Ok(self)
    }

    pub fn digest(&self) -> Option<HashAlgorithm> {
        self.digest
    }

    /// Derives a key from `passphrase`.
    ///
    /// # Errors
    ///
    /// [`Error::MissingKdfParameter`] when a parameter is neither configured
    /// nor overridden, or the validation errors of the setters.
    pub fn derive(&self, passphrase: &Passphrase, overrides: &KeyOptions) -> Result<SecretBytes> {
        let params = self.resolve(overrides)?;
        params.run(passphrase.expose_secret().as_bytes())
    }

    /// Same as [`derive`](Self::derive), run on the blocking thread pool.
    pub async fn derive_async(&self, passphrase: &Passphrase, overrides: &KeyOptions) -> Result<SecretBytes> {
        let params = self.resolve(overrides)?;
        let passphrase = passphrase.clone();

        tokio::task::spawn_blocking(move || params.run(passphrase.expose_secret().as_bytes())).await.map_err(io::Error::from)?
    }

    fn resolve(&self, overrides: &KeyOptions) -> Result<Params> {
        let digest = overrides.digest.or(self.digest).ok_or(Error::MissingKdfParameter("digest"))?;
        let salt = overrides.salt.as_ref().or(self.salt.as_ref()).ok_or(Error::MissingKdfParameter("salt"))?;
        let iterations = overrides.iterations.or(self.iterations).ok_or(Error::MissingKdfParameter("iterations"))?;
        let key_width = overrides.key_width.or(self.key_width).ok_or(Error::MissingKdfParameter("key width"))?;

        Ok(Params { digest: check_digest(digest)?, salt: salt.clone(), iterations: check_iterations(iterations)?, key_len: check_key_width(key_width)? / 8 })
    }
}

struct Params {
    digest: HashAlgorithm,
    salt: Vec<u8>,
    iterations: u32,
    key_len: usize,
}

impl Params {
    fn run(&self, password: &[u8]) -> Result<SecretBytes> {
        tracing::debug!(digest = %self.digest, iterations = self.iterations, key_len = self.key_len, "deriving key");

        let mut key = vec![0u8; self.key_len];
        let salt = &self.salt;
        let rounds = self.iterations;
        let result = match self.digest {
            HashAlgorithm::Sha224 => ::pbkdf2::pbkdf2::<Hmac<Sha224>>(password, salt, rounds, &mut key),
            HashAlgorithm::Sha256 => ::pbkdf2::pbkdf2::<Hmac<Sha256>>(password, salt, rounds, &mut key),
            HashAlgorithm::Sha384 => ::pbkdf2::pbkdf2::<Hmac<Sha384>>(password, salt, rounds, &mut key),
            HashAlgorithm::Sha512 => ::pbkdf2::pbkdf2::<Hmac<Sha512>>(password, salt, rounds, &mut key),
            HashAlgorithm::Sha512_224 => ::pbkdf2::pbkdf2::<Hmac<Sha512_224>>(password, salt, rounds, &mut key),
            HashAlgorithm::Sha512_256 => ::pbkdf2::pbkdf2::<Hmac<Sha512_256>>(password, salt, rounds, &mut key),
            HashAlgorithm::Blake3 => return Err(Error::UnsupportedDigest(self.digest.to_string())),
        };
        result.map_err(|e| Error::engine(format!("pbkdf2 failed: {e}")))?;

        Ok(SecretBytes::from_vec(key))
    }
}

fn check_key_width(bits: usize) -> Result<usize> {
    if bits >= 8 && bits % 8 == 0 { Ok(bits) } else { Err(Error::KeyWidthInvalid(bits)) }
}

fn check_iterations(iterations: u32) -> Result<u32> {
    if iterations >= 1 { Ok(iterations) } else { Err(Error::IterationsInvalid(iterations)) }
}

fn check_digest(digest: HashAlgorithm) -> Result<HashAlgorithm> {
    match digest {
        HashAlgorithm::Blake3 => Err(Error::UnsupportedDigest(digest.to_string())),
        _ => Ok(digest),
    }
}
