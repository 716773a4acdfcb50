use std::fmt;

use super::options::{CipherInfo, CipherOptions};
use crate::engine::TransformOptions;
use crate::error::Result;
use crate::types::Direction;

/// Checks that a key fits the algorithm.
pub type KeyValidator = fn(&[u8]) -> Result<()>;

/// Checks an IV given the key it will be used with.
pub type IvValidator = fn(&[u8], &[u8]) -> Result<()>;

/// Produces a fresh random IV for the key.
pub type IvGenerator = fn(&[u8]) -> Result<Vec<u8>>;

/// Maps `(key length in bytes, mode)` to the primitive id handed to the engine.
pub type NameResolver = fn(usize, &str) -> String;

/// Validates and normalises the full option set of an authenticated mode.
pub type OptionsValidator = for<'a> fn(&'a CipherOptions, Option<&'a [u8]>, Direction) -> Result<AuthParams<'a>>;

/// Static description of one mode: its names and the rules it enforces.
#[derive(Clone, Copy)]
pub struct ModeDescriptor {
    pub algorithm: &'static str,
    pub mode: &'static str,
    pub key_validator: KeyValidator,
    pub iv_validator: Option<IvValidator>,
    pub iv_generator: Option<IvGenerator>,
    pub resolver: NameResolver,
}

impl ModeDescriptor {
    /// Catalog name: `algorithm-mode`, or just the algorithm when the mode is empty.
    pub fn name(&self) -> String {
        if self.mode.is_empty() { self.algorithm.to_owned() } else { format!("{}-{}", self.algorithm, self.mode) }
    }

    /// Primitive id for a key of `key_len` bytes.
    pub fn primitive(&self, key_len: usize) -> String {
        (self.resolver)(key_len, self.mode)
    }

    #[inline]
    pub fn requires_iv(&self) -> bool {
        self.iv_validator.is_some()
    }
}

impl fmt::Debug for ModeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModeDescriptor").field("algorithm", &self.algorithm).field("mode", &self.mode).field("requires_iv", &self.requires_iv()).finish_non_exhaustive()
    }
}

#[derive(Clone, Debug)]
pub struct PlainParams<'a> {
    pub key: &'a [u8],
    pub auto_padding: Option<bool>,
}

#[derive(Clone, Debug)]
pub struct IvParams<'a> {
    pub key: &'a [u8],
    pub iv: Vec<u8>,
    pub auto_padding: Option<bool>,
}

/// Fully resolved options of an authenticated mode.
#[derive(Clone, Debug)]
pub struct AuthParams<'a> {
    pub key: &'a [u8],
    pub iv: Vec<u8>,
    pub aad: Option<&'a [u8]>,
    pub plaintext_length: Option<usize>,
    pub auth_tag_length: usize,
    /// Only set when decrypting.
    pub auth_tag: Option<&'a [u8]>,
    pub auto_padding: Option<bool>,
}

/// Validated options, shaped by the kind of mode they were resolved for.
#[derive(Clone, Debug)]
pub enum Params<'a> {
    Plain(PlainParams<'a>),
    Iv(IvParams<'a>),
    Auth(AuthParams<'a>),
}

impl Params<'_> {
    pub fn key(&self) -> &[u8] {
        match self {
            Self::Plain(p) => p.key,
            Self::Iv(p) => p.key,
            Self::Auth(p) => p.key,
        }
    }

    /// The IV, empty for modes without one.
    pub fn iv(&self) -> &[u8] {
        match self {
            Self::Plain(_) => &[],
            Self::Iv(p) => &p.iv,
            Self::Auth(p) => &p.iv,
        }
    }

    pub fn auto_padding(&self) -> Option<bool> {
        match self {
            Self::Plain(p) => p.auto_padding,
            Self::Iv(p) => p.auto_padding,
            Self::Auth(p) => p.auto_padding,
        }
    }

    pub fn transform_options(&self) -> TransformOptions {
        match self {
            Self::Auth(p) => TransformOptions { auth_tag_length: Some(p.auth_tag_length) },
            _ => TransformOptions::default(),
        }
    }

    pub(crate) fn info(&self, cipher: String, auth_tag: Option<Vec<u8>>) -> CipherInfo {
        let mut info = CipherInfo { cipher, iv: None, auth_tag: None, aad: None, plaintext_length: None, auth_tag_length: None, auto_padding: self.auto_padding() };
        match self {
            Self::Plain(_) => {}
            Self::Iv(p) => info.iv = Some(p.iv.clone()),
            Self::Auth(p) => {
                info.iv = Some(p.iv.clone());
                info.aad = p.aad.map(<[u8]>::to_vec);
                info.plaintext_length = p.plaintext_length;
                info.auth_tag_length = Some(p.auth_tag_length);
                info.auth_tag = auth_tag;
            }
        }
        info
    }
}
