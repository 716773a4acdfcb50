//! Building blocks for the per-algorithm key and IV rules.

use std::ops::RangeBounds;

use super::descriptor::ModeDescriptor;
use super::options::CipherOptions;
use crate::engine;
use crate::error::{Error, Result};

/// The key must be present and non-empty.
pub fn require_key(key: &[u8]) -> Result<()> {
    if key.is_empty() { Err(Error::KeyFormatInvalid) } else { Ok(()) }
}

/// The key must have one of the listed lengths.
pub fn key_length_in(key: &[u8], lengths: &[usize]) -> Result<()> {
    require_key(key)?;
    if lengths.contains(&key.len()) { Ok(()) } else { Err(Error::KeyLengthInvalid { length: key.len() }) }
}

/// The IV must be exactly `expected` bytes.
pub fn iv_length(iv: &[u8], expected: usize) -> Result<()> {
    if iv.len() == expected { Ok(()) } else { Err(Error::IvLengthInvalid { length: iv.len() }) }
}

/// The IV length must fall in `range`.
pub fn iv_length_in<R: RangeBounds<usize>>(iv: &[u8], range: R) -> Result<()> {
    if range.contains(&iv.len()) { Ok(()) } else { Err(Error::IvLengthInvalid { length: iv.len() }) }
}

#[inline]
pub fn random_iv(len: usize) -> Result<Vec<u8>> {
    engine::random_bytes(len)
}

/// Rejects the fields only authenticated modes understand.
pub(crate) fn reject_auth_options(descriptor: &ModeDescriptor, options: &CipherOptions, auth_tag: Option<&[u8]>) -> Result<()> {
    if options.aad.is_some() {
        return Err(Error::AadFormatInvalid);
    }

    let unsupported = [
        ("auth_tag", auth_tag.is_some()),
        ("auth_tag_length", options.auth_tag_length.is_some()),
        ("plaintext_length", options.plaintext_length.is_some()),
    ];
    match unsupported.into_iter().find(|(_, present)| *present) {
        Some((option, _)) => Err(Error::OptionNotSupported { option, cipher: descriptor.name() }),
        None => Ok(()),
    }
}
