//! AES in every supported mode.
//!
//! All modes accept 128, 192 and 256-bit keys except XTS, which takes two
//! keys back to back (256 or 512 bits in total). The primitive id is
//! `aes-<bits>-<mode>`; for XTS the bit count is that of one half.

use crate::cipher::validators::{iv_length, iv_length_in, key_length_in, random_iv};
use crate::cipher::{AuthCipher, AuthParams, AuthPolicy, CipherOptions, IvCipher, PlainCipher};
use crate::config::{
    AES_IV_SIZE, AES_KEY_SIZES, CCM_IV_SIZE, CCM_IV_SIZES, CCM_TAG_SIZES, GCM_DEFAULT_TAG_SIZE, GCM_IV_SIZE, GCM_MAX_IV_SIZE, GCM_TAG_SIZES, XTS_KEY_SIZES,
};
use crate::error::Result;
use crate::types::Direction;

fn aes_key(key: &[u8]) -> Result<()> {
    key_length_in(key, AES_KEY_SIZES)
}

fn xts_key(key: &[u8]) -> Result<()> {
    key_length_in(key, XTS_KEY_SIZES)
}

fn block_iv(_key: &[u8], iv: &[u8]) -> Result<()> {
    iv_length(iv, AES_IV_SIZE)
}

fn block_iv_source(_key: &[u8]) -> Result<Vec<u8>> {
    random_iv(AES_IV_SIZE)
}

fn gcm_iv(_key: &[u8], iv: &[u8]) -> Result<()> {
    iv_length_in(iv, 1..=GCM_MAX_IV_SIZE)
}

fn gcm_iv_source(_key: &[u8]) -> Result<Vec<u8>> {
    random_iv(GCM_IV_SIZE)
}

fn ccm_iv(_key: &[u8], iv: &[u8]) -> Result<()> {
    iv_length_in(iv, CCM_IV_SIZES)
}

fn ccm_iv_source(_key: &[u8]) -> Result<Vec<u8>> {
    random_iv(CCM_IV_SIZE)
}

fn resolve(key_len: usize, mode: &str) -> String {
    format!("aes-{}-{mode}", key_len * 8)
}

fn resolve_xts(key_len: usize, mode: &str) -> String {
    format!("aes-{}-{mode}", key_len * 4)
}

const GCM_POLICY: AuthPolicy = AuthPolicy {
    key_validator: aes_key,
    iv_validator: gcm_iv,
    iv_generator: gcm_iv_source,
    aad_required: false,
    plaintext_length_required: false,
    tag_lengths: GCM_TAG_SIZES,
    default_tag_length: Some(GCM_DEFAULT_TAG_SIZE),
    fixed_tag_length: None,
};

const CCM_POLICY: AuthPolicy = AuthPolicy {
    key_validator: aes_key,
    iv_validator: ccm_iv,
    iv_generator: ccm_iv_source,
    aad_required: true,
    plaintext_length_required: true,
    tag_lengths: CCM_TAG_SIZES,
    default_tag_length: None,
    fixed_tag_length: None,
};

fn gcm_options<'a>(options: &'a CipherOptions, auth_tag: Option<&'a [u8]>, direction: Direction) -> Result<AuthParams<'a>> {
    GCM_POLICY.validate(options, auth_tag, direction)
}

fn ccm_options<'a>(options: &'a CipherOptions, auth_tag: Option<&'a [u8]>, direction: Direction) -> Result<AuthParams<'a>> {
    CCM_POLICY.validate(options, auth_tag, direction)
}

/// AES-ECB. Identical plaintext blocks give identical ciphertext blocks.
#[deprecated(note = "ECB leaks plaintext patterns; use AES_GCM or AES_CBC")]
pub static AES_ECB: PlainCipher = PlainCipher::build("aes", "ecb", aes_key, resolve).deprecated();

pub static AES_CBC: IvCipher = IvCipher::build("aes", "cbc", aes_key, block_iv, block_iv_source, resolve);

/// AES-CFB with 128-bit feedback.
pub static AES_CFB: IvCipher = IvCipher::build("aes", "cfb", aes_key, block_iv, block_iv_source, resolve);

pub static AES_OFB: IvCipher = IvCipher::build("aes", "ofb", aes_key, block_iv, block_iv_source, resolve);

/// AES-CTR with a 128-bit big-endian counter.
pub static AES_CTR: IvCipher = IvCipher::build("aes", "ctr", aes_key, block_iv, block_iv_source, resolve);

/// AES-XTS. The IV is the 16-byte tweak; input must be at least one block.
pub static AES_XTS: IvCipher = IvCipher::build("aes", "xts", xts_key, block_iv, block_iv_source, resolve_xts);

/// AES-GCM. AAD, plaintext length and tag length are optional; the tag
/// defaults to 16 bytes. A 12-byte nonce is generated when none is given.
pub static AES_GCM: AuthCipher = AuthCipher::build("aes", "gcm", aes_key, gcm_iv, gcm_options, gcm_iv_source, resolve);

/// AES-CCM. AAD, plaintext length and tag length are all required.
pub static AES_CCM: AuthCipher = AuthCipher::build("aes", "ccm", aes_key, ccm_iv, ccm_options, ccm_iv_source, resolve);
