//! Global Configuration Constants
//!
//! Widths, defaults and limits used by the mode catalog, the engine and the
//! key helpers. Everything a validator checks against lives here so that the
//! catalog and the engine cannot drift apart.
//!
//! ## Conventions
//!
//! - All sizes are in bytes unless the name says otherwise.
//! - Slices list every accepted value; ranges are inclusive.

use std::ops::RangeInclusive;

// === AES ===

/// AES block size in bytes.
///
/// Every AES mode works on 16-byte blocks; ECB and CBC pad to it.
pub const AES_BLOCK_SIZE: usize = 16;

/// Accepted AES key sizes (AES-128, AES-192, AES-256).
pub const AES_KEY_SIZES: &[usize] = &[16, 24, 32];

/// Accepted XTS key sizes.
///
/// XTS takes two AES keys of equal size back to back, so only the
/// AES-128 and AES-256 variants exist.
pub const XTS_KEY_SIZES: &[usize] = &[32, 64];

/// IV size for CBC, CFB, OFB, CTR and the XTS tweak.
pub const AES_IV_SIZE: usize = 16;

// === AES-GCM ===

/// Generated GCM nonce size.
///
/// 96 bits is the only size for which GCM uses the nonce directly as the
/// initial counter block; other sizes go through GHASH first.
pub const GCM_IV_SIZE: usize = 12;

/// Longest GCM nonce the engine accepts.
pub const GCM_MAX_IV_SIZE: usize = 16;

/// Accepted GCM tag sizes.
pub const GCM_TAG_SIZES: &[usize] = &[12, 13, 14, 15, 16];

/// GCM tag size used when neither a length nor a tag is supplied.
pub const GCM_DEFAULT_TAG_SIZE: usize = 16;

// === AES-CCM ===

/// Accepted CCM nonce sizes.
///
/// The nonce and the length field share 15 bytes, so a longer nonce leaves
/// less room for the message length.
pub const CCM_IV_SIZES: RangeInclusive<usize> = 7..=13;

/// Generated CCM nonce size.
///
/// 12 bytes leaves a 3-byte length field, enough for messages up to 16 MiB.
pub const CCM_IV_SIZE: usize = 12;

/// Accepted CCM tag sizes.
pub const CCM_TAG_SIZES: &[usize] = &[4, 6, 8, 12, 14, 16];

// === ChaCha20 ===

/// ChaCha20 key size.
pub const CHACHA20_KEY_SIZE: usize = 32;

/// Raw ChaCha20 IV size: a 4-byte little-endian block counter followed by a
/// 12-byte nonce.
pub const CHACHA20_IV_SIZE: usize = 16;

/// ChaCha20-Poly1305 nonce size.
pub const CHACHA20_POLY1305_IV_SIZE: usize = 12;

/// Poly1305 tag size. ChaCha20-Poly1305 always uses it.
pub const POLY1305_TAG_SIZE: usize = 16;

// === Streams ===

/// Output bytes a [`crate::cipher::CipherStream`] buffers before writers are
/// told to wait for the reader.
pub const STREAM_HIGH_WATER_MARK: usize = 16 * 1024;

/// Chunk size used when hashing or copying streams.
pub const CHUNK_SIZE: usize = 64 * 1024;

// === PBKDF2 ===

/// Iteration count used by the command line when none is given.
pub const PBKDF2_DEFAULT_ITERATIONS: u32 = 100_000;

/// Salt length generated by the command line.
pub const PBKDF2_SALT_LEN: usize = 16;
