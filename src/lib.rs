//! ciphermode - one validated API over symmetric cipher modes.
//!
//! Every supported mode (AES ECB/CBC/CFB/OFB/CTR/XTS/GCM/CCM, ChaCha20,
//! ChaCha20-Poly1305, RC4) implements [`CipherMode`]:
//! - key and IV validation and IV generation
//! - one-shot `encrypt`/`decrypt`
//! - duplex [`CipherStream`]s reporting a [`CipherInfo`] when finished
//!
//! Modes are built from three shapes (plain, IV-based, authenticated) and
//! looked up by name through [`cipher::catalog`]. Hashing and PBKDF2 key
//! derivation live in [`hash`] and [`kdf`].

pub mod algorithms;
pub mod cipher;
pub mod config;
pub mod engine;
pub mod error;
pub mod hash;
pub mod kdf;
pub mod padding;
pub mod secret;
pub mod types;

pub use cipher::{CipherInfo, CipherMode, CipherOptions, CipherStream, DecipherOptions, EncryptionResult};
pub use error::{Error, ErrorClass, Result};
