//! Common type definitions.

use std::fmt::{Display, Formatter, Result};

/// Which way data flows through a transform.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Plaintext in, ciphertext out.
    Encrypt,

    /// Ciphertext in, plaintext out.
    Decrypt,
}

impl Direction {
    /// Array containing both directions for iteration.
    pub const ALL: &'static [Self] = &[Self::Encrypt, Self::Decrypt];

    #[inline]
    pub fn label(self) -> &'static str {
        match self {
            Self::Encrypt => "encrypt",
            Self::Decrypt => "decrypt",
        }
    }

    /// Progress label shown while a stream runs.
    #[inline]
    pub fn progress_label(self) -> &'static str {
        match self {
            Self::Encrypt => "Encrypting...",
            Self::Decrypt => "Decrypting...",
        }
    }

    #[inline]
    pub fn is_decrypt(self) -> bool {
        self == Self::Decrypt
    }
}

impl Display for Direction {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.write_str(self.label())
    }
}
