use std::ops::Deref;

use crate::secret::SecretBytes;

/// Per-call options for encryption.
///
/// Which fields matter depends on the mode: plain modes read only the key,
/// IV modes add `iv` and `auto_padding`, authenticated modes read everything.
/// Fields a mode cannot use are rejected rather than silently dropped.
#[derive(Clone, Debug)]
pub struct CipherOptions {
    pub key: SecretBytes,

    /// Generated on encryption when absent.
    pub iv: Option<Vec<u8>>,

    /// `None` keeps the engine default (PKCS#7 padding on for ECB and CBC).
    pub auto_padding: Option<bool>,

    pub plaintext_length: Option<usize>,

    pub aad: Option<Vec<u8>>,

    pub auth_tag_length: Option<usize>,
}

impl CipherOptions {
    pub fn new(key: &[u8]) -> Self {
        Self { key: SecretBytes::new(key), iv: None, auto_padding: None, plaintext_length: None, aad: None, auth_tag_length: None }
    }

    #[must_use]
    pub fn with_iv(mut self, iv: &[u8]) -> Self {
        self.iv = Some(iv.to_vec());
        self
    }

    #[must_use]
    pub fn with_auto_padding(mut self, enabled: bool) -> Self {
        self.auto_padding = Some(enabled);
        self
    }

    #[must_use]
    pub fn with_plaintext_length(mut self, length: usize) -> Self {
        self.plaintext_length = Some(length);
        self
    }

    #[must_use]
    pub fn with_aad(mut self, aad: &[u8]) -> Self {
        self.aad = Some(aad.to_vec());
        self
    }

    #[must_use]
    pub fn with_auth_tag_length(mut self, length: usize) -> Self {
        self.auth_tag_length = Some(length);
        self
    }

    /// Turns these options into decryption options carrying `tag`.
    #[must_use]
    pub fn with_auth_tag(self, tag: &[u8]) -> DecipherOptions {
        DecipherOptions { options: self, auth_tag: Some(tag.to_vec()) }
    }
}

/// Options for decryption: everything in [`CipherOptions`] plus the tag.
#[derive(Clone, Debug)]
pub struct DecipherOptions {
    pub options: CipherOptions,
    pub auth_tag: Option<Vec<u8>>,
}

impl DecipherOptions {
    pub fn new(key: &[u8]) -> Self {
        Self::from(CipherOptions::new(key))
    }

    #[must_use]
    pub fn with_auth_tag(mut self, tag: &[u8]) -> Self {
        self.auth_tag = Some(tag.to_vec());
        self
    }
}

impl From<CipherOptions> for DecipherOptions {
    fn from(options: CipherOptions) -> Self {
        Self { options, auth_tag: None }
    }
}

impl Deref for DecipherOptions {
    type Target = CipherOptions;

    fn deref(&self) -> &CipherOptions {
        &self.options
    }
}

/// What an encryption used, echoed back so the caller can decrypt later.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CipherInfo {
    /// Primitive id the engine ran, e.g. `aes-256-gcm`.
    pub cipher: String,
    pub iv: Option<Vec<u8>>,
    pub auth_tag: Option<Vec<u8>>,
    pub aad: Option<Vec<u8>>,
    pub plaintext_length: Option<usize>,
    pub auth_tag_length: Option<usize>,
    pub auto_padding: Option<bool>,
}

impl CipherInfo {
    /// Builds the options that decrypt what this info describes.
    pub fn decipher_options(&self, key: &[u8]) -> DecipherOptions {
        DecipherOptions {
            options: CipherOptions {
                key: SecretBytes::new(key),
                iv: self.iv.clone(),
                auto_padding: self.auto_padding,
                plaintext_length: self.plaintext_length,
                aad: self.aad.clone(),
                auth_tag_length: self.auth_tag_length,
            },
            auth_tag: self.auth_tag.clone(),
        }
    }
}

/// Ciphertext plus everything needed to reverse it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncryptionResult {
    pub ciphertext: Vec<u8>,
    pub info: CipherInfo,
}

impl EncryptionResult {
    #[inline]
    pub fn decipher_options(&self, key: &[u8]) -> DecipherOptions {
        self.info.decipher_options(key)
    }
}
