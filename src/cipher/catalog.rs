//! Every built-in mode, declared statically and looked up by name.

use std::sync::LazyLock;

use hashbrown::HashMap;

use super::CipherMode;
#[allow(deprecated)]
use crate::algorithms::{AES_CBC, AES_CCM, AES_CFB, AES_CTR, AES_ECB, AES_GCM, AES_OFB, AES_XTS, CHACHA20, CHACHA20_POLY1305, RC4};

#[allow(deprecated)]
static MODES: &[&dyn CipherMode] = &[&AES_ECB, &AES_CBC, &AES_CFB, &AES_OFB, &AES_CTR, &AES_XTS, &AES_GCM, &AES_CCM, &CHACHA20, &CHACHA20_POLY1305, &RC4];

static BY_NAME: LazyLock<HashMap<String, &'static dyn CipherMode>> = LazyLock::new(|| MODES.iter().map(|mode| (mode.name(), *mode)).collect());

/// All modes in catalog order.
#[inline]
pub fn all() -> &'static [&'static dyn CipherMode] {
    MODES
}

/// Looks a mode up by its catalog name (`aes-gcm`, `chacha20`, ...). Case-insensitive.
pub fn find(name: &str) -> Option<&'static dyn CipherMode> {
    BY_NAME.get(name.to_ascii_lowercase().as_str()).copied()
}

/// Catalog names in order.
pub fn names() -> impl Iterator<Item = String> {
    MODES.iter().map(|mode| mode.name())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_is_complete() {
        let names: Vec<String> = names().collect();
        assert_eq!(
            names,
            ["aes-ecb", "aes-cbc", "aes-cfb", "aes-ofb", "aes-ctr", "aes-xts", "aes-gcm", "aes-ccm", "chacha20", "chacha20-poly1305", "rc4"]
        );
        assert_eq!(BY_NAME.len(), MODES.len());
    }

    #[test]
    fn test_find() {
        assert_eq!(find("aes-gcm").map(|mode| mode.mode()), Some("gcm"));
        assert_eq!(find("AES-CBC").map(|mode| mode.algorithm()), Some("aes"));
        assert_eq!(find("chacha20-poly1305").map(|mode| mode.mode()), Some("poly1305"));
        assert!(find("aes-siv").is_none());
    }

    #[test]
    fn test_every_mode_roundtrips() {
        let plaintext = b"one catalog, one interface";
        for mode in all() {
            let key = match mode.name().as_str() {
                "aes-xts" => (0..64).collect(),
                "rc4" => b"catalog".to_vec(),
                _ => vec![0x11u8; 32],
            };
            let mut options = crate::cipher::CipherOptions::new(&key);
            if mode.mode() == "ccm" {
                options = options.with_aad(b"").with_auth_tag_length(16).with_plaintext_length(plaintext.len());
            }

            let result = mode.encrypt(plaintext, &options).unwrap();
            assert_eq!(mode.decrypt(&result.ciphertext, &result.decipher_options(&key)).unwrap(), plaintext, "{}", mode.name());
        }
    }
}
