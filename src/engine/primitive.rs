use std::fmt::{Display, Formatter};
use std::str::FromStr;

use strum::{Display as StrumDisplay, EnumString};

use crate::error::{Error, Result};

/// Chaining mode of an AES primitive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumString, StrumDisplay)]
#[strum(serialize_all = "lowercase")]
pub enum AesMode {
    Ecb,
    Cbc,
    Cfb,
    Ofb,
    Ctr,
    Xts,
    Gcm,
    Ccm,
}

/// A parsed primitive id such as `aes-256-gcm` or `chacha20-poly1305`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Primitive {
    Aes { bits: usize, mode: AesMode },
    ChaCha20,
    ChaCha20Poly1305,
    Rc4,
}

impl Primitive {
    /// Exact key length the primitive takes, or `None` when any non-empty key works.
    pub fn key_len(self) -> Option<usize> {
        match self {
            Self::Aes { bits, mode: AesMode::Xts } => Some(bits / 4),
            Self::Aes { bits, .. } => Some(bits / 8),
            Self::ChaCha20 | Self::ChaCha20Poly1305 => Some(32),
            Self::Rc4 => None,
        }
    }

    /// Refuses a key whose width disagrees with the id. The engine never
    /// picks another variant on the caller's behalf.
    pub fn check_key(self, key: &[u8]) -> Result<()> {
        match self.key_len() {
            Some(expected) if key.len() != expected => Err(Error::UnsupportedPrimitive(format!("{self} takes a {expected}-byte key, got {} bytes", key.len()))),
            None if key.is_empty() => Err(Error::KeyFormatInvalid),
            _ => Ok(()),
        }
    }

    fn parse_aes(id: &str) -> Option<Self> {
        let (bits, mode) = id.strip_prefix("aes-")?.split_once('-')?;
        let bits: usize = bits.parse().ok()?;
        let mode: AesMode = mode.parse().ok()?;

        let supported = match mode {
            AesMode::Xts => matches!(bits, 128 | 256),
            _ => matches!(bits, 128 | 192 | 256),
        };
        supported.then_some(Self::Aes { bits, mode })
    }
}

impl FromStr for Primitive {
    type Err = Error;

    fn from_str(id: &str) -> Result<Self> {
        if let Some(aes) = Self::parse_aes(id) {
            return Ok(aes);
        }
        match id {
            "chacha20" => Ok(Self::ChaCha20),
            "chacha20-poly1305" => Ok(Self::ChaCha20Poly1305),
            "rc4" => Ok(Self::Rc4),
            _ => Err(Error::UnsupportedPrimitive(id.to_owned())),
        }
    }
}

impl Display for Primitive {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Aes { bits, mode } => write!(f, "aes-{bits}-{mode}"),
            Self::ChaCha20 => f.write_str("chacha20"),
            Self::ChaCha20Poly1305 => f.write_str("chacha20-poly1305"),
            Self::Rc4 => f.write_str("rc4"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aes_ids() {
        assert_eq!("aes-128-cbc".parse::<Primitive>().unwrap(), Primitive::Aes { bits: 128, mode: AesMode::Cbc });
        assert_eq!("aes-256-xts".parse::<Primitive>().unwrap(), Primitive::Aes { bits: 256, mode: AesMode::Xts });
        assert_eq!("aes-192-gcm".parse::<Primitive>().unwrap().to_string(), "aes-192-gcm");
    }

    #[test]
    fn test_every_id_roundtrips_through_display() {
        let ids = ["aes-128-ecb", "aes-128-cbc", "aes-128-cfb", "aes-128-ofb", "aes-128-ctr", "aes-128-xts", "aes-128-gcm", "aes-128-ccm", "chacha20", "chacha20-poly1305", "rc4"];
        for id in ids {
            assert_eq!(id.parse::<Primitive>().unwrap().to_string(), id);
        }
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert!(matches!("aes-512-cbc".parse::<Primitive>(), Err(Error::UnsupportedPrimitive(_))));
        assert!(matches!("aes-192-xts".parse::<Primitive>(), Err(Error::UnsupportedPrimitive(_))));
        assert!(matches!("aes-128-foo".parse::<Primitive>(), Err(Error::UnsupportedPrimitive(_))));
        assert!(matches!("blowfish".parse::<Primitive>(), Err(Error::UnsupportedPrimitive(_))));
    }

    #[test]
    fn test_key_width_must_match_id() {
        let gcm = Primitive::Aes { bits: 256, mode: AesMode::Gcm };
        assert!(gcm.check_key(&[0u8; 32]).is_ok());
        assert!(gcm.check_key(&[0u8; 16]).is_err());

        let xts = Primitive::Aes { bits: 128, mode: AesMode::Xts };
        assert!(xts.check_key(&[0u8; 32]).is_ok());

        assert!(Primitive::Rc4.check_key(&[1]).is_ok());
        assert!(matches!(Primitive::Rc4.check_key(&[]), Err(Error::KeyFormatInvalid)));
    }
}
