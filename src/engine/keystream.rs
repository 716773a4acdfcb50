//! Byte-exact streaming modes: CFB, OFB, CTR, ChaCha20 and RC4.

use aes::cipher::consts::{U16, U256};
use aes::cipher::{BlockCipher, BlockEncrypt, BlockEncryptMut, BlockSizeUser, KeyInit, KeyIvInit, StreamCipher, StreamCipherSeek};
use aes::{Aes128, Aes192, Aes256};

use super::Transform;
use super::primitive::AesMode;
use crate::config::{AES_BLOCK_SIZE, CHACHA20_IV_SIZE};
use crate::error::{Error, Result};
use crate::secret::SecretBytes;
use crate::types::Direction;

trait Keystream: Send {
    fn apply(&mut self, data: &mut [u8]) -> Result<()>;
}

struct Stream<S>(S);

impl<S: StreamCipher + Send> Keystream for Stream<S> {
    fn apply(&mut self, data: &mut [u8]) -> Result<()> {
        self.0.try_apply_keystream(data).map_err(|_| Error::engine("keystream exhausted"))
    }
}

struct CfbEncrypt<C: BlockEncryptMut + BlockCipher>(cfb_mode::BufEncryptor<C>);

impl<C: BlockEncryptMut + BlockCipher + Send> Keystream for CfbEncrypt<C> {
    fn apply(&mut self, data: &mut [u8]) -> Result<()> {
        self.0.encrypt(data);
        Ok(())
    }
}

struct CfbDecrypt<C: BlockEncryptMut + BlockCipher>(cfb_mode::BufDecryptor<C>);

impl<C: BlockEncryptMut + BlockCipher + Send> Keystream for CfbDecrypt<C> {
    fn apply(&mut self, data: &mut [u8]) -> Result<()> {
        self.0.decrypt(data);
        Ok(())
    }
}

fn invalid_length(_: aes::cipher::InvalidLength) -> Error {
    Error::engine("invalid key or iv length")
}

fn aes_keystream<C>(mode: AesMode, direction: Direction, key: &[u8], iv: &[u8]) -> Result<Box<dyn Keystream>>
where
    C: BlockCipher + BlockSizeUser<BlockSize = U16> + BlockEncrypt + KeyInit + Send + 'static,
{
    if iv.len() != AES_BLOCK_SIZE {
        return Err(Error::IvLengthInvalid { length: iv.len() });
    }

    let stream: Box<dyn Keystream> = match (mode, direction) {
        (AesMode::Cfb, Direction::Encrypt) => Box::new(CfbEncrypt(cfb_mode::BufEncryptor::<C>::new_from_slices(key, iv).map_err(invalid_length)?)),
        (AesMode::Cfb, Direction::Decrypt) => Box::new(CfbDecrypt(cfb_mode::BufDecryptor::<C>::new_from_slices(key, iv).map_err(invalid_length)?)),
        (AesMode::Ofb, _) => Box::new(Stream(ofb::Ofb::<C>::new_from_slices(key, iv).map_err(invalid_length)?)),
        (AesMode::Ctr, _) => Box::new(Stream(ctr::Ctr128BE::<C>::new_from_slices(key, iv).map_err(invalid_length)?)),
        (other, _) => return Err(Error::UnsupportedPrimitive(format!("{other} is not a keystream mode"))),
    };
    Ok(stream)
}

/// Streams bytes through a keystream; output length always equals input length.
pub struct KeystreamTransform {
    stream: Box<dyn Keystream>,
    finished: bool,
}

impl KeystreamTransform {
    fn wrap(stream: Box<dyn Keystream>) -> Self {
        Self { stream, finished: false }
    }

    pub fn aes(bits: usize, mode: AesMode, direction: Direction, key: &[u8], iv: &[u8]) -> Result<Self> {
        let stream = match bits {
            128 => aes_keystream::<Aes128>(mode, direction, key, iv)?,
            192 => aes_keystream::<Aes192>(mode, direction, key, iv)?,
            256 => aes_keystream::<Aes256>(mode, direction, key, iv)?,
            other => return Err(Error::UnsupportedPrimitive(format!("aes-{other}-{mode}"))),
        };
        Ok(Self::wrap(stream))
    }

    /// ChaCha20 with a 16-byte IV: little-endian block counter, then the 12-byte nonce.
    pub fn chacha20(key: &[u8], iv: &[u8]) -> Result<Self> {
        if iv.len() != CHACHA20_IV_SIZE {
            return Err(Error::IvLengthInvalid { length: iv.len() });
        }

        let (counter, nonce) = iv.split_at(4);
        let counter = u32::from_le_bytes([counter[0], counter[1], counter[2], counter[3]]);

        let mut cipher = chacha20::ChaCha20::new_from_slices(key, nonce).map_err(invalid_length)?;
        cipher.try_seek(u64::from(counter) * 64).map_err(|_| Error::engine("chacha20 counter out of range"))?;

        Ok(Self::wrap(Box::new(Stream(cipher))))
    }

    /// RC4 with a key of any non-empty length. The key schedule reads the
    /// key cyclically over 256 rounds, so the key is repeated (or cut) to
    /// exactly 256 bytes.
    pub fn rc4(key: &[u8]) -> Result<Self> {
        if key.is_empty() {
            return Err(Error::KeyFormatInvalid);
        }

        let schedule = SecretBytes::from_vec(key.iter().copied().cycle().take(256).collect());
        let cipher = rc4::Rc4::<U256>::new_from_slice(schedule.expose_secret()).map_err(invalid_length)?;
        Ok(Self::wrap(Box::new(Stream(cipher))))
    }
}

impl Transform for KeystreamTransform {
    fn update(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        if self.finished {
            return Err(Error::StreamClosed);
        }

        let mut out = input.to_vec();
        self.stream.apply(&mut out)?;
        Ok(out)
    }

    fn finalize(&mut self) -> Result<Vec<u8>> {
        if self.finished {
            return Err(Error::StreamClosed);
        }
        self.finished = true;
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NIST_KEY: &str = "2b7e151628aed2a6abf7158809cf4f3c";
    const NIST_BLOCK: &str = "6bc1bee22e409f96e93d7e117393172a";

    fn encrypt_hex(mut transform: KeystreamTransform, plaintext: &[u8]) -> String {
        let mut out = transform.update(plaintext).unwrap();
        out.extend(transform.finalize().unwrap());
        hex::encode(out)
    }

    #[test]
    fn test_ctr_known_answer() {
        let key = hex::decode(NIST_KEY).unwrap();
        let iv = hex::decode("f0f1f2f3f4f5f6f7f8f9fafbfcfdfeff").unwrap();
        let transform = KeystreamTransform::aes(128, AesMode::Ctr, Direction::Encrypt, &key, &iv).unwrap();
        assert_eq!(encrypt_hex(transform, &hex::decode(NIST_BLOCK).unwrap()), "874d6191b620e3261bef6864990db6ce");
    }

    #[test]
    fn test_ofb_and_cfb_known_answer() {
        let key = hex::decode(NIST_KEY).unwrap();
        let iv = hex::decode("000102030405060708090a0b0c0d0e0f").unwrap();
        let plaintext = hex::decode(NIST_BLOCK).unwrap();

        // The first OFB and CFB-128 blocks coincide: both are E(iv) ^ p.
        let ofb = KeystreamTransform::aes(128, AesMode::Ofb, Direction::Encrypt, &key, &iv).unwrap();
        assert_eq!(encrypt_hex(ofb, &plaintext), "3b3fd92eb72dad20333449f8e83cfb4a");

        let cfb = KeystreamTransform::aes(128, AesMode::Cfb, Direction::Encrypt, &key, &iv).unwrap();
        assert_eq!(encrypt_hex(cfb, &plaintext), "3b3fd92eb72dad20333449f8e83cfb4a");
    }

    #[test]
    fn test_cfb_streaming_matches_one_shot() {
        let key = [3u8; 32];
        let iv = [4u8; 16];
        let plaintext: Vec<u8> = (0..77).collect();

        let one_shot = encrypt_hex(KeystreamTransform::aes(256, AesMode::Cfb, Direction::Encrypt, &key, &iv).unwrap(), &plaintext);

        let mut chunked = KeystreamTransform::aes(256, AesMode::Cfb, Direction::Encrypt, &key, &iv).unwrap();
        let mut out = Vec::new();
        for chunk in plaintext.chunks(5) {
            out.extend(chunked.update(chunk).unwrap());
        }
        assert_eq!(hex::encode(&out), one_shot);

        let mut dec = KeystreamTransform::aes(256, AesMode::Cfb, Direction::Decrypt, &key, &iv).unwrap();
        assert_eq!(dec.update(&out).unwrap(), plaintext);
    }

    #[test]
    fn test_chacha20_counter_prefix() {
        let key: Vec<u8> = (0u8..32).collect();
        let iv = hex::decode("01000000000000000000004a00000000").unwrap();
        let plaintext = b"Ladies and Gentlemen of the class of '99: If I could offer you only one tip for the future, sunscreen would be it.";

        let ciphertext = encrypt_hex(KeystreamTransform::chacha20(&key, &iv).unwrap(), plaintext);
        assert!(ciphertext.starts_with("6e2e359a2568f98041ba0728dd0d6981"));
    }

    #[test]
    fn test_rc4_known_answers() {
        assert_eq!(encrypt_hex(KeystreamTransform::rc4(b"Key").unwrap(), b"Plaintext"), "bbf316e8d940af0ad3");
        assert_eq!(encrypt_hex(KeystreamTransform::rc4(b"Wiki").unwrap(), b"pedia"), "1021bf0420");
    }

    #[test]
    fn test_ofb_streaming_matches_one_shot_and_inverts() {
        let key = hex::decode(NIST_KEY).unwrap();
        let iv = hex::decode("000102030405060708090a0b0c0d0e0f").unwrap();
        let plaintext = hex::decode(concat!(
            "6bc1bee22e409f96e93d7e117393172a",
            "ae2d8a571e03ac9c9eb76fac45af8e51",
            "30c81c46a35ce411e5fbc1191a0a52ef",
            "f69f2445df4f9b17ad2b417be66c3710",
        ))
        .unwrap();
        let expected = concat!(
            "3b3fd92eb72dad20333449f8e83cfb4a",
            "7789508d16918f03f53c52dac54ed825",
            "9740051e9c5fecf64344f7a82260edcc",
            "304c6528f659c77866a510d9c1d6ae5e",
        );

        let one_shot = KeystreamTransform::aes(128, AesMode::Ofb, Direction::Encrypt, &key, &iv).unwrap();
        assert_eq!(encrypt_hex(one_shot, &plaintext), expected);

        let mut chunked = KeystreamTransform::aes(128, AesMode::Ofb, Direction::Encrypt, &key, &iv).unwrap();
        let mut out = Vec::new();
        for chunk in plaintext.chunks(7) {
            out.extend(chunked.update(chunk).unwrap());
        }
        assert_eq!(hex::encode(&out), expected);

        let mut dec = KeystreamTransform::aes(128, AesMode::Ofb, Direction::Decrypt, &key, &iv).unwrap();
        assert_eq!(dec.update(&out[..20]).unwrap(), &plaintext[..20]);
        assert_eq!(dec.update(&out[20..]).unwrap(), &plaintext[20..]);
    }

    #[test]
    fn test_rc4_key_lengths() {
        // RFC 6229: 40-bit key 0102030405, keystream offset 0.
        let key = hex::decode("0102030405").unwrap();
        assert_eq!(encrypt_hex(KeystreamTransform::rc4(&key).unwrap(), &[0u8; 16]), "b2396305f03dc027ccc3524a0a1118a8");

        // Keys longer than 256 bytes only contribute their first 256.
        let long: Vec<u8> = (0..300u16).map(|i| (i % 251) as u8).collect();
        assert_eq!(
            encrypt_hex(KeystreamTransform::rc4(&long).unwrap(), b"same state"),
            encrypt_hex(KeystreamTransform::rc4(&long[..256]).unwrap(), b"same state"),
        );

        assert!(matches!(KeystreamTransform::rc4(&[]), Err(Error::KeyFormatInvalid)));
    }

    #[test]
    fn test_rejects_bad_iv_length() {
        assert!(matches!(KeystreamTransform::chacha20(&[0u8; 32], &[0u8; 12]), Err(Error::IvLengthInvalid { length: 12 })));
        assert!(matches!(KeystreamTransform::aes(128, AesMode::Ctr, Direction::Encrypt, &[0u8; 16], &[0u8; 8]), Err(Error::IvLengthInvalid { length: 8 })));
    }
}
