//! PKCS#7 padding for the 16-byte block modes.

use block_padding::array::Array;
use block_padding::array::typenum::U16;
use block_padding::{Padding, PaddedData, Pkcs7};

use crate::config::AES_BLOCK_SIZE;
use crate::error::{Error, Result};

pub struct Pkcs7Padding;

impl Pkcs7Padding {
    /// Pads a trailing partial block (0 to 15 bytes) into one full block.
    pub fn pad_tail(tail: &[u8]) -> Result<[u8; AES_BLOCK_SIZE]> {
        if tail.len() >= AES_BLOCK_SIZE {
            return Err(Error::engine(format!("padding tail must be shorter than a block, got {} bytes", tail.len())));
        }

        match Pkcs7::pad_detached::<U16>(tail) {
            PaddedData::Pad { tail_block, .. } => {
                let mut block = [0u8; AES_BLOCK_SIZE];
                block.copy_from_slice(tail_block.as_slice());
                Ok(block)
            }
            PaddedData::NoPad { .. } | PaddedData::Error => Err(Error::engine("padding error")),
        }
    }

    /// Strips the padding from the last decrypted block.
    pub fn unpad_block(block: &[u8]) -> Result<Vec<u8>> {
        if block.len() != AES_BLOCK_SIZE {
            return Err(Error::engine("bad decrypt: wrong final block length"));
        }

        let mut arr: Array<u8, U16> = Array::default();
        arr.copy_from_slice(block);

        Pkcs7::unpad_blocks::<U16>(std::slice::from_ref(&arr)).map(<[u8]>::to_vec).map_err(|_| Error::engine("bad decrypt: invalid padding"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pad_partial_tail() {
        let block = Pkcs7Padding::pad_tail(b"hello world!").unwrap();
        assert_eq!(&block[..12], b"hello world!");
        assert_eq!(&block[12..], &[4, 4, 4, 4]);
    }

    #[test]
    fn test_pad_empty_tail_is_full_block() {
        let block = Pkcs7Padding::pad_tail(&[]).unwrap();
        assert_eq!(block, [16u8; 16]);
    }

    #[test]
    fn test_pad_rejects_full_block() {
        assert!(Pkcs7Padding::pad_tail(&[0u8; 16]).is_err());
    }

    #[test]
    fn test_unpad_roundtrip() {
        let block = Pkcs7Padding::pad_tail(b"abc").unwrap();
        assert_eq!(Pkcs7Padding::unpad_block(&block).unwrap(), b"abc");
    }

    #[test]
    fn test_unpad_invalid_padding() {
        let mut block = [0u8; 16];
        block[15] = 0x20;
        assert!(Pkcs7Padding::unpad_block(&block).is_err());
    }
}
