//! ECB and CBC: whole-block transforms with optional PKCS#7 padding.

use aes::cipher::consts::U16;
use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockCipher, BlockDecrypt, BlockDecryptMut, BlockEncrypt, BlockEncryptMut, BlockSizeUser, KeyInit, KeyIvInit};
use aes::{Aes128, Aes192, Aes256};

use super::Transform;
use super::primitive::AesMode;
use crate::config::AES_BLOCK_SIZE;
use crate::error::{Error, Result};
use crate::padding::Pkcs7Padding;
use crate::types::Direction;

trait BlockOp: Send {
    fn apply(&mut self, data: &mut [u8]);
}

struct Encrypting<E>(E);

impl<E> BlockOp for Encrypting<E>
where
    E: BlockEncryptMut + BlockSizeUser<BlockSize = U16> + Send,
{
    fn apply(&mut self, data: &mut [u8]) {
        for chunk in data.chunks_exact_mut(AES_BLOCK_SIZE) {
            self.0.encrypt_block_mut(GenericArray::from_mut_slice(chunk));
        }
    }
}

struct Decrypting<D>(D);

impl<D> BlockOp for Decrypting<D>
where
    D: BlockDecryptMut + BlockSizeUser<BlockSize = U16> + Send,
{
    fn apply(&mut self, data: &mut [u8]) {
        for chunk in data.chunks_exact_mut(AES_BLOCK_SIZE) {
            self.0.decrypt_block_mut(GenericArray::from_mut_slice(chunk));
        }
    }
}

fn invalid_length(_: aes::cipher::InvalidLength) -> Error {
    Error::engine("invalid key or iv length")
}

fn block_op<C>(mode: AesMode, direction: Direction, key: &[u8], iv: &[u8]) -> Result<Box<dyn BlockOp>>
where
    C: BlockCipher + BlockSizeUser<BlockSize = U16> + BlockEncrypt + BlockDecrypt + KeyInit + Send + 'static,
{
    let op: Box<dyn BlockOp> = match (mode, direction) {
        (AesMode::Ecb, Direction::Encrypt) => Box::new(Encrypting(ecb::Encryptor::<C>::new_from_slice(key).map_err(invalid_length)?)),
        (AesMode::Ecb, Direction::Decrypt) => Box::new(Decrypting(ecb::Decryptor::<C>::new_from_slice(key).map_err(invalid_length)?)),
        (AesMode::Cbc, Direction::Encrypt) => Box::new(Encrypting(cbc::Encryptor::<C>::new_from_slices(key, iv).map_err(invalid_length)?)),
        (AesMode::Cbc, Direction::Decrypt) => Box::new(Decrypting(cbc::Decryptor::<C>::new_from_slices(key, iv).map_err(invalid_length)?)),
        (other, _) => return Err(Error::UnsupportedPrimitive(format!("{other} is not a block-aligned mode"))),
    };
    Ok(op)
}

/// Buffers input until whole blocks are available.
///
/// With padding on, decryption holds back the last complete block until
/// [`Transform::finalize`] so the padding can be checked and stripped.
pub struct BlockTransform {
    op: Box<dyn BlockOp>,
    direction: Direction,
    padding: bool,
    buffer: Vec<u8>,
    finished: bool,
}

impl BlockTransform {
    pub fn new(bits: usize, mode: AesMode, direction: Direction, key: &[u8], iv: &[u8]) -> Result<Self> {
        let op = match bits {
            128 => block_op::<Aes128>(mode, direction, key, iv)?,
            192 => block_op::<Aes192>(mode, direction, key, iv)?,
            256 => block_op::<Aes256>(mode, direction, key, iv)?,
            other => return Err(Error::UnsupportedPrimitive(format!("aes-{other}-{mode}"))),
        };
        Ok(Self { op, direction, padding: true, buffer: Vec::new(), finished: false })
    }

    /// Bytes that must stay buffered after an update.
    fn retained(&self) -> usize {
        let len = self.buffer.len();
        if self.direction.is_decrypt() && self.padding {
            if len == 0 { 0 } else { len - ((len - 1) / AES_BLOCK_SIZE) * AES_BLOCK_SIZE }
        } else {
            len % AES_BLOCK_SIZE
        }
    }
}

impl Transform for BlockTransform {
    fn set_auto_padding(&mut self, enabled: bool) -> Result<()> {
        self.padding = enabled;
        Ok(())
    }

    fn update(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        if self.finished {
            return Err(Error::StreamClosed);
        }

        self.buffer.extend_from_slice(input);
        let ready = self.buffer.len() - self.retained();
        let mut out: Vec<u8> = self.buffer.drain(..ready).collect();
        self.op.apply(&mut out);
        Ok(out)
    }

    fn finalize(&mut self) -> Result<Vec<u8>> {
        if self.finished {
            return Err(Error::StreamClosed);
        }
        self.finished = true;

        let tail = std::mem::take(&mut self.buffer);
        match (self.direction, self.padding) {
            (Direction::Encrypt, true) => {
                let mut block = Pkcs7Padding::pad_tail(&tail)?;
                self.op.apply(&mut block);
                Ok(block.to_vec())
            }
            (Direction::Decrypt, true) => {
                let mut block = tail;
                if block.len() != AES_BLOCK_SIZE {
                    return Err(Error::engine("bad decrypt: wrong final block length"));
                }
                self.op.apply(&mut block);
                Pkcs7Padding::unpad_block(&block)
            }
            (_, false) if tail.is_empty() => Ok(Vec::new()),
            (_, false) => Err(Error::engine("data not multiple of block length")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(transform: &mut BlockTransform, chunks: &[&[u8]]) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        for chunk in chunks {
            out.extend(transform.update(chunk)?);
        }
        out.extend(transform.finalize()?);
        Ok(out)
    }

    #[test]
    fn test_ecb_known_answer() {
        let key = hex::decode("000102030405060708090a0b0c0d0e0f").unwrap();
        let plaintext = hex::decode("00112233445566778899aabbccddeeff").unwrap();

        let mut transform = BlockTransform::new(128, AesMode::Ecb, Direction::Encrypt, &key, &[]).unwrap();
        transform.set_auto_padding(false).unwrap();
        let ciphertext = run(&mut transform, &[&plaintext]).unwrap();

        assert_eq!(hex::encode(ciphertext), "69c4e0d86a7b0430d8cdb78070b4c55a");
    }

    #[test]
    fn test_cbc_known_answer() {
        let key = hex::decode("2b7e151628aed2a6abf7158809cf4f3c").unwrap();
        let iv = hex::decode("000102030405060708090a0b0c0d0e0f").unwrap();
        let plaintext = hex::decode("6bc1bee22e409f96e93d7e117393172a").unwrap();

        let mut transform = BlockTransform::new(128, AesMode::Cbc, Direction::Encrypt, &key, &iv).unwrap();
        transform.set_auto_padding(false).unwrap();
        let ciphertext = run(&mut transform, &[&plaintext]).unwrap();

        assert_eq!(hex::encode(ciphertext), "7649abac8119b246cee98e9b12e9197d");
    }

    #[test]
    fn test_padded_roundtrip_across_odd_chunks() {
        let key = [7u8; 24];
        let iv = [9u8; 16];
        let plaintext: Vec<u8> = (0..=100).collect();

        let mut enc = BlockTransform::new(192, AesMode::Cbc, Direction::Encrypt, &key, &iv).unwrap();
        let ciphertext = run(&mut enc, &[&plaintext[..3], &plaintext[3..40], &plaintext[40..]]).unwrap();
        assert_eq!(ciphertext.len(), 112);

        let mut dec = BlockTransform::new(192, AesMode::Cbc, Direction::Decrypt, &key, &iv).unwrap();
        let recovered = run(&mut dec, &[&ciphertext[..16], &ciphertext[16..17], &ciphertext[17..]]).unwrap();
        assert_eq!(recovered, plaintext);
    }

    #[test]
    fn test_unpadded_rejects_partial_block() {
        let mut transform = BlockTransform::new(256, AesMode::Ecb, Direction::Encrypt, &[1u8; 32], &[]).unwrap();
        transform.set_auto_padding(false).unwrap();
        assert!(matches!(run(&mut transform, &[b"not sixteen"]), Err(Error::Engine(_))));
    }

    #[test]
    fn test_wrong_key_fails_padding_check() {
        let iv = [0u8; 16];
        let mut enc = BlockTransform::new(128, AesMode::Cbc, Direction::Encrypt, &[1u8; 16], &iv).unwrap();
        let ciphertext = run(&mut enc, &[b"attack at dawn"]).unwrap();

        // A wrong key garbles the last block; with overwhelming probability
        // its padding byte is then invalid.
        let mut dec = BlockTransform::new(128, AesMode::Cbc, Direction::Decrypt, &[2u8; 16], &iv).unwrap();
        let result = run(&mut dec, &[&ciphertext]);
        assert!(result.map(|plain| plain != b"attack at dawn").unwrap_or(true));
    }

    #[test]
    fn test_update_after_finalize_fails() {
        let mut transform = BlockTransform::new(128, AesMode::Ecb, Direction::Encrypt, &[0u8; 16], &[]).unwrap();
        transform.finalize().unwrap();
        assert!(matches!(transform.update(b"late"), Err(Error::StreamClosed)));
    }
}
