//! Transforms that need the whole message before producing output:
//! XTS, GCM, CCM and ChaCha20-Poly1305.
//!
//! Decryption output is only released after the tag has verified, so a
//! tampered message never leaks plaintext downstream.

use aes::cipher::consts::{U1, U2, U3, U4, U5, U6, U7, U8, U9, U10, U11, U12, U13, U14, U15, U16};
use aes::cipher::generic_array::ArrayLength;
use aes::cipher::{BlockCipher, BlockDecrypt, BlockEncrypt, BlockSizeUser, KeyInit};
use aes::{Aes128, Aes192, Aes256};
use aes_gcm::AesGcm;
use aes_gcm::aead::{AeadInPlace, Nonce, Tag};
use ccm::Ccm;
use chacha20poly1305::ChaCha20Poly1305;
use xts_mode::Xts128;

use super::{Transform, TransformOptions};
use crate::config::{AES_BLOCK_SIZE, CCM_IV_SIZES, CCM_TAG_SIZES, CHACHA20_POLY1305_IV_SIZE, GCM_DEFAULT_TAG_SIZE, GCM_MAX_IV_SIZE, GCM_TAG_SIZES, POLY1305_TAG_SIZE};
use crate::error::{Error, Result};
use crate::secret::SecretBytes;
use crate::types::Direction;

/// Buffered XTS transform; the IV is the 16-byte tweak of the data unit.
pub struct XtsTransform {
    direction: Direction,
    key: SecretBytes,
    tweak: [u8; AES_BLOCK_SIZE],
    buffer: Vec<u8>,
    finished: bool,
}

impl XtsTransform {
    pub fn new(direction: Direction, key: &[u8], iv: &[u8]) -> Result<Self> {
        let tweak: [u8; AES_BLOCK_SIZE] = iv.try_into().map_err(|_| Error::IvLengthInvalid { length: iv.len() })?;

        let (data_key, tweak_key) = key.split_at(key.len() / 2);
        if data_key == tweak_key {
            return Err(Error::engine("xts: the two key halves must differ"));
        }

        Ok(Self { direction, key: SecretBytes::new(key), tweak, buffer: Vec::new(), finished: false })
    }
}

/// One data unit under XEX with ciphertext stealing; `key` is the data key followed by the tweak key.
fn xts_sector<C>(key: &[u8], tweak: [u8; AES_BLOCK_SIZE], direction: Direction, data: &mut [u8]) -> Result<()>
where
    C: BlockCipher + BlockSizeUser<BlockSize = U16> + BlockEncrypt + BlockDecrypt + KeyInit,
{
    let (data_key, tweak_key) = key.split_at(key.len() / 2);
    let data_cipher = C::new_from_slice(data_key).map_err(|_| Error::KeyLengthInvalid { length: key.len() })?;
    let tweak_cipher = C::new_from_slice(tweak_key).map_err(|_| Error::KeyLengthInvalid { length: key.len() })?;

    let xts = Xts128::new(data_cipher, tweak_cipher);
    match direction {
        Direction::Encrypt => xts.encrypt_sector(data, tweak),
        Direction::Decrypt => xts.decrypt_sector(data, tweak),
    }
    Ok(())
}

impl Transform for XtsTransform {
    fn update(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        if self.finished {
            return Err(Error::StreamClosed);
        }
        self.buffer.extend_from_slice(input);
        Ok(Vec::new())
    }

    fn finalize(&mut self) -> Result<Vec<u8>> {
        if self.finished {
            return Err(Error::StreamClosed);
        }
        self.finished = true;

        // The sector routines assert at least one full block.
        let mut data = std::mem::take(&mut self.buffer);
        if data.len() < AES_BLOCK_SIZE {
            return Err(Error::engine(format!("xts needs at least {AES_BLOCK_SIZE} bytes, got {}", data.len())));
        }

        let key = self.key.expose_secret();
        match key.len() {
            32 => xts_sector::<Aes128>(key, self.tweak, self.direction, &mut data)?,
            64 => xts_sector::<Aes256>(key, self.tweak, self.direction, &mut data)?,
            length => return Err(Error::KeyLengthInvalid { length }),
        }
        Ok(data)
    }
}

/// A single AEAD operation, run once the concrete cipher type is known.
trait AeadJob {
    type Output;

    fn run<A: AeadInPlace + KeyInit>(self) -> Result<Self::Output>;
}

struct Seal<'a> {
    key: &'a [u8],
    nonce: &'a [u8],
    aad: &'a [u8],
    buffer: &'a mut [u8],
}

impl AeadJob for Seal<'_> {
    type Output = Vec<u8>;

    fn run<A: AeadInPlace + KeyInit>(self) -> Result<Vec<u8>> {
        let cipher = A::new_from_slice(self.key).map_err(|_| Error::KeyLengthInvalid { length: self.key.len() })?;
        let tag = cipher.encrypt_in_place_detached(Nonce::<A>::from_slice(self.nonce), self.aad, self.buffer).map_err(|e| Error::engine(format!("aead encryption failed: {e}")))?;
        Ok(tag.to_vec())
    }
}

struct Open<'a> {
    key: &'a [u8],
    nonce: &'a [u8],
    aad: &'a [u8],
    tag: &'a [u8],
    buffer: &'a mut [u8],
}

impl AeadJob for Open<'_> {
    type Output = ();

    fn run<A: AeadInPlace + KeyInit>(self) -> Result<()> {
        let cipher = A::new_from_slice(self.key).map_err(|_| Error::KeyLengthInvalid { length: self.key.len() })?;
        cipher.decrypt_in_place_detached(Nonce::<A>::from_slice(self.nonce), self.aad, self.buffer, Tag::<A>::from_slice(self.tag)).map_err(|_| Error::AuthenticationFailed)
    }
}

fn gcm<J: AeadJob>(key_len: usize, nonce_len: usize, tag_len: usize, job: J) -> Result<J::Output> {
    match key_len {
        16 => gcm_nonce::<Aes128, J>(nonce_len, tag_len, job),
        24 => gcm_nonce::<Aes192, J>(nonce_len, tag_len, job),
        32 => gcm_nonce::<Aes256, J>(nonce_len, tag_len, job),
        length => Err(Error::KeyLengthInvalid { length }),
    }
}

fn gcm_nonce<C, J>(nonce_len: usize, tag_len: usize, job: J) -> Result<J::Output>
where
    C: BlockCipher + BlockSizeUser<BlockSize = U16> + BlockEncrypt + KeyInit,
    J: AeadJob,
{
    macro_rules! by_nonce {
        ($($len:literal => $n:ty),+ $(,)?) => {
            match nonce_len {
                $($len => gcm_tag::<C, $n, J>(tag_len, job),)+
                length => Err(Error::IvLengthInvalid { length }),
            }
        };
    }

    by_nonce!(1 => U1, 2 => U2, 3 => U3, 4 => U4, 5 => U5, 6 => U6, 7 => U7, 8 => U8, 9 => U9, 10 => U10, 11 => U11, 12 => U12, 13 => U13, 14 => U14, 15 => U15, 16 => U16)
}

fn gcm_tag<C, N, J>(tag_len: usize, job: J) -> Result<J::Output>
where
    C: BlockCipher + BlockSizeUser<BlockSize = U16> + BlockEncrypt + KeyInit,
    N: ArrayLength<u8>,
    J: AeadJob,
{
    match tag_len {
        12 => job.run::<AesGcm<C, N, U12>>(),
        13 => job.run::<AesGcm<C, N, U13>>(),
        14 => job.run::<AesGcm<C, N, U14>>(),
        15 => job.run::<AesGcm<C, N, U15>>(),
        16 => job.run::<AesGcm<C, N, U16>>(),
        length => Err(Error::AuthTagLengthInvalid { length }),
    }
}

fn ccm<J: AeadJob>(key_len: usize, nonce_len: usize, tag_len: usize, job: J) -> Result<J::Output> {
    match key_len {
        16 => ccm_nonce::<Aes128, J>(nonce_len, tag_len, job),
        24 => ccm_nonce::<Aes192, J>(nonce_len, tag_len, job),
        32 => ccm_nonce::<Aes256, J>(nonce_len, tag_len, job),
        length => Err(Error::KeyLengthInvalid { length }),
    }
}

fn ccm_nonce<C, J>(nonce_len: usize, tag_len: usize, job: J) -> Result<J::Output>
where
    C: BlockCipher + BlockSizeUser<BlockSize = U16> + BlockEncrypt + KeyInit,
    J: AeadJob,
{
    match nonce_len {
        7 => ccm_tag::<C, U7, J>(tag_len, job),
        8 => ccm_tag::<C, U8, J>(tag_len, job),
        9 => ccm_tag::<C, U9, J>(tag_len, job),
        10 => ccm_tag::<C, U10, J>(tag_len, job),
        11 => ccm_tag::<C, U11, J>(tag_len, job),
        12 => ccm_tag::<C, U12, J>(tag_len, job),
        13 => ccm_tag::<C, U13, J>(tag_len, job),
        length => Err(Error::IvLengthInvalid { length }),
    }
}

fn ccm_tag<C, N, J>(tag_len: usize, job: J) -> Result<J::Output>
where
    C: BlockCipher + BlockSizeUser<BlockSize = U16> + BlockEncrypt + KeyInit,
    N: ArrayLength<u8> + ccm::NonceSize,
    J: AeadJob,
{
    match tag_len {
        4 => job.run::<Ccm<C, U4, N>>(),
        6 => job.run::<Ccm<C, U6, N>>(),
        8 => job.run::<Ccm<C, U8, N>>(),
        12 => job.run::<Ccm<C, U12, N>>(),
        14 => job.run::<Ccm<C, U14, N>>(),
        16 => job.run::<Ccm<C, U16, N>>(),
        length => Err(Error::AuthTagLengthInvalid { length }),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AeadKind {
    Gcm,
    Ccm,
    ChaCha20Poly1305,
}

impl AeadKind {
    fn dispatch<J: AeadJob>(self, key_len: usize, nonce_len: usize, tag_len: usize, job: J) -> Result<J::Output> {
        match self {
            Self::Gcm => gcm(key_len, nonce_len, tag_len, job),
            Self::Ccm => ccm(key_len, nonce_len, tag_len, job),
            Self::ChaCha20Poly1305 => job.run::<ChaCha20Poly1305>(),
        }
    }

    /// Resolves the tag length for a new transform, checking the nonce on the way.
    fn tag_length(self, nonce_len: usize, requested: Option<usize>) -> Result<usize> {
        let (nonce_ok, tag_len) = match self {
            Self::Gcm => ((1..=GCM_MAX_IV_SIZE).contains(&nonce_len), requested.unwrap_or(GCM_DEFAULT_TAG_SIZE)),
            Self::Ccm => (CCM_IV_SIZES.contains(&nonce_len), requested.ok_or(Error::AuthTagLengthRequired)?),
            Self::ChaCha20Poly1305 => (nonce_len == CHACHA20_POLY1305_IV_SIZE, requested.unwrap_or(POLY1305_TAG_SIZE)),
        };

        if !nonce_ok {
            return Err(Error::IvLengthInvalid { length: nonce_len });
        }

        let allowed: &[usize] = match self {
            Self::Gcm => GCM_TAG_SIZES,
            Self::Ccm => CCM_TAG_SIZES,
            Self::ChaCha20Poly1305 => &[POLY1305_TAG_SIZE],
        };
        if allowed.contains(&tag_len) { Ok(tag_len) } else { Err(Error::AuthTagLengthInvalid { length: tag_len }) }
    }
}

/// Buffered AEAD transform.
pub struct AeadTransform {
    kind: AeadKind,
    direction: Direction,
    key: SecretBytes,
    nonce: Vec<u8>,
    tag_length: usize,
    aad: Vec<u8>,
    plaintext_length: Option<usize>,
    expected_tag: Option<Vec<u8>>,
    tag: Option<Vec<u8>>,
    buffer: Vec<u8>,
    finished: bool,
}

impl AeadTransform {
    pub fn new(kind: AeadKind, direction: Direction, key: &[u8], nonce: &[u8], options: &TransformOptions) -> Result<Self> {
        let tag_length = kind.tag_length(nonce.len(), options.auth_tag_length)?;
        Ok(Self {
            kind,
            direction,
            key: SecretBytes::new(key),
            nonce: nonce.to_vec(),
            tag_length,
            aad: Vec::new(),
            plaintext_length: None,
            expected_tag: None,
            tag: None,
            buffer: Vec::new(),
            finished: false,
        })
    }

    fn ensure_open(&self) -> Result<()> {
        if self.finished { Err(Error::StreamClosed) } else { Ok(()) }
    }
}

impl Transform for AeadTransform {
    fn set_aad(&mut self, aad: &[u8], plaintext_length: Option<usize>) -> Result<()> {
        self.ensure_open()?;
        self.aad = aad.to_vec();
        self.plaintext_length = plaintext_length;
        Ok(())
    }

    fn set_auth_tag(&mut self, tag: &[u8]) -> Result<()> {
        self.ensure_open()?;
        if self.direction == Direction::Encrypt {
            return Err(Error::engine("the authentication tag can only be set when decrypting"));
        }
        if tag.len() != self.tag_length {
            return Err(Error::AuthTagLengthInvalid { length: tag.len() });
        }
        self.expected_tag = Some(tag.to_vec());
        Ok(())
    }

    fn update(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        self.ensure_open()?;
        self.buffer.extend_from_slice(input);
        Ok(Vec::new())
    }

    fn finalize(&mut self) -> Result<Vec<u8>> {
        self.ensure_open()?;
        self.finished = true;

        if let Some(declared) = self.plaintext_length.filter(|_| self.kind == AeadKind::Ccm) {
            if declared != self.buffer.len() {
                return Err(Error::engine(format!("declared plaintext length {declared} does not match message length {}", self.buffer.len())));
            }
        }

        let mut buffer = std::mem::take(&mut self.buffer);
        let key = self.key.expose_secret();

        match self.direction {
            Direction::Encrypt => {
                let job = Seal { key, nonce: &self.nonce, aad: &self.aad, buffer: &mut buffer };
                self.tag = Some(self.kind.dispatch(key.len(), self.nonce.len(), self.tag_length, job)?);
            }
            Direction::Decrypt => {
                let tag = self.expected_tag.as_deref().ok_or(Error::AuthTagRequired)?;
                let job = Open { key, nonce: &self.nonce, aad: &self.aad, tag, buffer: &mut buffer };
                self.kind.dispatch(key.len(), self.nonce.len(), self.tag_length, job)?;
            }
        }

        Ok(buffer)
    }

    fn auth_tag(&self) -> Option<Vec<u8>> {
        self.tag.clone()
    }
}
