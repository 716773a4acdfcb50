//! Message digests over a fixed, statically declared set of algorithms.
//!
//! The SHA-2 family comes from `sha2`, BLAKE3 from `blake3`. A [`Hasher`] is
//! a small `Copy` handle naming an algorithm; all hashing state lives in the
//! call or in the [`HashStream`] it creates, so one handle can be shared
//! freely.

use std::fmt;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use sha2::Digest as _;
use strum::{Display, EnumString};
use subtle::ConstantTimeEq;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};

use crate::config::CHUNK_SIZE;
use crate::error::{Error, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum HashAlgorithm {
    #[strum(serialize = "sha224")]
    Sha224,

    #[strum(serialize = "sha256")]
    Sha256,

    #[strum(serialize = "sha384")]
    Sha384,

    #[strum(serialize = "sha512")]
    Sha512,

    #[strum(serialize = "sha512-224")]
    Sha512_224,

    #[strum(serialize = "sha512-256")]
    Sha512_256,

    #[strum(serialize = "blake3")]
    Blake3,
}

impl HashAlgorithm {
    /// Every supported algorithm, in table order.
    pub const ALL: &'static [Self] = &[Self::Sha224, Self::Sha256, Self::Sha384, Self::Sha512, Self::Sha512_224, Self::Sha512_256, Self::Blake3];

    /// Digest size in bytes.
    pub const fn output_len(self) -> usize {
        match self {
            Self::Sha224 | Self::Sha512_224 => 28,
            Self::Sha256 | Self::Sha512_256 | Self::Blake3 => 32,
            Self::Sha384 => 48,
            Self::Sha512 => 64,
        }
    }
}

enum State {
    Sha224(sha2::Sha224),
    Sha256(sha2::Sha256),
    Sha384(sha2::Sha384),
    Sha512(sha2::Sha512),
    Sha512_224(sha2::Sha512_224),
    Sha512_256(sha2::Sha512_256),
    Blake3(Box<blake3::Hasher>),
}

impl State {
    fn new(algorithm: HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::Sha224 => Self::Sha224(sha2::Sha224::new()),
            HashAlgorithm::Sha256 => Self::Sha256(sha2::Sha256::new()),
            HashAlgorithm::Sha384 => Self::Sha384(sha2::Sha384::new()),
            HashAlgorithm::Sha512 => Self::Sha512(sha2::Sha512::new()),
            HashAlgorithm::Sha512_224 => Self::Sha512_224(sha2::Sha512_224::new()),
            HashAlgorithm::Sha512_256 => Self::Sha512_256(sha2::Sha512_256::new()),
            HashAlgorithm::Blake3 => Self::Blake3(Box::new(blake3::Hasher::new())),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            Self::Sha224(h) => h.update(data),
            Self::Sha256(h) => h.update(data),
            Self::Sha384(h) => h.update(data),
            Self::Sha512(h) => h.update(data),
            Self::Sha512_224(h) => h.update(data),
            Self::Sha512_256(h) => h.update(data),
            Self::Blake3(h) => {
                h.update(data);
            }
        }
    }

    fn finalize(self) -> Digest {
        let bytes = match self {
            Self::Sha224(h) => h.finalize().to_vec(),
            Self::Sha256(h) => h.finalize().to_vec(),
            Self::Sha384(h) => h.finalize().to_vec(),
            Self::Sha512(h) => h.finalize().to_vec(),
            Self::Sha512_224(h) => h.finalize().to_vec(),
            Self::Sha512_256(h) => h.finalize().to_vec(),
            Self::Blake3(h) => h.finalize().as_bytes().to_vec(),
        };
        Digest { bytes }
    }
}

/// A computed digest.
#[derive(Clone, PartialEq, Eq)]
pub struct Digest {
    bytes: Vec<u8>,
}

impl Digest {
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[inline]
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    /// Compares against `expected` in constant time.
    #[inline]
    pub fn verify(&self, expected: &[u8]) -> bool {
        bool::from(self.bytes.ct_eq(expected))
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.to_hex())
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Handle for one hash algorithm.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Hasher {
    algorithm: HashAlgorithm,
}

impl Hasher {
    pub const fn new(algorithm: HashAlgorithm) -> Self {
        Self { algorithm }
    }

    #[inline]
    pub const fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    pub fn name(&self) -> String {
        self.algorithm.to_string()
    }

    pub fn hash(&self, data: &[u8]) -> Digest {
        let mut state = State::new(self.algorithm);
        state.update(data);
        state.finalize()
    }

    /// Hashes everything `reader` yields until EOF.
    ///
    /// # Errors
    ///
    /// Returns an error if reading from the underlying stream fails.
    pub async fn hash_stream<R: AsyncRead + Unpin>(&self, mut reader: R) -> Result<Digest> {
        let mut state = State::new(self.algorithm);
        let mut buffer = vec![0u8; CHUNK_SIZE];

        loop {
            let bytes_read = reader.read(&mut buffer).await?;
            if bytes_read == 0 {
                break;
            }
            state.update(&buffer[..bytes_read]);
        }

        Ok(state.finalize())
    }

    /// A write-only sink; the digest is available once it has been shut down.
    pub fn create_stream(&self) -> HashStream {
        HashStream { algorithm: self.algorithm, state: Some(State::new(self.algorithm)), digest: None }
    }

    #[inline]
    pub fn clone_fresh_instance(&self) -> Self {
        Self::new(self.algorithm)
    }
}

/// [`AsyncWrite`] sink that hashes everything written to it.
pub struct HashStream {
    algorithm: HashAlgorithm,
    state: Option<State>,
    digest: Option<Digest>,
}

impl HashStream {
    /// # Errors
    ///
    /// [`Error::StreamNotFinished`] until the stream has been shut down.
    pub fn digest(&self) -> Result<Digest> {
        self.digest.clone().ok_or(Error::StreamNotFinished)
    }
}

impl fmt::Debug for HashStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashStream").field("algorithm", &self.algorithm).field("finished", &self.digest.is_some()).finish()
    }
}

impl AsyncWrite for HashStream {
    fn poll_write(self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        match this.state.as_mut() {
            Some(state) => {
                state.update(buf);
                Poll::Ready(Ok(buf.len()))
            }
            None => Poll::Ready(Err(Error::StreamClosed.into())),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if let Some(state) = this.state.take() {
            this.digest = Some(state.finalize());
        }
        Poll::Ready(Ok(()))
    }
}

/// One hasher per supported algorithm.
pub static HASHERS: [Hasher; 7] = [
    Hasher::new(HashAlgorithm::Sha224),
    Hasher::new(HashAlgorithm::Sha256),
    Hasher::new(HashAlgorithm::Sha384),
    Hasher::new(HashAlgorithm::Sha512),
    Hasher::new(HashAlgorithm::Sha512_224),
    Hasher::new(HashAlgorithm::Sha512_256),
    Hasher::new(HashAlgorithm::Blake3),
];

/// Looks a hasher up by name (`sha256`, `blake3`, ...). Case-insensitive.
pub fn find(name: &str) -> Option<Hasher> {
    name.parse().ok().map(Hasher::new)
}
