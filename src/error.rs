//! Error types shared by every cipher mode, the engine and the key helpers.
//!
//! Validation failures are raised synchronously, before any transform is
//! opened. [`Error::AuthenticationFailed`] is only ever produced by the engine
//! when an authenticated mode finalises a decryption with a bad tag, so callers
//! can tell "my inputs were wrong" apart from "the data was tampered with"
//! through [`Error::class`].

use std::io;
use std::sync::Arc;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Broad category of an [`Error`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorClass {
    /// Caller-supplied options were rejected before any work was done.
    Validation,

    /// An authenticated mode rejected the ciphertext, tag or AAD.
    Authentication,

    /// The primitive engine could not run the requested transform.
    Engine,

    /// A stream was used out of order.
    Stream,

    /// Key derivation parameters were incomplete or out of range.
    KeyDerivation,

    /// Underlying I/O failed.
    Io,
}

#[derive(Clone, Debug, thiserror::Error)]
pub enum Error {
    /// The key is missing or empty.
    #[error("the key must be a non-empty byte sequence")]
    KeyFormatInvalid,

    /// The key length is not accepted by the cipher.
    #[error("invalid key length: {length} bytes")]
    KeyLengthInvalid { length: usize },

    /// The IV is missing where one is required.
    #[error("the IV must be a byte sequence")]
    IvFormatInvalid,

    /// The IV length is not accepted by the cipher.
    #[error("invalid IV length: {length} bytes")]
    IvLengthInvalid { length: usize },

    /// AAD was supplied to a mode that cannot authenticate it.
    #[error("additional authenticated data is not accepted by this cipher")]
    AadFormatInvalid,

    /// The mode requires AAD and none was supplied.
    #[error("additional authenticated data is required by this cipher")]
    AadRequired,

    /// Decryption under an authenticated mode needs the authentication tag.
    #[error("the authentication tag is required for decryption")]
    AuthTagRequired,

    /// The mode cannot infer a tag length and none was given.
    #[error("the authentication tag length is required by this cipher")]
    AuthTagLengthRequired,

    /// The tag length is outside the set the mode accepts.
    #[error("invalid authentication tag length: {length} bytes")]
    AuthTagLengthInvalid { length: usize },

    /// The mode requires the plaintext length up front.
    #[error("the plaintext length is required by this cipher")]
    PlaintextLengthRequired,

    /// An option that only makes sense for another kind of mode was supplied.
    #[error("option `{option}` is not supported by {cipher}")]
    OptionNotSupported { option: &'static str, cipher: String },

    /// The tag did not verify.
    #[error("authentication failed: ciphertext, tag or AAD was modified")]
    AuthenticationFailed,

    /// The engine does not know the primitive, or the key does not fit it.
    #[error("unsupported primitive: {0}")]
    UnsupportedPrimitive(String),

    /// The engine rejected the data (bad padding, misaligned input, ...).
    #[error("{0}")]
    Engine(String),

    /// Cipher info was requested before the stream finished.
    #[error("cipher info is only available after the stream has finished")]
    StreamNotFinished,

    /// The stream was already finished or aborted.
    #[error("the stream is closed")]
    StreamClosed,

    /// PBKDF2 key width must be a positive multiple of 8 bits.
    #[error("invalid key width: {0} bits")]
    KeyWidthInvalid(usize),

    /// PBKDF2 needs at least one iteration.
    #[error("invalid iteration count: {0}")]
    IterationsInvalid(u32),

    /// A PBKDF2 parameter was neither configured nor supplied.
    #[error("missing key derivation parameter: {0}")]
    MissingKdfParameter(&'static str),

    /// The digest is unknown or cannot be used for the requested job.
    #[error("unsupported digest algorithm: {0}")]
    UnsupportedDigest(String),

    #[error("i/o error: {0}")]
    Io(Arc<io::Error>),
}

impl Error {
    pub(crate) fn engine(message: impl Into<String>) -> Self {
        Self::Engine(message.into())
    }

    /// Returns the broad category of this error.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::KeyFormatInvalid
            | Self::KeyLengthInvalid { .. }
            | Self::IvFormatInvalid
            | Self::IvLengthInvalid { .. }
            | Self::AadFormatInvalid
            | Self::AadRequired
            | Self::AuthTagRequired
            | Self::AuthTagLengthRequired
            | Self::AuthTagLengthInvalid { .. }
            | Self::PlaintextLengthRequired
            | Self::OptionNotSupported { .. } => ErrorClass::Validation,
            Self::AuthenticationFailed => ErrorClass::Authentication,
            Self::UnsupportedPrimitive(_) | Self::Engine(_) => ErrorClass::Engine,
            Self::StreamNotFinished | Self::StreamClosed => ErrorClass::Stream,
            Self::KeyWidthInvalid(_) | Self::IterationsInvalid(_) | Self::MissingKdfParameter(_) | Self::UnsupportedDigest(_) => ErrorClass::KeyDerivation,
            Self::Io(_) => ErrorClass::Io,
        }
    }

    #[inline]
    pub fn is_validation(&self) -> bool {
        self.class() == ErrorClass::Validation
    }

    #[inline]
    pub fn is_authentication_failure(&self) -> bool {
        self.class() == ErrorClass::Authentication
    }

    /// Recovers the typed error carried by an `io::Error` raised from a stream.
    pub fn from_io(err: &io::Error) -> Option<&Self> {
        err.get_ref().and_then(|inner| inner.downcast_ref::<Self>())
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        match Self::from_io(&err) {
            Some(typed) => typed.clone(),
            None => Self::Io(Arc::new(err)),
        }
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        let kind = match &err {
            Error::Io(inner) => inner.kind(),
            Error::AuthenticationFailed | Error::Engine(_) => io::ErrorKind::InvalidData,
            Error::StreamClosed => io::ErrorKind::BrokenPipe,
            _ => io::ErrorKind::InvalidInput,
        };
        io::Error::new(kind, err)
    }
}
