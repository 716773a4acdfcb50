//! The concrete modes, one `static` per algorithm and mode.

mod aes;
mod chacha20;
mod rc4;

#[allow(deprecated)]
pub use aes::AES_ECB;
pub use aes::{AES_CBC, AES_CCM, AES_CFB, AES_CTR, AES_GCM, AES_OFB, AES_XTS};
pub use chacha20::{CHACHA20, CHACHA20_POLY1305};
#[allow(deprecated)]
pub use rc4::RC4;
