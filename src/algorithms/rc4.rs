use crate::cipher::PlainCipher;
use crate::cipher::validators::require_key;
use crate::error::Result;

fn rc4_key(key: &[u8]) -> Result<()> {
    require_key(key)
}

fn resolve(_key_len: usize, _mode: &str) -> String {
    "rc4".to_owned()
}

/// RC4 with a key of any non-empty length. Broken; kept for reading old data.
#[deprecated(note = "RC4 keystream biases are practically exploitable; use CHACHA20_POLY1305")]
pub static RC4: PlainCipher = PlainCipher::build("rc4", "", rc4_key, resolve).deprecated();
