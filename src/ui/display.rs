//! Terminal output for the catalog listing and operation summaries.

use std::path::Path;

use bytesize::ByteSize;
use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;

use ciphermode::cipher::{CipherInfo, CipherMode, catalog};
use ciphermode::hash::HASHERS;
use ciphermode::types::Direction;

fn key_sizes(mode: &dyn CipherMode) -> String {
    let sizes: Vec<String> = (1..=64).filter(|len| mode.validate_key(&vec![0u8; *len])).map(|len| (len * 8).to_string()).collect();
    if sizes.len() > 8 { "any".to_owned() } else { sizes.join("/") }
}

fn kind(mode: &dyn CipherMode) -> &'static str {
    let descriptor = mode.descriptor();
    match (descriptor.requires_iv(), mode.mode()) {
        (false, _) => "plain",
        (true, "gcm" | "ccm" | "poly1305") => "authenticated",
        (true, _) => "iv",
    }
}

/// Builds the table of cipher modes.
pub fn catalog_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec!["Name", "Algorithm", "Mode", "Key bits", "Kind"]);

    for mode in catalog::all() {
        let shown_mode = if mode.mode().is_empty() { "-" } else { mode.mode() };
        table.add_row(vec![mode.name(), mode.algorithm().to_owned(), shown_mode.to_owned(), key_sizes(*mode), kind(*mode).to_owned()]);
    }
    table
}

/// Builds the table of hash algorithms.
pub fn hash_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec!["Hash", "Digest bytes"]);

    for hasher in &HASHERS {
        table.add_row(vec![hasher.name(), hasher.algorithm().output_len().to_string()]);
    }
    table
}

pub fn show_catalog() {
    println!("{}", catalog_table());
    println!("{}", hash_table());
}

/// Prints what the caller needs to keep in order to decrypt later.
pub fn show_cipher_info(info: &CipherInfo, salt: &[u8]) {
    println!("cipher:  {}", info.cipher);
    println!("salt:    {}", hex::encode(salt));
    if let Some(iv) = &info.iv {
        println!("iv:      {}", hex::encode(iv));
    }
    if let Some(tag) = &info.auth_tag {
        println!("tag:     {}", hex::encode(tag));
    }
}

pub fn show_success(direction: Direction, path: &Path, size: u64) {
    let action = match direction {
        Direction::Encrypt => "encrypted",
        Direction::Decrypt => "decrypted",
    };
    println!("✓ File {action} successfully: {} ({})", path.display(), ByteSize::b(size));
}
