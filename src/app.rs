use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use tokio::fs::File;
use tracing::Level;

use ciphermode::cipher::{CipherMode, CipherOptions, DecipherOptions, catalog};
use ciphermode::config::{PBKDF2_DEFAULT_ITERATIONS, PBKDF2_SALT_LEN};
use ciphermode::engine::random_bytes;
use ciphermode::hash::{self, HashAlgorithm};
use ciphermode::kdf::{KeyOptions, Pbkdf2KeyGenerator};
use ciphermode::secret::{Passphrase, SecretBytes};
use ciphermode::types::Direction;

use crate::ui::display;
use crate::ui::progress::{Bar, ProgressReader};

#[derive(Subcommand)]
pub enum Commands {
    /// List every cipher mode and hash algorithm.
    List,

    /// Encrypt a file with a key derived from a password.
    Encrypt {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(short, long)]
        password: String,

        #[arg(short, long, default_value = "aes-gcm")]
        cipher: String,

        #[arg(long, default_value_t = 256)]
        key_bits: usize,

        /// Additional authenticated data, for authenticated modes.
        #[arg(long)]
        aad: Option<String>,
    },

    /// Decrypt a file using the values printed by `encrypt`.
    Decrypt {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(short, long)]
        password: String,

        #[arg(short, long, default_value = "aes-gcm")]
        cipher: String,

        #[arg(long, default_value_t = 256)]
        key_bits: usize,

        /// Salt in hex.
        #[arg(long)]
        salt: String,

        /// IV in hex.
        #[arg(long)]
        iv: Option<String>,

        /// Authentication tag in hex.
        #[arg(long)]
        tag: Option<String>,

        #[arg(long)]
        aad: Option<String>,
    },

    /// Print the digest of a file.
    Hash {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long, default_value = "sha256")]
        algorithm: String,
    },
}

#[derive(Parser)]
#[command(name = "ciphermode", version = "26.1.0", about = "Encrypt, decrypt and hash files with any of the supported cipher modes.")]
pub struct App {
    /// Log debug output to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by both directions of a file transform.
struct FileJob<'a> {
    input: &'a Path,
    output: PathBuf,
    mode: &'static dyn CipherMode,
    key: SecretBytes,
    aad: Option<Vec<u8>>,
}

impl App {
    pub fn init() -> Result<Self> {
        let app = Self::parse();

        let level = if app.verbose { Level::DEBUG } else { Level::WARN };
        let subscriber = tracing_subscriber::fmt().with_writer(std::io::stderr).with_max_level(level).with_file(true).with_line_number(true).finish();
        tracing::subscriber::set_global_default(subscriber)?;

        Ok(app)
    }

    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::List => {
                display::show_catalog();
                Ok(())
            }
            Commands::Encrypt { input, output, password, cipher, key_bits, aad } => {
                let mode = Self::find_mode(&cipher)?;
                let salt = random_bytes(PBKDF2_SALT_LEN)?;
                let key = Self::derive_key(password, &salt, key_bits).await?;
                let output = output.unwrap_or_else(|| Self::sibling(&input, ".enc"));

                let job = FileJob { input: &input, output, mode, key, aad: aad.map(String::into_bytes) };
                Self::encrypt(job, &salt).await
            }
            Commands::Decrypt { input, output, password, cipher, key_bits, salt, iv, tag, aad } => {
                let mode = Self::find_mode(&cipher)?;
                let salt = hex::decode(&salt).context("salt is not valid hex")?;
                let key = Self::derive_key(password, &salt, key_bits).await?;
                let output = output.unwrap_or_else(|| Self::sibling(&input, ".dec"));
                let iv = iv.map(hex::decode).transpose().context("iv is not valid hex")?;
                let tag = tag.map(hex::decode).transpose().context("tag is not valid hex")?;

                let job = FileJob { input: &input, output, mode, key, aad: aad.map(String::into_bytes) };
                Self::decrypt(job, iv, tag).await
            }
            Commands::Hash { input, algorithm } => {
                let hasher = hash::find(&algorithm).ok_or_else(|| anyhow!("unknown hash algorithm: {algorithm}"))?;
                let file = File::open(&input).await.with_context(|| format!("failed to open {}", input.display()))?;
                let size = file.metadata().await?.len();

                let reader = ProgressReader::new(file, Bar::new(size, "Hashing...")?);
                let digest = hasher.hash_stream(reader).await.context("failed to hash file")?;
                println!("{digest}  {}", input.display());
                Ok(())
            }
        }
    }

    fn sibling(path: &Path, suffix: &str) -> PathBuf {
        let mut name = path.as_os_str().to_owned();
        name.push(suffix);
        PathBuf::from(name)
    }

    fn find_mode(name: &str) -> Result<&'static dyn CipherMode> {
        catalog::find(name).ok_or_else(|| anyhow!("unknown cipher: {name} (see `ciphermode list`)"))
    }

    async fn derive_key(password: String, salt: &[u8], key_bits: usize) -> Result<SecretBytes> {
        let generator = Pbkdf2KeyGenerator::new(
            KeyOptions::default().with_salt(salt).with_key_width(key_bits).with_iterations(PBKDF2_DEFAULT_ITERATIONS).with_digest(HashAlgorithm::Sha256),
        )?;
        let key = generator.derive_async(&Passphrase::from(password), &KeyOptions::default()).await.context("key derivation failed")?;
        Ok(key)
    }

    /// CCM needs the message length up front and always authenticates some AAD.
    fn base_options(job: &FileJob<'_>, size: u64) -> Result<CipherOptions> {
        let mut options = CipherOptions::new(job.key.expose_secret());
        options.aad = job.aad.clone();

        if job.mode.mode() == "ccm" {
            options.aad.get_or_insert_with(Vec::new);
            options.plaintext_length = Some(usize::try_from(size)?);
        }
        Ok(options)
    }

    async fn encrypt(job: FileJob<'_>, salt: &[u8]) -> Result<()> {
        let (reader, size) = Self::open_input(job.input, Direction::Encrypt).await?;
        let mut options = Self::base_options(&job, size)?;
        if job.mode.mode() == "ccm" {
            options.auth_tag_length = Some(16);
        }

        let stream = job.mode.create_encryption_stream(&options)?;
        let writer = File::create(&job.output).await.with_context(|| format!("failed to create {}", job.output.display()))?;
        let info = stream.pipe(reader, writer).await.context("encryption failed")?;

        display::show_success(Direction::Encrypt, &job.output, size);
        display::show_cipher_info(&info, salt);
        Ok(())
    }

    async fn decrypt(job: FileJob<'_>, iv: Option<Vec<u8>>, tag: Option<Vec<u8>>) -> Result<()> {
        let (reader, size) = Self::open_input(job.input, Direction::Decrypt).await?;
        let mut options = Self::base_options(&job, size)?;
        options.iv = iv;

        let options = DecipherOptions { options, auth_tag: tag };
        let stream = job.mode.create_decryption_stream(&options)?;
        let writer = File::create(&job.output).await.with_context(|| format!("failed to create {}", job.output.display()))?;

        if let Err(err) = stream.pipe(reader, writer).await {
            tokio::fs::remove_file(&job.output).await.ok();
            return Err(err).context("decryption failed");
        }

        display::show_success(Direction::Decrypt, &job.output, size);
        Ok(())
    }

    async fn open_input(path: &Path, direction: Direction) -> Result<(ProgressReader<File>, u64)> {
        let file = File::open(path).await.with_context(|| format!("failed to open {}", path.display()))?;
        let size = file.metadata().await?.len();
        let bar = Bar::new(size, direction.progress_label())?;
        Ok((ProgressReader::new(file, bar), size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_file_roundtrip_for_every_mode() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("plain.txt");
        tokio::fs::write(&input, b"file contents that span more than one block").await.unwrap();

        for mode in catalog::all() {
            let material: Vec<u8> = (0..64).collect();
            let key = SecretBytes::new(&material[..if mode.name() == "aes-xts" { 64 } else { 32 }]);
            let encrypted = dir.path().join(format!("{}.enc", mode.name()));
            let decrypted = dir.path().join(format!("{}.dec", mode.name()));

            let job = FileJob { input: &input, output: encrypted.clone(), mode: *mode, key: key.clone(), aad: None };
            let (reader, size) = App::open_input(job.input, Direction::Encrypt).await.unwrap();
            let mut options = App::base_options(&job, size).unwrap();
            if mode.mode() == "ccm" {
                options.auth_tag_length = Some(16);
            }
            let stream = mode.create_encryption_stream(&options).unwrap();
            let info = stream.pipe(reader, File::create(&encrypted).await.unwrap()).await.unwrap();

            let job = FileJob { input: &encrypted, output: decrypted.clone(), mode: *mode, key, aad: None };
            App::decrypt(job, info.iv, info.auth_tag).await.unwrap();

            assert_eq!(tokio::fs::read(&decrypted).await.unwrap(), b"file contents that span more than one block", "{}", mode.name());
        }
    }

    #[tokio::test]
    async fn test_failed_decrypt_removes_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("bogus.enc");
        let output = dir.path().join("bogus.dec");
        tokio::fs::write(&input, [0u8; 48]).await.unwrap();

        let job = FileJob { input: &input, output: output.clone(), mode: catalog::find("aes-gcm").unwrap(), key: SecretBytes::new(&[1u8; 32]), aad: None };
        assert!(App::decrypt(job, Some(vec![0u8; 12]), Some(vec![0u8; 16])).await.is_err());
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_decrypt_rejects_malformed_salt() {
        let app = App::try_parse_from(["ciphermode", "decrypt", "-i", "missing.enc", "-p", "secret", "--salt", "not-hex"]).unwrap();
        let err = app.execute().await.unwrap_err();
        assert_eq!(err.to_string(), "salt is not valid hex");
        assert!(err.downcast_ref::<hex::FromHexError>().is_some());
    }

    #[test]
    fn test_sibling_appends_suffix() {
        assert_eq!(App::sibling(Path::new("dir/report.pdf"), ".enc"), PathBuf::from("dir/report.pdf.enc"));
    }

    #[test]
    fn test_unknown_cipher() {
        assert!(App::find_mode("aes-siv").is_err());
        assert!(App::find_mode("aes-gcm").is_ok());
    }
}
