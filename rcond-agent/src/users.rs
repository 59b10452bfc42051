//! SSH authorized_keys management.

use std::io;
use std::path::PathBuf;

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::fs::{self, DirBuilder, OpenOptions};
use tokio::io::AsyncWriteExt;

const KEY_TYPES: &[&str] = &[
    "ssh-ed25519",
    "ssh-rsa",
    "ssh-dss",
    "ecdsa-sha2-nistp256",
    "ecdsa-sha2-nistp384",
    "ecdsa-sha2-nistp521",
    "sk-ssh-ed25519@openssh.com",
    "sk-ecdsa-sha2-nistp256@openssh.com",
];

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("invalid SSH public key: {0}")]
    InvalidKey(String),

    #[error("invalid user name: {0:?}")]
    InvalidUser(String),

    #[error("authorized_keys I/O failed: {0}")]
    Io(#[from] io::Error),
}

/// A validated `authorized_keys` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    line: String,
    blob: Vec<u8>,
}

impl PublicKey {
    /// Parses `<type> <base64 blob> [comment]`.
    ///
    /// The blob must decode and start with the same key type string.
    pub fn parse(line: &str) -> Result<Self, KeyError> {
        let line = line.trim();
        if line.contains('\n') {
            return Err(KeyError::InvalidKey("expected a single line".into()));
        }

        let mut fields = line.split_whitespace();
        let (Some(kind), Some(encoded)) = (fields.next(), fields.next()) else {
            return Err(KeyError::InvalidKey("expected '<type> <key> [comment]'".into()));
        };
        if !KEY_TYPES.contains(&kind) {
            return Err(KeyError::InvalidKey(format!("unsupported key type {kind}")));
        }

        let blob = STANDARD
            .decode(encoded)
            .map_err(|e| KeyError::InvalidKey(format!("key is not base64: {e}")))?;
        if embedded_type(&blob) != Some(kind.as_bytes()) {
            return Err(KeyError::InvalidKey(format!(
                "key data does not match type {kind}"
            )));
        }

        Ok(Self {
            line: line.to_string(),
            blob,
        })
    }

    /// The line as written to `authorized_keys`.
    pub fn line(&self) -> &str {
        &self.line
    }

    /// OpenSSH style `SHA256:` fingerprint.
    pub fn fingerprint(&self) -> String {
        format!("SHA256:{}", STANDARD_NO_PAD.encode(Sha256::digest(&self.blob)))
    }
}

/// The length-prefixed type string at the start of an SSH key blob.
fn embedded_type(blob: &[u8]) -> Option<&[u8]> {
    let len_bytes: [u8; 4] = blob.get(..4)?.try_into().ok()?;
    let len = u32::from_be_bytes(len_bytes) as usize;
    blob.get(4..4 + len)
}

/// Edits `<home_root>/<user>/.ssh/authorized_keys`.
#[derive(Debug, Clone)]
pub struct AuthorizedKeys {
    home_root: PathBuf,
}

impl Default for AuthorizedKeys {
    fn default() -> Self {
        Self::new("/home")
    }
}

impl AuthorizedKeys {
    pub fn new(home_root: impl Into<PathBuf>) -> Self {
        Self {
            home_root: home_root.into(),
        }
    }

    fn ssh_dir(&self, user: &str) -> Result<PathBuf, KeyError> {
        if user.is_empty() || user.contains('/') || user.contains("..") {
            return Err(KeyError::InvalidUser(user.to_string()));
        }
        Ok(self.home_root.join(user).join(".ssh"))
    }

    /// Appends `key` unless the exact line is already present.
    ///
    /// Returns the key fingerprint either way.
    pub async fn add(&self, user: &str, key: &str) -> Result<String, KeyError> {
        let key = PublicKey::parse(key)?;
        let dir = self.ssh_dir(user)?;
        DirBuilder::new().recursive(true).mode(0o700).create(&dir).await?;

        let path = dir.join("authorized_keys");
        let existing = match fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e.into()),
        };

        if existing.lines().any(|l| l.trim() == key.line()) {
            tracing::debug!(user, "key already authorized");
            return Ok(key.fingerprint());
        }

        let mut entry = String::new();
        if !existing.is_empty() && !existing.ends_with('\n') {
            entry.push('\n');
        }
        entry.push_str(key.line());
        entry.push('\n');

        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .mode(0o600)
            .open(&path)
            .await?;
        file.write_all(entry.as_bytes()).await?;
        file.flush().await?;

        tracing::info!(user, fingerprint = %key.fingerprint(), "key authorized");
        Ok(key.fingerprint())
    }

    /// Removes every line equal to `key`. A missing file is not an error.
    pub async fn remove(&self, user: &str, key: &str) -> Result<(), KeyError> {
        let key = PublicKey::parse(key)?;
        let path = self.ssh_dir(user)?.join("authorized_keys");

        let existing = match fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        let kept: Vec<&str> = existing
            .lines()
            .filter(|l| !l.trim().is_empty() && l.trim() != key.line())
            .collect();

        let mut contents = kept.join("\n");
        if !contents.is_empty() {
            contents.push('\n');
        }
        fs::write(&path, contents).await?;

        tracing::info!(user, fingerprint = %key.fingerprint(), "key revoked");
        Ok(())
    }
}
