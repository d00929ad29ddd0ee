use std::{fmt, io, process::Stdio};

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use rand::rngs::OsRng;
use thiserror::Error;
use tokio::{io::AsyncWriteExt, process::Command};
use tracing::{debug, instrument};
use x25519_dalek::StaticSecret;

use crate::traits::KeyGenerator;

const KEY_LEN: usize = 32;

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("can't run `{tool}`: {source}")]
    Spawn { tool: String, source: io::Error },
    #[error("`{tool}` exited with {status}: {stderr}")]
    Failed {
        tool: String,
        status: std::process::ExitStatus,
        stderr: String,
    },
    #[error("invalid key")]
    InvalidKey,
}

/// Base64 encoded X25519 private key. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct PrivateKey(String);

impl PrivateKey {
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(..)")
    }
}

impl TryFrom<String> for PrivateKey {
    type Error = KeyError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        let s = s.trim().to_owned();
        decode_key(&s)?;
        Ok(Self(s))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey(String);

impl PublicKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PublicKey {
    type Error = KeyError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        let s = s.trim().to_owned();
        decode_key(&s)?;
        Ok(Self(s))
    }
}

pub struct ClientKeyPair {
    pub private_key: PrivateKey,
    pub public_key: PublicKey,
}

impl ClientKeyPair {
    pub async fn generate(keys: &dyn KeyGenerator) -> Result<Self, KeyError> {
        let private_key = keys.generate_private_key().await?;
        let public_key = keys.derive_public_key(&private_key).await?;
        Ok(Self {
            private_key,
            public_key,
        })
    }
}

fn decode_key(s: &str) -> Result<[u8; KEY_LEN], KeyError> {
    let mut key = [0u8; KEY_LEN];
    // base64 of 32 bytes decodes into at most 33 bytes of scratch
    let mut buf = [0u8; KEY_LEN + 3];
    match STANDARD.decode_slice(s.as_bytes(), &mut buf) {
        Ok(KEY_LEN) => {
            key.copy_from_slice(&buf[..KEY_LEN]);
            Ok(key)
        }
        _ => Err(KeyError::InvalidKey),
    }
}

/// In-process X25519 keys, encoded the same way `wg genkey` does.
#[derive(Debug, Default, Clone, Copy)]
pub struct X25519Keys;

#[async_trait]
impl KeyGenerator for X25519Keys {
    async fn generate_private_key(&self) -> Result<PrivateKey, KeyError> {
        let private = StaticSecret::new(OsRng);
        Ok(PrivateKey(STANDARD.encode(private.to_bytes())))
    }

    async fn derive_public_key(&self, key: &PrivateKey) -> Result<PublicKey, KeyError> {
        let private = StaticSecret::from(decode_key(key.expose())?);
        let public = x25519_dalek::PublicKey::from(&private);
        Ok(PublicKey(STANDARD.encode(public.to_bytes())))
    }
}

/// Keys produced by the external `wg` tool.
#[derive(Debug, Clone)]
pub struct WgTool {
    binary: String,
}

impl Default for WgTool {
    fn default() -> Self {
        Self::with_binary("wg")
    }
}

impl WgTool {
    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Runs `wg --version`, failing when the tool is missing.
    #[instrument(skip(self))]
    pub async fn version(&self) -> Result<String, KeyError> {
        let out = self.run(&["--version"], None).await?;
        Ok(out.trim().to_owned())
    }

    async fn run(&self, args: &[&str], input: Option<&str>) -> Result<String, KeyError> {
        let tool = format!("{} {}", self.binary, args.join(" "));
        let spawn_err = |source| KeyError::Spawn {
            tool: tool.clone(),
            source,
        };

        let mut child = Command::new(&self.binary)
            .args(args)
            .stdin(if input.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(spawn_err)?;

        if let (Some(input), Some(mut stdin)) = (input, child.stdin.take()) {
            stdin.write_all(input.as_bytes()).await.map_err(spawn_err)?;
            stdin.write_all(b"\n").await.map_err(spawn_err)?;
        }

        let output = child.wait_with_output().await.map_err(spawn_err)?;
        if !output.status.success() {
            return Err(KeyError::Failed {
                tool,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }
        debug!("`{tool}` finished");

        String::from_utf8(output.stdout).map_err(|_| KeyError::InvalidKey)
    }
}

#[async_trait]
impl KeyGenerator for WgTool {
    async fn generate_private_key(&self) -> Result<PrivateKey, KeyError> {
        PrivateKey::try_from(self.run(&["genkey"], None).await?)
    }

    async fn derive_public_key(&self, key: &PrivateKey) -> Result<PublicKey, KeyError> {
        PublicKey::try_from(self.run(&["pubkey"], Some(key.expose())).await?)
    }
}
