use std::{io, net::Ipv4Addr, path::Path, str::FromStr};

use thiserror::Error;
use tokio::{fs::OpenOptions, io::AsyncWriteExt};

use super::keys::PrivateKey;

pub const PERSISTENT_KEEPALIVE: u16 = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseConfigError {
    #[error("missing `{0}`")]
    Missing(&'static str),
    #[error("invalid `{key}` value: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Client side tunnel configuration handed to the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub private_key: PrivateKey,
    pub address: Ipv4Addr,
    pub dns: String,
    pub server_public_key: String,
    pub allowed_ips: String,
    pub endpoint: String,
}

impl ClientConfig {
    pub fn config_file(&self) -> String {
        format!(
            "[Interface]
PrivateKey = {priv_key}
Address = {ip}
DNS = {dns}

[Peer]
PublicKey = {pub_key}
AllowedIPs = {allowed_ips}
Endpoint = {endpoint}
PersistentKeepalive = {keepalive}
",
            priv_key = self.private_key.expose(),
            ip = self.address,
            dns = self.dns,
            pub_key = self.server_public_key,
            allowed_ips = self.allowed_ips,
            endpoint = self.endpoint,
            keepalive = PERSISTENT_KEEPALIVE,
        )
    }

    /// Writes the file, replacing anything already at `path`. On unix the
    /// file ends up 0600 even if it existed with a wider mode.
    pub async fn write_to(&self, path: &Path) -> io::Result<()> {
        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options.open(path).await?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))
                .await?;
        }
        file.write_all(self.config_file().as_bytes()).await?;
        file.flush().await
    }
}

impl FromStr for ClientConfig {
    type Err = ParseConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut section = "";
        let mut private_key = None;
        let mut address = None;
        let mut dns = None;
        let mut server_public_key = None;
        let mut allowed_ips = None;
        let mut endpoint = None;

        for line in s.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if line.starts_with('[') && line.ends_with(']') {
                section = &line[1..line.len() - 1];
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let value = value.trim().to_owned();
            match (section, key.trim()) {
                ("Interface", "PrivateKey") => private_key = Some(value),
                ("Interface", "Address") => address = Some(value),
                ("Interface", "DNS") => dns = Some(value),
                ("Peer", "PublicKey") => server_public_key = Some(value),
                ("Peer", "AllowedIPs") => allowed_ips = Some(value),
                ("Peer", "Endpoint") => endpoint = Some(value),
                _ => {}
            }
        }

        let private_key = private_key.ok_or(ParseConfigError::Missing("PrivateKey"))?;
        let private_key = PrivateKey::try_from(private_key).map_err(|_| {
            ParseConfigError::Invalid {
                key: "PrivateKey",
                value: "<redacted>".to_owned(),
            }
        })?;
        let address = address.ok_or(ParseConfigError::Missing("Address"))?;
        let address = address
            .split('/')
            .next()
            .and_then(|a| a.parse().ok())
            .ok_or_else(|| ParseConfigError::Invalid {
                key: "Address",
                value: address.clone(),
            })?;

        Ok(Self {
            private_key,
            address,
            dns: dns.ok_or(ParseConfigError::Missing("DNS"))?,
            server_public_key: server_public_key.ok_or(ParseConfigError::Missing("PublicKey"))?,
            allowed_ips: allowed_ips.ok_or(ParseConfigError::Missing("AllowedIPs"))?,
            endpoint: endpoint.ok_or(ParseConfigError::Missing("Endpoint"))?,
        })
    }
}
