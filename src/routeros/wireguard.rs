use serde::{Deserialize, Serialize};

/// `/interface/wireguard` entry. RouterOS reports every value as a string.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Interface {
    #[serde(rename = ".id", default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub public_key: Option<String>,
    #[serde(default)]
    pub listen_port: Option<String>,
}

/// `/interface/wireguard/peers` entry.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Peer {
    #[serde(rename = ".id", default)]
    pub id: Option<String>,
    #[serde(default)]
    pub interface: Option<String>,
    #[serde(default)]
    pub public_key: Option<String>,
    #[serde(default)]
    pub allowed_address: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
}

impl Peer {
    pub fn with_address(allowed_address: impl Into<String>) -> Self {
        Self {
            allowed_address: Some(allowed_address.into()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct NewInterface {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listen_port: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct NewPeer {
    pub interface: String,
    pub public_key: String,
    pub allowed_address: String,
    pub comment: String,
}
