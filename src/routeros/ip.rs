use cidr::Ipv4Cidr;
use serde::{Deserialize, Serialize};

const PLACE_FIRST: &str = "1";

/// `/ip/address` entry.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Address {
    #[serde(rename = ".id", default)]
    pub id: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub interface: Option<String>,
    #[serde(default)]
    pub actual_interface: Option<String>,
}

impl Address {
    /// Prefers `actual-interface`, the name the address is really bound to.
    pub fn bound_to(&self, iface: &str) -> bool {
        match (&self.actual_interface, &self.interface) {
            (Some(actual), _) => actual == iface,
            (None, Some(configured)) => configured == iface,
            (None, None) => false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NewAddress {
    pub address: String,
    pub interface: String,
}

/// `/ip/firewall/filter` rule, always inserted on top of the input chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct FilterRule {
    pub action: String,
    pub chain: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dst_port: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src_address: Option<String>,
    pub comment: String,
    pub place_before: String,
}

impl FilterRule {
    pub fn open_udp_port(port: u16) -> Self {
        Self {
            action: "accept".to_owned(),
            chain: "input".to_owned(),
            protocol: Some("udp".to_owned()),
            dst_port: Some(port.to_string()),
            src_address: None,
            comment: format!("Open udp port {port} for wg connections"),
            place_before: PLACE_FIRST.to_owned(),
        }
    }

    pub fn allow_from(network: Ipv4Cidr) -> Self {
        Self {
            action: "accept".to_owned(),
            chain: "input".to_owned(),
            protocol: None,
            dst_port: None,
            src_address: Some(network.to_string()),
            comment: "VPN clients can access devices connected on the router".to_owned(),
            place_before: PLACE_FIRST.to_owned(),
        }
    }
}
