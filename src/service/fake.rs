use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::{
    routeros::{
        error::RouterError,
        ip::{Address, FilterRule, NewAddress},
        wireguard::{Interface, NewInterface, NewPeer, Peer},
        Created,
    },
    traits::RouterApi,
};

pub const SERVER_KEY: &str = "HIgo9xNzJMWLKASShiTqIybxZ0U3wGLiUeJ1PKf8ykw=";

/// In-memory router recording every PUT it receives.
#[derive(Default)]
pub struct FakeRouter {
    interfaces: Vec<Interface>,
    addresses: Vec<Address>,
    peers: Vec<Peer>,
    reject_peers: Option<String>,
    fail_rule: Option<usize>,
    added_peers: Mutex<Vec<NewPeer>>,
    added_interfaces: Mutex<Vec<NewInterface>>,
    added_addresses: Mutex<Vec<NewAddress>>,
    added_rules: Mutex<Vec<FilterRule>>,
}

impl FakeRouter {
    pub fn new(iface: &str, address: &str) -> Self {
        Self {
            interfaces: vec![Interface {
                id: Some("*A".to_owned()),
                name: Some(iface.to_owned()),
                public_key: Some(SERVER_KEY.to_owned()),
                listen_port: Some("13231".to_owned()),
            }],
            addresses: vec![Address {
                id: Some("*2".to_owned()),
                address: Some(address.to_owned()),
                interface: Some(iface.to_owned()),
                actual_interface: Some(iface.to_owned()),
            }],
            ..Default::default()
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_peers(mut self, addresses: &[&str]) -> Self {
        self.peers = addresses.iter().map(|a| Peer::with_address(*a)).collect();
        self
    }

    pub fn without_address(mut self) -> Self {
        self.addresses.clear();
        self
    }

    pub fn rejecting_peers(mut self, detail: &str) -> Self {
        self.reject_peers = Some(detail.to_owned());
        self
    }

    /// Fails the n-th (zero based) firewall rule PUT.
    pub fn failing_rule(mut self, n: usize) -> Self {
        self.fail_rule = Some(n);
        self
    }

    pub fn added_peers(&self) -> Vec<NewPeer> {
        self.added_peers.lock().unwrap().clone()
    }

    pub fn added_interfaces(&self) -> Vec<NewInterface> {
        self.added_interfaces.lock().unwrap().clone()
    }

    pub fn added_addresses(&self) -> Vec<NewAddress> {
        self.added_addresses.lock().unwrap().clone()
    }

    pub fn added_rules(&self) -> Vec<FilterRule> {
        self.added_rules.lock().unwrap().clone()
    }
}

fn bad_request(detail: &str) -> RouterError {
    RouterError::Status {
        status: StatusCode::BAD_REQUEST,
        detail: detail.to_owned(),
    }
}

fn created(n: usize) -> Created {
    Created {
        id: Some(format!("*{}", n + 1)),
    }
}

#[async_trait]
impl RouterApi for FakeRouter {
    async fn wireguard_interfaces(&self) -> Result<Vec<Interface>, RouterError> {
        Ok(self.interfaces.clone())
    }

    async fn ip_addresses(&self) -> Result<Vec<Address>, RouterError> {
        Ok(self.addresses.clone())
    }

    async fn wireguard_peers(&self) -> Result<Vec<Peer>, RouterError> {
        Ok(self.peers.clone())
    }

    async fn add_wireguard_peer(&self, peer: &NewPeer) -> Result<Created, RouterError> {
        if let Some(detail) = &self.reject_peers {
            return Err(bad_request(detail));
        }
        let mut added = self.added_peers.lock().unwrap();
        added.push(peer.clone());
        Ok(created(added.len() - 1))
    }

    async fn add_wireguard_interface(&self, iface: &NewInterface) -> Result<Created, RouterError> {
        let mut added = self.added_interfaces.lock().unwrap();
        added.push(iface.clone());
        Ok(created(added.len() - 1))
    }

    async fn add_ip_address(&self, address: &NewAddress) -> Result<Created, RouterError> {
        let mut added = self.added_addresses.lock().unwrap();
        added.push(address.clone());
        Ok(created(added.len() - 1))
    }

    async fn add_firewall_rule(&self, rule: &FilterRule) -> Result<Created, RouterError> {
        let mut added = self.added_rules.lock().unwrap();
        if self.fail_rule == Some(added.len()) {
            return Err(bad_request("failure: rule rejected"));
        }
        added.push(rule.clone());
        Ok(created(added.len() - 1))
    }
}
