use async_trait::async_trait;

use crate::{
    routeros::{
        error::RouterError,
        ip::{Address, FilterRule, NewAddress},
        wireguard::{Interface, NewInterface, NewPeer, Peer},
        Created,
    },
    service::keys::{KeyError, PrivateKey, PublicKey},
};

/// The subset of the router's administrative API the provisioning workflows use.
#[async_trait]
pub trait RouterApi: Sync + Send {
    async fn wireguard_interfaces(&self) -> Result<Vec<Interface>, RouterError>;
    async fn ip_addresses(&self) -> Result<Vec<Address>, RouterError>;
    async fn wireguard_peers(&self) -> Result<Vec<Peer>, RouterError>;
    async fn add_wireguard_peer(&self, peer: &NewPeer) -> Result<Created, RouterError>;
    async fn add_wireguard_interface(&self, iface: &NewInterface) -> Result<Created, RouterError>;
    async fn add_ip_address(&self, address: &NewAddress) -> Result<Created, RouterError>;
    async fn add_firewall_rule(&self, rule: &FilterRule) -> Result<Created, RouterError>;
}

#[async_trait]
pub trait KeyGenerator: Sync + Send {
    async fn generate_private_key(&self) -> Result<PrivateKey, KeyError>;
    async fn derive_public_key(&self, key: &PrivateKey) -> Result<PublicKey, KeyError>;
}
