use std::{net::Ipv4Addr, path::PathBuf};

use tracing::{info, instrument};

use super::{
    allocator::{self, Subnet},
    configs::ClientConfig,
    error::{ServiceError, Stage, StageError, StageExt},
    keys::{ClientKeyPair, PublicKey},
    Provisioner,
};
use crate::{
    routeros::wireguard::NewPeer,
    traits::{KeyGenerator, RouterApi},
};

#[derive(Debug, Clone)]
pub struct EnrollRequest {
    pub interface: String,
    pub allowed_ips: String,
    pub endpoint: String,
    pub dns: String,
    pub output: PathBuf,
    pub comment: String,
}

#[derive(Debug)]
pub struct Enrollment {
    pub address: Ipv4Addr,
    pub public_key: PublicKey,
    pub output: PathBuf,
    pub peer_id: Option<String>,
}

impl<R: RouterApi> Provisioner<R> {
    /// Adds a client peer and writes its config.
    ///
    /// The config is written before the peer is registered. If registration
    /// fails the file stays on disk but the router won't accept it.
    #[instrument(skip(self, keys))]
    pub async fn enroll(
        &self,
        keys: &dyn KeyGenerator,
        request: &EnrollRequest,
    ) -> Result<Enrollment, StageError> {
        let server_public_key = self
            .server_public_key(&request.interface)
            .await
            .stage(Stage::ResolveServerPubkey)?;

        let subnet = self
            .tunnel_subnet(&request.interface)
            .await
            .stage(Stage::ResolveSubnet)?;

        let peers = self
            .router
            .wireguard_peers()
            .await
            .stage(Stage::AllocateAddress)?;
        let address = allocator::allocate(&peers, subnet).stage(Stage::AllocateAddress)?;
        info!("allocated {address} ({} peers registered)", peers.len());

        let key_pair = ClientKeyPair::generate(keys)
            .await
            .stage(Stage::GenerateKeypair)?;

        info!("writing client config to {}", request.output.display());
        let config = ClientConfig {
            private_key: key_pair.private_key,
            address,
            dns: request.dns.clone(),
            server_public_key,
            allowed_ips: request.allowed_ips.clone(),
            endpoint: request.endpoint.clone(),
        };
        config
            .write_to(&request.output)
            .await
            .map_err(|source| ServiceError::ConfigWrite {
                path: request.output.clone(),
                source,
            })
            .stage(Stage::WriteConfig)?;

        info!("adding peer {} to {}", key_pair.public_key, request.interface);
        let created = self
            .router
            .add_wireguard_peer(&NewPeer {
                interface: request.interface.clone(),
                public_key: key_pair.public_key.as_str().to_owned(),
                allowed_address: address.to_string(),
                comment: request.comment.clone(),
            })
            .await
            .map_err(ServiceError::registration)
            .stage(Stage::RegisterPeer)?;

        Ok(Enrollment {
            address,
            public_key: key_pair.public_key,
            output: request.output.clone(),
            peer_id: created.id,
        })
    }

    #[instrument(skip(self))]
    pub async fn server_public_key(&self, interface: &str) -> Result<String, ServiceError> {
        self.router
            .wireguard_interfaces()
            .await?
            .into_iter()
            .filter(|i| i.name.as_deref() == Some(interface))
            .find_map(|i| i.public_key)
            .ok_or_else(|| {
                ServiceError::NotFound(format!("public key of wireguard interface {interface}"))
            })
    }

    #[instrument(skip(self))]
    pub async fn tunnel_subnet(&self, interface: &str) -> Result<Subnet, ServiceError> {
        self.router
            .ip_addresses()
            .await?
            .iter()
            .filter(|a| a.bound_to(interface))
            .find_map(|a| a.address.as_deref().and_then(Subnet::from_interface_address))
            .ok_or_else(|| ServiceError::NotFound(format!("ipv4 address of interface {interface}")))
    }
}
