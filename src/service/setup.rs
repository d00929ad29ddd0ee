use cidr::Ipv4Inet;
use tracing::{info, instrument};

use super::{
    error::{Stage, StageError, StageExt},
    Provisioner,
};
use crate::{
    routeros::{
        ip::{FilterRule, NewAddress},
        wireguard::NewInterface,
        Created,
    },
    traits::RouterApi,
};

pub const DEFAULT_LISTEN_PORT: u16 = 13231;

#[derive(Debug, Clone)]
pub struct SetupRequest {
    pub interface: String,
    /// Address of the router on the tunnel, e.g. `192.168.100.1/24`.
    pub range: Ipv4Inet,
    pub listen_port: u16,
}

#[derive(Debug, Default)]
pub struct SetupReport {
    pub interface_id: Option<String>,
    pub address_id: Option<String>,
    pub rule_ids: Vec<Option<String>>,
}

impl<R: RouterApi> Provisioner<R> {
    /// Creates the tunnel interface, its address and the two input rules.
    ///
    /// Steps already applied are left in place when a later one fails.
    #[instrument(skip(self))]
    pub async fn setup(&self, request: &SetupRequest) -> Result<SetupReport, StageError> {
        let mut report = SetupReport::default();

        info!("creating wireguard interface {}", request.interface);
        let Created { id } = self
            .router
            .add_wireguard_interface(&NewInterface {
                name: request.interface.clone(),
                listen_port: Some(request.listen_port.to_string()),
            })
            .await
            .stage(Stage::CreateInterface)?;
        report.interface_id = id;

        info!("assigning {} to {}", request.range, request.interface);
        let Created { id } = self
            .router
            .add_ip_address(&NewAddress {
                address: request.range.to_string(),
                interface: request.interface.clone(),
            })
            .await
            .stage(Stage::AssignAddress)?;
        report.address_id = id;

        let rules = [
            (
                Stage::OpenTunnelPort,
                FilterRule::open_udp_port(request.listen_port),
            ),
            (
                Stage::AllowLanAccess,
                FilterRule::allow_from(request.range.network()),
            ),
        ];
        for (stage, rule) in rules {
            info!("adding firewall rule: {}", rule.comment);
            let Created { id } = self.router.add_firewall_rule(&rule).await.stage(stage)?;
            report.rule_ids.push(id);
        }

        Ok(report)
    }
}
