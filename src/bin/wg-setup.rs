use cidr::Ipv4Inet;
use clap::Parser;
use tracing::info;

use wg_provision::{
    routeros::{self, RestClient},
    service::{Provisioner, SetupRequest, Stage, StageExt, DEFAULT_LISTEN_PORT},
};

/// Create a WireGuard server interface and its firewall rules on a RouterOS 7 router.
#[derive(Debug, Parser)]
#[clap(name = "wg-setup", version)]
struct Config {
    #[clap(flatten)]
    router: routeros::Config,
    /// WireGuard interface name
    #[clap(short, long, env = "WG_INTERFACE", default_value = "wireguard1", value_parser)]
    interface: String,
    /// Router address and prefix on the tunnel
    #[clap(short, long, env = "WG_RANGE", default_value = "192.168.100.1/24", value_parser)]
    range: Ipv4Inet,
    /// UDP port the interface listens on
    #[clap(short, long, env = "WG_LISTEN_PORT", default_value_t = DEFAULT_LISTEN_PORT, value_parser)]
    listen_port: u16,
}

async fn run(config: Config) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let router = RestClient::new(&config.router).stage(Stage::CreateInterface)?;
    let service = Provisioner::new(router);

    let report = service
        .setup(&SetupRequest {
            interface: config.interface,
            range: config.range,
            listen_port: config.listen_port,
        })
        .await?;

    info!(
        "done: interface {}, address {}, {} firewall rules",
        report.interface_id.as_deref().unwrap_or("?"),
        report.address_id.as_deref().unwrap_or("?"),
        report.rule_ids.len()
    );
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    wg_provision::init_logging();

    if let Err(e) = run(Config::parse()).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
