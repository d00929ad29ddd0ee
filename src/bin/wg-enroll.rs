use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use time::OffsetDateTime;
use tracing::info;

use wg_provision::{
    routeros::{self, RestClient},
    service::{
        keys::{WgTool, X25519Keys},
        EnrollRequest, Provisioner, Stage, StageExt,
    },
    traits::KeyGenerator,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum KeySource {
    /// In-process X25519
    Builtin,
    /// `wg genkey` / `wg pubkey`
    WgTool,
}

/// Add a client peer to a RouterOS 7 WireGuard interface and write its config.
#[derive(Debug, Parser)]
#[clap(name = "wg-enroll", version)]
struct Config {
    #[clap(flatten)]
    router: routeros::Config,
    /// WireGuard interface name
    #[clap(short, long, env = "WG_INTERFACE", default_value = "wireguard1", value_parser)]
    interface: String,
    /// Router's public ip:port, written as the client's Endpoint
    #[clap(short, long, env = "WG_ENDPOINT", value_parser)]
    server_ip: String,
    /// Prefixes routed through the tunnel
    #[clap(long, default_value = "0.0.0.0/0", value_parser)]
    allowed_ips: String,
    #[clap(long, default_value = "8.8.8.8", value_parser)]
    dns: String,
    #[clap(short, long, default_value = "wg0.conf", value_parser)]
    output: PathBuf,
    /// Peer comment, today's date if omitted
    #[clap(short, long, value_parser)]
    comment: Option<String>,
    #[clap(short, long, value_enum, default_value = "builtin")]
    key_source: KeySource,
}

async fn run(config: Config) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let keys: Box<dyn KeyGenerator> = match config.key_source {
        KeySource::Builtin => Box::new(X25519Keys),
        KeySource::WgTool => {
            let tool = WgTool::default();
            let version = tool.version().await.stage(Stage::GenerateKeypair)?;
            info!("using {version}");
            Box::new(tool)
        }
    };

    let comment = config
        .comment
        .unwrap_or_else(|| OffsetDateTime::now_utc().date().to_string());
    let router = RestClient::new(&config.router).stage(Stage::ResolveServerPubkey)?;
    let service = Provisioner::new(router);

    let enrollment = service
        .enroll(
            &*keys,
            &EnrollRequest {
                interface: config.interface,
                allowed_ips: config.allowed_ips,
                endpoint: config.server_ip,
                dns: config.dns,
                output: config.output,
                comment,
            },
        )
        .await?;

    info!(
        "peer {} added as {}, config in {}",
        enrollment.public_key,
        enrollment.address,
        enrollment.output.display()
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
