//! Provisioning of WireGuard tunnels on MikroTik RouterOS 7 over its REST API.
//!
//! `wg-setup` creates the tunnel interface, its address range and the input
//! firewall rules. `wg-enroll` adds a client peer and writes its config file.

pub mod routeros;
pub mod service;
pub mod traits;

/// `pretty_env_logger` filtered by `RUST_LOG`, `info` when it is unset.
pub fn init_logging() {
    let filters = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_owned());
    pretty_env_logger::formatted_builder()
        .parse_filters(&filters)
        .init();
}
