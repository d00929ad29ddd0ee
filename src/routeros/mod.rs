pub mod error;
pub mod ip;
pub mod wireguard;

use std::{fmt, time::Duration};

use async_trait::async_trait;
use clap::{Parser, ValueEnum};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::traits::RouterApi;
use error::{ApiError, RouterError};

const WIREGUARD: &str = "/interface/wireguard";
const WIREGUARD_PEERS: &str = "/interface/wireguard/peers";
const IP_ADDRESS: &str = "/ip/address";
const FIREWALL_FILTER: &str = "/ip/firewall/filter";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Scheme {
    Http,
    Https,
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        })
    }
}

#[derive(Clone, Parser)]
pub struct Config {
    /// Router address (host or host:port)
    #[clap(short, long, env = "ROUTER_ADDRESS", default_value = "192.168.88.1", value_parser)]
    pub address: String,
    /// Router username
    #[clap(short, long, env = "ROUTER_USERNAME", default_value = "admin", value_parser)]
    pub username: String,
    /// Router password
    #[clap(short, long, env = "ROUTER_PASSWORD", default_value = "", hide_env_values = true, value_parser)]
    pub password: String,
    #[clap(long, env = "ROUTER_SCHEME", value_enum, default_value = "http")]
    pub scheme: Scheme,
    /// Skip TLS certificate validation (only for routers without a valid certificate)
    #[clap(long, env = "ROUTER_INSECURE", action)]
    pub insecure: bool,
    /// Request timeout in seconds
    #[clap(long, env = "ROUTER_TIMEOUT", value_parser)]
    pub timeout: Option<u64>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("address", &self.address)
            .field("username", &self.username)
            .field("scheme", &self.scheme)
            .field("insecure", &self.insecure)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Config {
    pub fn base_uri(&self) -> String {
        format!("{}://{}/rest", self.scheme, self.address)
    }
}

/// Record echoed back by RouterOS after a successful PUT.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Created {
    #[serde(rename = ".id", default)]
    pub id: Option<String>,
}

/// Client for the RouterOS 7 `/rest` API.
#[derive(Clone)]
pub struct RestClient {
    base: String,
    username: String,
    password: String,
    client: Client,
}

impl RestClient {
    #[instrument]
    pub fn new(config: &Config) -> Result<Self, RouterError> {
        let mut builder = Client::builder();
        if config.insecure {
            warn!("TLS certificate validation is disabled for {}", config.address);
            builder = builder.danger_accept_invalid_certs(true);
        }
        if let Some(secs) = config.timeout {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        if config.scheme == Scheme::Http {
            warn!("RouterOS credentials are sent over plaintext http");
        }

        Ok(Self {
            base: config.base_uri(),
            username: config.username.clone(),
            password: config.password.clone(),
            client: builder.build()?,
        })
    }

    fn request(&self, req: RequestBuilder) -> RequestBuilder {
        req.basic_auth(&self.username, Some(&self.password))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, RouterError> {
        let url = format!("{}{}", self.base, path);
        debug!("GET {url}");
        let resp = self.request(self.client.get(&url)).send().await?;
        let resp = Self::check(resp).await?;

        Ok(resp.json().await?)
    }

    async fn put<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Created, RouterError> {
        let url = format!("{}{}", self.base, path);
        debug!("PUT {url}");
        let resp = self.request(self.client.put(&url)).json(body).send().await?;
        let resp = Self::check(resp).await?;
        let status = resp.status();
        let text = resp.text().await?;

        let value: serde_json::Value = serde_json::from_str(&text)?;
        if let Ok(err) = serde_json::from_value::<ApiError>(value.clone()) {
            return Err(RouterError::Status {
                status,
                detail: err.describe(),
            });
        }

        Ok(serde_json::from_value(value)?)
    }

    async fn check(resp: Response) -> Result<Response, RouterError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(RouterError::Auth(status));
        }

        let body = resp.text().await.unwrap_or_default();
        let detail = match serde_json::from_str::<ApiError>(&body) {
            Ok(err) => err.describe(),
            Err(_) => body,
        };
        Err(RouterError::Status { status, detail })
    }
}

#[async_trait]
impl RouterApi for RestClient {
    async fn wireguard_interfaces(&self) -> Result<Vec<wireguard::Interface>, RouterError> {
        self.get(WIREGUARD).await
    }

    async fn ip_addresses(&self) -> Result<Vec<ip::Address>, RouterError> {
        self.get(IP_ADDRESS).await
    }

    async fn wireguard_peers(&self) -> Result<Vec<wireguard::Peer>, RouterError> {
        self.get(WIREGUARD_PEERS).await
    }

    async fn add_wireguard_peer(&self, peer: &wireguard::NewPeer) -> Result<Created, RouterError> {
        self.put(WIREGUARD_PEERS, peer).await
    }

    async fn add_wireguard_interface(
        &self,
        iface: &wireguard::NewInterface,
    ) -> Result<Created, RouterError> {
        self.put(WIREGUARD, iface).await
    }

    async fn add_ip_address(&self, address: &ip::NewAddress) -> Result<Created, RouterError> {
        self.put(IP_ADDRESS, address).await
    }

    async fn add_firewall_rule(&self, rule: &ip::FilterRule) -> Result<Created, RouterError> {
        self.put(FIREWALL_FILTER, rule).await
    }
}
