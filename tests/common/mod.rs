#![allow(dead_code)]

use serde_json::{json, Value};
use wg_provision::routeros::{Config, RestClient, Scheme};
use wiremock::{
    matchers::{header, method, path},
    Mock, MockServer, ResponseTemplate,
};

// base64("admin:secret")
pub const AUTH: &str = "Basic YWRtaW46c2VjcmV0";
pub const SERVER_KEY: &str = "HIgo9xNzJMWLKASShiTqIybxZ0U3wGLiUeJ1PKf8ykw=";

pub fn config(server: &MockServer) -> Config {
    Config {
        address: server.address().to_string(),
        username: "admin".to_owned(),
        password: "secret".to_owned(),
        scheme: Scheme::Http,
        insecure: false,
        timeout: Some(5),
    }
}

pub fn client(server: &MockServer) -> RestClient {
    RestClient::new(&config(server)).unwrap()
}

pub async fn mock_get(server: &MockServer, route: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(route))
        .and(header("authorization", AUTH))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Router with `wireguard1` on `10.0.0.1/24` and the given peer addresses.
pub async fn router(peers: &[&str]) -> MockServer {
    let server = MockServer::start().await;
    mock_get(
        &server,
        "/rest/interface/wireguard",
        json!([
            {".id": "*9", "name": "wg-other", "public-key": "b3RoZXI=", "disabled": "false"},
            {".id": "*A", "name": "wireguard1", "public-key": SERVER_KEY, "listen-port": "13231", "mtu": "1420"},
        ]),
    )
    .await;
    mock_get(
        &server,
        "/rest/ip/address",
        json!([
            {".id": "*1", "address": "192.168.88.1/24", "interface": "bridge", "actual-interface": "bridge", "network": "192.168.88.0"},
            {".id": "*2", "address": "10.0.0.1/24", "interface": "wireguard1", "actual-interface": "wireguard1", "network": "10.0.0.0"},
        ]),
    )
    .await;
    let peers: Vec<Value> = peers
        .iter()
        .enumerate()
        .map(|(i, a)| json!({".id": format!("*{i}"), "interface": "wireguard1", "allowed-address": a, "comment": "old"}))
        .collect();
    mock_get(&server, "/rest/interface/wireguard/peers", Value::Array(peers)).await;
    server
}
