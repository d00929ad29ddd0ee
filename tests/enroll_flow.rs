mod common;

use std::net::Ipv4Addr;

use common::*;
use serde_json::{json, Value};
use wg_provision::{
    service::{
        keys::X25519Keys, ClientConfig, EnrollRequest, Provisioner, ServiceError, Stage,
    },
    traits::KeyGenerator,
};
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

fn request(dir: &tempfile::TempDir, interface: &str) -> EnrollRequest {
    EnrollRequest {
        interface: interface.to_owned(),
        allowed_ips: "0.0.0.0/0".to_owned(),
        endpoint: "vpn.example.net:13231".to_owned(),
        dns: "1.1.1.1".to_owned(),
        output: dir.path().join("client.conf"),
        comment: "phone".to_owned(),
    }
}

async fn accept_peers(server: &MockServer) {
    Mock::given(method("PUT"))
        .and(path("/rest/interface/wireguard/peers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({".id": "*10"})))
        .mount(server)
        .await;
}

async fn peer_puts(server: &MockServer) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.method.to_string() == "PUT")
        .map(|r| r.body_json::<Value>().unwrap())
        .collect()
}

#[tokio::test]
async fn enrolls_client_end_to_end() {
    let server = router(&["10.0.0.2/32", "10.0.0.3/32", "10.0.0.5/32"]).await;
    accept_peers(&server).await;
    let dir = tempfile::tempdir().unwrap();
    let service = Provisioner::new(client(&server));

    let enrollment = service
        .enroll(&X25519Keys, &request(&dir, "wireguard1"))
        .await
        .unwrap();
    assert_eq!(enrollment.address, Ipv4Addr::new(10, 0, 0, 4));
    assert_eq!(enrollment.peer_id.as_deref(), Some("*10"));

    let config: ClientConfig = std::fs::read_to_string(dir.path().join("client.conf"))
        .unwrap()
        .parse()
        .unwrap();
    assert_eq!(config.address, Ipv4Addr::new(10, 0, 0, 4));
    assert_eq!(config.server_public_key, SERVER_KEY);
    assert_eq!(config.dns, "1.1.1.1");
    assert_eq!(config.allowed_ips, "0.0.0.0/0");
    assert_eq!(config.endpoint, "vpn.example.net:13231");

    let puts = peer_puts(&server).await;
    assert_eq!(puts.len(), 1);
    let public_key = X25519Keys
        .derive_public_key(&config.private_key)
        .await
        .unwrap();
    assert_eq!(
        puts[0],
        json!({
            "interface": "wireguard1",
            "public-key": public_key.as_str(),
            "allowed-address": "10.0.0.4",
            "comment": "phone",
        })
    );
    assert!(!puts[0].to_string().contains(config.private_key.expose()));
}

#[tokio::test]
async fn empty_peer_table_starts_at_two() {
    let server = router(&[]).await;
    accept_peers(&server).await;
    let dir = tempfile::tempdir().unwrap();

    let enrollment = Provisioner::new(client(&server))
        .enroll(&X25519Keys, &request(&dir, "wireguard1"))
        .await
        .unwrap();
    assert_eq!(enrollment.address, Ipv4Addr::new(10, 0, 0, 2));
}

#[tokio::test]
async fn unknown_interface_registers_nothing() {
    let server = router(&[]).await;
    accept_peers(&server).await;
    let dir = tempfile::tempdir().unwrap();

    let err = Provisioner::new(client(&server))
        .enroll(&X25519Keys, &request(&dir, "wireguard7"))
        .await
        .unwrap_err();
    assert_eq!(err.stage, Stage::ResolveServerPubkey);
    assert!(matches!(err.source, ServiceError::NotFound(_)));
    assert!(peer_puts(&server).await.is_empty());
    assert!(err.to_string().starts_with("resolve server public key failed"));
}

#[tokio::test]
async fn rejected_peer_leaves_config_behind() {
    let server = router(&["10.0.0.2/32"]).await;
    Mock::given(method("PUT"))
        .and(path("/rest/interface/wireguard/peers"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": 400,
            "message": "Bad Request",
            "detail": "failure: peer with the same allowed-address already exists",
        })))
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();

    let err = Provisioner::new(client(&server))
        .enroll(&X25519Keys, &request(&dir, "wireguard1"))
        .await
        .unwrap_err();
    assert_eq!(err.stage, Stage::RegisterPeer);
    match &err.source {
        ServiceError::RegistrationRejected(detail) => assert!(detail.contains("already exists")),
        e => panic!("unexpected error {e}"),
    }
    assert!(dir.path().join("client.conf").exists());
}

#[tokio::test]
async fn exhausted_pool_writes_nothing() {
    let taken: Vec<String> = (2..=254).map(|n| format!("10.0.0.{n}/32")).collect();
    let taken: Vec<&str> = taken.iter().map(String::as_str).collect();
    let server = router(&taken).await;
    accept_peers(&server).await;
    let dir = tempfile::tempdir().unwrap();

    let err = Provisioner::new(client(&server))
        .enroll(&X25519Keys, &request(&dir, "wireguard1"))
        .await
        .unwrap_err();
    assert_eq!(err.stage, Stage::AllocateAddress);
    assert!(matches!(err.source, ServiceError::PoolExhausted));
    assert!(!dir.path().join("client.conf").exists());
    assert!(peer_puts(&server).await.is_empty());
}

#[tokio::test]
async fn html_answer_to_peer_put_is_not_a_registration() {
    let server = router(&[]).await;
    Mock::given(method("PUT"))
        .and(path("/rest/interface/wireguard/peers"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<html>captive portal</html>", "text/html"),
        )
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();

    let err = Provisioner::new(client(&server))
        .enroll(&X25519Keys, &request(&dir, "wireguard1"))
        .await
        .unwrap_err();
    assert_eq!(err.stage, Stage::RegisterPeer);
    assert!(matches!(err.source, ServiceError::Transport(_)));
}
