#![cfg(test)]

use guacinator_client::api::{SystemPermission, GUACADMIN};
use guacinator_mock_server::{MockServer, SharedServer};
use structopt::StructOpt;

use crate::{config::Settings, *};

fn opts(addr: &str, password: &str, extra: &[&str]) -> GuacamoleOpt {
    let mut args = vec![
        "guacinator",
        "guacamole",
        "--url",
        addr,
        "--username",
        GUACADMIN,
        "--password",
        password,
    ];
    args.extend_from_slice(extra);
    match Opt::from_iter_safe(args).expect("parsing args").cmd {
        Command::Guacamole(g) => g,
    }
}

fn settings(url: &str) -> Settings {
    let mut settings = Settings::default();
    settings.guac.scheme = String::from("http");
    settings.guac.url = String::from(url);
    settings.guac.vnc_port = 5901;
    settings
}

async fn invoke(server: MockServer, extra: &[&str]) -> (anyhow::Result<()>, SharedServer) {
    let (addr, shared) = guacinator_mock_server::spawn(server);
    let opt = opts(&addr.to_string(), GUACADMIN, extra);
    (guacamole(&settings(&addr.to_string()), opt).await, shared)
}

#[tokio::test]
async fn creates_connection_with_configured_port() {
    let (res, server) = invoke(
        MockServer::new(),
        &[
            "--connection",
            "desk",
            "--vnc-ip",
            "10.0.0.5",
            "--vnc-pw",
            "secret",
        ],
    )
    .await;
    res.unwrap();
    let server = server.lock().await;
    let conn = server.test_connections().next().expect("no connection created");
    assert_eq!(conn.name, "desk");
    assert_eq!(conn.parameters.port.as_deref(), Some("5901"));
}

#[tokio::test]
async fn sets_guacadmin_password() {
    let (res, server) = invoke(MockServer::new(), &["--guacadmin-pw", "l0ng-and-s3cure"]).await;
    res.unwrap();
    assert_eq!(
        server.lock().await.test_user_password(GUACADMIN),
        Some("l0ng-and-s3cure")
    );
}

#[tokio::test]
async fn creates_admin() {
    let (res, server) = invoke(MockServer::new(), &["--new-admin", "alice"]).await;
    res.unwrap();
    let server = server.lock().await;
    assert_eq!(server.test_user_password("alice"), Some(GUACADMIN));
    assert_eq!(
        server.test_user_permissions("alice").unwrap().len(),
        SystemPermission::ADMIN_SET.len()
    );
}

#[tokio::test]
async fn deleting_unknown_user_fails() {
    let (res, _) = invoke(MockServer::new(), &["--delete-user", "nobody"]).await;
    let err = res.unwrap_err();
    assert!(format!("{err:#}").contains("nobody"), "{err:#}");
}

#[tokio::test]
async fn bad_credentials_fail_before_any_action() {
    let (addr, server) = guacinator_mock_server::spawn(MockServer::new());
    let opt = opts(&addr.to_string(), "wrong", &["--new-admin", "alice"]);
    assert!(guacamole(&settings(&addr.to_string()), opt).await.is_err());
    assert!(server.lock().await.test_user_password("alice").is_none());
}

#[tokio::test]
async fn usage_errors_happen_before_connecting() {
    // nothing listens on port 9 of the loopback in tests, a connection attempt would fail
    let opt = opts("127.0.0.1:9", GUACADMIN, &["--connection", "desk"]);
    let err = guacamole(&settings("127.0.0.1:9"), opt).await.unwrap_err();
    assert!(err.downcast_ref::<action::UsageError>().is_some(), "{err:#}");

    let opt = opts("127.0.0.1:9", GUACADMIN, &[]);
    guacamole(&settings("127.0.0.1:9"), opt).await.unwrap();
}

#[tokio::test]
async fn configured_url_wins_over_flag() {
    let (addr, server) = guacinator_mock_server::spawn(MockServer::new());
    let opt = opts("127.0.0.1:9", GUACADMIN, &["--new-admin", "alice"]);
    guacamole(&settings(&addr.to_string()), opt).await.unwrap();
    assert!(server.lock().await.test_user_password("alice").is_some());
}

#[tokio::test]
async fn flag_url_is_used_when_configured_url_is_empty() {
    let (addr, server) = guacinator_mock_server::spawn(MockServer::new());
    let opt = opts(&addr.to_string(), GUACADMIN, &["--new-admin", "alice"]);
    guacamole(&settings(""), opt).await.unwrap();
    assert!(server.lock().await.test_user_password("alice").is_some());
}

#[tokio::test]
async fn gateway_url_from_environment_reaches_client() {
    let (addr, server) = guacinator_mock_server::spawn(MockServer::new());
    let dir = tempfile::tempdir().unwrap();
    let addr = addr.to_string();
    let loaded = config::load_from(dir.path().join("guacinator-config.yaml"), |key| {
        match key {
            "GUAC_URL" => Some(addr.clone()),
            "GUAC_SCHEME" => Some(String::from("http")),
            _ => None,
        }
    })
    .unwrap();
    assert!(loaded.created);

    let opt = opts("127.0.0.1:9", GUACADMIN, &["--new-admin", "alice"]);
    guacamole(&loaded.settings, opt).await.unwrap();
    assert!(server.lock().await.test_user_password("alice").is_some());
}

#[tokio::test]
async fn gateway_url_from_config_file_reaches_client() {
    let (addr, server) = guacinator_mock_server::spawn(MockServer::new());
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("guacinator-config.yaml");
    std::fs::write(&path, format!("guac:\n  scheme: http\n  url: {addr}\n")).unwrap();
    let loaded = config::load_from(path, |_| None).unwrap();
    assert!(!loaded.created);

    let opt = opts("127.0.0.1:9", GUACADMIN, &["--delete-user", GUACADMIN]);
    guacamole(&loaded.settings, opt).await.unwrap();
    assert!(server.lock().await.test_user_password(GUACADMIN).is_none());
}
