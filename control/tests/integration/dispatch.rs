//! Command dispatch over HTTP: wire format, status mapping and partial
//! results.

use salt_common::{CommandEnvelope, TargetType};
use salt_control::application::{Dispatcher, Fleet};
use salt_control::domain::SaltError;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::helpers::{client_for, command_mock, login_mock, minions, server};

#[tokio::test]
async fn envelope_is_sent_as_json_with_optional_fields() {
    let server = server().await;
    login_mock("t", 1).mount(&server).await;
    Mock::given(method("POST"))
        .and(path("/"))
        .and(header("X-Auth-Token", "t"))
        .and(body_json(json!({
            "client": "local",
            "tgt": "G@role:db",
            "fun": "state.apply",
            "arg": ["postgres"],
            "kwarg": {"test": true},
            "tgt_type": "compound",
            "timeout": 60
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(minions(&[("db-1", json!({}))])))
        .expect(1)
        .mount(&server)
        .await;
    let client = client_for(&server);

    let envelope = CommandEnvelope::new("G@role:db", "state.apply")
        .with_args(vec!["postgres".to_string()])
        .with_kwarg("test", true)
        .with_target_type(TargetType::Compound)
        .with_timeout(60);
    client.dispatch(envelope).await.expect("dispatch");
}

#[tokio::test]
async fn server_error_is_terminal_dispatch_error() {
    let server = server().await;
    login_mock("t", 1).mount(&server).await;
    Mock::given(method("POST"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .expect(1)
        .mount(&server)
        .await;
    let client = client_for(&server);

    let err = client
        .dispatch(CommandEnvelope::new("*", "pkg.install"))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(500));
    match err {
        SaltError::Dispatch { fun, status, body } => {
            assert_eq!(fun, "pkg.install");
            assert_eq!(status, 500);
            assert_eq!(body, "Internal Server Error");
        }
        other => panic!("expected Dispatch, got {other:?}"),
    }
}

#[tokio::test]
async fn non_json_success_body_is_decode_error() {
    let server = server().await;
    login_mock("t", 1).mount(&server).await;
    Mock::given(method("POST"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy</html>"))
        .mount(&server)
        .await;
    let client = client_for(&server);

    let err = client
        .dispatch(CommandEnvelope::new("*", "test.ping"))
        .await
        .unwrap_err();
    assert!(matches!(err, SaltError::Decode { .. }), "{err:?}");
}

#[tokio::test]
async fn two_of_three_minions_answering_is_not_an_error() {
    let server = server().await;
    login_mock("t", 1).mount(&server).await;
    command_mock(
        "t",
        200,
        minions(&[("web-1", json!(true)), ("web-2", json!(true))]),
    )
    .expect(3)
    .mount(&server)
    .await;
    let fleet = Fleet::new(client_for(&server));

    let result = fleet
        .call("*", "test.ping", Vec::new())
        .await
        .expect("dispatch");
    assert_eq!(result.len(), 2);
    assert_eq!(result.missing(&["web-1", "web-2", "web-3"]), vec!["web-3"]);

    let ping = fleet.ping("*").await.expect("ping");
    assert_eq!(ping.len(), 2);
    assert!(ping.values().all(|ok| *ok));
    assert!(!ping.contains_key("web-3"));

    let listed = fleet.list_minions().await.expect("list");
    assert_eq!(listed, vec!["web-1", "web-2"]);
}

#[tokio::test]
async fn empty_return_is_an_empty_result() {
    let server = server().await;
    login_mock("t", 1).mount(&server).await;
    command_mock("t", 200, json!({"return": []}))
        .mount(&server)
        .await;
    let fleet = Fleet::new(client_for(&server));

    let ping = fleet.ping("nobody-*").await.expect("ping");
    assert!(ping.is_empty());
}

#[tokio::test]
async fn facade_shares_the_session_of_the_client() {
    let server = server().await;
    login_mock("t", 1).mount(&server).await;
    command_mock("t", 200, minions(&[("n1", json!("ok"))]))
        .expect(2)
        .mount(&server)
        .await;
    let fleet = Fleet::new(client_for(&server));

    fleet
        .package_install("n1", &["wireguard"])
        .await
        .expect("install");
    let result = fleet
        .service_restart("n1", "wg-quick@wg0")
        .await
        .expect("restart");
    assert_eq!(result.get("n1"), Some(&json!("ok")));
    assert!(fleet.dispatcher().token().await.is_some());
}
