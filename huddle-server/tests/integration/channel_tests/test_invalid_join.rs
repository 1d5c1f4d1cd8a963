use huddle_core::ControlMessage;
use huddle_server::RegistryConfig;
use std::time::Duration;

use crate::integration::init_tracing;
use crate::utils::{TestServer, WsClient, member};

#[tokio::test]
async fn test_join_without_member_is_rejected() {
    init_tracing();

    let server = TestServer::start(RegistryConfig::default()).await;
    let session = server.manager.create(member("alice")).unwrap();
    let mut alice = WsClient::connect(&server.ws_url(session.as_str())).await;

    alice
        .send_raw(&format!(r#"{{"type":"JOIN","sessionId":"{}","member":""}}"#, session))
        .await;

    match alice.recv().await {
        ControlMessage::InvalidRequest { session_id, reason } => {
            assert_eq!(session_id, Some(session.clone()));
            assert!(reason.is_some());
        }
        other => panic!("expected INVALID_REQUEST, got {:?}", other),
    }
    assert!(alice.recv_within(Duration::from_millis(200)).await.is_none());

    let info = server.manager.describe(&session).await.unwrap();
    assert!(info.members.is_empty());
}
