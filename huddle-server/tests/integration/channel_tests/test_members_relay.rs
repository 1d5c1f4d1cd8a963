use huddle_core::{ControlMessage, SessionDescription};
use huddle_server::RegistryConfig;
use std::time::Duration;

use crate::integration::init_tracing;
use crate::utils::{TestServer, WsClient, member};

#[tokio::test]
async fn test_members_negotiate_through_registry() {
    init_tracing();

    let server = TestServer::start(RegistryConfig::default()).await;
    let session = server.manager.create(member("alice")).unwrap();
    let url = server.ws_url(session.as_str());

    let mut alice = WsClient::connect(&url).await;
    alice
        .send(&ControlMessage::Join {
            session_id: session.clone(),
            member: member("alice"),
        })
        .await;
    server.wait_for_members(&session, 1).await;

    // Legacy join spelling.
    let mut bob = WsClient::connect(&url).await;
    bob.send_raw(&format!(
        r#"{{"type":"JOIN_MEETING","sessionID":"{}","member":"bob"}}"#,
        session
    ))
    .await;

    assert_eq!(
        alice.recv().await,
        ControlMessage::MemberJoined {
            session_id: session.clone(),
            member: member("bob"),
        }
    );

    alice
        .send(&ControlMessage::Offer {
            session_id: session.clone(),
            member: member("bob"),
            from: Some(member("mallory")),
            offer: SessionDescription::offer("v=0"),
        })
        .await;
    assert_eq!(
        bob.recv().await,
        ControlMessage::Offer {
            session_id: session.clone(),
            member: member("bob"),
            from: Some(member("alice")),
            offer: SessionDescription::offer("v=0"),
        }
    );

    bob.send(&ControlMessage::Answer {
        session_id: session.clone(),
        member: member("alice"),
        from: None,
        answer: SessionDescription::answer("v=0"),
    })
    .await;
    let answer = alice.recv().await;
    assert!(matches!(answer, ControlMessage::Answer { from: Some(ref f), .. } if f == &member("bob")));

    assert!(bob.recv_within(Duration::from_millis(200)).await.is_none());
}

#[tokio::test]
async fn test_closed_socket_leaves_session() {
    init_tracing();

    let server = TestServer::start(RegistryConfig::default()).await;
    let session = server.manager.create(member("alice")).unwrap();
    let url = server.ws_url(session.as_str());

    let mut alice = WsClient::connect(&url).await;
    alice
        .send(&ControlMessage::Join {
            session_id: session.clone(),
            member: member("alice"),
        })
        .await;
    server.wait_for_members(&session, 1).await;

    alice.close().await;
    server.wait_for_members(&session, 0).await;
}

#[tokio::test]
async fn test_messages_before_join_are_dropped() {
    init_tracing();

    let server = TestServer::start(RegistryConfig::default()).await;
    let session = server.manager.create(member("alice")).unwrap();
    let url = server.ws_url(session.as_str());

    let mut alice = WsClient::connect(&url).await;
    alice
        .send(&ControlMessage::Join {
            session_id: session.clone(),
            member: member("alice"),
        })
        .await;
    server.wait_for_members(&session, 1).await;

    let mut lurker = WsClient::connect(&url).await;
    lurker
        .send(&ControlMessage::Offer {
            session_id: session.clone(),
            member: member("alice"),
            from: Some(member("lurker")),
            offer: SessionDescription::offer("v=0"),
        })
        .await;
    lurker.send_raw("garbage").await;

    assert!(alice.recv_within(Duration::from_millis(300)).await.is_none());
}
