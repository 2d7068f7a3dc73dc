//! Client to server round trips over real loopback sockets

mod common;

use clipqa::config::TransportConfig;
use clipqa::{ConnectionHealth, Message, MessageKind, QaEntry, ServerPhase, Shutdown, TransportClient};
use common::RunningServer;

fn client_for(server: &RunningServer) -> TransportClient {
    let config = TransportConfig {
        host: server.addr.ip().to_string(),
        port: server.addr.port(),
        ..TransportConfig::default()
    };
    TransportClient::new(config, Shutdown::new())
}

#[tokio::test]
async fn test_clear_question_answer_delivered() {
    let server = RunningServer::start().await;
    let mut client = client_for(&server);

    assert!(client.send(&Message::Clear).await);
    assert!(client.send(&Message::Question("abc".to_string())).await);
    assert!(client.send(&Message::Answer("1".to_string())).await);
    assert_eq!(
        client.health(),
        ConnectionHealth {
            alive: true,
            consecutive_errors: 0
        }
    );

    let messages = server.sink.wait_for(3).await;
    assert_eq!(
        messages,
        vec![
            (MessageKind::Clear, String::new()),
            (MessageKind::Question, "abc".to_string()),
            (MessageKind::Answer, "1".to_string()),
        ]
    );

    let sink = server.sink.clone();
    server.stop().await.unwrap();
    assert_eq!(sink.statuses.lock().clone(), vec![true, false]);
}

#[tokio::test]
async fn test_probe_is_not_forwarded() {
    let server = RunningServer::start().await;
    let mut client = client_for(&server);

    assert!(client.test_connection().await);
    assert!(client.send(&Message::Clear).await);

    let messages = server.sink.wait_for(1).await;
    assert_eq!(messages, vec![(MessageKind::Clear, String::new())]);
    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_conversation_reaches_display() {
    let server = RunningServer::start().await;
    let mut client = client_for(&server);
    let entry = QaEntry::many("primary colours", ["red", "yellow", "blue", "green"]);

    assert!(client.send_conversation("name the primary colours", &[&entry]).await);

    let messages = server.sink.wait_for(5).await;
    let payloads: Vec<&str> = messages.iter().map(|(_, p)| p.as_str()).collect();
    assert_eq!(
        payloads,
        vec!["", "name the primary colours", "➤ red", "➤ yellow", "➤ blue"]
    );
    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_unreachable_display_counts_one_error_per_message() {
    // Bind and drop to get a port nobody listens on
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let config = TransportConfig {
        port,
        backoff_step_ms: 10,
        ..TransportConfig::default()
    };
    let mut client = TransportClient::new(config, Shutdown::new());

    assert!(!client.send(&Message::Clear).await);
    assert!(!client.send(&Message::Clear).await);
    assert_eq!(
        client.health(),
        ConnectionHealth {
            alive: false,
            consecutive_errors: 2
        }
    );
}

#[tokio::test]
async fn test_server_stops_cleanly() {
    let server = RunningServer::start().await;
    let handle = server.handle.clone();
    assert!(matches!(
        handle.phase(),
        ServerPhase::Accepting | ServerPhase::Listening
    ));

    server.stop().await.unwrap();
    assert_eq!(handle.phase(), ServerPhase::Stopped);
}
