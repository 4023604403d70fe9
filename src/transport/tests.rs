use super::*;
use crate::utils::PubsubError;
use std::time::Duration;
use tokio::net::UdpSocket;

#[test]
fn test_request_carries_marker_and_path() {
    let msg = CoapMessage::request(Command::AddSub, "sensors/temp", 42);
    assert_eq!(msg.message_type, MessageType::Confirmable);
    assert_eq!(msg.code, Code::GET);
    assert_eq!(msg.command, Some(Command::AddSub));
    assert_eq!(msg.path, "sensors/temp");
    assert!(msg.payload.is_empty());

    let decoded = CoapMessage::decode(&msg.encode().unwrap()).unwrap();
    assert_eq!(decoded, msg);
}

#[test]
fn test_heartbeat_encoding() {
    let msg = CoapMessage::heartbeat(7, "Heart beat msg.");
    let decoded = CoapMessage::decode(&msg.encode().unwrap()).unwrap();
    assert_eq!(decoded.command, Some(Command::Heartbeat));
    assert_eq!(decoded.message_id, 7);
    assert_eq!(decoded.payload_text(), "Heart beat msg.");
    assert!(decoded.path.is_empty());
}

#[test]
fn test_path_segments_skip_empty() {
    let msg = CoapMessage::request(Command::RemSub, "/a//b/", 1);
    let decoded = CoapMessage::decode(&msg.encode().unwrap()).unwrap();
    assert_eq!(decoded.path, "a/b");
}

#[test]
fn test_command_markers() {
    assert_eq!(Command::AddSub.as_str(), "ADDSUB");
    assert_eq!(Command::RemSub.as_str(), "REMSUB");
    assert_eq!(Command::Heartbeat.to_string(), "HB");
    assert_eq!(Command::from_marker(b"REMSUB"), Some(Command::RemSub));
    assert_eq!(Command::from_marker(b"PUBLISH"), None);
}

#[test]
fn test_bare_ack() {
    let ack = CoapMessage::ack(9);
    assert!(ack.is_bare_ack());
    assert_eq!(ack.code, Code::EMPTY);

    let mut piggybacked = CoapMessage::ack(9);
    piggybacked.payload = b"21.5".to_vec();
    assert!(!piggybacked.is_bare_ack());
}

#[test]
fn test_decode_garbage_is_codec_error() {
    let err = CoapMessage::decode(&[0xff]).unwrap_err();
    assert!(matches!(err, PubsubError::Codec(_)));
}

#[tokio::test]
async fn test_udp_send_and_receive() {
    let server = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let addr = server.local_addr().unwrap().to_string();

    let conn = UdpDialer.dial(&addr).await.unwrap();
    conn.send(&CoapMessage::request(Command::AddSub, "chat", 100))
        .await
        .unwrap();

    let mut buf = [0u8; 1500];
    let (n, from) = server.recv_from(&mut buf).await.unwrap();
    let req = CoapMessage::decode(&buf[..n]).unwrap();
    assert_eq!(req.command, Some(Command::AddSub));
    assert_eq!(req.path, "chat");

    let mut push = CoapMessage::ack(100);
    push.code = Code::CONTENT;
    push.payload = b"hello".to_vec();
    server.send_to(&push.encode().unwrap(), from).await.unwrap();

    let received = tokio::time::timeout(Duration::from_secs(2), conn.receive())
        .await
        .expect("receive timed out")
        .unwrap();
    assert_eq!(received.payload_text(), "hello");
}

#[tokio::test]
async fn test_udp_send_after_close_fails() {
    let server = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let addr = server.local_addr().unwrap().to_string();

    let conn = UdpDialer.dial(&addr).await.unwrap();
    conn.close().await;
    let err = conn.send(&CoapMessage::heartbeat(1, "x")).await.unwrap_err();
    assert!(matches!(err, PubsubError::Transport(_)));
}

#[tokio::test]
async fn test_dial_unresolvable_address() {
    let err = UdpDialer.dial("not an address").await.err().unwrap();
    assert!(matches!(err, PubsubError::Connection(_)));
    assert!(err.to_string().starts_with("Dial failed"));
}

#[tokio::test]
async fn test_udp_receives_datagram_larger_than_mtu() {
    let server = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let addr = server.local_addr().unwrap().to_string();

    let conn = UdpDialer.dial(&addr).await.unwrap();
    conn.send(&CoapMessage::request(Command::AddSub, "bulk", 1))
        .await
        .unwrap();
    let mut buf = [0u8; 1500];
    let (_, from) = server.recv_from(&mut buf).await.unwrap();

    let mut push = CoapMessage::ack(2);
    push.message_type = MessageType::NonConfirmable;
    push.code = Code::CONTENT;
    push.payload = vec![b'x'; 3000];
    server.send_to(&push.encode().unwrap(), from).await.unwrap();

    let received = tokio::time::timeout(Duration::from_secs(2), conn.receive())
        .await
        .expect("receive timed out")
        .unwrap();
    assert_eq!(received.payload.len(), 3000);
    assert_eq!(received.payload, push.payload);
}
