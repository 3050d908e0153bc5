//! Integration tests for jsonrpc-wire.
//!
//! These tests drive whole pipelines over in-memory transports.

use jsonrpc_wire::formatter::{Formatter, JsonFormatter, MsgPackFormatter};
use jsonrpc_wire::message::{ErrorResponse, Message, Notification, Request, RequestId, SuccessResponse};
use jsonrpc_wire::protocol::{build_length_prefixed, FrameBuffer};
use jsonrpc_wire::transport::{websocket, PacketKind, PacketSender};
use jsonrpc_wire::{spawn_writer_task, PipelineBuilder, WireError, WriterConfig};
use serde_json::json;
use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt};
use tokio_tungstenite::tungstenite::protocol::Role;
use tokio_tungstenite::WebSocketStream;
use tokio_util::sync::CancellationToken;

const PING: &[u8] = br#"{"jsonrpc":"2.0","method":"ping"}"#;

/// A ping notification is a 4-byte big-endian length followed by its JSON.
#[tokio::test]
async fn test_ping_wire_bytes_both_directions() {
    let (a, mut raw) = duplex(4096);
    let mut pipeline = PipelineBuilder::new()
        .length_prefixed(a, JsonFormatter::new())
        .unwrap();
    let cancel = CancellationToken::new();

    pipeline
        .write_message(&Notification::new("ping", None).into(), &cancel)
        .await
        .unwrap();

    let mut written = vec![0u8; 4 + PING.len()];
    raw.read_exact(&mut written).await.unwrap();
    assert_eq!(written, build_length_prefixed(PING));
    assert_eq!(&written[..4], &[0, 0, 0, PING.len() as u8]);

    raw.write_all(&build_length_prefixed(PING)).await.unwrap();
    let message = pipeline.read_message(&cancel).await.unwrap().unwrap();
    assert_eq!(message, Notification::new("ping", None).into());
}

/// A batch frame is served as its elements, in order, from one frame.
#[tokio::test]
async fn test_inbound_batch_served_in_order() {
    let (a, mut raw) = duplex(4096);
    let mut pipeline = PipelineBuilder::new()
        .length_prefixed(a, JsonFormatter::new())
        .unwrap();
    let cancel = CancellationToken::new();

    let batch = br#"[{"jsonrpc":"2.0","id":1,"method":"x"},{"jsonrpc":"2.0","id":2,"method":"y"}]"#;
    raw.write_all(&build_length_prefixed(batch)).await.unwrap();
    raw.shutdown().await.unwrap();

    let first = pipeline.read_message(&cancel).await.unwrap().unwrap();
    let second = pipeline.read_message(&cancel).await.unwrap().unwrap();
    assert_eq!(first, Request::new(1, "x", None).into());
    assert_eq!(second, Request::new(2, "y", None).into());
    assert_eq!(pipeline.read_message(&cancel).await.unwrap(), None);
}

/// Every message variant survives a trip through both formatters.
#[tokio::test]
async fn test_all_variants_cross_pipeline() {
    let messages: Vec<Message> = vec![
        Request::new("req-1", "sum", Some(vec![json!(1), json!(2)].into())).into(),
        Notification::new("log", Some(json!({"level": "info"}).as_object().unwrap().clone().into())).into(),
        SuccessResponse::new(5, json!({"total": 3})).into(),
        ErrorResponse::method_not_found(6).into(),
        ErrorResponse::new("e", -32000, "Server error")
            .with_data(json!(["trace"]))
            .into(),
    ];

    async fn run<F: Formatter + Clone>(formatter: F, messages: &[Message]) {
        let (a, b) = duplex(64 * 1024);
        let builder = PipelineBuilder::new();
        let mut left = builder.length_prefixed(a, formatter.clone()).unwrap();
        let mut right = builder.length_prefixed(b, formatter).unwrap();
        let cancel = CancellationToken::new();

        for message in messages {
            left.write_message(message, &cancel).await.unwrap();
        }
        for message in messages {
            assert_eq!(right.read_message(&cancel).await.unwrap().as_ref(), Some(message));
        }
    }

    run(JsonFormatter::new(), &messages).await;
    run(MsgPackFormatter::new(), &messages).await;
}

/// An empty batch fails the read; the stream stays usable.
#[tokio::test]
async fn test_empty_batch_then_next_message() {
    let (a, mut raw) = duplex(4096);
    let mut pipeline = PipelineBuilder::new()
        .length_prefixed(a, JsonFormatter::new())
        .unwrap();
    let cancel = CancellationToken::new();

    raw.write_all(&build_length_prefixed(b"[]")).await.unwrap();
    raw.write_all(&build_length_prefixed(PING)).await.unwrap();

    assert!(matches!(
        pipeline.read_message(&cancel).await,
        Err(WireError::EmptyBatch)
    ));
    let next = pipeline.read_message(&cancel).await.unwrap().unwrap();
    assert_eq!(next.method(), Some("ping"));
}

/// Frames above the configured limit are rejected before their content is read.
#[tokio::test]
async fn test_oversized_inbound_frame() {
    let (a, mut raw) = duplex(4096);
    let mut pipeline = PipelineBuilder::new()
        .max_frame_size(16)
        .length_prefixed(a, JsonFormatter::new())
        .unwrap();
    let cancel = CancellationToken::new();

    raw.write_all(&build_length_prefixed(PING)).await.unwrap();

    assert!(matches!(
        pipeline.read_message(&cancel).await,
        Err(WireError::FrameTooLarge { size: 33, max: 16 })
    ));
}

/// Messages survive arbitrary chunking of the byte stream.
#[test]
fn test_frame_buffer_with_formatter() {
    let formatter = JsonFormatter::new();
    let mut bytes = Vec::new();
    for i in 0..5 {
        let message: Message = Request::new(i, "step", None).into();
        bytes.extend(build_length_prefixed(&formatter.encode(&message)));
    }

    let mut buffer = FrameBuffer::new();
    let mut frames = Vec::new();
    for chunk in bytes.chunks(7) {
        frames.extend(buffer.push(chunk).unwrap());
    }

    assert_eq!(frames.len(), 5);
    for (i, frame) in frames.iter().enumerate() {
        let message = formatter.decode(frame.payload()).unwrap();
        assert_eq!(message.id(), Some(&RequestId::Number(i as i64)));
    }
}

/// JSON text over a real WebSocket, then a close from the client side.
#[tokio::test]
async fn test_websocket_pipeline() {
    let (a, b) = duplex(64 * 1024);
    let client_ws = WebSocketStream::from_raw_socket(a, Role::Client, None).await;
    let server_ws = WebSocketStream::from_raw_socket(b, Role::Server, None).await;

    let builder = PipelineBuilder::new();
    let mut client = builder.websocket(client_ws, JsonFormatter::new()).unwrap();
    let mut server = builder.websocket(server_ws, JsonFormatter::new()).unwrap();
    let cancel = CancellationToken::new();

    let request: Message = Request::new(1, "echo", Some(vec![json!("hi")].into())).into();
    client.write_message(&request, &cancel).await.unwrap();
    assert_eq!(server.read_message(&cancel).await.unwrap(), Some(request));

    client.close().await.unwrap();
    assert_eq!(server.read_message(&cancel).await.unwrap(), None);
    assert_eq!(server.read_message(&cancel).await.unwrap(), None);
}

/// MessagePack over a WebSocket uses binary messages.
#[tokio::test]
async fn test_websocket_binary_formatter() {
    let (a, b) = duplex(64 * 1024);
    let client_ws = WebSocketStream::from_raw_socket(a, Role::Client, None).await;
    let server_ws = WebSocketStream::from_raw_socket(b, Role::Server, None).await;

    let (_client_rx, mut client_tx) = websocket::split(client_ws);
    let mut server = PipelineBuilder::new()
        .websocket(server_ws, MsgPackFormatter::new())
        .unwrap();
    let cancel = CancellationToken::new();

    let payload = MsgPackFormatter::new().encode(&Notification::new("bin", None).into());
    client_tx.send(payload, PacketKind::Binary).await.unwrap();

    let message = server.read_message(&cancel).await.unwrap().unwrap();
    assert_eq!(message.method(), Some("bin"));
}

/// Writer task with outbound batching feeds a peer that unbatches.
#[tokio::test]
async fn test_writer_task_end_to_end() {
    let (a, b) = duplex(64 * 1024);
    let builder = PipelineBuilder::new();
    let (_reader, writer) = builder.length_prefixed(a, JsonFormatter::new()).unwrap().split();
    let mut peer = builder.length_prefixed(b, JsonFormatter::new()).unwrap();
    let cancel = CancellationToken::new();

    let config = WriterConfig {
        batch_outbound: true,
        ..WriterConfig::default()
    };
    let (handle, task) = spawn_writer_task(writer, config, cancel.clone());

    let producers: Vec<_> = (0..4)
        .map(|i| {
            let handle = handle.clone();
            tokio::spawn(async move {
                handle
                    .send(Notification::new(format!("p{i}"), None).into())
                    .await
            })
        })
        .collect();
    for producer in producers {
        producer.await.unwrap().unwrap();
    }
    drop(handle);
    task.await.unwrap().unwrap();

    let mut methods = Vec::new();
    while let Some(message) = peer.read_message(&cancel).await.unwrap() {
        methods.push(message.method().unwrap().to_string());
    }
    methods.sort();
    assert_eq!(methods, vec!["p0", "p1", "p2", "p3"]);
}
