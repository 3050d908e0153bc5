//! Echo server - simple request/response example.
//!
//! This example demonstrates:
//! - Building a length-prefixed pipeline with the builder pattern
//! - Reading requests and answering each with its own params
//! - Unbatching: a client batch is answered message by message
//!
//! Both ends run in-process over `tokio::io::duplex`. Swap the duplex for a
//! `TcpStream` (or a `WebSocketStream` with `PipelineBuilder::websocket`) to
//! serve real peers.

use jsonrpc_wire::message::{ErrorResponse, Message, Request, SuccessResponse};
use jsonrpc_wire::{Formatter, JsonFormatter, PipelineBuilder};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (client_io, server_io) = tokio::io::duplex(64 * 1024);
    let builder = PipelineBuilder::new();
    let mut server = builder.length_prefixed(server_io, JsonFormatter::new())?;
    let mut client = builder.length_prefixed(client_io, JsonFormatter::new())?;
    let cancel = CancellationToken::new();

    let server_cancel = cancel.clone();
    let server_task = tokio::spawn(async move {
        while let Some(message) = server.read_message(&server_cancel).await? {
            if let Message::Request(request) = message {
                let reply = answer(request);
                server.write_message(&reply, &server_cancel).await?;
            }
        }
        server.close().await
    });

    // One plain request and one batch of two.
    client
        .write_message(
            &Request::new(1, "echo", Some(vec![json!("hello")].into())).into(),
            &cancel,
        )
        .await?;
    client
        .write_batch(
            &[
                Request::new(2, "echo", Some(vec![json!("batched")].into())).into(),
                Request::new(3, "shout", None).into(),
            ],
            &cancel,
        )
        .await?;

    for _ in 0..3 {
        if let Some(reply) = client.read_message(&cancel).await? {
            println!("{}", JsonFormatter::new().render_text(&reply));
        }
    }

    client.close().await?;
    server_task.await??;
    Ok(())
}

fn answer(request: Request) -> Message {
    match request.method.as_str() {
        "echo" => {
            let params = serde_json::to_value(&request.params).unwrap_or(Value::Null);
            SuccessResponse::new(request.id, params).into()
        }
        _ => ErrorResponse::method_not_found(request.id).into(),
    }
}
