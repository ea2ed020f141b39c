//! Replays a fixture session over a WebSocket listener, standing in for a
//! live Race Monitor feed during local development and manual testing.
//!
//! Lines are grouped into frames at each heartbeat (`$F`) boundary, with a
//! one-second pause between frames, mirroring the cadence of a live feed.

use std::net::SocketAddr;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::protocol::Message;

const FIXTURE: &str = include_str!("../../fixtures/sample_session.txt");

#[tokio::main(flavor = "current_thread")]
async fn main() -> std::io::Result<()> {
    let listener = TcpListener::bind("127.0.0.1:9898").await?;
    println!("simulator listening on ws://127.0.0.1:9898");

    loop {
        let (socket, addr) = listener.accept().await?;
        tokio::task::spawn(async move {
            let _ = handle_connection(socket, addr).await;
        });
    }
}

async fn handle_connection(
    socket: TcpStream,
    addr: SocketAddr,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("client connected from {addr}");
    let mut ws = tokio_tungstenite::accept_async(socket).await?;

    for frame in frames() {
        ws.send(Message::Text(frame.clone().into())).await?;
        if frame.lines().any(|l| l.starts_with("$F")) {
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
    }

    ws.close(None).await?;
    Ok(())
}

/// Splits the fixture into frames, flushing the current frame once a
/// heartbeat line is seen.
fn frames() -> Vec<String> {
    let mut frames = Vec::new();
    let mut current = String::new();

    for line in FIXTURE.lines() {
        if line.is_empty() {
            continue;
        }
        current.push_str(line);
        current.push('\n');
        if line.starts_with("$F") {
            frames.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        frames.push(current);
    }

    frames
}
