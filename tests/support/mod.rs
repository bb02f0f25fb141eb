// Boots one session host per test binary and hands out WebSocket clients.
#![allow(dead_code)]

use futures_util::StreamExt;
use std::{
    sync::{Arc, OnceLock},
    time::Duration,
};
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

pub type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

static SERVER_ADDR: OnceLock<String> = OnceLock::new();

/// Starts the host on an ephemeral port (once) and returns `host:port`.
pub fn ensure_server() -> &'static str {
    SERVER_ADDR.get_or_init(|| {
        let published = Arc::new(OnceLock::<String>::new());
        let published_thread = Arc::clone(&published);

        // Own OS thread and runtime so the server outlives each `#[tokio::test]` runtime.
        std::thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("test runtime");
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                    .await
                    .expect("bind ephemeral test port");
                let addr = listener.local_addr().expect("get local addr");
                let _ = published_thread.set(addr.to_string());
                grenade_server::run(listener).await.expect("server failed");
            });
        });

        wait_until_accepting(&published)
    })
}

fn wait_until_accepting(published: &OnceLock<String>) -> String {
    let addr = loop {
        if let Some(addr) = published.get() {
            break addr.clone();
        }
        std::thread::sleep(Duration::from_millis(10));
    };

    for _ in 0..100 {
        if std::net::TcpStream::connect(&addr).is_ok() {
            return addr;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    panic!("server did not become ready in time");
}

/// Connects a client and returns it with the peer id from its Identity message.
pub async fn connect_peer() -> (Client, u64) {
    let addr = ensure_server();
    let (mut client, _) = connect_async(format!("ws://{addr}/ws"))
        .await
        .expect("websocket connect");

    let identity = next_text(&mut client).await;
    assert_eq!(identity["type"], "Identity");
    let peer_id = identity["data"]["peer_id"]
        .as_str()
        .and_then(|id| id.parse().ok())
        .expect("identity carries a numeric peer id");
    (client, peer_id)
}

/// Next JSON text frame, skipping anything else.
pub async fn next_text(client: &mut Client) -> serde_json::Value {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(2), client.next())
            .await
            .expect("timed out waiting for a text frame")
            .expect("socket closed")
            .expect("websocket error");
        if let Message::Text(text) = msg {
            return serde_json::from_str(text.as_str()).expect("server sends JSON");
        }
    }
}

/// Every binary frame received within `wait`; text frames are skipped.
pub async fn binaries_within(client: &mut Client, wait: Duration) -> Vec<Vec<u8>> {
    let mut frames = Vec::new();
    let read = async {
        while let Some(msg) = client.next().await {
            if let Ok(Message::Binary(bytes)) = msg {
                frames.push(bytes.to_vec());
            }
        }
    };
    let _ = tokio::time::timeout(wait, read).await;
    frames
}

/// Waits for a world update that satisfies `pred`.
pub async fn world_update_where(
    client: &mut Client,
    pred: impl Fn(&serde_json::Value) -> bool,
) -> serde_json::Value {
    let read = async {
        loop {
            let msg = next_text(client).await;
            if msg["type"] == "WorldUpdate" && pred(&msg["data"]) {
                return msg["data"].clone();
            }
        }
    };
    tokio::time::timeout(Duration::from_secs(3), read)
        .await
        .expect("no matching world update")
}
