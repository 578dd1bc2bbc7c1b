//! Websocket runtime for the client.
//!
//! The render loop is synchronous (macroquad owns the main thread), so the
//! socket lives on a background thread with its own tokio runtime. The two
//! sides talk through a pair of unbounded channels: decoded server
//! messages flow in, input/reset messages flow out. Dropping the runtime
//! closes the outbound channel, which ends the socket task and tears down
//! both paths together.

use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info};
use shared::{ClientMessage, ServerMessage};
use std::sync::Mutex;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

/// Events delivered to the render loop.
#[derive(Debug)]
pub enum NetEvent {
    Message(ServerMessage),
    /// The connection is gone, whether it ever came up or not.
    Closed,
}

pub struct ClientRuntime {
    outbound_tx: UnboundedSender<ClientMessage>,
    inbound_rx: Mutex<UnboundedReceiver<NetEvent>>,
}

impl ClientRuntime {
    /// Connects to `url` on a background thread and returns immediately;
    /// connection failure surfaces later as [`NetEvent::Closed`].
    pub fn connect(url: String) -> Self {
        let (outbound_tx, outbound_rx) = unbounded_channel::<ClientMessage>();
        let (inbound_tx, inbound_rx) = unbounded_channel::<NetEvent>();

        std::thread::spawn(move || match tokio::runtime::Runtime::new() {
            Ok(runtime) => runtime.block_on(socket_task(url, outbound_rx, inbound_tx)),
            Err(e) => {
                error!("failed to start network runtime: {}", e);
            }
        });

        Self {
            outbound_tx,
            inbound_rx: Mutex::new(inbound_rx),
        }
    }

    /// Queues a message for the server. A dead connection drops it
    /// silently; the render loop learns about the death via `Closed`.
    pub fn send(&self, message: ClientMessage) {
        let _ = self.outbound_tx.send(message);
    }

    /// Non-blocking poll for the next network event.
    pub fn try_recv(&self) -> Option<NetEvent> {
        self.inbound_rx
            .lock()
            .ok()
            .and_then(|mut rx| rx.try_recv().ok())
    }
}

async fn socket_task(
    url: String,
    mut outbound_rx: UnboundedReceiver<ClientMessage>,
    inbound_tx: UnboundedSender<NetEvent>,
) {
    let ws_stream = match connect_async(&url).await {
        Ok((stream, _)) => stream,
        Err(e) => {
            error!("could not connect to {}: {}", url, e);
            let _ = inbound_tx.send(NetEvent::Closed);
            return;
        }
    };
    info!("connected to {}", url);
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    loop {
        tokio::select! {
            outbound = outbound_rx.recv() => {
                match outbound {
                    Some(message) => {
                        let text = match serde_json::to_string(&message) {
                            Ok(text) => text,
                            Err(e) => {
                                error!("failed to serialize outbound message: {}", e);
                                continue;
                            }
                        };
                        if let Err(e) = ws_sender.send(Message::Text(text)).await {
                            debug!("send failed: {}", e);
                            break;
                        }
                    }
                    // The render loop dropped the runtime: deliberate quit.
                    None => break,
                }
            }
            inbound = ws_receiver.next() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ServerMessage>(&text) {
                            Ok(message) => {
                                if inbound_tx.send(NetEvent::Message(message)).is_err() {
                                    break;
                                }
                            }
                            Err(e) => debug!("ignoring malformed frame: {}", e),
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        debug!("receive failed: {}", e);
                        break;
                    }
                    Some(Ok(_)) => {} // ping/pong/binary: nothing to do
                }
            }
        }
    }

    let _ = ws_sender.close().await;
    let _ = inbound_tx.send(NetEvent::Closed);
    info!("disconnected from {}", url);
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::InputEvent;
    use std::time::Duration;
    use tokio::net::TcpListener;
    use tokio_tungstenite::accept_async;

    async fn recv_event(runtime: &ClientRuntime) -> Option<NetEvent> {
        for _ in 0..200 {
            if let Some(event) = runtime.try_recv() {
                return Some(event);
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        None
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn runtime_delivers_decoded_messages() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(stream).await.unwrap();
            ws.send(Message::Text(
                r#"{"type":"welcome","player":1}"#.to_string(),
            ))
            .await
            .unwrap();

            // Echo the first client frame back as a close trigger check.
            if let Some(Ok(Message::Text(text))) = ws.next().await {
                assert!(text.contains("\"type\":\"input\""));
            }
        });

        let runtime = ClientRuntime::connect(format!("ws://{}", addr));

        match recv_event(&runtime).await {
            Some(NetEvent::Message(ServerMessage::Welcome { player })) => assert_eq!(player, 1),
            other => panic!("expected welcome, got {:?}", other),
        }

        runtime.send(ClientMessage::Input {
            data: InputEvent {
                key: "LEFT".to_string(),
            },
        });

        // Server task ends after the input frame; the runtime reports the
        // closed connection.
        match recv_event(&runtime).await {
            Some(NetEvent::Closed) => {}
            other => panic!("expected closed, got {:?}", other),
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn failed_connect_reports_closed() {
        // Nothing listens on this port.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let runtime = ClientRuntime::connect(format!("ws://{}", addr));
        match recv_event(&runtime).await {
            Some(NetEvent::Closed) => {}
            other => panic!("expected closed, got {:?}", other),
        }
    }
}
