//! Server network layer: websocket connections, slot assignment, and the
//! fixed-rate tick/broadcast loop.
//!
//! Each connection runs in its own task and only ever touches its own
//! slot's input cell; the tick task is the sole writer of game state. The
//! two sides meet through the shared [`Session`] mutex and the per-slot
//! outbound queues, so one slow or dead connection can never stall the
//! tick loop or its sibling. Outbound queues hold a single snapshot: when
//! a socket write stalls, later frames are dropped for that connection
//! rather than queued as history.

use crate::session::{Session, SlotTable};
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use shared::{ClientMessage, ServerMessage, TICK_RATE};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::Mutex;
use tokio::time::{interval, MissedTickBehavior};
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

/// Owns the listener and the shared session state; `run` drives both the
/// accept loop and the tick/broadcast task.
pub struct GameServer {
    listener: TcpListener,
    session: Arc<Mutex<Session>>,
    slots: Arc<Mutex<SlotTable>>,
    tick_duration: Duration,
}

impl GameServer {
    pub async fn bind(addr: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let listener = TcpListener::bind(addr).await?;
        info!("server listening on {}", listener.local_addr()?);

        Ok(GameServer {
            listener,
            session: Arc::new(Mutex::new(Session::new())),
            slots: Arc::new(Mutex::new(SlotTable::new())),
            tick_duration: Duration::from_secs_f64(1.0 / f64::from(TICK_RATE)),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Runs forever: spawns the tick loop, then accepts connections.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        let session = Arc::clone(&self.session);
        let slots = Arc::clone(&self.slots);
        let tick_duration = self.tick_duration;
        tokio::spawn(async move {
            tick_loop(session, slots, tick_duration).await;
        });

        loop {
            let (stream, addr) = self.listener.accept().await?;
            let session = Arc::clone(&self.session);
            let slots = Arc::clone(&self.slots);
            tokio::spawn(async move {
                handle_connection(stream, addr, session, slots).await;
            });
        }
    }
}

/// Fires at the fixed tick rate: applies queued inputs, advances the
/// simulation, serializes the snapshot once, and fans the same payload out
/// to every connected slot. A full or closed queue drops the frame for
/// that connection only; the loop itself never blocks on a socket.
async fn tick_loop(
    session: Arc<Mutex<Session>>,
    slots: Arc<Mutex<SlotTable>>,
    tick_duration: Duration,
) {
    let mut ticker = interval(tick_duration);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;

        let snapshot = {
            let mut session = session.lock().await;
            session.tick()
        };

        let targets = {
            let slots = slots.lock().await;
            slots.senders()
        };
        if targets.is_empty() {
            continue;
        }

        let payload = match serde_json::to_string(&ServerMessage::State { data: snapshot }) {
            Ok(payload) => payload,
            Err(e) => {
                error!("failed to serialize snapshot: {}", e);
                continue;
            }
        };

        for (slot, sender) in targets {
            match sender.try_send(payload.clone()) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    debug!("player {} is lagging, dropping frame", slot + 1);
                }
                Err(TrySendError::Closed(_)) => {
                    debug!("player {} outbound queue closed, dropping frame", slot + 1);
                }
            }
        }
    }
}

/// Full lifecycle of one client connection: websocket handshake, slot
/// claim (or `full` rejection), welcome, then a select loop pumping
/// inbound messages into the session and outbound frames onto the socket.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    session: Arc<Mutex<Session>>,
    slots: Arc<Mutex<SlotTable>>,
) {
    let ws_stream = match accept_async(stream).await {
        Ok(ws_stream) => ws_stream,
        Err(e) => {
            warn!("websocket handshake with {} failed: {}", addr, e);
            return;
        }
    };
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();
    // One snapshot deep: a stalled write drops frames instead of queueing.
    let (outbound_tx, mut outbound_rx) = mpsc::channel::<String>(1);

    let slot = {
        let mut slots = slots.lock().await;
        slots.claim(outbound_tx)
    };
    let Some(slot) = slot else {
        info!("rejecting {}: both player slots are taken", addr);
        if let Ok(text) = serde_json::to_string(&ServerMessage::Full) {
            let _ = ws_sender.send(Message::Text(text)).await;
        }
        let _ = ws_sender.close().await;
        return;
    };

    info!("player {} connected from {}", slot + 1, addr);

    // Sent directly, ahead of any state frames queued on the channel, so
    // the client learns its slot before the first snapshot.
    let welcome = ServerMessage::Welcome {
        player: (slot + 1) as u8,
    };
    let greeted = match serde_json::to_string(&welcome) {
        Ok(text) => ws_sender.send(Message::Text(text)).await.is_ok(),
        Err(e) => {
            error!("failed to serialize welcome: {}", e);
            false
        }
    };

    if greeted {
        loop {
            tokio::select! {
                inbound = ws_receiver.next() => {
                    match inbound {
                        Some(Ok(Message::Text(text))) => {
                            handle_client_text(&text, slot, &session).await;
                        }
                        Some(Ok(Message::Close(_))) | None => break,
                        Some(Err(e)) => {
                            debug!("receive error from player {}: {}", slot + 1, e);
                            break;
                        }
                        Some(Ok(_)) => {} // ping/pong/binary: nothing to do
                    }
                }
                outbound = outbound_rx.recv() => {
                    match outbound {
                        Some(text) => {
                            if let Err(e) = ws_sender.send(Message::Text(text)).await {
                                debug!("send to player {} failed: {}", slot + 1, e);
                                break;
                            }
                        }
                        None => break,
                    }
                }
            }
        }
    }

    // Any exit path counts as a disconnect: free the slot and drop the
    // pending input so the next connection starts clean.
    {
        let mut slots = slots.lock().await;
        slots.release(slot);
    }
    {
        let mut session = session.lock().await;
        session.clear_input(slot);
    }
    info!("player {} disconnected", slot + 1);
}

/// Decodes one inbound text frame. Malformed payloads are ignored, per the
/// protocol: no error is surfaced to the client and no state changes.
async fn handle_client_text(text: &str, slot: usize, session: &Arc<Mutex<Session>>) {
    match serde_json::from_str::<ClientMessage>(text) {
        Ok(ClientMessage::Input { data }) => {
            let mut session = session.lock().await;
            session.queue_input(slot, data.key);
        }
        Ok(ClientMessage::Reset) => {
            info!("player {} requested a new round", slot + 1);
            let mut session = session.lock().await;
            session.reset();
        }
        Err(e) => {
            debug!("ignoring malformed message from player {}: {}", slot + 1, e);
        }
    }
}
