//! Clearing channel client
//!
//! One persistent duplex WebSocket connection to the clearinghouse. Outbound
//! messages from any task funnel through an mpsc channel into the single
//! writer; inbound frames are decoded and handed to the [`Dispatcher`].
//!
//! Sends fail fast while the link is down; nothing is queued against a
//! connection known to be dead. The runner reconnects with a fixed delay;
//! anything smarter is an operator concern.

use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use super::correlation::{CorrelationTable, TransferOutcome};
use super::error::InterbankError;
use super::participant::Participant;
use super::protocol::{ClearingMessage, RejectReason};

/// Cloneable handle for sending on the clearing channel
#[derive(Clone)]
pub struct ChannelClient {
    outbound: mpsc::UnboundedSender<ClearingMessage>,
    connected: Arc<AtomicBool>,
}

impl ChannelClient {
    /// Create a client and the receiver end of its outbound queue
    ///
    /// The client starts disconnected; the channel runner (or a test
    /// harness) flips the flag once a link is up.
    pub fn pair() -> (Self, mpsc::UnboundedReceiver<ClearingMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                outbound: tx,
                connected: Arc::new(AtomicBool::new(false)),
            },
            rx,
        )
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    pub fn set_connected(&self, up: bool) {
        self.connected.store(up, Ordering::Release);
    }

    /// Queue a message for the writer task
    ///
    /// Fails fast with [`InterbankError::ChannelDown`] when the link is not
    /// up; no outbound message is ever parked on a dead connection.
    pub fn send(&self, msg: ClearingMessage) -> Result<(), InterbankError> {
        if !self.is_connected() {
            return Err(InterbankError::ChannelDown);
        }
        self.outbound
            .send(msg)
            .map_err(|_| InterbankError::ChannelDown)
    }
}

/// Routes inbound messages to their consumers
///
/// Terminal events resolve the correlation table (misses are late or
/// duplicate deliveries and are dropped); participant events are answered
/// through the client. Every participant event produces exactly one result
/// message.
pub struct Dispatcher {
    correlation: Arc<CorrelationTable>,
    participant: Arc<Participant>,
    client: ChannelClient,
}

impl Dispatcher {
    pub fn new(
        correlation: Arc<CorrelationTable>,
        participant: Arc<Participant>,
        client: ChannelClient,
    ) -> Self {
        Self {
            correlation,
            participant,
            client,
        }
    }

    pub async fn dispatch(&self, msg: ClearingMessage) {
        match msg {
            ClearingMessage::Commit { id } => {
                self.correlation.resolve(&id, TransferOutcome::Committed);
            }
            ClearingMessage::Reject { id, reason } => {
                let reason = RejectReason::from_wire(&reason);
                self.correlation
                    .resolve(&id, TransferOutcome::Rejected(reason));
            }
            ClearingMessage::Reserve { .. }
            | ClearingMessage::Credit { .. }
            | ClearingMessage::Debit { .. }
            | ClearingMessage::Rollback { .. } => {
                if let Some(reply) = self.participant.handle(msg).await {
                    if let Err(e) = self.client.send(reply) {
                        warn!(error = %e, "Could not answer participant event");
                    }
                }
            }
            other => {
                warn!(id = other.transaction_id(), "Unexpected inbound message type");
            }
        }
    }
}

/// Owns the WebSocket connection lifecycle
pub struct ChannelRunner {
    url: String,
    reconnect_delay: Duration,
    outbound: mpsc::UnboundedReceiver<ClearingMessage>,
    connected: Arc<AtomicBool>,
    dispatcher: Dispatcher,
}

/// Wire up a client, dispatcher, and runner for the given endpoint
pub fn build_channel(
    url: String,
    reconnect_delay: Duration,
    correlation: Arc<CorrelationTable>,
    participant: Arc<Participant>,
) -> (ChannelClient, ChannelRunner) {
    let (client, outbound) = ChannelClient::pair();
    let dispatcher = Dispatcher::new(correlation, participant, client.clone());
    let runner = ChannelRunner {
        url,
        reconnect_delay,
        outbound,
        connected: client.connected.clone(),
        dispatcher,
    };
    (client, runner)
}

impl ChannelRunner {
    /// Connect-pump-reconnect loop; runs for the life of the process
    pub async fn run(mut self) {
        loop {
            match connect_async(self.url.as_str()).await {
                Ok((ws, _)) => {
                    info!(url = %self.url, "Clearing channel connected");
                    self.connected.store(true, Ordering::Release);
                    self.pump(ws).await;
                    self.connected.store(false, Ordering::Release);
                    warn!(url = %self.url, "Clearing channel disconnected");
                }
                Err(e) => {
                    warn!(url = %self.url, error = %e, "Clearing channel connect failed");
                }
            }
            tokio::time::sleep(self.reconnect_delay).await;
        }
    }

    async fn pump<S>(&mut self, ws: tokio_tungstenite::WebSocketStream<S>)
    where
        S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
    {
        let (mut sink, mut stream) = ws.split();

        loop {
            tokio::select! {
                outbound = self.outbound.recv() => {
                    let Some(msg) = outbound else { break };
                    let frame = match serde_json::to_string(&msg) {
                        Ok(frame) => frame,
                        Err(e) => {
                            warn!(error = %e, "Could not encode outbound message");
                            continue;
                        }
                    };
                    debug!(id = msg.transaction_id(), "-> clearinghouse");
                    if sink.send(Message::Text(frame)).await.is_err() {
                        break;
                    }
                }
                inbound = stream.next() => {
                    match inbound {
                        Some(Ok(Message::Text(text))) => {
                            match serde_json::from_str::<ClearingMessage>(&text) {
                                Ok(msg) => {
                                    debug!(id = msg.transaction_id(), "<- clearinghouse");
                                    self.dispatcher.dispatch(msg).await;
                                }
                                Err(e) => {
                                    warn!(error = %e, "Malformed frame from clearinghouse");
                                }
                            }
                        }
                        Some(Ok(Message::Close(_))) | None => break,
                        Some(Ok(_)) => {} // ping/pong handled by the stream
                        Some(Err(e)) => {
                            warn!(error = %e, "Clearing channel read error");
                            break;
                        }
                    }
                }
            }
        }
    }
}
