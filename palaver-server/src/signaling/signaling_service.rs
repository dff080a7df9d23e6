use crate::registry::RoomRegistry;
use axum::extract::ws::Message;
use dashmap::DashMap;
use palaver_core::{ClientMessage, ConnId, ServerMessage};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, warn};

struct SignalingInner {
    peers: DashMap<ConnId, mpsc::UnboundedSender<Message>>,
}

/// Routes signaling messages between registry-known connections.
///
/// Forwarding is at-most-once and best-effort: a message addressed to an
/// unknown or already-disconnected id is dropped with a log line and the
/// sender gets no feedback. Payloads are never interpreted; only the
/// `to`/`from` envelope is rewritten. Messages from one sender reach one
/// recipient in send order (each connection has a single outbound channel);
/// nothing is guaranteed across senders.
#[derive(Clone)]
pub struct SignalingService {
    inner: Arc<SignalingInner>,
    registry: RoomRegistry,
}

impl SignalingService {
    pub fn new(registry: RoomRegistry) -> Self {
        Self {
            inner: Arc::new(SignalingInner {
                peers: DashMap::new(),
            }),
            registry,
        }
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    /// Attach a connection's outbound channel and greet it with its id.
    pub fn add_peer(&self, conn_id: ConnId, tx: mpsc::UnboundedSender<Message>) {
        self.inner.peers.insert(conn_id.clone(), tx);
        self.send(&conn_id, ServerMessage::Welcome { conn_id: conn_id.clone() });
    }

    /// Detach a connection and purge its registry entries. Must run on every
    /// disconnect, or the id tables grow without bound.
    pub fn remove_peer(&self, conn_id: &ConnId) {
        self.inner.peers.remove(conn_id);
        self.registry.leave(conn_id);
    }

    /// Handle one inbound message from `from`, already decoded.
    pub fn handle(&self, from: &ConnId, msg: ClientMessage) {
        match msg {
            ClientMessage::Join { identity, room } => {
                let existing = self.registry.members(&room, from);
                self.registry.join(from.clone(), identity.clone(), room.clone());

                for member in existing {
                    self.send(
                        &member,
                        ServerMessage::PeerJoined {
                            identity: identity.clone(),
                            conn_id: from.clone(),
                        },
                    );
                }

                // Echo back to the joiner as the "ready" signal.
                self.send(from, ServerMessage::JoinAck { identity, room });
            }

            ClientMessage::CallOffer { to, offer } => self.send(
                &to,
                ServerMessage::IncomingCall {
                    from: from.clone(),
                    offer,
                },
            ),

            ClientMessage::CallAccepted { to, answer } => self.send(
                &to,
                ServerMessage::CallAccepted {
                    from: from.clone(),
                    answer,
                },
            ),

            ClientMessage::NegotiationOffer { to, offer } => self.send(
                &to,
                ServerMessage::NegotiationOffer {
                    from: from.clone(),
                    offer,
                },
            ),

            ClientMessage::NegotiationAnswer { to, answer } => self.send(
                &to,
                ServerMessage::NegotiationFinal {
                    from: from.clone(),
                    answer,
                },
            ),

            ClientMessage::CandidateExchange { to, candidate } => self.send(
                &to,
                ServerMessage::CandidateExchange {
                    from: from.clone(),
                    candidate,
                },
            ),
        }
    }

    pub fn send(&self, conn_id: &ConnId, msg: ServerMessage) {
        if let Some(peer) = self.inner.peers.get(conn_id) {
            match serde_json::to_string(&msg) {
                Ok(json) => {
                    if let Err(e) = peer.send(Message::Text(json.into())) {
                        error!("Failed to queue message for {}: {:?}", conn_id, e);
                    }
                }
                Err(e) => error!("Failed to serialize server message: {}", e),
            }
        } else {
            warn!("Dropping signal for unknown connection {}", conn_id);
        }
    }
}
