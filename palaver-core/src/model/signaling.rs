use crate::model::conn::ConnId;
use crate::model::room::RoomId;
use crate::model::session::{CandidateInit, SessionDescription};
use serde::{Deserialize, Serialize};

/// Messages a client sends to the relay. Everything except `Join` is
/// addressed to another connection by id; the relay rewrites the envelope
/// and forwards the payload untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", content = "d")]
pub enum ClientMessage {
    Join {
        identity: String,
        room: RoomId,
    },
    CallOffer {
        to: ConnId,
        offer: SessionDescription,
    },
    CallAccepted {
        to: ConnId,
        answer: SessionDescription,
    },
    NegotiationOffer {
        to: ConnId,
        offer: SessionDescription,
    },
    NegotiationAnswer {
        to: ConnId,
        answer: SessionDescription,
    },
    CandidateExchange {
        to: ConnId,
        candidate: Option<CandidateInit>,
    },
}

/// Messages the relay sends to a client. Routed variants carry the sender's
/// connection id in `from` where the client put the target in `to`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", content = "d")]
pub enum ServerMessage {
    /// Sent once at connect so the client learns its own connection id.
    Welcome { conn_id: ConnId },
    /// Echo of a successful `Join`; the client's "ready" signal.
    JoinAck { identity: String, room: RoomId },
    /// Fan-out to existing room members when someone joins.
    PeerJoined { identity: String, conn_id: ConnId },
    IncomingCall {
        from: ConnId,
        offer: SessionDescription,
    },
    CallAccepted {
        from: ConnId,
        answer: SessionDescription,
    },
    NegotiationOffer {
        from: ConnId,
        offer: SessionDescription,
    },
    NegotiationFinal {
        from: ConnId,
        answer: SessionDescription,
    },
    CandidateExchange {
        from: ConnId,
        candidate: Option<CandidateInit>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_message_wire_shape() {
        let msg = ClientMessage::Join {
            identity: "alice@example.com".into(),
            room: "42".into(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""op":"Join""#));
        assert!(json.contains(r#""room":"42""#));

        let back: ClientMessage = serde_json::from_str(&json).unwrap();
        assert!(matches!(back, ClientMessage::Join { identity, .. } if identity == "alice@example.com"));
    }

    #[test]
    fn sentinel_candidate_survives_serialization() {
        let msg = ClientMessage::CandidateExchange {
            to: ConnId::new(),
            candidate: None,
        };
        let json = serde_json::to_string(&msg).unwrap();
        let back: ClientMessage = serde_json::from_str(&json).unwrap();
        assert!(matches!(
            back,
            ClientMessage::CandidateExchange {
                candidate: None,
                ..
            }
        ));
    }
}
