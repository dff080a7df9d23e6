use crate::signaling::SignalingService;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use palaver_core::{ClientMessage, ConnId};
use tokio::sync::mpsc;
use tracing::{info, warn};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(service): State<SignalingService>,
) -> impl IntoResponse {
    // The id is allocated here, at accept, and reclaimed when the socket dies.
    let conn_id = ConnId::new();

    ws.on_upgrade(move |socket| handle_socket(socket, conn_id, service))
}

async fn handle_socket(socket: WebSocket, conn_id: ConnId, service: SignalingService) {
    info!("New signaling connection: {}", conn_id);

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    service.add_peer(conn_id.clone(), tx);

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let service = service.clone();
        let conn_id = conn_id.clone();

        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                        Ok(client_msg) => service.handle(&conn_id, client_msg),
                        Err(e) => warn!("Invalid message from {}: {:?}", conn_id, e),
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    service.remove_peer(&conn_id);
    info!("Signaling connection closed: {}", conn_id);
}
