use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::HeaderMap,
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::broadcast::{self, error::RecvError};

use crate::{
    AppState,
    error::Result,
    models::Notification,
    utils::{
        extractors::{AppQuery, extract_token},
        jwt,
    },
};

#[derive(Debug, Deserialize)]
pub struct SocketQuery {
    pub token: Option<String>,
}

/// Upgrades an authenticated admin to the live notification stream.
///
/// Browsers cannot set headers on a WebSocket handshake, so the token is read
/// from the `token` query parameter first.
pub async fn notifications_ws(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<SocketQuery>,
    headers: HeaderMap,
) -> Result<Response> {
    let token = match query.token.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        Some(token) => token,
        None => extract_token(&headers)?,
    };
    let claims = jwt::verify_token(&state.config.auth.jwt_secret, token)?;

    let events = state.notifier.subscribe();

    Ok(ws.on_upgrade(move |socket| stream_notifications(socket, events, claims.username)))
}

async fn stream_notifications(
    socket: WebSocket,
    mut events: broadcast::Receiver<Notification>,
    username: String,
) {
    let (mut sender, mut receiver) = socket.split();
    tracing::info!("Admin {} subscribed to notifications", username);

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(notification) => {
                    let payload = match serde_json::to_string(&notification) {
                        Ok(payload) => payload,
                        Err(e) => {
                            tracing::error!("Failed to encode notification: {}", e);
                            continue;
                        }
                    };
                    if sender.send(Message::Text(payload.into())).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Admin {} missed {} notification(s)", username, skipped);
                }
                Err(RecvError::Closed) => break,
            },
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    tracing::info!("Admin {} disconnected from notifications", username);
}
