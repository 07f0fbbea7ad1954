use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use bytes::Bytes;
use tracing::{debug, info, warn};

use super::AppState;
use crate::ingest::{self, FrameOutcome, StreamError};

/// Accept a long-lived websocket on which devices push status notifications.
/// Full-status messages are stored verbatim; nothing is ever sent back.
#[utoipa::path(
    get,
    path = "/measure/v1/ws",
    responses(
        (status = 101, description = "Switching to the websocket protocol"),
    ),
    tag = "measure"
)]
pub async fn stream_ingest(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| read_frames(socket, state))
}

/// Per-connection loop: read, decode, store or skip, repeat. Any read or
/// decode failure ends this connection only.
async fn read_frames(mut socket: WebSocket, state: AppState) {
    info!("Stream connection opened");

    loop {
        let frame = tokio::select! {
            _ = state.shutdown.cancelled() => {
                let _ = socket.send(Message::Close(None)).await;
                info!("Closing stream connection for shutdown");
                return;
            }
            frame = socket.recv() => frame,
        };

        let bytes = match frame {
            Some(Ok(Message::Text(text))) => Bytes::from(text),
            Some(Ok(Message::Binary(bytes))) => bytes,
            Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
            Some(Ok(Message::Close(_))) | None => break,
            Some(Err(e)) => {
                warn!(error = %StreamError::from(e), "Closing stream connection");
                break;
            }
        };

        match ingest::ingest_frame(&state.store, bytes).await {
            Ok(FrameOutcome::Stored(device_id)) => {
                debug!(device_id = %device_id, "Full status received");
            }
            Ok(FrameOutcome::Skipped(method)) => {
                debug!(method = ?method, "Ignoring stream message");
            }
            Err(e) => {
                warn!(error = %e, "Closing stream connection");
                break;
            }
        }
    }

    info!("Stream connection closed");
}
