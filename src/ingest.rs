//! Producers for the status store: streamed device messages and one-shot
//! reports. Both paths validate at their own boundary and never let an error
//! reach the store.

use bytes::Bytes;
use thiserror::Error;
use tracing::debug;

use crate::{
    models::{Envelope, Method, ReportStatus},
    status_store::StatusStore,
};

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("stream read failed: {0}")]
    Transport(#[from] axum::Error),
    #[error("message is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("undecodable envelope: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("device id is required")]
    MissingDevice,
    #[error("at least one of temperature or humidity is required")]
    MissingMeasurement,
    #[error("failed to encode report: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Outcome of a streamed message that decoded cleanly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Full status stored under the contained device id.
    Stored(String),
    /// Recognized envelope whose method does not update the store.
    Skipped(Method),
}

/// Decode the envelope of one streamed message and, for a full-status
/// notification, store the whole message under its `src`.
///
/// The whole message must be UTF-8, not just the header fields: stored
/// payloads are later embedded as raw JSON text.
pub async fn ingest_frame(store: &StatusStore, frame: Bytes) -> Result<FrameOutcome, StreamError> {
    let text = std::str::from_utf8(&frame)?;
    let envelope: Envelope = serde_json::from_str(text)?;

    match envelope.method {
        Method::NotifyFullStatus => {
            debug!(device_id = %envelope.src, bytes = frame.len(), "Storing full status");
            store.put(envelope.src.clone(), frame).await;
            Ok(FrameOutcome::Stored(envelope.src))
        }
        other => Ok(FrameOutcome::Skipped(other)),
    }
}

/// Validate a pull-style report, serialize it and store it under its device.
pub async fn ingest_report(store: &StatusStore, report: ReportStatus) -> Result<(), ReportError> {
    if report.device.is_empty() {
        return Err(ReportError::MissingDevice);
    }
    if report.temperature.is_empty() && report.humidity.is_empty() {
        return Err(ReportError::MissingMeasurement);
    }

    let document = serde_json::to_vec(&report)?;
    debug!(device_id = %report.device, "Storing reported status");
    store.put(report.device, Bytes::from(document)).await;
    Ok(())
}
