use std::collections::HashMap;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use crate::models::ReportStatus;

/// Query string of `GET /measure/v1/report`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ReportParams {
    pub dev: String,
    pub temp: String,
    pub hum: String,
}

impl From<ReportParams> for ReportStatus {
    fn from(p: ReportParams) -> Self {
        Self {
            device: p.dev,
            temperature: p.temp,
            humidity: p.hum,
        }
    }
}

/// Query string of `GET /measure/v1/collect`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CollectParams {
    pub device: Option<String>,
}

/// Response of `GET /measure/v1/collect`. Stored payloads are embedded as raw
/// JSON, byte for byte.
///
/// Serializes as `{"status": <payload>}` or `{"devices": {"<id>": <payload>}}`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectResponse {
    Status(Box<RawValue>),
    Devices(HashMap<String, Box<RawValue>>),
}

/// Reinterpret a stored payload as a JSON fragment.
pub fn raw_json(payload: Bytes) -> anyhow::Result<Box<RawValue>> {
    let text = String::from_utf8(payload.to_vec())?;
    Ok(RawValue::from_string(text)?)
}
