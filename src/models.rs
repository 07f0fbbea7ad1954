use std::{borrow::Cow, fmt};

use serde::{
    de::{IgnoredAny, MapAccess, Visitor},
    Deserialize, Deserializer, Serialize,
};
use utoipa::ToSchema;

// ---------------------------------------------------------------------------
// Streaming envelope
// ---------------------------------------------------------------------------

/// Method tags a device may put on a streamed message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum Method {
    /// Complete status document; the only tag that updates the store.
    NotifyFullStatus,
    /// Partial status delta.
    NotifyStatus,
    NotifyEvent,
    #[default]
    #[serde(other)]
    Other,
}

/// Routing header carried by every streamed message, e.g.
/// `{"src":"shellyplusht-...","dst":"ws","method":"NotifyFullStatus",...}`.
///
/// Only the header is decoded; the rest of the document is kept verbatim by
/// the caller. The message must be a JSON object. Header keys match without
/// regard to ASCII case; missing or `null` fields decode as empty.
#[derive(Debug, Clone, Default)]
pub struct Envelope {
    pub src: String,
    pub dst: String,
    pub method: Method,
}

impl<'de> Deserialize<'de> for Envelope {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(EnvelopeVisitor)
    }
}

struct EnvelopeVisitor;

impl<'de> Visitor<'de> for EnvelopeVisitor {
    type Value = Envelope;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a message object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Envelope, A::Error> {
        let mut envelope = Envelope::default();

        while let Some(key) = map.next_key::<Cow<'de, str>>()? {
            if key.eq_ignore_ascii_case("src") {
                envelope.src = map.next_value::<Option<String>>()?.unwrap_or_default();
            } else if key.eq_ignore_ascii_case("dst") {
                envelope.dst = map.next_value::<Option<String>>()?.unwrap_or_default();
            } else if key.eq_ignore_ascii_case("method") {
                envelope.method = map.next_value::<Option<Method>>()?.unwrap_or_default();
            } else {
                map.next_value::<IgnoredAny>()?;
            }
        }

        Ok(envelope)
    }
}

// ---------------------------------------------------------------------------
// Pull-style report
// ---------------------------------------------------------------------------

/// Status document built from a one-shot report. Measurements are kept as
/// the strings the device sent; an empty string means "not reported".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ReportStatus {
    pub device: String,
    /// Degrees Celsius, as sent by the device.
    pub temperature: String,
    /// Relative humidity percentage, as sent by the device.
    pub humidity: String,
}
