//! Encoding and decoding of bridge messages.
//!
//! Decoding reads the envelope first, then each event's `event_name` discriminator. Unknown
//! events never fail a batch. How a malformed *known* event affects the rest of its batch is
//! governed by [`DecodePolicy`].

use serde::Deserialize;

use crate::{
    errors::{self, DecodeError, EncodeError},
    events::{Envelope, EnvelopePayload, OutboundEvent, ProtocolEvent},
    types::{AnyJson, EnvelopeVersion},
};

/// Default global entry point invoked inside the surface to deliver outbound payloads.
pub const DEFAULT_ACCEPT_EVENT_ENTRY_POINT: &str = "window.paywall.acceptEvent";

/// What to do with a batch containing a recognized event whose payload fails to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodePolicy {
    /// Fail the whole message; no events are delivered.
    #[default]
    WholeBatch,
    /// Drop only the malformed event and deliver the rest in order.
    PerEvent,
}

#[derive(Deserialize)]
struct RawEnvelope {
    version: EnvelopeVersion,
    payload: RawPayload,
}

#[derive(Deserialize)]
struct RawPayload {
    events: Vec<AnyJson>,
}

/// Bridge message codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventCodec {
    pub policy: DecodePolicy,
}

impl EventCodec {
    pub fn new(policy: DecodePolicy) -> Self {
        EventCodec { policy }
    }

    /// Decode a raw bridge message.
    ///
    /// Events keep their array order. Unknown events are kept as [`ProtocolEvent::Ignored`].
    pub fn decode(&self, raw: &[u8]) -> Result<Envelope, DecodeError> {
        let raw: RawEnvelope =
            serde_json::from_slice(raw).map_err(DecodeError::MalformedEnvelope)?;

        let mut events = Vec::with_capacity(raw.payload.events.len());
        for value in raw.payload.events {
            match ProtocolEvent::from_value(value) {
                Ok(event) => events.push(event),
                Err(err) if self.policy == DecodePolicy::PerEvent => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!("Dropping malformed bridge event: {err}");
                    #[cfg(not(feature = "tracing"))]
                    let _ = err;
                }
                Err(err) => return Err(err),
            }
        }

        Ok(Envelope {
            version: raw.version,
            payload: EnvelopePayload { events },
        })
    }

    pub fn decode_str(&self, raw: &str) -> Result<Envelope, DecodeError> {
        self.decode(raw.as_bytes())
    }
}

/// Decode a raw bridge message with the default [`DecodePolicy::WholeBatch`] policy.
pub fn decode(raw: &[u8]) -> Result<Envelope, DecodeError> {
    EventCodec::default().decode(raw)
}

/// Encode an envelope as a JSON string, discriminators first.
pub fn encode_envelope(envelope: &Envelope) -> errors::Result<String> {
    Ok(serde_json::to_string(envelope).map_err(EncodeError)?)
}

/// Encode an outbound payload as a JSON string, discriminator first.
pub fn encode_outbound(event: &OutboundEvent) -> errors::Result<String> {
    Ok(serde_json::to_string(event).map_err(EncodeError)?)
}

/// Build the script that delivers `event` to the surface through `entry_point`.
///
/// ```
/// use webpaywall_core::{codec::accept_event_script, events::OutboundEvent, types::Variables};
///
/// let event = OutboundEvent::variables(Variables::new());
/// let script = accept_event_script("window.paywall.acceptEvent", &event).unwrap();
/// assert_eq!(
///     script,
///     r#"window.paywall.acceptEvent({"event_name":"template_variables","variables":{}});"#
/// );
/// ```
pub fn accept_event_script(entry_point: &str, event: &OutboundEvent) -> errors::Result<String> {
    let json = encode_outbound(event)?;
    Ok(format!("{entry_point}({json});"))
}

/// Extract the JSON payload from a script built by [`accept_event_script`].
///
/// Surfaces and test doubles use this to read back what the core injected.
pub fn parse_accept_event_script<T>(entry_point: &str, script: &str) -> Option<T>
where
    T: for<'de> Deserialize<'de>,
{
    let json = script
        .strip_prefix(entry_point)?
        .strip_prefix('(')?
        .strip_suffix(");")?;
    serde_json::from_str(json).ok()
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use url::Url;

    use super::*;
    use crate::types::Substitutions;

    #[test]
    fn decodes_spec_envelope() {
        let raw = br#"{"version":1,"payload":{"events":[{"event_name":"close"},{"event_name":"open_url","url":"https://example.com/faq"}]}}"#;

        let envelope = decode(raw).unwrap();

        assert_eq!(envelope.version, EnvelopeVersion(1));
        assert_eq!(
            envelope.events(),
            [
                ProtocolEvent::Close,
                ProtocolEvent::OpenUrl {
                    url: Url::parse("https://example.com/faq").unwrap()
                }
            ]
        );
    }

    #[test]
    fn unknown_event_does_not_fail_batch() {
        let raw = json!({
            "version": 1,
            "payload": { "events": [{ "event_name": "sparkle" }, { "event_name": "close" }] }
        })
        .to_string();

        let envelope = decode(raw.as_bytes()).unwrap();

        assert_eq!(envelope.events().len(), 2);
        assert!(envelope.events()[0].is_ignored());
        assert_eq!(envelope.events()[1], ProtocolEvent::Close);
    }

    #[test]
    fn malformed_event_fails_whole_batch_by_default() {
        let raw = json!({
            "version": 1,
            "payload": { "events": [{ "event_name": "close" }, { "event_name": "open_url" }] }
        })
        .to_string();

        let err = decode(raw.as_bytes()).unwrap_err();
        assert!(matches!(err, DecodeError::MalformedEvent { .. }));
    }

    #[test]
    fn per_event_policy_isolates_malformed_event() {
        let raw = json!({
            "version": 1,
            "payload": {
                "events": [
                    { "event_name": "open_deep_link", "url": 42 },
                    { "event_name": "close" }
                ]
            }
        })
        .to_string();

        let envelope = EventCodec::new(DecodePolicy::PerEvent)
            .decode_str(&raw)
            .unwrap();

        assert_eq!(envelope.events(), [ProtocolEvent::Close]);
    }

    #[test]
    fn malformed_envelope() {
        for raw in [
            "not json",
            r#"{"payload":{"events":[]}}"#,
            r#"{"version":1,"payload":{}}"#,
            r#"{"version":"1","payload":{"events":[]}}"#,
        ] {
            let err = decode(raw.as_bytes()).unwrap_err();
            assert!(
                matches!(err, DecodeError::MalformedEnvelope(_)),
                "expected malformed envelope for {raw}"
            );
        }
    }

    #[test]
    fn version_round_trips() {
        let raw = r#"{"version":9,"payload":{"events":[{"event_name":"ready"}]}}"#;

        let envelope = decode(raw.as_bytes()).unwrap();

        assert_eq!(envelope.version, EnvelopeVersion(9));
        assert_eq!(encode_envelope(&envelope).unwrap(), raw);
    }

    #[test]
    fn substitutions_survive_injection() {
        let substitutions = Substitutions::from_iter([("price", "$9.99")]);
        let script = accept_event_script(
            DEFAULT_ACCEPT_EVENT_ENTRY_POINT,
            &OutboundEvent::substitutions(&substitutions),
        )
        .unwrap();

        let received: OutboundEvent =
            parse_accept_event_script(DEFAULT_ACCEPT_EVENT_ENTRY_POINT, &script).unwrap();

        match received {
            OutboundEvent::TemplateSubstitutions { substitutions } => {
                assert_eq!(AnyJson::Object(substitutions), json!({ "price": "$9.99" }));
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }
}
