//! Bridge protocol events exchanged with the embedded paywall surface.
//!
//! Inbound messages are envelopes of the form
//! `{"version": 1, "payload": {"events": [{"event_name": "close"}, ...]}}`.
//! Each event is a discriminated union tagged by `event_name`. Outbound payloads are single
//! [`OutboundEvent`]s handed to the surface's entry point.

use serde::{Deserialize, Serialize, ser::SerializeMap};
use url::Url;

use crate::{
    errors::DecodeError,
    types::{AnyJson, EnvelopeVersion, Record, Substitutions, Variables},
};

/// Discriminator field of every bridge event.
pub const EVENT_NAME_FIELD: &str = "event_name";

/// A single inbound event emitted by the embedded surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolEvent {
    /// The surface finished loading and its script bridge is live.
    Ready,
    /// The user dismissed the paywall from within the content.
    Close,
    /// Open a web link in an in-app browser.
    OpenUrl { url: Url },
    /// Hand an app deep link to the host.
    OpenDeepLink { url: Url },
    /// Restore previous purchases.
    Restore,
    /// An event this build does not understand. Carried so it can be logged, never dispatched.
    Ignored { event_name: String },
}

#[derive(Deserialize)]
struct LinkPayload {
    url: Url,
}

impl ProtocolEvent {
    /// Decode one event by reading its discriminator first.
    ///
    /// Unknown discriminators produce [`ProtocolEvent::Ignored`]. A known discriminator with a
    /// payload that fails to parse is a [`DecodeError::MalformedEvent`].
    pub fn from_value(value: AnyJson) -> Result<Self, DecodeError> {
        let event_name = match value.get(EVENT_NAME_FIELD).and_then(AnyJson::as_str) {
            Some(name) => name.to_owned(),
            None => {
                return Err(DecodeError::MalformedEvent {
                    event_name: String::new(),
                    source: serde::de::Error::missing_field(EVENT_NAME_FIELD),
                });
            }
        };

        let link = |value: AnyJson| {
            serde_json::from_value::<LinkPayload>(value)
                .map(|p| p.url)
                .map_err(|source| DecodeError::MalformedEvent {
                    event_name: event_name.clone(),
                    source,
                })
        };

        let event = match event_name.as_str() {
            "ready" => ProtocolEvent::Ready,
            "close" => ProtocolEvent::Close,
            "restore" => ProtocolEvent::Restore,
            "open_url" => ProtocolEvent::OpenUrl { url: link(value)? },
            "open_deep_link" => ProtocolEvent::OpenDeepLink { url: link(value)? },
            _ => ProtocolEvent::Ignored {
                event_name: event_name.clone(),
            },
        };

        Ok(event)
    }

    /// The wire discriminator of this event.
    pub fn event_name(&self) -> &str {
        match self {
            ProtocolEvent::Ready => "ready",
            ProtocolEvent::Close => "close",
            ProtocolEvent::OpenUrl { .. } => "open_url",
            ProtocolEvent::OpenDeepLink { .. } => "open_deep_link",
            ProtocolEvent::Restore => "restore",
            ProtocolEvent::Ignored { event_name } => event_name,
        }
    }

    pub fn is_ignored(&self) -> bool {
        matches!(self, ProtocolEvent::Ignored { .. })
    }
}

impl Serialize for ProtocolEvent {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let url = match self {
            ProtocolEvent::OpenUrl { url } | ProtocolEvent::OpenDeepLink { url } => Some(url),
            _ => None,
        };

        let mut map = serializer.serialize_map(Some(1 + url.is_some() as usize))?;
        map.serialize_entry(EVENT_NAME_FIELD, self.event_name())?;
        if let Some(url) = url {
            map.serialize_entry("url", url)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ProtocolEvent {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = AnyJson::deserialize(deserializer)?;
        ProtocolEvent::from_value(value).map_err(serde::de::Error::custom)
    }
}

/// Inbound bridge message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Envelope {
    pub version: EnvelopeVersion,
    pub payload: EnvelopePayload,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EnvelopePayload {
    pub events: Vec<ProtocolEvent>,
}

impl Envelope {
    /// Wrap events in an envelope of the current version.
    pub fn new(events: impl IntoIterator<Item = ProtocolEvent>) -> Self {
        Envelope {
            version: EnvelopeVersion::CURRENT,
            payload: EnvelopePayload {
                events: events.into_iter().collect(),
            },
        }
    }

    pub fn events(&self) -> &[ProtocolEvent] {
        &self.payload.events
    }

    pub fn into_events(self) -> Vec<ProtocolEvent> {
        self.payload.events
    }
}

/// A payload pushed into the surface after it reports ready.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_name", rename_all = "snake_case")]
pub enum OutboundEvent {
    TemplateSubstitutions { substitutions: Record },
    TemplateVariables { variables: Variables },
}

impl OutboundEvent {
    pub fn substitutions(substitutions: &Substitutions) -> Self {
        OutboundEvent::TemplateSubstitutions {
            substitutions: substitutions.to_record(),
        }
    }

    pub fn variables(variables: Variables) -> Self {
        OutboundEvent::TemplateVariables { variables }
    }
}
