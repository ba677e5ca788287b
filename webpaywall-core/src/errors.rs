/// Failure to decode an inbound bridge message.
///
/// A decode failure means no events are delivered for that message.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The message is not a valid `{version, payload: {events}}` envelope.
    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(#[source] serde_json::Error),

    /// The envelope carries a version this build refuses to handle.
    ///
    /// Reserved for version negotiation; the decoder currently accepts every version.
    #[error("Unknown envelope version {0}")]
    UnknownEnvelopeVersion(i64),

    /// A recognized event carried a payload that failed to parse.
    #[error("Malformed '{event_name}' event: {source}")]
    MalformedEvent {
        event_name: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Failure to fetch the paywall configuration.
///
/// Cloneable so it can be broadcast to every caller waiting on readiness.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NetworkError {
    /// The request never produced a response.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The service rejected the credentials.
    #[error("Unauthorized")]
    Unauthorized,

    /// The service answered with a non-success status.
    #[error("Unexpected status {0}")]
    Status(u16),

    /// The response body was not a valid configuration.
    #[error("Invalid configuration response: {0}")]
    InvalidResponse(String),

    /// The fetch did not complete within the configured bound.
    #[error("Configuration fetch timed out")]
    TimedOut,
}

/// Failure to encode an envelope or an outbound payload.
#[derive(Debug, thiserror::Error)]
#[error("Failed to encode bridge payload: {0}")]
pub struct EncodeError(#[from] pub serde_json::Error);

/// Error types for webpaywall core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Network(#[from] NetworkError),
}

/// A specialized `Result` type for webpaywall core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn umbrella_keeps_inner_message() {
        let err = Error::from(NetworkError::Status(503));
        assert_eq!(err.to_string(), "Unexpected status 503");

        let err = Error::from(DecodeError::UnknownEnvelopeVersion(4));
        assert!(matches!(err, Error::Decode(_)));
        assert_eq!(err.to_string(), "Unknown envelope version 4");
    }
}
