use std::time::Duration;

use bon::Builder;
use webpaywall_core::codec::{DEFAULT_ACCEPT_EVENT_ENTRY_POINT, DecodePolicy};

/// Offset applied to the surface while it loads off-screen, in points.
pub const DEFAULT_HIDDEN_OFFSET: f32 = 48.0;

/// Duration of the reveal animation once content is ready.
pub const DEFAULT_REVEAL_DURATION: Duration = Duration::from_millis(300);

/// Settings for a [`Paywall`](crate::paywall::Paywall) session.
///
/// ```
/// use std::time::Duration;
/// use webpaywall::config::PaywallSettings;
///
/// let settings = PaywallSettings::builder()
///     .user_id("user-42")
///     .api_key("pk_live_123")
///     .fetch_timeout(Duration::from_secs(10))
///     .build();
///
/// assert_eq!(settings.user_id.as_deref(), Some("user-42"));
/// assert_eq!(settings.accept_event_entry_point, "window.paywall.acceptEvent");
/// ```
#[derive(Builder, Debug, Clone)]
pub struct PaywallSettings {
    /// User the configuration is fetched for.
    #[builder(into)]
    pub user_id: Option<String>,
    /// Key sent to the configuration service.
    #[builder(into)]
    pub api_key: Option<String>,
    /// Upper bound on the configuration fetch. Unbounded when unset.
    pub fetch_timeout: Option<Duration>,
    #[builder(default = DEFAULT_REVEAL_DURATION)]
    pub reveal_duration: Duration,
    #[builder(default = DEFAULT_HIDDEN_OFFSET)]
    pub hidden_offset: f32,
    /// How a malformed event affects the rest of its bridge message.
    #[builder(default)]
    pub decode_policy: DecodePolicy,
    /// Panic on wiring mistakes instead of returning them. Defaults to on in debug builds.
    #[builder(default = cfg!(debug_assertions))]
    pub abort_on_misconfiguration: bool,
    /// Global function inside the surface that receives outbound payloads.
    #[builder(default = DEFAULT_ACCEPT_EVENT_ENTRY_POINT.to_string(), into)]
    pub accept_event_entry_point: String,
}

impl Default for PaywallSettings {
    fn default() -> Self {
        PaywallSettings::builder().build()
    }
}
