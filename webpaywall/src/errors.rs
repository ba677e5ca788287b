use webpaywall_core::errors::NetworkError;

/// A programmer mistake in how the paywall was wired into the host.
///
/// These are fatal when [`PaywallSettings::abort_on_misconfiguration`] is set, which is the
/// default in debug builds.
///
/// [`PaywallSettings::abort_on_misconfiguration`]: crate::config::PaywallSettings::abort_on_misconfiguration
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("no paywall delegate is registered")]
    MissingDelegate,

    #[error("the host has no view to present the paywall onto")]
    MissingPresentationTarget,

    #[error("no content surface is attached")]
    MissingSurface,

    #[error("the paywall configuration has not been fetched")]
    MissingConfiguration,

    #[error("the shared paywall has not been configured")]
    NotConfigured,
}

/// Why a presentation request could not be fulfilled.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PresentationError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// The configuration fetch failed, so there is nothing to present.
    #[error("paywall configuration could not be loaded: {0}")]
    Fetch(#[from] NetworkError),
}

/// Failure while waiting on a [`ReadinessGate`](crate::gate::ReadinessGate).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GateError {
    #[error("timed out waiting for readiness")]
    TimedOut,

    #[error("readiness signal closed before the gate opened")]
    Closed,
}
