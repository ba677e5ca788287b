//! Process-wide convenience handle for hosts that want a single global paywall.
//!
//! Everything else in the crate takes an explicit [`Paywall`]. Replacing the shared paywall
//! starts a fresh session; handles obtained earlier keep pointing at the old one.

use std::sync::OnceLock;

use parking_lot::RwLock;

use crate::{errors::ConfigurationError, paywall::Paywall};

static SHARED: OnceLock<RwLock<Option<Paywall>>> = OnceLock::new();

fn slot() -> &'static RwLock<Option<Paywall>> {
    SHARED.get_or_init(|| RwLock::new(None))
}

/// Install `paywall` as the shared paywall, returning the previous one.
pub fn configure_shared(paywall: Paywall) -> Option<Paywall> {
    slot().write().replace(paywall)
}

/// The shared paywall.
pub fn shared() -> Result<Paywall, ConfigurationError> {
    slot().read().clone().ok_or(ConfigurationError::NotConfigured)
}

/// Remove the shared paywall.
pub fn reset_shared() -> Option<Paywall> {
    slot().write().take()
}
