//! The host application's side of purchase and restore.
//!
//! A single [`PaywallDelegate`] is registered per paywall; registering another replaces it.
//! Purchases and restores are answered through one-shot reply handles, so each initiation
//! resolves exactly once.

use std::{fmt::Display, sync::Arc};

use parking_lot::RwLock;
use url::Url;
use webpaywall_core::types::CheckoutOutcome;

use crate::errors::{ConfigurationError, PresentationError};

/// Host-supplied handler for purchase/restore decisions and lifecycle notifications.
///
/// Only [`initiate_checkout`](PaywallDelegate::initiate_checkout) and
/// [`initiate_restore`](PaywallDelegate::initiate_restore) are required; every notification hook
/// defaults to a no-op.
pub trait PaywallDelegate: Send + Sync {
    /// Start a checkout for `product_id` and answer through `reply`.
    fn initiate_checkout(&self, product_id: &str, reply: CheckoutReply);

    /// Restore previous purchases and answer through `reply`.
    fn initiate_restore(&self, reply: RestoreReply);

    fn will_present(&self) {}

    fn did_present(&self) {}

    fn will_dismiss(&self) {}

    fn did_dismiss(&self) {}

    fn will_open_url(&self, _url: &Url) {}

    fn will_open_deep_link(&self, _url: &Url) {}

    /// A queued presentation could not go ahead, e.g. because the configuration fetch failed.
    fn presentation_failed(&self, _error: &PresentationError) {}
}

/// Holds the registered delegate. Last writer wins.
#[derive(Default)]
pub struct DelegateBridge {
    slot: RwLock<Option<Arc<dyn PaywallDelegate>>>,
}

impl DelegateBridge {
    /// Register `delegate`, returning the one it replaced.
    pub fn set(&self, delegate: Arc<dyn PaywallDelegate>) -> Option<Arc<dyn PaywallDelegate>> {
        self.slot.write().replace(delegate)
    }

    pub fn clear(&self) -> Option<Arc<dyn PaywallDelegate>> {
        self.slot.write().take()
    }

    pub fn get(&self) -> Option<Arc<dyn PaywallDelegate>> {
        self.slot.read().clone()
    }

    pub fn is_set(&self) -> bool {
        self.slot.read().is_some()
    }

    pub fn require(&self) -> Result<Arc<dyn PaywallDelegate>, ConfigurationError> {
        self.get().ok_or(ConfigurationError::MissingDelegate)
    }
}

impl std::fmt::Debug for DelegateBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DelegateBridge")
            .field("registered", &self.is_set())
            .finish()
    }
}

type Resolve<T> = Box<dyn FnOnce(T) + Send + 'static>;

/// Answer to a single checkout.
///
/// Consumed by exactly one of [`purchase_completed`](CheckoutReply::purchase_completed),
/// [`checkout_abandoned`](CheckoutReply::checkout_abandoned) or
/// [`error_occurred`](CheckoutReply::error_occurred). Dropping it unanswered counts as abandoned.
#[must_use = "a checkout must be answered; dropping the reply abandons it"]
pub struct CheckoutReply {
    product_id: String,
    resolve: Option<Resolve<CheckoutOutcome>>,
}

impl CheckoutReply {
    pub fn new(
        product_id: impl Into<String>,
        resolve: impl FnOnce(CheckoutOutcome) + Send + 'static,
    ) -> Self {
        CheckoutReply {
            product_id: product_id.into(),
            resolve: Some(Box::new(resolve)),
        }
    }

    pub fn product_id(&self) -> &str {
        &self.product_id
    }

    /// The purchase went through. The paywall dismisses itself.
    pub fn purchase_completed(self) {
        self.finish(CheckoutOutcome::PurchaseCompleted);
    }

    pub fn checkout_abandoned(self) {
        self.finish(CheckoutOutcome::CheckoutAbandoned);
    }

    pub fn error_occurred(self, error: impl Display) {
        self.finish(CheckoutOutcome::ErrorOccurred(error.to_string()));
    }

    fn finish(mut self, outcome: CheckoutOutcome) {
        if let Some(resolve) = self.resolve.take() {
            resolve(outcome);
        }
    }
}

impl Drop for CheckoutReply {
    fn drop(&mut self) {
        if let Some(resolve) = self.resolve.take() {
            #[cfg(feature = "tracing")]
            tracing::warn!(
                "Checkout reply for '{}' dropped without an answer; treating as abandoned",
                self.product_id
            );
            resolve(CheckoutOutcome::CheckoutAbandoned);
        }
    }
}

impl std::fmt::Debug for CheckoutReply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutReply")
            .field("product_id", &self.product_id)
            .field("answered", &self.resolve.is_none())
            .finish()
    }
}

/// Answer to a single restore. Dropping it unanswered counts as a failed restore.
#[must_use = "a restore must be answered; dropping the reply reports failure"]
pub struct RestoreReply {
    resolve: Option<Resolve<bool>>,
}

impl RestoreReply {
    pub fn new(resolve: impl FnOnce(bool) + Send + 'static) -> Self {
        RestoreReply {
            resolve: Some(Box::new(resolve)),
        }
    }

    /// Report whether anything was restored. On `true` the paywall dismisses itself.
    pub fn restore_finished(mut self, succeeded: bool) {
        if let Some(resolve) = self.resolve.take() {
            resolve(succeeded);
        }
    }
}

impl Drop for RestoreReply {
    fn drop(&mut self) {
        if let Some(resolve) = self.resolve.take() {
            #[cfg(feature = "tracing")]
            tracing::warn!("Restore reply dropped without an answer; treating as failed");
            resolve(false);
        }
    }
}

impl std::fmt::Debug for RestoreReply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestoreReply")
            .field("answered", &self.resolve.is_none())
            .finish()
    }
}
