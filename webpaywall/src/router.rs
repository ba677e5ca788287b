//! Routing of decoded bridge events and presentation outcomes.
//!
//! Each [`ProtocolEvent`] is first translated into a [`Route`], then its side effects are
//! dispatched. Outcome dispatch is exposed on its own so host-initiated actions (such as a
//! checkout started outside the content) share the same path.

use webpaywall_core::{errors::DecodeError, events::ProtocolEvent, types::PresentationOutcome};

use crate::{errors::ConfigurationError, paywall::Paywall};

/// Where a protocol event goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Internal to the presentation controller; never seen by the delegate.
    SurfaceReady,
    Outcome(PresentationOutcome),
    /// Unknown event, dropped.
    Drop(String),
}

impl From<ProtocolEvent> for Route {
    fn from(event: ProtocolEvent) -> Self {
        match event {
            ProtocolEvent::Ready => Route::SurfaceReady,
            ProtocolEvent::Close => Route::Outcome(PresentationOutcome::Closed),
            ProtocolEvent::OpenUrl { url } => Route::Outcome(PresentationOutcome::OpenedUrl(url)),
            ProtocolEvent::OpenDeepLink { url } => {
                Route::Outcome(PresentationOutcome::OpenedDeepLink(url))
            }
            ProtocolEvent::Restore => Route::Outcome(PresentationOutcome::InitiateRestore),
            ProtocolEvent::Ignored { event_name } => Route::Drop(event_name),
        }
    }
}

/// Dispatches events and outcomes for one [`Paywall`].
#[derive(Debug, Clone, Copy)]
pub struct EventRouter<'pw> {
    paywall: &'pw Paywall,
}

impl<'pw> EventRouter<'pw> {
    pub fn new(paywall: &'pw Paywall) -> Self {
        EventRouter { paywall }
    }

    /// Decode a bridge message and route its events in order.
    ///
    /// Returns the outcomes produced. On a decode error nothing is dispatched.
    pub fn route_message(&self, raw: &[u8]) -> Result<Vec<PresentationOutcome>, DecodeError> {
        let envelope = self.paywall.codec().decode(raw)?;
        Ok(self.route_events(envelope.into_events()))
    }

    /// Route events in order, synchronously.
    ///
    /// A wiring mistake in one event is logged and does not stop the rest of the batch.
    pub fn route_events(
        &self,
        events: impl IntoIterator<Item = ProtocolEvent>,
    ) -> Vec<PresentationOutcome> {
        events
            .into_iter()
            .filter_map(|event| self.route(event).ok().flatten())
            .collect()
    }

    /// Route a single event, returning the outcome it produced if any.
    pub fn route(
        &self,
        event: ProtocolEvent,
    ) -> Result<Option<PresentationOutcome>, ConfigurationError> {
        match Route::from(event) {
            Route::SurfaceReady => {
                self.paywall.surface_ready();
                Ok(None)
            }
            Route::Outcome(outcome) => {
                self.dispatch(outcome.clone())?;
                Ok(Some(outcome))
            }
            Route::Drop(_event_name) => {
                #[cfg(feature = "tracing")]
                tracing::debug!("Ignoring unknown bridge event '{_event_name}'");
                Ok(None)
            }
        }
    }

    /// Carry out the side effects of `outcome`.
    ///
    /// Every outcome except [`PresentationOutcome::Closed`] needs a registered delegate.
    pub fn dispatch(&self, outcome: PresentationOutcome) -> Result<(), ConfigurationError> {
        #[cfg(feature = "tracing")]
        tracing::debug!("Dispatching paywall outcome {outcome}");

        if !outcome.requires_delegate() {
            self.paywall.dismiss();
            return Ok(());
        }

        let delegate = self
            .paywall
            .delegate()
            .ok_or_else(|| self.paywall.misconfigured(ConfigurationError::MissingDelegate))?;

        match outcome {
            PresentationOutcome::Closed => {}
            PresentationOutcome::InitiatePurchase(product_id) => {
                let reply = self.paywall.checkout_reply(&product_id, None);
                delegate.initiate_checkout(&product_id, reply);
            }
            PresentationOutcome::InitiateRestore => {
                delegate.initiate_restore(self.paywall.restore_reply(None));
            }
            PresentationOutcome::OpenedUrl(url) => {
                delegate.will_open_url(&url);
                self.paywall.open_in_app_browser(&url);
            }
            PresentationOutcome::OpenedDeepLink(url) => {
                delegate.will_open_deep_link(&url);
            }
        }
        Ok(())
    }
}
