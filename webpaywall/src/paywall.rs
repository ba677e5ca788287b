//! Host-facing paywall context.
//!
//! For details, see the [`Paywall`] struct documentation.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::oneshot;
use url::Url;
use webpaywall_core::{
    codec::EventCodec,
    errors::NetworkError,
    types::{CheckoutOutcome, Configuration, PresentationOutcome, Variables},
};

use crate::{
    config::PaywallSettings,
    controller::{PresentStep, PresentationController, PresentationState},
    delegate::{CheckoutReply, DelegateBridge, PaywallDelegate, RestoreReply},
    errors::{ConfigurationError, GateError, PresentationError},
    router::EventRouter,
    service::ConfigService,
    session::{Readiness, Session, SessionState},
    surface::{ContentSurface, HostPresenter, SurfaceFactory},
};

struct PaywallContext {
    settings: PaywallSettings,
    codec: EventCodec,
    session: Session,
    controller: Mutex<PresentationController>,
    factory: Arc<dyn SurfaceFactory>,
    host: Arc<dyn HostPresenter>,
    delegate: DelegateBridge,
}

/// A configured paywall: session state, presentation state machine and delegate, bundled
/// into one explicitly passed context.
///
/// `Paywall` is a cheap handle; clones share the same session.
///
/// ## Lifecycle
///
/// 1. **Configure** ([`configure`](Paywall::configure)): create the session. Nothing is fetched yet.
/// 2. **Load** ([`load`](Paywall::load) or [`complete_fetch`](Paywall::complete_fetch)): fetch the
///    configuration. Completion opens the readiness gate, which first attaches the surface
///    off-screen and then replays any queued [`present`](Paywall::present) calls.
/// 3. **Bridge** ([`on_message`](Paywall::on_message)): feed every message from the surface. The
///    content's `ready` event populates and reveals the surface.
/// 4. **Present / dismiss**: presentation completes only after content is ready. A `close`
///    event, a completed purchase or a successful restore dismisses it.
///
/// Delegate hooks, surface calls and host calls are made without holding any internal lock, so
/// they may call back into the paywall.
#[derive(Clone)]
pub struct Paywall {
    inner: Arc<PaywallContext>,
}

impl Paywall {
    /// Create a paywall session.
    pub fn configure(
        factory: impl SurfaceFactory + 'static,
        host: impl HostPresenter + 'static,
        settings: PaywallSettings,
    ) -> Self {
        let inner = Arc::new(PaywallContext {
            codec: EventCodec::new(settings.decode_policy),
            session: Session::new(settings.user_id.clone(), settings.api_key.clone()),
            controller: Mutex::new(PresentationController::new(&settings)),
            factory: Arc::new(factory),
            host: Arc::new(host),
            delegate: DelegateBridge::default(),
            settings,
        });

        // Registered first, so the surface is attached before any queued presentation runs.
        let weak = Arc::downgrade(&inner);
        inner.session.gate().when_ready(move |readiness| {
            if let Some(paywall) = Paywall::upgrade(&weak) {
                paywall.attach(readiness);
            }
        });

        Paywall { inner }
    }

    fn upgrade(weak: &Weak<PaywallContext>) -> Option<Paywall> {
        weak.upgrade().map(|inner| Paywall { inner })
    }

    fn downgrade(&self) -> Weak<PaywallContext> {
        Arc::downgrade(&self.inner)
    }

    pub fn settings(&self) -> &PaywallSettings {
        &self.inner.settings
    }

    pub fn session(&self) -> SessionState {
        self.inner.session.snapshot()
    }

    pub fn state(&self) -> PresentationState {
        self.inner.controller.lock().state()
    }

    pub fn is_being_presented(&self) -> bool {
        self.inner.controller.lock().is_being_presented()
    }

    /// Register the delegate, replacing any previous one.
    pub fn set_delegate(&self, delegate: Arc<dyn PaywallDelegate>) {
        self.inner.delegate.set(delegate);
    }

    pub fn clear_delegate(&self) {
        self.inner.delegate.clear();
    }

    pub fn delegate(&self) -> Option<Arc<dyn PaywallDelegate>> {
        self.inner.delegate.get()
    }

    /// Template variables pushed to the surface when it becomes ready.
    pub fn set_template_variables(&self, variables: Variables) {
        self.inner.session.set_variables(variables);
    }

    /// Fetch the configuration from `service` and complete the session with the result.
    ///
    /// Bounded by [`PaywallSettings::fetch_timeout`] when set; on expiry the session completes
    /// with [`NetworkError::TimedOut`] so waiters are never left hanging.
    pub async fn load<S: ConfigService>(&self, service: &S) -> Readiness {
        let fetch = service.fetch(self.inner.session.request());
        let result = match self.inner.settings.fetch_timeout {
            Some(limit) => tokio::time::timeout(limit, fetch)
                .await
                .unwrap_or_else(|_| Err(NetworkError::TimedOut)),
            None => fetch.await,
        };

        self.complete_fetch(result);
        self.inner
            .session
            .readiness()
            .unwrap_or(Err(NetworkError::TimedOut))
    }

    /// Complete the session with a fetch result obtained elsewhere.
    ///
    /// Must be called on the main context. Only the first call counts.
    pub fn complete_fetch(&self, result: Result<Configuration, NetworkError>) -> bool {
        self.inner.session.complete_fetch(result)
    }

    /// Wait for the configuration fetch to complete.
    pub async fn ready(&self) -> Result<Readiness, GateError> {
        self.inner.session.gate().ready().await
    }

    pub async fn ready_within(&self, limit: std::time::Duration) -> Result<Readiness, GateError> {
        self.inner.session.gate().ready_within(limit).await
    }

    fn attach(&self, readiness: &Readiness) {
        let Ok(configuration) = readiness else {
            return;
        };
        if self.state() != PresentationState::Detached {
            return;
        }

        let surface: Arc<dyn ContentSurface> =
            Arc::from(self.inner.factory.create_surface(configuration));
        let load = self
            .inner
            .controller
            .lock()
            .attach(surface, configuration.clone());
        if let Some(load) = load {
            self.inner.session.mark_surface_attached();
            load.run();
        }
    }

    /// Present the paywall.
    ///
    /// Before the configuration arrives the request is queued on the readiness gate; before the
    /// content is ready it is held until the `ready` event. Either way the caller sees a delay,
    /// not a failure. Calling this while presented is a no-op.
    ///
    /// A missing delegate or host view is reported immediately. A failed configuration fetch is
    /// reported to [`PaywallDelegate::presentation_failed`] when the queued request runs.
    pub fn present(&self) -> Result<(), PresentationError> {
        self.inner
            .delegate
            .require()
            .map_err(|err| self.misconfigured(err))?;
        if !self.inner.host.can_present() {
            return Err(self
                .misconfigured(ConfigurationError::MissingPresentationTarget)
                .into());
        }

        if let Some(readiness) = self.inner.session.gate().value() {
            return self.present_when_loaded(&readiness);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!("Paywall configuration pending; queueing presentation");

        let weak = self.downgrade();
        self.inner.session.gate().when_ready(move |readiness| {
            if let Some(paywall) = Paywall::upgrade(&weak) {
                // Failures were already logged and reported to the delegate.
                let _ = paywall.present_when_loaded(readiness);
            }
        });
        Ok(())
    }

    fn present_when_loaded(&self, readiness: &Readiness) -> Result<(), PresentationError> {
        if let Err(err) = readiness {
            let error = PresentationError::Fetch(err.clone());
            #[cfg(feature = "tracing")]
            tracing::error!("Cannot present paywall: {error}");
            if let Some(delegate) = self.inner.delegate.get() {
                delegate.presentation_failed(&error);
            }
            return Err(error);
        }
        self.run_present()
    }

    fn run_present(&self) -> Result<(), PresentationError> {
        let delegate = self
            .inner
            .delegate
            .require()
            .map_err(|err| self.misconfigured(err))?;
        let host_can_present = self.inner.host.can_present();
        let step = self
            .inner
            .controller
            .lock()
            .request_present(host_can_present);

        match step.map_err(|err| self.misconfigured(err))? {
            PresentStep::AlreadyPresented => return Ok(()),
            PresentStep::Deferred => {
                #[cfg(feature = "tracing")]
                tracing::debug!("Paywall content not ready; presentation deferred");
                return Ok(());
            }
            PresentStep::Proceed => {}
        }

        delegate.will_present();
        let presentation = self.inner.controller.lock().finish_present();
        if let Some(presentation) = presentation {
            self.inner
                .host
                .present(presentation.style, &presentation.background);
            #[cfg(feature = "tracing")]
            tracing::debug!("Paywall presented");
            delegate.did_present();
        }
        Ok(())
    }

    /// Dismiss the paywall if it is presented.
    ///
    /// Returns `false`, without notifying anyone, when there is nothing to dismiss.
    pub fn dismiss(&self) -> bool {
        if !self.inner.controller.lock().begin_dismiss() {
            return false;
        }

        let delegate = self.inner.delegate.get();
        if let Some(delegate) = &delegate {
            delegate.will_dismiss();
        }
        let dismissed = self.inner.controller.lock().finish_dismiss();
        if dismissed {
            self.inner.host.dismiss();
            #[cfg(feature = "tracing")]
            tracing::debug!("Paywall dismissed");
            if let Some(delegate) = &delegate {
                delegate.did_dismiss();
            }
        }
        dismissed
    }

    /// The content reported ready: populate and reveal it, then replay a deferred presentation.
    pub(crate) fn surface_ready(&self) {
        let variables = self.inner.session.variables();
        let ready = self.inner.controller.lock().on_ready(&variables);
        match ready {
            Ok(Some(reveal)) => {
                if reveal.run() {
                    // Failures were already logged and reported.
                    let _ = self.run_present();
                }
            }
            Ok(None) => {}
            Err(err) => {
                self.misconfigured(err);
            }
        }
    }

    pub(crate) fn open_in_app_browser(&self, url: &Url) {
        self.inner.host.open_in_app_browser(url);
    }

    /// Router over this paywall's events and outcomes.
    pub fn router(&self) -> EventRouter<'_> {
        EventRouter::new(self)
    }

    pub fn codec(&self) -> &EventCodec {
        &self.inner.codec
    }

    /// Sole ingress for bridge messages from the surface.
    ///
    /// Malformed messages are logged and dropped.
    pub fn on_message(&self, raw: &str) {
        if let Err(err) = self.router().route_message(raw.as_bytes()) {
            #[cfg(feature = "tracing")]
            tracing::warn!("Dropping bridge message: {err}");
            #[cfg(not(feature = "tracing"))]
            let _ = err;
        }
    }

    /// Start a checkout for `product_id` through the delegate.
    pub fn initiate_checkout(
        &self,
        product_id: impl Into<String>,
    ) -> Result<(), ConfigurationError> {
        self.router()
            .dispatch(PresentationOutcome::InitiatePurchase(product_id.into()))
    }

    /// Start a checkout and wait for the delegate's answer.
    pub async fn purchase(
        &self,
        product_id: impl Into<String>,
    ) -> Result<CheckoutOutcome, ConfigurationError> {
        let product_id = product_id.into();
        let delegate = self
            .inner
            .delegate
            .require()
            .map_err(|err| self.misconfigured(err))?;

        let (tx, rx) = oneshot::channel();
        delegate.initiate_checkout(&product_id, self.checkout_reply(&product_id, Some(tx)));

        Ok(rx.await.unwrap_or(CheckoutOutcome::CheckoutAbandoned))
    }

    /// Start a restore and wait for the delegate's answer.
    pub async fn restore(&self) -> Result<bool, ConfigurationError> {
        let delegate = self
            .inner
            .delegate
            .require()
            .map_err(|err| self.misconfigured(err))?;

        let (tx, rx) = oneshot::channel();
        delegate.initiate_restore(self.restore_reply(Some(tx)));

        Ok(rx.await.unwrap_or(false))
    }

    pub(crate) fn checkout_reply(
        &self,
        product_id: &str,
        notify: Option<oneshot::Sender<CheckoutOutcome>>,
    ) -> CheckoutReply {
        let weak = self.downgrade();
        CheckoutReply::new(product_id, move |outcome| {
            match &outcome {
                CheckoutOutcome::PurchaseCompleted => {
                    #[cfg(feature = "tracing")]
                    tracing::info!("Checkout completed");
                }
                CheckoutOutcome::CheckoutAbandoned => {
                    #[cfg(feature = "tracing")]
                    tracing::info!("Checkout abandoned");
                }
                CheckoutOutcome::ErrorOccurred(_reason) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!("Checkout failed: {_reason}");
                }
            }
            if outcome.is_completed() {
                if let Some(paywall) = Paywall::upgrade(&weak) {
                    paywall.dismiss();
                }
            }
            if let Some(tx) = notify {
                let _ = tx.send(outcome);
            }
        })
    }

    pub(crate) fn restore_reply(&self, notify: Option<oneshot::Sender<bool>>) -> RestoreReply {
        let weak = self.downgrade();
        RestoreReply::new(move |succeeded| {
            #[cfg(feature = "tracing")]
            tracing::info!("Restore finished: succeeded={succeeded}");
            if succeeded {
                if let Some(paywall) = Paywall::upgrade(&weak) {
                    paywall.dismiss();
                }
            }
            if let Some(tx) = notify {
                let _ = tx.send(succeeded);
            }
        })
    }

    /// Log a wiring mistake, and abort if the settings ask for it.
    pub(crate) fn misconfigured(&self, err: ConfigurationError) -> ConfigurationError {
        #[cfg(feature = "tracing")]
        tracing::error!("Paywall misconfigured: {err}");
        if self.inner.settings.abort_on_misconfiguration {
            panic!("paywall misconfigured: {err}");
        }
        err
    }
}

impl std::fmt::Debug for Paywall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Paywall")
            .field("session", &self.inner.session)
            .field("controller", &*self.inner.controller.lock())
            .field("delegate", &self.inner.delegate)
            .finish()
    }
}
