#![allow(dead_code)]

use std::{sync::Arc, time::Duration};

use parking_lot::Mutex;
use serde_json::json;
use url::Url;
use url_macro::url;
use webpaywall::{
    config::PaywallSettings,
    delegate::{CheckoutReply, PaywallDelegate, RestoreReply},
    errors::PresentationError,
    paywall::Paywall,
    service::{ConfigRequest, ConfigService},
    surface::{ContentSurface, HostPresenter},
};
use webpaywall_core::{
    errors::NetworkError,
    types::{ColorToken, Configuration, PresentationStyle, Substitutions},
};

pub type Journal = Arc<Mutex<Vec<String>>>;

pub fn entries(journal: &Journal) -> Vec<String> {
    journal.lock().clone()
}

pub fn count(journal: &Journal, entry: &str) -> usize {
    journal.lock().iter().filter(|e| e.as_str() == entry).count()
}

pub fn position(journal: &Journal, entry: &str) -> Option<usize> {
    journal.lock().iter().position(|e| e.starts_with(entry))
}

pub struct MockSurface {
    journal: Journal,
    scripts: Arc<Mutex<Vec<String>>>,
}

impl ContentSurface for MockSurface {
    fn load(&self, url: &Url) {
        self.journal.lock().push(format!("surface.load {url}"));
    }

    fn set_opacity(&self, opacity: f32) {
        self.journal.lock().push(format!("surface.opacity {opacity}"));
    }

    fn set_offset(&self, offset: f32) {
        self.journal.lock().push(format!("surface.offset {offset}"));
    }

    fn attach_hidden(&self) {
        self.journal.lock().push("surface.attach_hidden".to_string());
    }

    fn reveal(&self, _duration: Duration) {
        self.journal.lock().push("surface.reveal".to_string());
    }

    fn evaluate_script(&self, script: &str) {
        self.journal.lock().push("surface.script".to_string());
        self.scripts.lock().push(script.to_string());
    }
}

pub struct MockHost {
    journal: Journal,
    can_present: bool,
}

impl HostPresenter for MockHost {
    fn can_present(&self) -> bool {
        self.can_present
    }

    fn present(&self, style: PresentationStyle, background: &ColorToken) {
        self.journal
            .lock()
            .push(format!("host.present {style:?} {background}"));
    }

    fn dismiss(&self) {
        self.journal.lock().push("host.dismiss".to_string());
    }

    fn open_in_app_browser(&self, url: &Url) {
        self.journal.lock().push(format!("host.browser {url}"));
    }
}

#[derive(Debug, Clone)]
pub enum CheckoutAnswer {
    Complete,
    Abandon,
    Fail(&'static str),
    /// Keep the reply so the test can answer it later.
    Hold,
}

pub struct MockDelegate {
    journal: Journal,
    pub checkout: CheckoutAnswer,
    pub restore: bool,
    pub held: Mutex<Option<CheckoutReply>>,
}

impl MockDelegate {
    pub fn new(journal: Journal) -> Self {
        MockDelegate {
            journal,
            checkout: CheckoutAnswer::Complete,
            restore: true,
            held: Mutex::new(None),
        }
    }

    pub fn checkout(mut self, answer: CheckoutAnswer) -> Self {
        self.checkout = answer;
        self
    }

    pub fn restore(mut self, succeeded: bool) -> Self {
        self.restore = succeeded;
        self
    }

    fn note(&self, entry: impl Into<String>) {
        self.journal.lock().push(entry.into());
    }
}

impl PaywallDelegate for MockDelegate {
    fn initiate_checkout(&self, product_id: &str, reply: CheckoutReply) {
        self.note(format!("delegate.checkout {product_id}"));
        match &self.checkout {
            CheckoutAnswer::Complete => reply.purchase_completed(),
            CheckoutAnswer::Abandon => reply.checkout_abandoned(),
            CheckoutAnswer::Fail(reason) => reply.error_occurred(reason),
            CheckoutAnswer::Hold => *self.held.lock() = Some(reply),
        }
    }

    fn initiate_restore(&self, reply: RestoreReply) {
        self.note("delegate.restore");
        reply.restore_finished(self.restore);
    }

    fn will_present(&self) {
        self.note("delegate.will_present");
    }

    fn did_present(&self) {
        self.note("delegate.did_present");
    }

    fn will_dismiss(&self) {
        self.note("delegate.will_dismiss");
    }

    fn did_dismiss(&self) {
        self.note("delegate.did_dismiss");
    }

    fn will_open_url(&self, url: &Url) {
        self.note(format!("delegate.will_open_url {url}"));
    }

    fn will_open_deep_link(&self, url: &Url) {
        self.note(format!("delegate.will_open_deep_link {url}"));
    }

    fn presentation_failed(&self, error: &PresentationError) {
        self.note(format!("delegate.presentation_failed {error}"));
    }
}

pub struct Harness {
    pub paywall: Paywall,
    pub journal: Journal,
    pub scripts: Arc<Mutex<Vec<String>>>,
}

impl Harness {
    pub fn new() -> Self {
        Harness::with(
            PaywallSettings::builder()
                .abort_on_misconfiguration(false)
                .build(),
            true,
        )
    }

    pub fn with(settings: PaywallSettings, can_present: bool) -> Self {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();

        let journal: Journal = Arc::default();
        let scripts: Arc<Mutex<Vec<String>>> = Arc::default();

        let surface_journal = journal.clone();
        let surface_scripts = scripts.clone();
        let paywall = Paywall::configure(
            move |_: &Configuration| -> Box<dyn ContentSurface> {
                Box::new(MockSurface {
                    journal: surface_journal.clone(),
                    scripts: surface_scripts.clone(),
                })
            },
            MockHost {
                journal: journal.clone(),
                can_present,
            },
            settings,
        );

        Harness {
            paywall,
            journal,
            scripts,
        }
    }

    /// Register a delegate writing to the shared journal.
    pub fn delegate(&self, build: impl FnOnce(MockDelegate) -> MockDelegate) -> Arc<MockDelegate> {
        let delegate = Arc::new(build(MockDelegate::new(self.journal.clone())));
        self.paywall.set_delegate(delegate.clone());
        delegate
    }

    /// Complete the fetch and deliver `ready`, leaving the paywall loaded but not presented.
    pub fn load_and_ready(&self) {
        self.paywall.complete_fetch(Ok(configuration()));
        self.paywall.on_message(&envelope(json!([{ "event_name": "ready" }])));
    }

    /// Load, ready and present.
    pub fn presented(&self) {
        self.load_and_ready();
        self.paywall.present().unwrap();
    }

    /// Load, ready and present, then unregister the delegate.
    pub fn presented_without_delegate(&self) {
        let delegate = self.delegate(|d| d);
        self.presented();
        self.paywall.clear_delegate();
        drop(delegate);
    }

    pub fn count(&self, entry: &str) -> usize {
        count(&self.journal, entry)
    }
}

pub fn configuration() -> Configuration {
    Configuration::builder()
        .content_url(url!("https://x/p"))
        .substitutions(Substitutions::from_iter([("price", "$9.99")]))
        .presentation_style(PresentationStyle::Modal)
        .background_color("#FFFFFF")
        .build()
}

pub fn envelope(events: serde_json::Value) -> String {
    json!({ "version": 1, "payload": { "events": events } }).to_string()
}

/// Configuration service answering after a delay.
pub struct DelayedService {
    pub delay: Duration,
    pub result: Result<Configuration, NetworkError>,
    pub requests: Mutex<Vec<ConfigRequest>>,
}

impl DelayedService {
    pub fn ok(delay: Duration) -> Self {
        DelayedService {
            delay,
            result: Ok(configuration()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(delay: Duration, err: NetworkError) -> Self {
        DelayedService {
            delay,
            result: Err(err),
            requests: Mutex::new(Vec::new()),
        }
    }
}

impl ConfigService for DelayedService {
    async fn fetch(&self, request: ConfigRequest) -> Result<Configuration, NetworkError> {
        self.requests.lock().push(request);
        tokio::time::sleep(self.delay).await;
        self.result.clone()
    }
}
