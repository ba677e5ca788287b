mod common;

use std::{
    fmt::Display,
    sync::{Arc, Barrier, OnceLock, mpsc},
    thread,
    time::Duration,
};

use common::{Harness, Journal, MockDelegate, configuration, envelope};
use serde_json::json;
use url::Url;
use webpaywall::{
    config::PaywallSettings,
    controller::PresentationState,
    delegate::{CheckoutReply, PaywallDelegate, RestoreReply},
    paywall::Paywall,
    surface::{ContentSurface, HostPresenter},
};
use webpaywall_core::types::{ColorToken, Configuration, PresentationStyle};

type Slot = Arc<OnceLock<Paywall>>;

/// Surface with cached content: it reports `ready` from inside `load`.
struct CachedSurface {
    paywall: Slot,
    journal: Journal,
}

impl ContentSurface for CachedSurface {
    fn load(&self, url: &Url) {
        self.journal.lock().push(format!("surface.load {url}"));
        if let Some(paywall) = self.paywall.get() {
            paywall.on_message(&envelope(json!([{ "event_name": "ready" }])));
        }
    }

    fn set_opacity(&self, _opacity: f32) {}

    fn set_offset(&self, _offset: f32) {}

    fn attach_hidden(&self) {}

    fn reveal(&self, _duration: Duration) {
        self.journal.lock().push("surface.reveal".to_string());
    }

    fn evaluate_script(&self, _script: &str) {}
}

/// Host that reads the paywall state back from inside each callback.
struct InspectingHost {
    paywall: Slot,
    journal: Journal,
}

impl InspectingHost {
    fn note(&self, call: impl Display) {
        let state = self.paywall.get().map(Paywall::state);
        self.journal.lock().push(format!("{call} {state:?}"));
    }
}

impl HostPresenter for InspectingHost {
    fn can_present(&self) -> bool {
        true
    }

    fn present(&self, _style: PresentationStyle, _background: &ColorToken) {
        self.note("host.present");
    }

    fn dismiss(&self) {
        self.note("host.dismiss");
    }

    fn open_in_app_browser(&self, url: &Url) {
        self.note(format!("host.browser {url}"));
    }
}

fn cached_paywall() -> (Paywall, Journal) {
    let journal = Journal::default();
    let slot = Slot::default();

    let surface_slot = slot.clone();
    let surface_journal = journal.clone();
    let paywall = Paywall::configure(
        move |_: &Configuration| -> Box<dyn ContentSurface> {
            Box::new(CachedSurface {
                paywall: surface_slot.clone(),
                journal: surface_journal.clone(),
            })
        },
        InspectingHost {
            paywall: slot.clone(),
            journal: journal.clone(),
        },
        PaywallSettings::builder()
            .abort_on_misconfiguration(false)
            .build(),
    );
    let _ = slot.set(paywall.clone());
    paywall.set_delegate(Arc::new(MockDelegate::new(journal.clone())));

    (paywall, journal)
}

#[test]
fn surface_may_report_ready_from_load() {
    let (paywall, journal) = cached_paywall();
    paywall.present().unwrap();

    let (done, finished) = mpsc::channel();
    let worker = paywall.clone();
    thread::spawn(move || {
        worker.complete_fetch(Ok(configuration()));
        let _ = done.send(());
    });
    finished
        .recv_timeout(Duration::from_secs(3))
        .expect("fetch completion blocked inside surface load");

    assert_eq!(paywall.state(), PresentationState::Presented);
    assert_eq!(
        common::entries(&journal),
        [
            "surface.load https://x/p",
            "surface.reveal",
            "delegate.will_present",
            "host.present Some(Presented)",
            "delegate.did_present",
        ]
    );
}

#[test]
fn host_may_read_paywall_from_callbacks() {
    let (paywall, journal) = cached_paywall();
    paywall.complete_fetch(Ok(configuration()));
    assert_eq!(paywall.state(), PresentationState::Loaded);

    paywall.present().unwrap();
    assert!(paywall.dismiss());
    paywall.on_message(&envelope(json!([
        { "event_name": "open_url", "url": "https://example.com/terms" },
    ])));

    let host_calls: Vec<_> = common::entries(&journal)
        .into_iter()
        .filter(|e| e.starts_with("host."))
        .collect();
    assert_eq!(
        host_calls,
        [
            "host.present Some(Presented)",
            "host.dismiss Some(Dismissed)",
            "host.browser https://example.com/terms Some(Dismissed)",
        ]
    );
}

/// Delegate that asks for the paywall again while it is being presented.
struct PresentingAgain {
    paywall: Slot,
    journal: Journal,
}

impl PaywallDelegate for PresentingAgain {
    fn initiate_checkout(&self, _product_id: &str, reply: CheckoutReply) {
        reply.checkout_abandoned();
    }

    fn initiate_restore(&self, reply: RestoreReply) {
        reply.restore_finished(false);
    }

    fn will_present(&self) {
        self.journal.lock().push("delegate.will_present".to_string());
        if let Some(paywall) = self.paywall.get() {
            paywall.present().unwrap();
        }
    }
}

#[test]
fn present_from_will_present_is_a_no_op() {
    let h = Harness::new();
    let slot = Slot::default();
    h.paywall.set_delegate(Arc::new(PresentingAgain {
        paywall: slot.clone(),
        journal: h.journal.clone(),
    }));
    let _ = slot.set(h.paywall.clone());

    h.presented();

    assert_eq!(h.paywall.state(), PresentationState::Presented);
    assert_eq!(h.count("delegate.will_present"), 1);
    assert_eq!(h.count("host.present Modal #FFFFFF"), 1);

    h.paywall.clear_delegate();
}

#[test]
fn racing_presents_show_once() {
    for _ in 0..200 {
        let h = Harness::new();
        h.delegate(|d| d);
        h.load_and_ready();

        let barrier = Arc::new(Barrier::new(2));
        let racers: Vec<_> = (0..2)
            .map(|_| {
                let paywall = h.paywall.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    paywall.present()
                })
            })
            .collect();
        for racer in racers {
            racer.join().unwrap().unwrap();
        }

        assert_eq!(h.paywall.state(), PresentationState::Presented);
        assert_eq!(h.count("delegate.will_present"), 1);
        assert_eq!(h.count("host.present Modal #FFFFFF"), 1);
    }
}
