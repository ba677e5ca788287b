use std::{io::BufRead, sync::Arc, time::Duration};

use url::Url;
use webpaywall::{
    client::RemoteConfigService,
    config::PaywallSettings,
    delegate::{CheckoutReply, PaywallDelegate, RestoreReply},
    errors::PresentationError,
    paywall::Paywall,
    surface::{ContentSurface, HostPresenter},
};
use webpaywall_core::types::{ColorToken, Configuration, PresentationStyle};

/// Prints what a web view would do.
struct ConsoleSurface;

impl ContentSurface for ConsoleSurface {
    fn load(&self, url: &Url) {
        tracing::info!("surface: loading {url}");
    }

    fn set_opacity(&self, _opacity: f32) {}

    fn set_offset(&self, _offset: f32) {}

    fn attach_hidden(&self) {
        tracing::info!("surface: attached off-screen");
    }

    fn reveal(&self, duration: Duration) {
        tracing::info!("surface: revealing over {duration:?}");
    }

    fn evaluate_script(&self, script: &str) {
        tracing::info!("surface: {script}");
    }
}

struct ConsoleHost;

impl HostPresenter for ConsoleHost {
    fn can_present(&self) -> bool {
        true
    }

    fn present(&self, style: PresentationStyle, background: &ColorToken) {
        tracing::info!("host: presenting as {style:?} on {background}");
    }

    fn dismiss(&self) {
        tracing::info!("host: dismissed");
    }

    fn open_in_app_browser(&self, url: &Url) {
        tracing::info!("host: opening {url} in the in-app browser");
    }
}

/// Approves every purchase and finds nothing to restore.
struct ApproveAll;

impl PaywallDelegate for ApproveAll {
    fn initiate_checkout(&self, product_id: &str, reply: CheckoutReply) {
        tracing::info!("store: buying {product_id}");
        reply.purchase_completed();
    }

    fn initiate_restore(&self, reply: RestoreReply) {
        reply.restore_finished(false);
    }

    fn presentation_failed(&self, error: &PresentationError) {
        tracing::error!("store: paywall unavailable: {error}");
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let api_url = std::env::var("PAYWALL_API_URL")
        .expect("Please set `PAYWALL_API_URL` in environment variables");
    let api_url = Url::parse(&api_url).expect("PAYWALL_API_URL must be a valid URL");
    let api_key = std::env::var("PAYWALL_API_KEY").ok();

    let paywall = Paywall::configure(
        |_: &Configuration| -> Box<dyn ContentSurface> { Box::new(ConsoleSurface) },
        ConsoleHost,
        PaywallSettings::builder()
            .user_id("console-user")
            .maybe_api_key(api_key)
            .fetch_timeout(Duration::from_secs(10))
            .build(),
    );
    paywall.set_delegate(Arc::new(ApproveAll));
    paywall.present().expect("paywall is wired");

    tracing::info!("Fetching paywall configuration from {api_url}");
    if let Err(err) = paywall.load(&RemoteConfigService::from_url(api_url)).await {
        tracing::error!("Configuration fetch failed: {err}");
        return;
    }

    tracing::info!("Paste bridge messages, one per line, e.g.");
    tracing::info!(r#"{{"version":1,"payload":{{"events":[{{"event_name":"ready"}}]}}}}"#);
    for line in std::io::stdin().lock().lines() {
        let Ok(line) = line else { break };
        paywall.on_message(&line);
        tracing::info!("state: {:?}", paywall.state());
    }
}
