//! # Webpaywall
//!
//! Session lifecycle and event protocol for a remotely configured paywall shown in an embedded
//! web surface.
//!
//! This crate provides [`Paywall`](paywall::Paywall), which fetches the paywall configuration,
//! loads the content off-screen, exchanges events with it over the message bridge, and routes
//! purchase and restore intents to a host-supplied [`PaywallDelegate`](delegate::PaywallDelegate).
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use url_macro::url;
//! use webpaywall::{client::RemoteConfigService, config::PaywallSettings, paywall::Paywall};
//!
//! let paywall = Paywall::configure(
//!     |config: &Configuration| -> Box<dyn ContentSurface> { Box::new(MyWebView::new(config)) },
//!     MyHostPresenter::default(),
//!     PaywallSettings::builder().user_id("user-42").api_key("pk_live_123").build(),
//! );
//! paywall.set_delegate(Arc::new(MyStoreDelegate::default()));
//!
//! // Safe to call right away: presentation waits for the configuration and the content.
//! paywall.present()?;
//!
//! paywall
//!     .load(&RemoteConfigService::from_url(url!("https://api.example.com/v1/")))
//!     .await?;
//!
//! // From the web view's script message handler:
//! paywall.on_message(&message_body);
//! ```
//!
//! ## Modules
//!
//! - [`paywall`]: The [`Paywall`](paywall::Paywall) context and its lifecycle.
//! - [`gate`]: [`ReadinessGate`](gate::ReadinessGate), the one-shot broadcast gating presentation.
//! - [`session`]: Fetched configuration and loaded/attached flags.
//! - [`controller`]: The attach → load → present → dismiss state machine.
//! - [`router`]: Translation of bridge events into outcomes and their dispatch.
//! - [`delegate`]: The host's purchase/restore contract and reply handles.
//! - [`surface`]: Traits for the embedded surface and the host view.
//! - [`service`]: The configuration source; [`client`] holds the HTTP implementation.
//! - [`shared`]: An optional process-wide handle.
//!
//! ## Error Handling
//!
//! - Wiring mistakes ([`ConfigurationError`](errors::ConfigurationError)) panic when
//!   [`abort_on_misconfiguration`](config::PaywallSettings::abort_on_misconfiguration) is set
//!   (the default in debug builds), and are returned otherwise.
//! - Malformed bridge messages are logged and dropped.
//! - A failed configuration fetch still completes the session; queued presentations fail fast
//!   through [`PaywallDelegate::presentation_failed`](delegate::PaywallDelegate::presentation_failed).
//! - Checkout errors reported by the delegate are logged only.

#[cfg(feature = "config-client")]
pub mod client;
pub mod config;
pub mod controller;
pub mod delegate;
pub mod errors;
pub mod gate;
pub mod paywall;
pub mod router;
pub mod service;
pub mod session;
pub mod shared;
pub mod surface;

pub use webpaywall_core as core;
