//! Webpaywall core library.
//!
//! Wire protocol, configuration model and codec shared by everything that talks to an
//! embedded paywall surface:
//!
//! - [`types`]: the fetched [`Configuration`](types::Configuration), presentation outcomes and
//!   common aliases.
//! - [`events`]: inbound [`ProtocolEvent`](events::ProtocolEvent)s, their
//!   [`Envelope`](events::Envelope), and outbound payloads.
//! - [`codec`]: decoding and encoding of bridge messages.
//! - [`errors`]: decode and network error types.

pub mod codec;
pub mod errors;
pub mod events;
pub mod types;
