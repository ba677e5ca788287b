//! Presentation state machine.
//!
//! ```text
//! Detached ──attach──► Attaching ──ready──► Loaded ──present──► Presenting ──► Presented
//!                                              ▲                                   │
//!                                              │                                dismiss
//!                                   Dismissed ◄┴──────────── Dismissing ◄──────────┘
//! ```
//!
//! The controller only commits transitions. Every call into the surface or the host is handed
//! back to the caller ([`HiddenLoad`], [`Reveal`], [`HostPresentation`]) and made after the
//! controller lock is released, so surfaces, hosts and delegates may re-enter the paywall.
//! `Presenting` and `Dismissing` double as the re-entrancy guards.

use std::{sync::Arc, time::Duration};

use url::Url;
use webpaywall_core::{
    codec::accept_event_script,
    events::OutboundEvent,
    types::{ColorToken, Configuration, PresentationStyle, Variables},
};

use crate::{config::PaywallSettings, errors::ConfigurationError, surface::ContentSurface};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentationState {
    /// No surface yet; waiting on configuration.
    Detached,
    /// Surface created and loading invisibly.
    Attaching,
    /// Content reported ready, was populated and revealed.
    Loaded,
    Presenting,
    Presented,
    Dismissing,
    /// Dismissed; can be presented again.
    Dismissed,
}

/// What a presentation request resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentStep {
    /// Already presented or in the middle of presenting; nothing to do.
    AlreadyPresented,
    /// Content is not loaded yet; the request is remembered and replayed on `ready`.
    Deferred,
    /// The controller moved to `Presenting`; finish with
    /// [`PresentationController::finish_present`].
    Proceed,
}

/// Off-screen setup of a freshly attached surface.
#[must_use = "the surface is not loaded until `run` is called"]
pub struct HiddenLoad {
    surface: Arc<dyn ContentSurface>,
    hidden_offset: f32,
    content_url: Url,
}

impl HiddenLoad {
    pub fn run(self) {
        self.surface.set_opacity(0.0);
        self.surface.set_offset(self.hidden_offset);
        self.surface.attach_hidden();
        self.surface.load(&self.content_url);
    }
}

/// Template injection and reveal once the content is ready.
#[must_use = "the surface is not revealed until `run` is called"]
pub struct Reveal {
    surface: Arc<dyn ContentSurface>,
    scripts: Vec<String>,
    duration: Duration,
    replay_present: bool,
}

impl Reveal {
    /// Inject the template payloads in order, then reveal.
    ///
    /// Returns whether a presentation requested before `ready` should now be replayed.
    pub fn run(self) -> bool {
        for script in &self.scripts {
            self.surface.evaluate_script(script);
        }
        self.surface.reveal(self.duration);
        self.replay_present
    }
}

/// What the host is asked to present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPresentation {
    pub style: PresentationStyle,
    pub background: ColorToken,
}

pub struct PresentationController {
    state: PresentationState,
    surface: Option<Arc<dyn ContentSurface>>,
    configuration: Option<Arc<Configuration>>,
    present_requested: bool,
    hidden_offset: f32,
    reveal_duration: Duration,
    entry_point: String,
}

impl PresentationController {
    pub fn new(settings: &PaywallSettings) -> Self {
        PresentationController {
            state: PresentationState::Detached,
            surface: None,
            configuration: None,
            present_requested: false,
            hidden_offset: settings.hidden_offset,
            reveal_duration: settings.reveal_duration,
            entry_point: settings.accept_event_entry_point.clone(),
        }
    }

    pub fn state(&self) -> PresentationState {
        self.state
    }

    pub fn is_being_presented(&self) -> bool {
        matches!(
            self.state,
            PresentationState::Presenting | PresentationState::Presented
        )
    }

    pub fn has_surface(&self) -> bool {
        self.surface.is_some()
    }

    /// Adopt `surface` for `configuration` and move to `Attaching`.
    ///
    /// Only valid while detached; returns `None` otherwise.
    pub fn attach(
        &mut self,
        surface: Arc<dyn ContentSurface>,
        configuration: Arc<Configuration>,
    ) -> Option<HiddenLoad> {
        if self.state != PresentationState::Detached {
            return None;
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "Paywall surface attached: content_url='{}'",
            configuration.content_url
        );

        let load = HiddenLoad {
            surface: surface.clone(),
            hidden_offset: self.hidden_offset,
            content_url: configuration.content_url.clone(),
        };
        self.surface = Some(surface);
        self.configuration = Some(configuration);
        self.state = PresentationState::Attaching;
        Some(load)
    }

    /// Handle the content's `ready` event and move to `Loaded`.
    ///
    /// The returned [`Reveal`] pushes template substitutions, then template variables, then
    /// reveals the surface. Repeated `ready` events yield `None`.
    pub fn on_ready(
        &mut self,
        variables: &Variables,
    ) -> Result<Option<Reveal>, ConfigurationError> {
        if self.state != PresentationState::Attaching {
            #[cfg(feature = "tracing")]
            tracing::debug!("Ignoring ready event in state {:?}", self.state);
            return Ok(None);
        }

        let configuration = self
            .configuration
            .clone()
            .ok_or(ConfigurationError::MissingConfiguration)?;
        let surface = self
            .surface
            .clone()
            .ok_or(ConfigurationError::MissingSurface)?;

        let payloads = [
            OutboundEvent::substitutions(&configuration.substitutions),
            OutboundEvent::variables(variables.clone()),
        ];
        let mut scripts = Vec::with_capacity(payloads.len());
        for payload in &payloads {
            match accept_event_script(&self.entry_point, payload) {
                Ok(script) => scripts.push(script),
                Err(err) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!("Failed to encode template payload: {err}; skipping");
                    #[cfg(not(feature = "tracing"))]
                    let _ = err;
                }
            }
        }

        self.state = PresentationState::Loaded;
        Ok(Some(Reveal {
            surface,
            scripts,
            duration: self.reveal_duration,
            replay_present: std::mem::take(&mut self.present_requested),
        }))
    }

    /// Classify a presentation request and, when it can go ahead, enter `Presenting`.
    ///
    /// Check and transition happen under one borrow, so of two racing requests only one gets
    /// [`PresentStep::Proceed`]. A failed precondition leaves the state untouched.
    pub fn request_present(
        &mut self,
        host_can_present: bool,
    ) -> Result<PresentStep, ConfigurationError> {
        match self.state {
            PresentationState::Presenting
            | PresentationState::Presented
            | PresentationState::Dismissing => Ok(PresentStep::AlreadyPresented),
            PresentationState::Detached | PresentationState::Attaching => {
                self.present_requested = true;
                Ok(PresentStep::Deferred)
            }
            PresentationState::Loaded | PresentationState::Dismissed => {
                if !host_can_present {
                    return Err(ConfigurationError::MissingPresentationTarget);
                }
                if self.surface.is_none() {
                    return Err(ConfigurationError::MissingSurface);
                }
                if self.configuration.is_none() {
                    return Err(ConfigurationError::MissingConfiguration);
                }
                self.state = PresentationState::Presenting;
                Ok(PresentStep::Proceed)
            }
        }
    }

    /// Enter `Presented`, returning what the host should show. `None` if presentation was not
    /// begun.
    pub fn finish_present(&mut self) -> Option<HostPresentation> {
        if self.state != PresentationState::Presenting {
            return None;
        }
        let configuration = self.configuration.as_ref()?;
        self.state = PresentationState::Presented;
        Some(HostPresentation {
            style: configuration.presentation_style,
            background: configuration.background_color.clone(),
        })
    }

    /// Enter `Dismissing` if presented. Returns `false` when there is nothing to dismiss.
    pub fn begin_dismiss(&mut self) -> bool {
        if self.state != PresentationState::Presented {
            return false;
        }
        self.state = PresentationState::Dismissing;
        true
    }

    /// Enter `Dismissed`. The caller then asks the host to dismiss.
    pub fn finish_dismiss(&mut self) -> bool {
        if self.state != PresentationState::Dismissing {
            return false;
        }
        self.state = PresentationState::Dismissed;
        true
    }
}

impl std::fmt::Debug for PresentationController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PresentationController")
            .field("state", &self.state)
            .field("has_surface", &self.surface.is_some())
            .field("present_requested", &self.present_requested)
            .finish()
    }
}
