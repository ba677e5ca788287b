//! In-memory session state for one configured paywall.

use std::sync::Arc;

use parking_lot::Mutex;
use webpaywall_core::{
    errors::NetworkError,
    types::{Configuration, Variables},
};

use crate::{gate::ReadinessGate, service::ConfigRequest};

/// What the readiness gate broadcasts when the configuration fetch completes.
pub type Readiness = Result<Arc<Configuration>, NetworkError>;

/// Snapshot of a session.
///
/// `loaded` flips to `true` exactly once, when the fetch completes. After a successful fetch
/// `configuration` is set; after a failed one it stays `None` and `fetch_error` is set.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub user_id: Option<String>,
    pub api_key: Option<String>,
    pub configuration: Option<Arc<Configuration>>,
    pub fetch_error: Option<NetworkError>,
    pub loaded: bool,
    pub surface_attached: bool,
    /// Host-supplied template variables, pushed to the surface alongside substitutions.
    pub variables: Variables,
}

impl SessionState {
    /// The readiness outcome, once loaded.
    pub fn readiness(&self) -> Option<Readiness> {
        if !self.loaded {
            return None;
        }
        match (&self.configuration, &self.fetch_error) {
            (Some(configuration), _) => Some(Ok(configuration.clone())),
            (None, Some(err)) => Some(Err(err.clone())),
            (None, None) => None,
        }
    }
}

/// Session state plus the readiness gate released by the configuration fetch.
pub struct Session {
    state: Mutex<SessionState>,
    gate: ReadinessGate<Readiness>,
}

impl Session {
    pub fn new(user_id: Option<String>, api_key: Option<String>) -> Self {
        Session {
            state: Mutex::new(SessionState {
                user_id,
                api_key,
                ..SessionState::default()
            }),
            gate: ReadinessGate::new(),
        }
    }

    pub fn snapshot(&self) -> SessionState {
        self.state.lock().clone()
    }

    pub fn request(&self) -> ConfigRequest {
        let state = self.state.lock();
        ConfigRequest {
            user_id: state.user_id.clone(),
            api_key: state.api_key.clone(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.state.lock().loaded
    }

    pub fn configuration(&self) -> Option<Arc<Configuration>> {
        self.state.lock().configuration.clone()
    }

    pub fn readiness(&self) -> Option<Readiness> {
        self.state.lock().readiness()
    }

    pub fn variables(&self) -> Variables {
        self.state.lock().variables.clone()
    }

    pub fn set_variables(&self, variables: Variables) {
        self.state.lock().variables = variables;
    }

    pub(crate) fn mark_surface_attached(&self) {
        self.state.lock().surface_attached = true;
    }

    pub fn gate(&self) -> &ReadinessGate<Readiness> {
        &self.gate
    }

    /// Record the fetch result and open the readiness gate.
    ///
    /// Only the first completion counts; later calls return `false` and change nothing.
    pub fn complete_fetch(&self, result: Result<Configuration, NetworkError>) -> bool {
        let readiness = {
            let mut state = self.state.lock();
            if state.loaded {
                #[cfg(feature = "tracing")]
                tracing::warn!("Configuration fetch completed twice; keeping the first result");
                return false;
            }
            state.loaded = true;
            match result {
                Ok(configuration) => {
                    let configuration = Arc::new(configuration);
                    state.configuration = Some(configuration.clone());
                    Ok(configuration)
                }
                Err(err) => {
                    state.fetch_error = Some(err.clone());
                    Err(err)
                }
            }
        };

        #[cfg(feature = "tracing")]
        match &readiness {
            Ok(configuration) => tracing::debug!(
                "Paywall configuration loaded: content_url='{}'",
                configuration.content_url
            ),
            Err(err) => tracing::warn!("Paywall configuration fetch failed: {err}"),
        }

        self.gate.open(readiness)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &*self.state.lock())
            .field("gate", &self.gate)
            .finish()
    }
}
