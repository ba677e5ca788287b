//! Host-side collaborators: the embedded content surface and the view that presents it.
//!
//! The paywall never holds an internal lock while calling into these traits. A surface may
//! therefore deliver bridge messages synchronously, for example from `load` when the content is
//! cached, and a host may query the paywall from any of its callbacks. Implementations keep their
//! own state behind interior mutability.

use std::time::Duration;

use url::Url;
use webpaywall_core::types::{ColorToken, Configuration, PresentationStyle};

/// The embedded view hosting paywall content and its message bridge.
///
/// Bridge messages coming out of the surface are fed to
/// [`Paywall::on_message`](crate::paywall::Paywall::on_message).
pub trait ContentSurface: Send + Sync {
    /// Start loading `url`. Completion is reported by the content itself with a `ready` event.
    fn load(&self, url: &Url);

    fn set_opacity(&self, opacity: f32);

    /// Vertical offset from the resting position, in points.
    fn set_offset(&self, offset: f32);

    /// Insert the surface into the host hierarchy. It stays invisible until revealed.
    fn attach_hidden(&self);

    /// Animate to full opacity and zero offset.
    fn reveal(&self, duration: Duration);

    /// Run `script` inside the loaded content.
    fn evaluate_script(&self, script: &str);
}

/// Builds a surface for a fetched configuration.
pub trait SurfaceFactory: Send + Sync {
    fn create_surface(&self, configuration: &Configuration) -> Box<dyn ContentSurface>;
}

impl<F> SurfaceFactory for F
where
    F: Fn(&Configuration) -> Box<dyn ContentSurface> + Send + Sync,
{
    fn create_surface(&self, configuration: &Configuration) -> Box<dyn ContentSurface> {
        self(configuration)
    }
}

/// Host UI wiring: transitions, the view presented onto, and the in-app browser.
pub trait HostPresenter: Send + Sync {
    /// Whether a view to present onto can currently be resolved.
    fn can_present(&self) -> bool;

    fn present(&self, style: PresentationStyle, background: &ColorToken);

    fn dismiss(&self);

    fn open_in_app_browser(&self, url: &Url);
}
