//! Delegate-facing results of a paywall presentation.
//!
//! Outcomes are the internal vocabulary between event routing and the host delegate. They
//! never carry wire-format details, so the protocol can evolve without touching delegates.

use std::fmt::Display;

use url::Url;

/// Result of a protocol event or a host-initiated action, handed to the delegate-facing layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresentationOutcome {
    /// The user closed the paywall.
    Closed,
    /// A checkout was requested for the given product.
    InitiatePurchase(String),
    /// The user asked to restore previous purchases.
    InitiateRestore,
    /// The content asked to open a web link.
    OpenedUrl(Url),
    /// The content asked to open an app deep link.
    OpenedDeepLink(Url),
}

impl PresentationOutcome {
    /// Short, stable name for logs and analytics.
    pub fn kind(&self) -> &'static str {
        match self {
            PresentationOutcome::Closed => "closed",
            PresentationOutcome::InitiatePurchase(_) => "initiate_purchase",
            PresentationOutcome::InitiateRestore => "initiate_restore",
            PresentationOutcome::OpenedUrl(_) => "opened_url",
            PresentationOutcome::OpenedDeepLink(_) => "opened_deep_link",
        }
    }

    /// Whether handling this outcome requires a registered delegate.
    pub fn requires_delegate(&self) -> bool {
        !matches!(self, PresentationOutcome::Closed)
    }
}

impl Display for PresentationOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PresentationOutcome::InitiatePurchase(product_id) => {
                write!(f, "{}({})", self.kind(), product_id)
            }
            PresentationOutcome::OpenedUrl(url) | PresentationOutcome::OpenedDeepLink(url) => {
                write!(f, "{}({})", self.kind(), url)
            }
            _ => write!(f, "{}", self.kind()),
        }
    }
}

/// How a checkout initiated through the delegate ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutOutcome {
    PurchaseCompleted,
    CheckoutAbandoned,
    ErrorOccurred(String),
}

impl CheckoutOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, CheckoutOutcome::PurchaseCompleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_display_includes_argument() {
        let purchase = PresentationOutcome::InitiatePurchase("pro_annual".to_string());
        assert_eq!(purchase.to_string(), "initiate_purchase(pro_annual)");

        let url = Url::parse("https://example.com/terms").unwrap();
        assert_eq!(
            PresentationOutcome::OpenedUrl(url).to_string(),
            "opened_url(https://example.com/terms)"
        );

        assert_eq!(PresentationOutcome::Closed.to_string(), "closed");
    }

    #[test]
    fn only_close_is_handled_without_delegate() {
        assert!(!PresentationOutcome::Closed.requires_delegate());
        assert!(PresentationOutcome::InitiateRestore.requires_delegate());
    }
}
