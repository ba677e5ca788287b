use webpaywall_core::{errors::NetworkError, types::Configuration};

/// Identity sent along with a configuration fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigRequest {
    pub user_id: Option<String>,
    pub api_key: Option<String>,
}

/// Source of paywall configuration.
///
/// A single request/response; retries, if any, are the implementation's concern.
pub trait ConfigService {
    fn fetch(
        &self,
        request: ConfigRequest,
    ) -> impl Future<Output = Result<Configuration, NetworkError>>;
}
