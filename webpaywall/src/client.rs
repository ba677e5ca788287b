//! HTTP configuration client.

use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use url::Url;
use webpaywall_core::{errors::NetworkError, types::Configuration};

use crate::service::{ConfigRequest, ConfigService};

/// Default path, relative to the base URL, of the configuration endpoint.
pub const DEFAULT_CONFIG_PATH: &str = "paywall";

/// A remote configuration service reached over HTTP.
///
/// Issues `GET {base_url}/{path}?user_id=...`, authenticating with the session's API key as a
/// bearer token when one is set.
#[derive(Debug, Clone)]
pub struct RemoteConfigService {
    pub base_url: Url,
    pub path: String,
    pub client: reqwest::Client,
    pub headers: HeaderMap,
}

impl RemoteConfigService {
    pub fn from_url(base_url: Url) -> Self {
        RemoteConfigService {
            base_url,
            path: DEFAULT_CONFIG_PATH.to_string(),
            client: reqwest::Client::new(),
            headers: HeaderMap::new(),
        }
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn header(mut self, key: &HeaderName, value: &HeaderValue) -> Self {
        self.headers.insert(key, value.to_owned());
        self
    }

    /// The URL fetched for `request`.
    pub fn endpoint(&self, request: &ConfigRequest) -> Result<Url, url::ParseError> {
        let mut url = self.base_url.join(&self.path)?;
        if let Some(user_id) = &request.user_id {
            url.query_pairs_mut().append_pair("user_id", user_id);
        }
        Ok(url)
    }
}

/// Map a response status to the error it implies, if any.
pub fn check_status(status: StatusCode) -> Result<(), NetworkError> {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(NetworkError::Unauthorized),
        status if status.is_success() => Ok(()),
        status => Err(NetworkError::Status(status.as_u16())),
    }
}

/// Parse a configuration response body.
pub fn parse_configuration(body: &[u8]) -> Result<Configuration, NetworkError> {
    serde_json::from_slice(body).map_err(|err| NetworkError::InvalidResponse(err.to_string()))
}

impl ConfigService for RemoteConfigService {
    async fn fetch(&self, request: ConfigRequest) -> Result<Configuration, NetworkError> {
        let url = self
            .endpoint(&request)
            .map_err(|err| NetworkError::Transport(format!("invalid endpoint: {err}")))?;

        let mut builder = self.client.get(url).headers(self.headers.clone());
        if let Some(api_key) = &request.api_key {
            builder = builder.bearer_auth(api_key);
        }

        let response = builder
            .send()
            .await
            .map_err(|err| NetworkError::Transport(err.to_string()))?;
        check_status(response.status())?;

        let body = response
            .bytes()
            .await
            .map_err(|err| NetworkError::Transport(err.to_string()))?;

        #[cfg(feature = "tracing")]
        tracing::debug!("Fetched paywall configuration: {} bytes", body.len());

        parse_configuration(&body)
    }
}
