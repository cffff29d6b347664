use std::{rc::Rc, sync::Arc};

use crate::TransportError;

/// Response to a single HTTP GET.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    /// HTTP status code.
    pub status: u16,

    /// Response body.
    pub body: String,
}

impl FetchResponse {
    /// Constructs a response.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Returns true if the status code is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Blocking HTTP transport used to download IP range feeds.
///
/// Implementations make a single attempt per call; timeouts are the implementation's concern and
/// are reported as a [`TransportError`] like any other failure.
pub trait HttpFetcher {
    /// Performs a GET request against `url`.
    fn fetch(&self, url: &str) -> Result<FetchResponse, TransportError>;
}

impl<T: HttpFetcher + ?Sized> HttpFetcher for &T {
    fn fetch(&self, url: &str) -> Result<FetchResponse, TransportError> {
        (**self).fetch(url)
    }
}

impl<T: HttpFetcher + ?Sized> HttpFetcher for Box<T> {
    fn fetch(&self, url: &str) -> Result<FetchResponse, TransportError> {
        (**self).fetch(url)
    }
}

impl<T: HttpFetcher + ?Sized> HttpFetcher for Rc<T> {
    fn fetch(&self, url: &str) -> Result<FetchResponse, TransportError> {
        (**self).fetch(url)
    }
}

impl<T: HttpFetcher + ?Sized> HttpFetcher for Arc<T> {
    fn fetch(&self, url: &str) -> Result<FetchResponse, TransportError> {
        (**self).fetch(url)
    }
}

#[cfg(feature = "__reqwest")]
pub use self::reqwest_fetcher::ReqwestFetcher;

#[cfg(feature = "__reqwest")]
mod reqwest_fetcher {
    use reqwest::blocking::Client;

    use super::*;
    use crate::HttpConfig;

    /// [`HttpFetcher`] backed by a blocking `reqwest` client.
    #[derive(Debug, Clone)]
    pub struct ReqwestFetcher {
        client: Client,
    }

    impl ReqwestFetcher {
        /// Constructs a fetcher with default timeouts and user agent.
        pub fn new() -> Result<Self, TransportError> {
            Self::from_config(&HttpConfig::default())
        }

        /// Constructs a fetcher from HTTP settings.
        pub fn from_config(config: &HttpConfig) -> Result<Self, TransportError> {
            let mut builder = Client::builder()
                .timeout(config.timeout())
                .user_agent(config.user_agent());

            if let Some(timeout) = config.connect_timeout() {
                builder = builder.connect_timeout(timeout);
            }

            let client = builder.build().map_err(TransportError::new)?;

            Ok(Self { client })
        }

        /// Wraps an existing client.
        pub fn with_client(client: Client) -> Self {
            Self { client }
        }
    }

    impl HttpFetcher for ReqwestFetcher {
        fn fetch(&self, url: &str) -> Result<FetchResponse, TransportError> {
            tracing::debug!(url, "sending request");
            let res = self.client.get(url).send().map_err(TransportError::new)?;

            let status = res.status().as_u16();
            let body = res.text().map_err(TransportError::new)?;
            tracing::debug!(url, status, len = body.len(), "received response");

            Ok(FetchResponse { status, body })
        }
    }
}
