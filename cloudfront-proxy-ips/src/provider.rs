use crate::{
    feed::{self, RangeFeed},
    Config, HttpFetcher, ProviderError,
};

/// IP ranges gathered by a provider along with the per-endpoint errors encountered.
#[derive(Debug, Default)]
pub struct ProxyIpReport {
    /// IP addresses and CIDR prefixes, in endpoint order. Not deduplicated.
    pub ranges: Vec<String>,

    /// One entry per failed endpoint, in endpoint order.
    pub errors: Vec<ProviderError>,
}

impl ProxyIpReport {
    /// Returns true if no endpoint failed.
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }
}

/// A source of IP ranges belonging to a proxy or CDN network.
///
/// Clients whose peer address falls in these ranges can have their forwarded-for headers trusted.
pub trait ProxyIpProvider {
    /// Human-readable provider name.
    fn name(&self) -> &str;

    /// Gathers proxy IP ranges.
    ///
    /// Never fails outright: each endpoint failure is appended to `errors` and the remaining
    /// endpoints are still queried. When `config` is given it replaces the provider's own
    /// configuration for this call.
    fn proxy_ips(&self, errors: &mut Vec<ProviderError>, config: Option<&Config>) -> Vec<String>;

    /// Gathers proxy IP ranges, returning them together with any errors.
    fn fetch_ranges(&self, config: Option<&Config>) -> ProxyIpReport {
        let mut errors = Vec::new();
        let ranges = self.proxy_ips(&mut errors, config);
        ProxyIpReport { ranges, errors }
    }
}

/// Provider of CloudFront edge IP ranges.
///
/// Queries the configured endpoints one at a time and concatenates the prefixes found in each.
/// Both the CloudFront tooling feed and the AWS IP ranges feed are understood.
///
/// ```no_run
/// # #[cfg(feature = "__reqwest")]
/// # fn main() -> Result<(), cloudfront_proxy_ips::TransportError> {
/// use cloudfront_proxy_ips::{CloudFrontProvider, ProxyIpProvider as _};
///
/// let provider = CloudFrontProvider::from_config(Default::default())?;
/// let report = provider.fetch_ranges(None);
///
/// for err in &report.errors {
///     eprintln!("{err}");
/// }
/// # Ok(()) }
/// # #[cfg(not(feature = "__reqwest"))]
/// # fn main() {}
/// ```
#[derive(Debug, Clone)]
pub struct CloudFrontProvider<F> {
    config: Config,
    fetcher: F,
}

impl<F> CloudFrontProvider<F> {
    /// Registry handle for this provider.
    pub const HANDLE: &'static str = "cloudfront";

    /// Display name of this provider.
    pub const NAME: &'static str = "CloudFront";

    /// Constructs a provider using `fetcher` as its HTTP transport.
    pub fn new(config: Config, fetcher: F) -> Self {
        Self { config, fetcher }
    }

    /// Returns the provider's configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }
}

#[cfg(feature = "__reqwest")]
impl CloudFrontProvider<crate::ReqwestFetcher> {
    /// Constructs a provider with a `reqwest` transport built from `config.http`.
    pub fn from_config(config: Config) -> Result<Self, crate::TransportError> {
        let fetcher = crate::ReqwestFetcher::from_config(&config.http)?;
        Ok(Self::new(config, fetcher))
    }
}

impl<F: HttpFetcher> CloudFrontProvider<F> {
    fn endpoint_ips(&self, url: &str) -> Result<Vec<String>, ProviderError> {
        let res = self
            .fetcher
            .fetch(url)
            .map_err(|source| ProviderError::Transport {
                url: url.to_owned(),
                source,
            })?;

        if !res.is_success() {
            return Err(ProviderError::Status {
                url: url.to_owned(),
                status: res.status,
            });
        }

        let doc = feed::decode(&res.body).map_err(|source| ProviderError::Decode {
            url: url.to_owned(),
            source,
        })?;

        let feed = RangeFeed::classify(doc).ok_or_else(|| ProviderError::Shape {
            url: url.to_owned(),
        })?;

        Ok(feed.into_prefixes())
    }
}

impl<F: HttpFetcher> ProxyIpProvider for CloudFrontProvider<F> {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn proxy_ips(&self, errors: &mut Vec<ProviderError>, config: Option<&Config>) -> Vec<String> {
        let config = config.unwrap_or(&self.config);
        let mut ranges = Vec::new();

        for url in config.endpoints.resolve() {
            match self.endpoint_ips(url) {
                Ok(ips) => {
                    tracing::debug!(url, count = ips.len(), "extracted proxy IPs");
                    ranges.extend(ips);
                }
                Err(err) => {
                    tracing::warn!(url, kind = %err.kind(), "{err}");
                    errors.push(err);
                }
            }
        }

        ranges
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::{cell::RefCell, collections::HashMap, io};

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{ErrorKind, FetchResponse, TransportError};

    const SHAPE_A: &str =
        r#"{"CLOUDFRONT_REGIONAL_EDGE_IP_LIST": {"GLOBAL": ["1.2.3.0/24","5.6.7.0/24"]}}"#;
    const SHAPE_B: &str = r#"{"prefixes":[
        {"ip_prefix":"10.0.0.0/8","service":"CLOUDFRONT"},
        {"ip_prefix":"20.0.0.0/8","service":"S3"}
    ]}"#;
    const NINES: &str = r#"{"CLOUDFRONT_REGIONAL_EDGE_IP_LIST": ["9.9.9.0/24"]}"#;

    /// Fetcher serving canned responses and recording requested URLs.
    #[derive(Debug, Default)]
    pub(crate) struct ScriptedFetcher {
        responses: HashMap<String, Result<FetchResponse, String>>,
        requested: RefCell<Vec<String>>,
    }

    impl ScriptedFetcher {
        pub(crate) fn ok(mut self, url: &str, body: &str) -> Self {
            self.responses
                .insert(url.to_owned(), Ok(FetchResponse::new(200, body)));
            self
        }

        pub(crate) fn status(mut self, url: &str, status: u16) -> Self {
            self.responses
                .insert(url.to_owned(), Ok(FetchResponse::new(status, "")));
            self
        }

        pub(crate) fn fail(mut self, url: &str, msg: &str) -> Self {
            self.responses.insert(url.to_owned(), Err(msg.to_owned()));
            self
        }

        pub(crate) fn requested(&self) -> Vec<String> {
            self.requested.borrow().clone()
        }
    }

    impl HttpFetcher for ScriptedFetcher {
        fn fetch(&self, url: &str) -> Result<FetchResponse, TransportError> {
            self.requested.borrow_mut().push(url.to_owned());

            match self.responses.get(url) {
                Some(Ok(res)) => Ok(res.clone()),
                Some(Err(msg)) => Err(TransportError::new(io::Error::other(msg.clone()))),
                None => Err(TransportError::new(io::Error::other("connection refused"))),
            }
        }
    }

    pub(crate) fn config(primary: &[&str], fallback: &str) -> Config {
        let mut config = Config::default();
        config.endpoints.primary = primary.iter().map(|&url| url.to_owned()).collect();
        config.endpoints.fallback = fallback.to_owned();
        config
    }

    #[test]
    fn identification() {
        let provider = CloudFrontProvider::new(Config::default(), ScriptedFetcher::default());
        assert_eq!(provider.name(), "CloudFront");
        assert_eq!(CloudFrontProvider::<ScriptedFetcher>::HANDLE, "cloudfront");
    }

    #[test]
    fn primary_endpoints_skip_fallback() {
        let fetcher = ScriptedFetcher::default()
            .ok("https://a.example", SHAPE_A)
            .ok("https://b.example", SHAPE_B)
            .ok("https://fallback.example", NINES);
        let provider = CloudFrontProvider::new(
            config(&["https://a.example", "https://b.example"], "https://fallback.example"),
            &fetcher,
        );

        let report = provider.fetch_ranges(None);

        assert!(report.is_complete());
        assert_eq!(report.ranges, ["1.2.3.0/24", "5.6.7.0/24", "10.0.0.0/8"]);
        assert_eq!(fetcher.requested(), ["https://a.example", "https://b.example"]);
    }

    #[test]
    fn empty_primary_uses_only_fallback() {
        let fetcher = ScriptedFetcher::default().ok("https://fallback.example", SHAPE_B);
        let provider = CloudFrontProvider::new(config(&[], "https://fallback.example"), &fetcher);

        let report = provider.fetch_ranges(None);

        assert!(report.is_complete());
        assert_eq!(report.ranges, ["10.0.0.0/8"]);
        assert_eq!(fetcher.requested(), ["https://fallback.example"]);
    }

    #[test]
    fn invalid_json_is_recorded() {
        let fetcher = ScriptedFetcher::default().ok("https://a.example", "<html>oops</html>");
        let provider = CloudFrontProvider::new(config(&["https://a.example"], ""), &fetcher);

        let mut errors = Vec::new();
        let ranges = provider.proxy_ips(&mut errors, None);

        assert!(ranges.is_empty());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind(), ErrorKind::Decode);
        assert_eq!(errors[0].endpoint(), "https://a.example");
    }

    #[test]
    fn one_failure_one_success_in_either_order() {
        let orders = [
            ["https://bad.example", "https://good.example"],
            ["https://good.example", "https://bad.example"],
        ];

        for order in orders {
            let fetcher = ScriptedFetcher::default()
                .fail("https://bad.example", "timed out")
                .ok("https://good.example", NINES);
            let provider = CloudFrontProvider::new(config(&order, ""), &fetcher);

            let report = provider.fetch_ranges(None);

            assert_eq!(report.ranges, ["9.9.9.0/24"]);
            assert_eq!(report.errors.len(), 1);
            assert_eq!(report.errors[0].kind(), ErrorKind::Transport);
            assert_eq!(
                report.errors[0].to_string(),
                "Failed to send the HTTP request to https://bad.example: timed out",
            );
        }
    }

    #[test]
    fn every_failure_kind_is_collected() {
        let fetcher = ScriptedFetcher::default()
            .status("https://status.example", 503)
            .ok("https://array.example", "[]")
            .ok("https://shape.example", r#"{"result": {}}"#)
            .ok("https://good.example", SHAPE_A);
        let provider = CloudFrontProvider::new(
            config(
                &[
                    "https://down.example",
                    "https://status.example",
                    "https://array.example",
                    "https://shape.example",
                    "https://good.example",
                ],
                "",
            ),
            &fetcher,
        );

        let report = provider.fetch_ranges(None);

        assert_eq!(report.ranges, ["1.2.3.0/24", "5.6.7.0/24"]);

        let kinds = report.errors.iter().map(ProviderError::kind).collect::<Vec<_>>();
        assert_eq!(
            kinds,
            [
                ErrorKind::Transport,
                ErrorKind::Transport,
                ErrorKind::Decode,
                ErrorKind::Shape,
            ],
        );
        assert!(matches!(
            report.errors[1],
            ProviderError::Status { status: 503, .. }
        ));
        assert_eq!(
            report.errors[3].to_string(),
            "Failed to extract IPs from the response of https://shape.example",
        );
    }

    #[test]
    fn all_endpoints_failing_yields_empty_result() {
        let provider = CloudFrontProvider::new(
            config(&["https://a.example", "https://b.example"], ""),
            ScriptedFetcher::default(),
        );

        let report = provider.fetch_ranges(None);

        assert!(report.ranges.is_empty());
        assert_eq!(report.errors.len(), 2);
    }

    #[test]
    fn duplicates_are_kept() {
        let fetcher = ScriptedFetcher::default()
            .ok("https://a.example", NINES)
            .ok("https://b.example", NINES);
        let provider = CloudFrontProvider::new(
            config(&["https://a.example", "https://b.example"], ""),
            &fetcher,
        );

        assert_eq!(provider.fetch_ranges(None).ranges, ["9.9.9.0/24", "9.9.9.0/24"]);
    }

    #[test]
    fn repeated_calls_are_identical() {
        let fetcher = ScriptedFetcher::default()
            .ok("https://a.example", SHAPE_A)
            .ok("https://b.example", SHAPE_B);
        let provider = CloudFrontProvider::new(
            config(&["https://a.example", "https://b.example"], ""),
            &fetcher,
        );

        let first = provider.fetch_ranges(None);
        let second = provider.fetch_ranges(None);

        assert_eq!(first.ranges, second.ranges);
        assert_eq!(provider.config().endpoints.primary.len(), 2);
    }

    #[test]
    fn per_call_config_overrides() {
        let fetcher = ScriptedFetcher::default()
            .ok("https://a.example", SHAPE_A)
            .ok("https://override.example", NINES);
        let provider = CloudFrontProvider::new(config(&["https://a.example"], ""), &fetcher);

        let report = provider.fetch_ranges(Some(&config(&[], "https://override.example")));

        assert_eq!(report.ranges, ["9.9.9.0/24"]);
        assert_eq!(fetcher.requested(), ["https://override.example"]);
    }

    #[test]
    fn errors_are_appended() {
        let provider = CloudFrontProvider::new(
            config(&["https://a.example"], ""),
            ScriptedFetcher::default(),
        );

        let mut errors = vec![ProviderError::Shape {
            url: "https://earlier.example".to_owned(),
        }];
        provider.proxy_ips(&mut errors, None);

        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].endpoint(), "https://earlier.example");
        assert_eq!(errors[1].endpoint(), "https://a.example");
    }
}
