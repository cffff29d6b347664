use std::time::Duration;

use serde::Deserialize;

/// Endpoint serving the CloudFront tooling IP list.
///
/// Its feed is keyed by `CLOUDFRONT_REGIONAL_EDGE_IP_LIST`.
pub const CLOUDFRONT_TOOLS_URL: &str =
    "https://d7uri8nf7uskq.cloudfront.net/tools/list-cloudfront-ips";

/// Endpoint serving the AWS-wide IP ranges document (feed keyed by `prefixes`).
pub const AWS_IP_RANGES_URL: &str = "https://ip-ranges.amazonaws.com/ip-ranges.json";

/// Provider configuration.
///
/// Every field has a default, so an empty document deserializes to [`Config::default()`].
///
/// ```
/// # use cloudfront_proxy_ips::Config;
/// let config: Config = serde_json::from_str(r#"{
///     "endpoints": { "primary": "https://example.com/ips.json" }
/// }"#).unwrap();
///
/// assert_eq!(config.endpoints.resolve(), ["https://example.com/ips.json"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Endpoints to query.
    pub endpoints: EndpointsConfig,

    /// HTTP client settings.
    pub http: HttpConfig,
}

/// Which endpoints are queried.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EndpointsConfig {
    /// Endpoints queried in order. May be given as a single URL or a list.
    #[serde(deserialize_with = "one_or_many")]
    pub primary: Vec<String>,

    /// Endpoint queried only when `primary` is empty.
    pub fallback: String,
}

impl EndpointsConfig {
    /// Returns the endpoints to query: the primary list if it is non-empty, otherwise the fallback.
    pub fn resolve(&self) -> Vec<&str> {
        if self.primary.is_empty() {
            vec![self.fallback.as_str()]
        } else {
            self.primary.iter().map(String::as_str).collect()
        }
    }
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            primary: vec![CLOUDFRONT_TOOLS_URL.to_owned()],
            fallback: AWS_IP_RANGES_URL.to_owned(),
        }
    }
}

/// HTTP client settings used by [`ReqwestFetcher`](crate::ReqwestFetcher).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Connection timeout, in seconds. Zero disables it.
    pub connect_timeout_secs: u64,

    /// Whole-request timeout, in seconds. Zero disables it.
    pub timeout_secs: u64,

    /// `User-Agent` header value. Defaults to this crate's name and version.
    pub user_agent: Option<String>,
}

impl HttpConfig {
    /// Returns the connection timeout, or `None` if disabled.
    pub fn connect_timeout(&self) -> Option<Duration> {
        secs(self.connect_timeout_secs)
    }

    /// Returns the whole-request timeout, or `None` if disabled.
    pub fn timeout(&self) -> Option<Duration> {
        secs(self.timeout_secs)
    }

    pub fn user_agent(&self) -> &str {
        self.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT)
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 10,
            timeout_secs: 30,
            user_agent: None,
        }
    }
}

const DEFAULT_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

fn secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

fn one_or_many<'de, D>(de: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(de)? {
        None => Vec::new(),
        Some(OneOrMany::One(url)) if url.is_empty() => Vec::new(),
        Some(OneOrMany::One(url)) => vec![url],
        Some(OneOrMany::Many(urls)) => urls,
    })
}
