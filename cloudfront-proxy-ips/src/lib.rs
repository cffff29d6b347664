//! Proxy IP provider for CloudFront's edge network.
//!
//! Gathers the IP ranges used by CloudFront edge servers so that `X-Forwarded-For` headers can be
//! trusted only when the peer is one of them. Ranges are read from one or more JSON endpoints;
//! both the CloudFront tooling feed (`CLOUDFRONT_REGIONAL_EDGE_IP_LIST`) and the AWS IP ranges
//! feed (`prefixes`) are understood. Endpoint failures are collected rather than propagated, so a
//! partial result is always returned.
//!
//! # Crate Features
//!
//! `fetch-ips` (default): Enables [`ReqwestFetcher`], a blocking HTTP transport, and
//! [`CloudFrontProvider::from_config`]. This feature includes `rustls` but if you prefer the
//! platform's TLS implementation you can disable default crate features and enable
//! `fetch-ips-native-tls` instead. Enabling either `fetch-ips-rustls` or `fetch-ips-native-tls`
//! on its own is enough to get the transport.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms, nonstandard_style)]
#![warn(future_incompatible)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

mod config;
mod error;
pub mod feed;
mod fetch;
mod provider;
mod registry;

#[cfg(feature = "__reqwest")]
pub use self::fetch::ReqwestFetcher;
pub use self::{
    config::{Config, EndpointsConfig, HttpConfig, AWS_IP_RANGES_URL, CLOUDFRONT_TOOLS_URL},
    error::{DecodeError, ErrorKind, ProviderError, TransportError},
    feed::RangeFeed,
    fetch::{FetchResponse, HttpFetcher},
    provider::{CloudFrontProvider, ProxyIpProvider, ProxyIpReport},
    registry::{ProviderRegistry, RegistryError},
};
