use std::collections::BTreeMap;

use derive_more::{Display, Error};

use crate::{CloudFrontProvider, Config, HttpFetcher, ProxyIpProvider, ProxyIpReport};

/// Error returned when registering a provider.
#[derive(Debug, Display, Error)]
#[non_exhaustive]
pub enum RegistryError {
    /// Another provider already uses this handle.
    #[display("There's already a Proxy IP Provider registered with the handle \"{handle}\"")]
    DuplicateHandle {
        /// Conflicting handle.
        handle: String,
    },
}

/// Handle-keyed set of proxy IP providers.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: BTreeMap<String, Box<dyn ProxyIpProvider>>,
}

impl ProviderRegistry {
    /// Constructs an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `provider` under `handle`.
    ///
    /// # Errors
    /// Fails if `handle` is already registered; the existing provider is kept.
    pub fn register(
        &mut self,
        handle: impl Into<String>,
        provider: impl ProxyIpProvider + 'static,
    ) -> Result<(), RegistryError> {
        let handle = handle.into();

        if self.providers.contains_key(&handle) {
            return Err(RegistryError::DuplicateHandle { handle });
        }

        tracing::debug!(%handle, name = provider.name(), "registering proxy IP provider");
        self.providers.insert(handle, Box::new(provider));

        Ok(())
    }

    /// Removes and returns the provider registered under `handle`.
    pub fn unregister(&mut self, handle: &str) -> Option<Box<dyn ProxyIpProvider>> {
        self.providers.remove(handle)
    }

    /// Returns the provider registered under `handle`.
    pub fn get(&self, handle: &str) -> Option<&dyn ProxyIpProvider> {
        self.providers.get(handle).map(|provider| &**provider)
    }

    /// Returns registered handles in sorted order.
    pub fn handles(&self) -> impl Iterator<Item = &str> {
        self.providers.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Queries every provider in handle order, each with its own configuration, and concatenates
    /// their results.
    pub fn collect(&self) -> ProxyIpReport {
        self.collect_with(&BTreeMap::new())
    }

    /// Queries every provider in handle order and concatenates their results.
    ///
    /// A provider whose handle appears in `overrides` is given that configuration for this call;
    /// the others use their own.
    pub fn collect_with(&self, overrides: &BTreeMap<String, Config>) -> ProxyIpReport {
        let mut report = ProxyIpReport::default();

        for (handle, provider) in &self.providers {
            let ranges = provider.proxy_ips(&mut report.errors, overrides.get(handle));
            report.ranges.extend(ranges);
        }

        report
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(
                self.providers
                    .iter()
                    .map(|(handle, provider)| (handle, provider.name())),
            )
            .finish()
    }
}

impl<F: HttpFetcher + 'static> CloudFrontProvider<F> {
    /// Registers this provider under [`HANDLE`](Self::HANDLE).
    pub fn register_into(self, registry: &mut ProviderRegistry) -> Result<(), RegistryError> {
        registry.register(Self::HANDLE, self)
    }
}
