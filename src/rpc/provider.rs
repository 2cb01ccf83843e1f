//! HTTP transport with multi-RPC support and automatic failover

use super::{methods, Transport};
use crate::config::RpcConfig;
use crate::error::TransportError;

use async_trait::async_trait;
use ethers::providers::{Http, Provider, ProviderError, RpcError};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Multi-provider wrapper with automatic failover
pub struct HttpTransport {
    /// HTTP providers (multiple for failover), with their URLs
    providers: Vec<(String, Provider<Http>)>,
    /// Current active provider index
    current_provider: AtomicUsize,
    /// Per-call timeout
    timeout: Duration,
}

impl HttpTransport {
    /// Create a transport over the configured endpoints
    pub fn new(config: &RpcConfig) -> Result<Self, TransportError> {
        let mut providers = Vec::new();

        for url in config.endpoints() {
            match Provider::<Http>::try_from(url) {
                Ok(provider) => {
                    providers.push((url.to_string(), provider));
                    debug!("Added HTTP provider: {}", url);
                }
                Err(e) => {
                    warn!("Failed to create provider for {}: {}", url, e);
                }
            }
        }

        if providers.is_empty() {
            return Err(TransportError::Connection(
                "No valid RPC providers".to_string(),
            ));
        }

        Ok(Self {
            providers,
            current_provider: AtomicUsize::new(0),
            timeout: Duration::from_millis(config.timeout_ms),
        })
    }

    /// URL of the active provider
    pub fn active_url(&self) -> &str {
        &self.providers[self.active_index()].0
    }

    fn active_index(&self) -> usize {
        self.current_provider.load(Ordering::Relaxed) % self.providers.len()
    }

    /// Switch to next available provider
    pub fn failover(&self) {
        let current = self.current_provider.load(Ordering::Relaxed);
        let next = (current + 1) % self.providers.len();
        self.current_provider.store(next, Ordering::Relaxed);
        warn!("RPC failover to provider {} ({})", next, self.providers[next].0);
    }

    /// One attempt against the active provider, bounded by the timeout
    async fn call_once(&self, method: &str, params: Vec<Value>) -> Result<Value, TransportError> {
        let (url, provider) = &self.providers[self.active_index()];
        debug!("{} -> {}", method, url);

        match timeout(self.timeout, provider.request::<_, Value>(method, params)).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(map_provider_error(method, e)),
            Err(_) => Err(TransportError::Timeout {
                method: method.to_string(),
            }),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, TransportError> {
        // A broadcast that timed out may still have landed; never repeat it.
        if methods::is_submission(method) {
            return self.call_once(method, params).await;
        }

        let mut last_error = None;
        for _ in 0..self.providers.len() {
            match self.call_once(method, params.clone()).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() => {
                    warn!("{} failed on {}: {}", method, self.active_url(), e);
                    last_error = Some(e);
                    self.failover();
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| {
            TransportError::Connection("All providers failed".to_string())
        }))
    }
}

fn map_provider_error(method: &str, err: ProviderError) -> TransportError {
    if let Some(response) = err.as_error_response() {
        return TransportError::Rpc {
            code: response.code,
            message: response.message.clone(),
        };
    }
    if let Some(serde_err) = err.as_serde_error() {
        return TransportError::Decode {
            method: method.to_string(),
            message: serde_err.to_string(),
        };
    }
    TransportError::Connection(err.to_string())
}
