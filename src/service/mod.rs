//! Callable entry points
//!
//! `HexlinkService` owns the collaborators and exposes one async method per
//! callable. Every method takes the raw JSON payload plus the caller's auth
//! context and answers with a [`CallResult`]; anticipated failures become a
//! `{code, message}` body instead of an `Err`.

mod redpacket;
mod wallet;

pub use redpacket::*;
pub use wallet::*;

use crate::chain::Chain;
use crate::config::HexlinkConfig;
use crate::error::{HexlinkError, HexlinkResult};
use crate::provider::{ChainProvider, JsonRpcProvider};
use crate::signing::SignerResolver;
use crate::store::{Datastore, RequestPreprocessor, Submitter};
use crate::tx::IntentBuilder;
use crate::types::CallResult;
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

pub struct HexlinkService {
    config: Arc<HexlinkConfig>,
    preprocessor: Arc<dyn RequestPreprocessor>,
    submitter: Arc<dyn Submitter>,
    store: Arc<dyn Datastore>,
    intents: IntentBuilder,
    providers: HashMap<u64, Arc<dyn ChainProvider>>,
}

impl HexlinkService {
    pub fn new(
        config: Arc<HexlinkConfig>,
        preprocessor: Arc<dyn RequestPreprocessor>,
        submitter: Arc<dyn Submitter>,
        store: Arc<dyn Datastore>,
        signers: Arc<dyn SignerResolver>,
    ) -> Self {
        Self {
            intents: IntentBuilder::new(config.clone(), signers),
            config,
            preprocessor,
            submitter,
            store,
            providers: HashMap::new(),
        }
    }

    /// Use `provider` for reads on `chain`
    pub fn with_provider(mut self, chain: &Chain, provider: Arc<dyn ChainProvider>) -> Self {
        self.providers.insert(chain.id(), provider);
        self
    }

    /// JSON-RPC provider for every chain that has a deployment
    pub fn connect_providers(mut self) -> HexlinkResult<Self> {
        for key in self.config.deployments.keys() {
            let chain = Chain::get(key)?;
            let provider = JsonRpcProvider::for_chain(&self.config, chain)?;
            tracing::info!(chain = chain.name, url = provider.url(), "connected provider");
            self.providers.insert(chain.id(), Arc::new(provider));
        }
        Ok(self)
    }

    pub fn config(&self) -> &HexlinkConfig {
        &self.config
    }

    fn provider(&self, chain: &Chain) -> HexlinkResult<Arc<dyn ChainProvider>> {
        self.providers
            .get(&chain.id())
            .cloned()
            .ok_or_else(|| HexlinkError::unsupported_chain(chain.name).with_details("no provider configured"))
    }
}

/// Run a callable body, turning its error into a `{code, message}` response
async fn respond<T, F>(callable: &'static str, body: F) -> CallResult
where
    T: Serialize,
    F: Future<Output = HexlinkResult<T>>,
{
    match body.await {
        Ok(data) => CallResult::ok(data),
        Err(e) => {
            if e.status() >= 500 {
                tracing::error!(callable, code = ?e.code, error = %e, "callable failed");
            } else {
                tracing::warn!(callable, code = ?e.code, error = %e, "callable rejected");
            }
            e.into()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_respond_maps_errors() {
        let ok = respond("ok", async { Ok::<_, HexlinkError>(json!({"id": 1})) }).await;
        assert_eq!(ok.code, 200);
        assert_eq!(ok.get("id"), Some(&json!(1)));

        let denied = respond("denied", async {
            Err::<(), _>(HexlinkError::new(ErrorCode::InvalidValidator, "invalid validator"))
        })
        .await;
        assert_eq!(denied.code, 403);
        assert_eq!(denied.message.as_deref(), Some("invalid validator"));

        let down = respond("down", async { Err::<(), _>(HexlinkError::timeout("getFeeData timed out")) }).await;
        assert_eq!(down.code, 503);
    }
}
