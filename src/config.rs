//! Runtime configuration
//!
//! A single `HexlinkConfig` is built once per process and handed to every
//! component at construction. Nothing in the crate reads environment variables
//! or globals after that point.
//!
//! ```json
//! {
//!   "admin": "0x...",
//!   "walletBytecode": "0x6080...",
//!   "deployments": {
//!     "goerli": { "redPacket": "0x...", "tokenFactory": "0x...", "refunder": "0x..." }
//!   },
//!   "callPolicy": { "timeoutMs": 15000 }
//! }
//! ```

use crate::chain::Chain;
use crate::error::{HexlinkError, HexlinkResult};
use crate::utils::CallPolicy;
use ethers_core::types::{Address, Bytes};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use url::Url;

/// Environment variable naming the config file
pub const CONFIG_PATH_ENV: &str = "HEXLINK_CONFIG";

/// Contract addresses for one chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainDeployment {
    /// Red packet contract
    pub red_packet: Address,
    /// ERC-721 drop factory
    pub token_factory: Address,
    /// Account that receives creation deposits
    pub refunder: Address,
    /// Overrides the catalog RPC endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpc_url: Option<String>,
}

/// Process-wide configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HexlinkConfig {
    /// Wallet admin contract (CREATE2 deployer of wallet clones)
    pub admin: Address,
    /// Creation bytecode of the wallet implementation
    pub wallet_bytecode: Bytes,
    /// Deployments keyed by chain name or id
    #[serde(default)]
    pub deployments: HashMap<String, ChainDeployment>,
    #[serde(default)]
    pub call_policy: CallPolicy,
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_log_filter() -> String {
    "hexlink_core=info".to_string()
}

/// Config loading failures
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config path not set: export {0}")]
    MissingPath(&'static str),
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl From<ConfigError> for HexlinkError {
    fn from(e: ConfigError) -> Self {
        HexlinkError::config(e.to_string())
    }
}

impl HexlinkConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: HexlinkConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// Load from the file named by `HEXLINK_CONFIG`
    pub fn from_env() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV).map_err(|_| ConfigError::MissingPath(CONFIG_PATH_ENV))?;
        Self::from_file(path)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.wallet_bytecode.is_empty() {
            return Err(ConfigError::Invalid("walletBytecode is empty".to_string()));
        }
        if self.admin.is_zero() {
            return Err(ConfigError::Invalid("admin address is zero".to_string()));
        }
        if self.call_policy.timeout.is_zero() {
            return Err(ConfigError::Invalid("callPolicy.timeoutMs must be positive".to_string()));
        }

        for (key, deployment) in &self.deployments {
            Chain::get(key).map_err(|_| ConfigError::Invalid(format!("unknown chain in deployments: {}", key)))?;

            if deployment.red_packet.is_zero() || deployment.token_factory.is_zero() {
                return Err(ConfigError::Invalid(format!("{}: contract address is zero", key)));
            }

            if let Some(rpc) = &deployment.rpc_url {
                let parsed = Url::parse(rpc)
                    .map_err(|e| ConfigError::Invalid(format!("{}: invalid rpcUrl: {}", key, e)))?;
                if !matches!(parsed.scheme(), "https" | "http" | "wss" | "ws") {
                    return Err(ConfigError::Invalid(format!(
                        "{}: unsupported rpcUrl scheme {}",
                        key,
                        parsed.scheme()
                    )));
                }
            }
        }

        Ok(())
    }

    /// Deployment for `chain`, looked up by name then by id
    pub fn deployment(&self, chain: &Chain) -> HexlinkResult<&ChainDeployment> {
        self.deployments
            .get(chain.name)
            .or_else(|| self.deployments.get(chain.chain_id))
            .ok_or_else(|| {
                HexlinkError::unsupported_chain(chain.name).with_details("no contracts deployed")
            })
    }

    pub fn red_packet_address(&self, chain: &Chain) -> HexlinkResult<Address> {
        Ok(self.deployment(chain)?.red_packet)
    }

    pub fn token_factory_address(&self, chain: &Chain) -> HexlinkResult<Address> {
        Ok(self.deployment(chain)?.token_factory)
    }

    pub fn refunder(&self, chain: &Chain) -> HexlinkResult<Address> {
        Ok(self.deployment(chain)?.refunder)
    }

    /// Endpoint to use for `chain`: deployment override, else the catalog default
    pub fn rpc_url(&self, chain: &Chain) -> HexlinkResult<String> {
        if let Some(url) = self.deployment(chain).ok().and_then(|d| d.rpc_url.clone()) {
            return Ok(url);
        }
        chain
            .rpc_urls
            .first()
            .map(|url| url.to_string())
            .ok_or_else(|| HexlinkError::config(format!("no rpc url for {}", chain.name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{GOERLI, POLYGON};
    use std::time::Duration;

    const CONFIG: &str = r#"{
        "admin": "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
        "walletBytecode": "0x600a600c600039600a6000f3602a60005260206000f3",
        "deployments": {
            "goerli": {
                "redPacket": "0x1111111111111111111111111111111111111111",
                "tokenFactory": "0x2222222222222222222222222222222222222222",
                "refunder": "0x3333333333333333333333333333333333333333",
                "rpcUrl": "https://goerli.example.org/rpc"
            }
        },
        "callPolicy": { "timeoutMs": 5000 }
    }"#;

    #[test]
    fn test_parse_config() {
        let config = HexlinkConfig::from_json_str(CONFIG).unwrap();
        assert_eq!(config.call_policy.timeout, Duration::from_secs(5));
        assert_eq!(config.log_filter, "hexlink_core=info");
        assert_eq!(
            config.red_packet_address(&GOERLI).unwrap(),
            "0x1111111111111111111111111111111111111111".parse().unwrap()
        );
        assert_eq!(config.rpc_url(&GOERLI).unwrap(), "https://goerli.example.org/rpc");
        assert_eq!(config.rpc_url(&POLYGON).unwrap(), "https://polygon-rpc.com");
    }

    #[test]
    fn test_missing_deployment() {
        let config = HexlinkConfig::from_json_str(CONFIG).unwrap();
        let err = config.red_packet_address(&POLYGON).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::UnsupportedChain);
    }

    #[test]
    fn test_rejects_unknown_chain_key() {
        let bad = CONFIG.replace("\"goerli\"", "\"ropsten\"");
        assert!(matches!(HexlinkConfig::from_json_str(&bad), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_bad_rpc_url() {
        let bad = CONFIG.replace("https://goerli.example.org/rpc", "ftp://goerli.example.org");
        assert!(matches!(HexlinkConfig::from_json_str(&bad), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_empty_bytecode() {
        let bad = CONFIG.replace("0x600a600c600039600a6000f3602a60005260206000f3", "0x");
        assert!(matches!(HexlinkConfig::from_json_str(&bad), Err(ConfigError::Invalid(_))));
    }
}
