//! Chain Registry
//!
//! Static catalog of the networks Hexlink is deployed on. Lookups accept the
//! chain name or its decimal chain id; anything else is `UnsupportedChain`.

use crate::error::{HexlinkError, HexlinkResult};
use ethers_core::types::U256;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Native currency of a chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NativeCurrency {
    pub name: &'static str,
    pub symbol: &'static str,
    pub decimals: u8,
}

/// Network metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Chain {
    pub chain_id: &'static str,
    pub name: &'static str,
    pub full_name: &'static str,
    pub rpc_urls: &'static [&'static str],
    pub native_currency: NativeCurrency,
    pub block_explorer_urls: &'static [&'static str],
    pub logo_url: &'static str,
    /// Max fee per gas (wei) used when the provider reports no EIP-1559 fee data
    #[serde(skip)]
    pub default_max_fee_per_gas: u64,
}

pub const GOERLI: Chain = Chain {
    chain_id: "5",
    name: "goerli",
    full_name: "Goerli Test Network",
    rpc_urls: &["https://goerli.infura.io/v3/"],
    native_currency: NativeCurrency {
        name: "Goerli ETH",
        symbol: "gETH",
        decimals: 18,
    },
    block_explorer_urls: &["https://goerli.etherscan.io"],
    logo_url: "https://token.metaswap.codefi.network/assets/networkLogos/ethereum.svg",
    default_max_fee_per_gas: 10_000_000_000,
};

pub const POLYGON: Chain = Chain {
    chain_id: "137",
    name: "polygon",
    full_name: "Polygon Network",
    rpc_urls: &["https://polygon-rpc.com"],
    native_currency: NativeCurrency {
        name: "MATIC",
        symbol: "MATIC",
        decimals: 18,
    },
    block_explorer_urls: &["https://polygonscan.com"],
    logo_url: "https://token.metaswap.codefi.network/assets/networkLogos/polygon.svg",
    default_max_fee_per_gas: 200_000_000_000,
};

pub const MUMBAI: Chain = Chain {
    chain_id: "80001",
    name: "mumbai",
    full_name: "Polygon Test Network",
    rpc_urls: &["https://rpc-mumbai.maticvigil.com/"],
    native_currency: NativeCurrency {
        name: "MATIC",
        symbol: "MATIC",
        decimals: 18,
    },
    block_explorer_urls: &["https://mumbai.polygonscan.com/"],
    logo_url: "https://token.metaswap.codefi.network/assets/networkLogos/polygon.svg",
    default_max_fee_per_gas: 2_000_000_000,
};

/// Every chain in the catalog
pub const ALL_CHAINS: [&Chain; 3] = [&GOERLI, &POLYGON, &MUMBAI];

impl Chain {
    /// Look up a chain by name or decimal chain id
    pub fn get(key: impl fmt::Display) -> HexlinkResult<&'static Chain> {
        let key = key.to_string();
        let normalized = key.trim().to_ascii_lowercase();
        ALL_CHAINS
            .iter()
            .copied()
            .find(|chain| chain.name == normalized || chain.chain_id == normalized)
            .ok_or_else(|| HexlinkError::unsupported_chain(key))
    }

    /// Numeric chain id
    pub fn id(&self) -> u64 {
        // Catalog entries are decimal literals
        self.chain_id.parse().unwrap_or_default()
    }

    pub fn id_u256(&self) -> U256 {
        U256::from(self.id())
    }

    pub fn default_max_fee(&self) -> U256 {
        U256::from(self.default_max_fee_per_gas)
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.chain_id)
    }
}

/// Serde-friendly reference to a catalog chain, carried in requests and operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainRef(pub &'static Chain);

impl ChainRef {
    pub fn chain(&self) -> &'static Chain {
        self.0
    }
}

impl std::str::FromStr for ChainRef {
    type Err = HexlinkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Chain::get(s).map(ChainRef)
    }
}

impl Serialize for ChainRef {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.0.name)
    }
}

impl<'de> Deserialize<'de> for ChainRef {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        let key = match raw {
            serde_json::Value::String(s) => s,
            serde_json::Value::Number(n) => n.to_string(),
            other => return Err(serde::de::Error::custom(format!("invalid chain: {}", other))),
        };
        Chain::get(&key).map(ChainRef).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_lookup_by_name_and_id() {
        assert_eq!(Chain::get("goerli").unwrap(), &GOERLI);
        assert_eq!(Chain::get("5").unwrap(), &GOERLI);
        assert_eq!(Chain::get(137).unwrap(), &POLYGON);
        assert_eq!(Chain::get("mumbai").unwrap(), &MUMBAI);
        assert_eq!(Chain::get(80001u64).unwrap(), &MUMBAI);
    }

    #[test]
    fn test_unknown_chain() {
        let err = Chain::get("ropsten").unwrap_err();
        assert_eq!(err.code, ErrorCode::UnsupportedChain);
        assert!(Chain::get(1).is_err());
        assert!(Chain::get("").is_err());
    }

    #[test]
    fn test_chain_ids_are_numeric() {
        for chain in ALL_CHAINS {
            assert!(chain.id() > 0, "{} should have a numeric id", chain.name);
            assert_eq!(chain.native_currency.decimals, 18);
        }
    }

    #[test]
    fn test_chain_ref_serde() {
        let parsed: ChainRef = serde_json::from_str("\"polygon\"").unwrap();
        assert_eq!(parsed.chain(), &POLYGON);

        let numeric: ChainRef = serde_json::from_str("80001").unwrap();
        assert_eq!(numeric.chain(), &MUMBAI);

        assert_eq!(serde_json::to_string(&parsed).unwrap(), "\"polygon\"");
        assert!(serde_json::from_str::<ChainRef>("\"kovan\"").is_err());
    }
}
