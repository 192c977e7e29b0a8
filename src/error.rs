//! Unified error types for Hexlink Core
//!
//! Every fallible operation in the crate returns `HexlinkResult<T>`. The error
//! carries a stable `ErrorCode` so that entry points can turn anticipated
//! failures into `{code, message}` responses without string matching.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Main error type for all Hexlink operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HexlinkError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<String>,
}

impl HexlinkError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    // Convenience constructors
    pub fn unsupported_chain(chain: impl fmt::Display) -> Self {
        Self::new(ErrorCode::UnsupportedChain, format!("Unsupported chain: {}", chain))
    }

    pub fn invalid_validator(signer: impl fmt::Debug) -> Self {
        Self::new(ErrorCode::InvalidValidator, "invalid validator")
            .with_details(format!("signer={:?}", signer))
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, msg)
    }

    pub fn decode_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::DecodeError, msg)
    }

    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::UpstreamUnavailable, msg)
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Timeout, msg)
    }

    pub fn signing_failed(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::SigningFailed, msg)
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Config, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, msg)
    }

    /// HTTP-style status used by the callable entry points
    pub fn status(&self) -> u16 {
        self.code.status()
    }
}

impl fmt::Display for HexlinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for HexlinkError {}

/// Error codes for categorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // Request errors
    UnsupportedChain,
    InvalidInput,

    // Authorization
    InvalidValidator,
    SigningFailed,

    // Chain data
    DecodeError,

    // Collaborators (RPC provider, datastore, key service, queue)
    UpstreamUnavailable,
    Timeout,

    // Internal
    Config,
    Internal,
}

impl ErrorCode {
    pub fn status(&self) -> u16 {
        match self {
            ErrorCode::UnsupportedChain | ErrorCode::InvalidInput => 400,
            ErrorCode::InvalidValidator => 403,
            ErrorCode::UpstreamUnavailable | ErrorCode::Timeout => 503,
            ErrorCode::SigningFailed
            | ErrorCode::DecodeError
            | ErrorCode::Config
            | ErrorCode::Internal => 500,
        }
    }
}

/// Result type alias for Hexlink operations
pub type HexlinkResult<T> = Result<T, HexlinkError>;

// Conversions from common error types

impl From<serde_json::Error> for HexlinkError {
    fn from(e: serde_json::Error) -> Self {
        HexlinkError::new(ErrorCode::InvalidInput, e.to_string())
    }
}

impl From<hex::FromHexError> for HexlinkError {
    fn from(e: hex::FromHexError) -> Self {
        HexlinkError::new(ErrorCode::InvalidInput, format!("Invalid hex: {}", e))
    }
}

impl From<std::io::Error> for HexlinkError {
    fn from(e: std::io::Error) -> Self {
        HexlinkError::new(ErrorCode::Internal, e.to_string())
    }
}

impl From<reqwest::Error> for HexlinkError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            HexlinkError::new(ErrorCode::Timeout, "Request timed out")
        } else if e.is_connect() {
            HexlinkError::new(ErrorCode::UpstreamUnavailable, "Connection failed")
        } else {
            HexlinkError::new(ErrorCode::UpstreamUnavailable, e.to_string())
        }
    }
}

impl From<ethers_core::abi::Error> for HexlinkError {
    fn from(e: ethers_core::abi::Error) -> Self {
        HexlinkError::new(ErrorCode::DecodeError, format!("ABI error: {}", e))
    }
}

impl From<ethers_signers::WalletError> for HexlinkError {
    fn from(e: ethers_signers::WalletError) -> Self {
        HexlinkError::new(ErrorCode::SigningFailed, e.to_string())
    }
}

impl From<ethers_core::utils::ConversionError> for HexlinkError {
    fn from(e: ethers_core::utils::ConversionError) -> Self {
        HexlinkError::new(ErrorCode::InvalidInput, format!("Invalid amount: {}", e))
    }
}

impl From<tokio::time::error::Elapsed> for HexlinkError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        HexlinkError::new(ErrorCode::Timeout, "Deadline elapsed")
    }
}
