//! Per-call deadlines for collaborator round-trips.
//!
//! Nonce reads, fee reads, address predictions, signature requests and
//! datastore mutations are the only suspension points in the core. Each one is
//! wrapped with `CallPolicy::run` so a hung collaborator surfaces as a
//! `Timeout` error instead of stalling the request. No retries happen here.

use crate::error::{HexlinkError, HexlinkResult};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(15);

/// Deadline applied to every external call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallPolicy {
    #[serde(with = "millis", rename = "timeoutMs")]
    pub timeout: Duration,
}

impl Default for CallPolicy {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_CALL_TIMEOUT,
        }
    }
}

impl CallPolicy {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Run `fut`, failing with `Timeout` once the deadline passes
    pub async fn run<T, F>(&self, label: &'static str, fut: F) -> HexlinkResult<T>
    where
        F: Future<Output = HexlinkResult<T>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(call = label, timeout_ms = self.timeout.as_millis() as u64, "external call timed out");
                Err(HexlinkError::timeout(format!("{} timed out", label))
                    .with_details(format!("after {}ms", self.timeout.as_millis())))
            }
        }
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
