//! Snap discovery, connection, and invocation over the Provider Gateway.
//!
//! Wire contract (all through a single uniform request shape):
//! - `web3_clientVersion`: capability probe for a Flask-equivalent build
//! - `wallet_getSnaps`: list installed snaps
//! - `wallet_enable`: request permission to enable/install a snap
//! - `wallet_invokeSnap`: invoke a named method on an installed snap

use crate::errors::BridgeError;
use crate::provider::WalletProvider;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use tracing::{debug, warn};

const fn default_enabled() -> bool {
    true
}

/// Identity and version of a discovered snap. Owned by discovery; refreshed
/// by re-querying, never mutated in place.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SnapMetadata {
    pub id: String,
    pub version: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

/// One-shot request forwarded verbatim to the snap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvocationRequest {
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub params: Option<Value>,
}

impl InvocationRequest {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            params: None,
        }
    }

    pub fn with_params(method: impl Into<String>, params: Value) -> Self {
        Self {
            method: method.into(),
            params: Some(params),
        }
    }
}

/// True iff the host wallet advertises the developer/preview feature set
/// required to install snaps.
///
/// Failure to detect is `false`, never an error: detection runs
/// opportunistically and must not crash the session.
pub async fn detect_capability<P: WalletProvider>(provider: &P) -> bool {
    match provider.request("web3_clientVersion", json!([])).await {
        Ok(Value::String(v)) => v.to_lowercase().contains("flask"),
        Ok(other) => {
            debug!(?other, "unexpected client version shape");
            false
        }
        Err(e) => {
            debug!(error = %e, "capability detection failed");
            false
        }
    }
}

/// Query the wallet for installed snaps.
///
/// Any failure degrades to an empty list with a diagnostic; an absent snap is
/// the common initial case and must never surface as a user-facing error.
pub async fn installed_snaps<P: WalletProvider>(provider: &P) -> Vec<SnapMetadata> {
    let raw = match provider.request("wallet_getSnaps", json!([])).await {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "failed to obtain installed snaps");
            return Vec::new();
        }
    };
    match serde_json::from_value::<BTreeMap<String, SnapMetadata>>(raw) {
        Ok(m) => m.into_values().collect(),
        Err(e) => {
            warn!(error = %e, "unparseable wallet_getSnaps response");
            Vec::new()
        }
    }
}

/// Filter discovered snaps by exact id and, if given, exact version.
pub fn find_snap(
    snaps: &[SnapMetadata],
    target_id: &str,
    version: Option<&str>,
) -> Option<SnapMetadata> {
    snaps
        .iter()
        .find(|s| s.id == target_id && version.is_none_or(|v| s.version == v))
        .cloned()
}

/// Ask the wallet to enable/install the target snap.
///
/// Idempotent from the caller's perspective: enabling an already-installed
/// snap is a no-op success inside the wallet.
pub async fn connect_snap<P: WalletProvider>(
    provider: &P,
    snap_id: &str,
    params: Value,
) -> Result<(), BridgeError> {
    provider
        .request("wallet_enable", json!([{ "wallet_snap": { (snap_id): params } }]))
        .await
        .map_err(BridgeError::Connection)?;
    Ok(())
}

/// Invoke a named method on the connected snap.
///
/// The single choke point for all domain operations; the result is opaque
/// here and interpreted by the caller.
pub async fn invoke_snap<P: WalletProvider>(
    provider: &P,
    snap_id: &str,
    request: &InvocationRequest,
) -> Result<Value, BridgeError> {
    provider
        .request("wallet_invokeSnap", json!([snap_id, request]))
        .await
        .map_err(BridgeError::Invocation)
}
