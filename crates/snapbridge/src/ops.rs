//! User-triggered operations over the bridge.
//!
//! Every operation follows the same structural block: acquire the advisory
//! lock, run the fallible body to a `Result`, record exactly one outcome
//! (success message or error), release the lock. Because the body returns a
//! value instead of throwing, the release is unconditional rather than a
//! convention each call site must remember.

use crate::config::BridgeConfig;
use crate::errors::BridgeError;
use crate::provider::WalletProvider;
use crate::session::{SessionState, Transition};
use crate::snap::{self, InvocationRequest};
use crate::swap;
use crate::{amount, errors::ErrorInfo};
use serde_json::{json, Value};
use tracing::{info, warn};

/// Binds a Provider Gateway and configuration to the operation set.
#[derive(Debug)]
pub struct Bridge<P> {
    provider: P,
    cfg: BridgeConfig,
}

fn settle(state: &mut SessionState, outcome: Result<String, BridgeError>) {
    match outcome {
        Ok(msg) => {
            info!(message = %msg, "operation succeeded");
            state.apply(Transition::SetSuccess(msg));
        }
        Err(e) => {
            warn!(error = %e, "operation failed");
            state.apply(Transition::SetError(ErrorInfo::from(e)));
        }
    }
    state.apply(Transition::SetLocked(false));
}

impl<P: WalletProvider> Bridge<P> {
    pub const fn new(provider: P, cfg: BridgeConfig) -> Self {
        Self { provider, cfg }
    }

    /// Opportunistic capability + discovery refresh. Not a user operation:
    /// takes no lock and records no outcome banner.
    pub async fn refresh(&self, state: &mut SessionState) {
        let capable = snap::detect_capability(&self.provider).await;
        state.apply(Transition::SetCapability(capable));
        if !capable {
            state.apply(Transition::SetInstalled(None));
            return;
        }
        let snaps = snap::installed_snaps(&self.provider).await;
        let found = snap::find_snap(&snaps, &self.cfg.snap_id, self.cfg.snap_version.as_deref());
        state.apply(Transition::SetInstalled(found));
    }

    /// Request permission to enable/install the configured snap.
    pub async fn connect(&self, state: &mut SessionState) {
        state.apply(Transition::SetLocked(true));
        let outcome = self.connect_inner(state).await;
        settle(state, outcome);
    }

    /// Prompt the user to log into their account inside the snap.
    pub async fn initialize(&self, state: &mut SessionState) {
        state.apply(Transition::SetLocked(true));
        let outcome = self.initialize_inner(state).await;
        settle(state, outcome);
    }

    /// Ask the snap for the user's private balance.
    pub async fn request_balance(&self, state: &mut SessionState) {
        state.apply(Transition::SetLocked(true));
        let outcome = self.request_balance_inner(state).await;
        settle(state, outcome);
    }

    /// Build the fixed-amount swap and hand it to the snap for execution.
    pub async fn transact(&self, state: &mut SessionState) {
        state.apply(Transition::SetLocked(true));
        let outcome = self.transact_inner(state).await;
        settle(state, outcome);
    }

    /// Gate for snap-backed operations. Fails before any gateway call so a
    /// non-capable wallet never triggers network traffic from this layer.
    fn require_ready(&self, state: &SessionState) -> Result<String, BridgeError> {
        if !state.is_capable_wallet {
            return Err(BridgeError::Validation(
                "wallet does not expose the snap feature set; install a Flask-capable build".into(),
            ));
        }
        match &state.installed_snap {
            Some(s) => Ok(s.id.clone()),
            None => Err(BridgeError::Validation(
                "snap is not connected; run connect first".into(),
            )),
        }
    }

    async fn connect_inner(&self, state: &mut SessionState) -> Result<String, BridgeError> {
        if !state.is_capable_wallet {
            return Err(BridgeError::Validation(
                "wallet does not expose the snap feature set; install a Flask-capable build".into(),
            ));
        }
        let params = match &self.cfg.snap_version {
            Some(v) => json!({ "version": v }),
            None => json!({}),
        };
        snap::connect_snap(&self.provider, &self.cfg.snap_id, params).await?;

        // Re-query rather than trusting the enable result; discovery stays
        // the source of truth for installed-snap metadata.
        let snaps = snap::installed_snaps(&self.provider).await;
        let found = snap::find_snap(&snaps, &self.cfg.snap_id, self.cfg.snap_version.as_deref());
        let msg = match &found {
            Some(s) => format!("Snap {} v{} connected.", s.id, s.version),
            None => format!("Snap {} connected.", self.cfg.snap_id),
        };
        state.apply(Transition::SetInstalled(found));
        Ok(msg)
    }

    async fn initialize_inner(&self, state: &SessionState) -> Result<String, BridgeError> {
        let snap_id = self.require_ready(state)?;
        snap::invoke_snap(&self.provider, &snap_id, &InvocationRequest::new("initialize")).await?;
        Ok("User successfully logged in.".into())
    }

    async fn request_balance_inner(&self, state: &SessionState) -> Result<String, BridgeError> {
        let snap_id = self.require_ready(state)?;
        let raw = snap::invoke_snap(
            &self.provider,
            &snap_id,
            &InvocationRequest::new("requestBalance"),
        )
        .await?;
        // The snap reports the balance in milli-units.
        let milli = raw
            .as_u64()
            .ok_or_else(|| BridgeError::MalformedResponse(format!("balance: {raw}")))?;
        Ok(format!(
            "Private balance is {} ETH.",
            amount::format_milli_units(milli)
        ))
    }

    async fn transact_inner(&self, state: &SessionState) -> Result<String, BridgeError> {
        let snap_id = self.require_ready(state)?;
        let tx = swap::build_swap(&self.provider, &self.cfg).await?;
        let receipt = snap::invoke_snap(
            &self.provider,
            &snap_id,
            &InvocationRequest::with_params("transact", tx.invoke_params()),
        )
        .await?;
        let hash = receipt
            .get("transactionHash")
            .and_then(Value::as_str)
            .ok_or_else(|| BridgeError::MalformedResponse(format!("transact receipt: {receipt}")))?;
        Ok(format!("Transaction successful; its hash was {hash}."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ProviderError;
    use crate::provider::testing::MockProvider;
    use crate::snap::SnapMetadata;

    const ACCOUNT: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";

    fn ready_state() -> SessionState {
        let mut s = SessionState::new();
        s.apply(Transition::SetCapability(true));
        s.apply(Transition::SetInstalled(Some(SnapMetadata {
            id: BridgeConfig::default().snap_id,
            version: "0.2.1".into(),
            enabled: true,
        })));
        s
    }

    fn bridge(p: MockProvider) -> Bridge<MockProvider> {
        Bridge::new(p, BridgeConfig::default())
    }

    #[tokio::test]
    async fn rejection_releases_lock_and_keeps_prior_success() {
        let p = MockProvider::new();
        p.push_err(ProviderError::Rpc {
            code: 4001,
            message: "User rejected request".into(),
        });
        let b = bridge(p);
        let mut s = ready_state();
        s.apply(Transition::SetSuccess("prior outcome".into()));

        b.initialize(&mut s).await;

        assert!(!s.locked, "lock must be released after settlement");
        let msg = s.error.as_ref().map(|e| e.message.clone()).unwrap_or_default();
        assert!(
            msg.contains("User rejected request"),
            "wallet cause must survive: {msg}"
        );
        assert_eq!(
            s.success.as_deref(),
            Some("prior outcome"),
            "success unchanged from its prior value"
        );
    }

    #[tokio::test]
    async fn non_capable_wallet_never_reaches_the_gateway() {
        let b = bridge(MockProvider::new());
        let mut s = SessionState::new();

        b.transact(&mut s).await;

        assert_eq!(b.provider.call_count(), 0, "no network-facing call attempted");
        assert!(!s.locked, "lock must be released");
        assert!(
            matches!(&s.error, Some(e) if e.message.contains("invalid input")),
            "gate failure surfaces as a validation error: {:?}",
            s.error
        );
    }

    #[tokio::test]
    async fn connect_requires_capability_only() {
        let b = bridge(MockProvider::new());
        let mut s = SessionState::new();
        b.connect(&mut s).await;
        assert_eq!(b.provider.call_count(), 0, "gate precedes the enable call");
        assert!(s.error.is_some(), "connect without capability must fail");
    }

    #[tokio::test]
    async fn initialize_records_login_success() {
        let p = MockProvider::new();
        p.push_ok(serde_json::Value::Null);
        let b = bridge(p);
        let mut s = ready_state();

        b.initialize(&mut s).await;

        assert_eq!(s.success.as_deref(), Some("User successfully logged in."));
        assert!(s.error.is_none(), "no error on success: {:?}", s.error);
        assert!(!s.locked, "lock must be released");
    }

    #[tokio::test]
    async fn balance_formats_milli_units() {
        let p = MockProvider::new();
        p.push_ok(json!(1234));
        let b = bridge(p);
        let mut s = ready_state();

        b.request_balance(&mut s).await;

        assert_eq!(s.success.as_deref(), Some("Private balance is 1.234 ETH."));
        assert!(!s.locked, "lock must be released");
    }

    #[tokio::test]
    async fn balance_rejects_non_numeric_response() {
        let p = MockProvider::new();
        p.push_ok(json!("not-a-number"));
        let b = bridge(p);
        let mut s = ready_state();

        b.request_balance(&mut s).await;

        assert!(
            matches!(&s.error, Some(e) if e.message.contains("unexpected snap response")),
            "malformed balance must error: {:?}",
            s.error
        );
        assert!(!s.locked, "lock must be released");
    }

    #[tokio::test]
    async fn transact_builds_then_invokes_through_the_choke_point() {
        let p = MockProvider::new();
        p.push_ok(json!([ACCOUNT]));
        p.push_ok(json!("0x1"));
        p.push_ok(json!({ "transactionHash": "0xdeadbeef" }));
        let b = bridge(p);
        let mut s = ready_state();

        b.transact(&mut s).await;

        assert_eq!(
            s.success.as_deref(),
            Some("Transaction successful; its hash was 0xdeadbeef."),
            "receipt hash should appear in the message; error: {:?}",
            s.error
        );
        assert_eq!(
            b.provider.calls(),
            vec!["eth_accounts", "eth_chainId", "wallet_invokeSnap"],
            "builder reads the environment, then dispatches once"
        );
        assert!(!s.locked, "lock must be released");
    }

    #[tokio::test]
    async fn wrong_network_surfaces_with_guidance() {
        let p = MockProvider::new();
        p.push_ok(json!([ACCOUNT]));
        p.push_ok(json!("0x5"));
        let b = bridge(p);
        let mut s = ready_state();

        b.transact(&mut s).await;

        assert!(
            matches!(&s.error, Some(e) if e.message.contains("mainnet")),
            "wrong-network guidance expected: {:?}",
            s.error
        );
        assert!(!s.locked, "lock must be released");
    }

    #[tokio::test]
    async fn refresh_discovers_capability_and_snap() {
        let p = MockProvider::new();
        p.push_ok(json!("MetaMask/v10.8.1-flask.0"));
        p.push_ok(json!({
            "npm:@firnprotocol/snap": {
                "id": "npm:@firnprotocol/snap",
                "version": "0.2.1",
            }
        }));
        let b = bridge(p);
        let mut s = SessionState::new();

        b.refresh(&mut s).await;

        assert!(s.is_capable_wallet, "flask build is capable");
        assert_eq!(
            s.installed_snap.map(|m| m.id),
            Some("npm:@firnprotocol/snap".into()),
            "configured snap should be discovered"
        );
    }

    #[tokio::test]
    async fn refresh_skips_discovery_without_capability() {
        let p = MockProvider::new();
        p.push_ok(json!("MetaMask/v10.8.1"));
        let b = bridge(p);
        let mut s = SessionState::new();

        b.refresh(&mut s).await;

        assert!(!s.is_capable_wallet, "stable build is not capable");
        assert_eq!(b.provider.call_count(), 1, "no snap query without capability");
    }

    #[tokio::test]
    async fn connect_enables_then_requeries_discovery() {
        let p = MockProvider::new();
        p.push_ok(json!({})); // wallet_enable
        p.push_ok(json!({
            "npm:@firnprotocol/snap": {
                "id": "npm:@firnprotocol/snap",
                "version": "0.2.1",
            }
        }));
        let b = bridge(p);
        let mut s = SessionState::new();
        s.apply(Transition::SetCapability(true));

        b.connect(&mut s).await;

        assert_eq!(
            b.provider.calls(),
            vec!["wallet_enable", "wallet_getSnaps"],
            "connector then fresh discovery"
        );
        assert!(s.installed_snap.is_some(), "snap recorded after connect");
        assert!(
            s.success.as_deref().is_some_and(|m| m.contains("connected")),
            "success banner expected: {:?}",
            s.success
        );
    }
}
