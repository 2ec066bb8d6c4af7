use eyre::Context as _;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The only chain this bridge will route a swap on.
pub const MAINNET_CHAIN_ID: u64 = 1;

/// Static identifiers for the bridge: snap origin, contract addresses, pool
/// parameters. Pure data; everything here is external configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// JSON-RPC endpoint of the host wallet.
    pub wallet_rpc_url: String,
    /// Origin id of the snap to discover/connect (e.g. an npm: specifier).
    pub snap_id: String,
    /// Optional exact snap version to match during discovery.
    pub snap_version: Option<String>,
    /// Chain id the swap is allowed to execute on.
    pub chain_id: u64,
    /// Uniswap `SwapRouter02` address.
    pub router_address: String,
    /// Input token: the wrapped native asset, supplied by value.
    pub token_in: String,
    /// Output token bought by the fixed-amount swap.
    pub token_out: String,
    /// Pool fee tier in hundredths of a bip.
    pub pool_fee: u32,
    /// Fixed swap input in whole native units (decimal string).
    pub swap_amount: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            wallet_rpc_url: "http://127.0.0.1:8545".into(),
            snap_id: "npm:@firnprotocol/snap".into(),
            snap_version: None,
            chain_id: MAINNET_CHAIN_ID,
            // Mainnet SwapRouter02 / WETH9 / USDC.
            router_address: "0x68b3465833fb72A70ecDF485E0e4C7bD8665Fc45".into(),
            token_in: "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2".into(),
            token_out: "0xA0b86991c6218b36c1d19d4a2e9eb0ce3606eb48".into(),
            pool_fee: 3000,
            swap_amount: "0.1".into(),
        }
    }
}

/// Apply environment variable overrides to the config.
fn apply_env_overrides(cfg: &mut BridgeConfig) {
    /// Helper: if an env var is set and non-empty, apply `setter` with the trimmed value.
    fn apply_env(var: &str, setter: impl FnOnce(&str)) {
        if let Ok(u) = std::env::var(var) {
            let t = u.trim();
            if !t.is_empty() {
                setter(t);
            }
        }
    }

    apply_env("SNAPBRIDGE_WALLET_RPC_URL", |v| {
        v.clone_into(&mut cfg.wallet_rpc_url);
    });
    apply_env("SNAPBRIDGE_SNAP_ID", |v| {
        v.clone_into(&mut cfg.snap_id);
    });
    apply_env("SNAPBRIDGE_SNAP_VERSION", |v| {
        cfg.snap_version = Some(v.to_owned());
    });
    apply_env("SNAPBRIDGE_TOKEN_OUT", |v| {
        v.clone_into(&mut cfg.token_out);
    });
}

impl BridgeConfig {
    /// Load the config from an optional TOML file, then apply env overrides.
    ///
    /// A missing file is not an error; defaults apply.
    pub fn load(path: Option<&Path>) -> eyre::Result<Self> {
        let mut cfg = match path {
            Some(p) if p.exists() => {
                let raw = std::fs::read_to_string(p)
                    .with_context(|| format!("read config file {}", p.display()))?;
                toml::from_str(&raw).context("parse config file")?
            }
            Some(_) | None => Self::default(),
        };
        apply_env_overrides(&mut cfg);
        Ok(cfg)
    }
}
