//! Unsigned swap construction: a single-hop exact-input invocation of the
//! router's fixed-fee pool.
//!
//! Signing, broadcasting, and confirmation all happen inside the snap
//! sandbox; this module only assembles the payload.

use crate::amount::parse_amount_ui_to_base_u128;
use crate::config::BridgeConfig;
use crate::errors::BridgeError;
use crate::provider::WalletProvider;
use alloy::{
    primitives::{Address, Bytes, Uint, U256},
    sol,
    sol_types::SolCall as _,
};
use serde_json::{json, Value};
use std::str::FromStr as _;

/// Largest value representable in the router's `uint24` fee field.
const MAX_FEE_TIER: u32 = (1 << 24) - 1;

sol! {
    contract ISwapRouter {
        struct ExactInputSingleParams {
            address tokenIn;
            address tokenOut;
            uint24 fee;
            address recipient;
            uint256 amountIn;
            uint256 amountOutMinimum;
            uint160 sqrtPriceLimitX96;
        }
        function exactInputSingle(ExactInputSingleParams params)
            external payable returns (uint256 amountOut);
    }
}

/// A fully parameterized, unsigned swap call.
///
/// `amount_out_minimum` and `price_limit` are always zero: the original
/// design deliberately carries no slippage protection. That is a documented
/// risk, preserved faithfully, not a bug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapTransaction {
    pub router: Address,
    pub token_in: Address,
    pub token_out: Address,
    pub fee_tier: u32,
    pub recipient: Address,
    pub amount_in: U256,
    pub amount_out_minimum: U256,
    pub price_limit: U256,
    /// Native value attached to the call; equals `amount_in` because the
    /// input token is the wrapped native asset, supplied by value rather
    /// than prior approval.
    pub value: U256,
}

impl SwapTransaction {
    /// ABI-encoded `exactInputSingle` calldata.
    pub fn calldata(&self) -> Bytes {
        let call = ISwapRouter::exactInputSingleCall {
            params: ISwapRouter::ExactInputSingleParams {
                tokenIn: self.token_in,
                tokenOut: self.token_out,
                fee: Uint::from(self.fee_tier),
                recipient: self.recipient,
                amountIn: self.amount_in,
                amountOutMinimum: self.amount_out_minimum,
                sqrtPriceLimitX96: Uint::from(self.price_limit),
            },
        };
        Bytes::from(call.abi_encode())
    }

    /// The unsigned transaction object handed to the snap's `transact`.
    pub fn invoke_params(&self) -> Value {
        json!({
            "from": format!("{:#x}", self.recipient),
            "to": format!("{:#x}", self.router),
            "data": self.calldata().to_string(),
            "value": format!("{:#x}", self.value),
        })
    }
}

fn parse_addr(s: &str, field: &str) -> Result<Address, BridgeError> {
    Address::from_str(s).map_err(|e| BridgeError::Validation(format!("{field}: {e}")))
}

fn parse_chain_id(v: &Value) -> Result<u64, BridgeError> {
    let s = v
        .as_str()
        .ok_or_else(|| BridgeError::MalformedResponse(format!("chain id: {v}")))?;
    let digits = s.strip_prefix("0x").unwrap_or(s);
    u64::from_str_radix(digits, 16)
        .map_err(|e| BridgeError::MalformedResponse(format!("chain id {s}: {e}")))
}

/// Build the unsigned swap transaction.
///
/// Static inputs are validated before any network call; then the connected
/// account list and active chain id are read through the gateway. The chain
/// id must equal the configured mainnet id, guarding against routing funds on
/// a test network or fork where the router/token addresses are meaningless or
/// dangerous. Given the same account/chain this is referentially transparent,
/// so it tests offline against a stub provider.
pub async fn build_swap<P: WalletProvider>(
    provider: &P,
    cfg: &BridgeConfig,
) -> Result<SwapTransaction, BridgeError> {
    let router = parse_addr(&cfg.router_address, "router_address")?;
    let token_in = parse_addr(&cfg.token_in, "token_in")?;
    let token_out = parse_addr(&cfg.token_out, "token_out")?;
    let amount_in = parse_amount_ui_to_base_u128(&cfg.swap_amount, 18)
        .map_err(|e| BridgeError::Validation(format!("swap_amount: {e}")))?;
    let amount_in = U256::from(amount_in);
    if cfg.pool_fee > MAX_FEE_TIER {
        return Err(BridgeError::Validation(format!(
            "pool_fee {} exceeds the uint24 fee field (max {MAX_FEE_TIER})",
            cfg.pool_fee
        )));
    }

    let accounts_raw = provider
        .request("eth_accounts", json!([]))
        .await
        .map_err(BridgeError::ProviderUnavailable)?;
    let accounts: Vec<String> = serde_json::from_value(accounts_raw)
        .map_err(|e| BridgeError::MalformedResponse(format!("accounts: {e}")))?;
    let recipient = accounts
        .first()
        .ok_or_else(|| BridgeError::Validation("wallet returned no accounts".into()))?;
    let recipient = Address::from_str(recipient)
        .map_err(|e| BridgeError::MalformedResponse(format!("account address: {e}")))?;

    let chain_id_raw = provider
        .request("eth_chainId", json!([]))
        .await
        .map_err(BridgeError::ProviderUnavailable)?;
    let chain_id = parse_chain_id(&chain_id_raw)?;
    if chain_id != cfg.chain_id {
        return Err(BridgeError::WrongNetwork(format!(
            "connected to chain id {chain_id}, but this swap routes through mainnet \
             contracts (chain id {}). Switch the wallet network and retry.",
            cfg.chain_id
        )));
    }

    Ok(SwapTransaction {
        router,
        token_in,
        token_out,
        fee_tier: cfg.pool_fee,
        recipient,
        amount_in,
        amount_out_minimum: U256::ZERO,
        price_limit: U256::ZERO,
        value: amount_in,
    })
}
