//! Chain access trait
//!
//! Every flow in the client reaches the node through [`ChainClient`]. The
//! ethers implementation lives in `rpc_client`; `testing::MockChain` is an
//! in-memory chain for tests.

use async_trait::async_trait;
use ethers::types::{Address, Log, H256, U256};
use serde::Serialize;
use std::time::Duration;

use crate::error::Result;

/// Receipt summary of a mined transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TxOutcome {
    pub hash: H256,
    pub gas_used: U256,
    pub effective_gas_price: U256,
    pub success: bool,
    pub block_number: u64,
}

impl TxOutcome {
    /// Total fee paid in wei
    pub fn gas_cost(&self) -> U256 {
        self.gas_used.saturating_mul(self.effective_gas_price)
    }
}

/// Everything the history view shows about one transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxDetails {
    pub outcome: TxOutcome,
    pub timestamp: u64,
    pub nonce: u64,
}

/// Raw pair state as stored on-chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairState {
    pub token0: Address,
    pub token1: Address,
    pub reserve0: U256,
    pub reserve1: U256,
}

/// Addresses a router was deployed against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouterLinks {
    pub factory: Address,
    pub weth: Address,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapRequest {
    pub amount_in: U256,
    pub amount_out_min: U256,
    pub path: Vec<Address>,
    pub to: Address,
    pub deadline: U256,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiquidityRequest {
    pub token_a: Address,
    pub token_b: Address,
    pub amount_a_desired: U256,
    pub amount_b_desired: U256,
    pub amount_a_min: U256,
    pub amount_b_min: U256,
    pub to: Address,
    pub deadline: U256,
}

/// Pair `Swap` logs whose indexed `to` equals `recipient`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapLogQuery {
    pub pair: Address,
    pub recipient: Address,
    pub from_block: u64,
    pub to_block: u64,
}

#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Account that signs and pays for submitted transactions
    fn account(&self) -> Address;

    async fn chain_id(&self) -> Result<u64>;
    async fn block_number(&self) -> Result<u64>;
    async fn gas_price(&self) -> Result<U256>;
    async fn eth_balance(&self, owner: Address) -> Result<U256>;
    async fn code_size(&self, address: Address) -> Result<usize>;

    // ERC-20
    async fn token_balance(&self, token: Address, owner: Address) -> Result<U256>;
    async fn allowance(&self, token: Address, owner: Address, spender: Address) -> Result<U256>;
    async fn send_approve(&self, token: Address, spender: Address, amount: U256, gas: u64) -> Result<H256>;

    // WETH / MockDAI
    async fn estimate_deposit_gas(&self, weth: Address, value: U256) -> Result<U256>;
    async fn send_deposit(&self, weth: Address, value: U256, gas: u64) -> Result<H256>;
    async fn send_withdraw(&self, weth: Address, amount: U256, gas: u64) -> Result<H256>;
    async fn send_mint(&self, token: Address, to: Address, amount: U256, gas: u64) -> Result<H256>;

    // Uniswap V2
    async fn get_pair(&self, factory: Address, token_a: Address, token_b: Address) -> Result<Address>;
    async fn pair_state(&self, pair: Address) -> Result<PairState>;
    async fn router_links(&self, router: Address) -> Result<RouterLinks>;
    async fn amounts_out(&self, router: Address, amount_in: U256, path: &[Address]) -> Result<Vec<U256>>;
    async fn send_swap(&self, router: Address, request: SwapRequest, gas: u64) -> Result<H256>;
    async fn send_add_liquidity(&self, router: Address, request: LiquidityRequest, gas: u64) -> Result<H256>;

    // Receipts and logs
    async fn wait_for_receipt(&self, hash: H256, timeout: Duration) -> Result<TxOutcome>;
    async fn tx_details(&self, hash: H256) -> Result<TxDetails>;
    async fn swap_logs(&self, query: SwapLogQuery) -> Result<Vec<Log>>;
}
