//! Balance and pool reader
//!
//! Every call re-fetches from the node; nothing is cached between reads.

use ethers::types::{Address, U256};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use swapdesk_amm::{SlippageTolerance, V2Math};
use swapdesk_config::ContractAddresses;

use crate::chain::ChainClient;
use crate::error::{ClientError, Result};
use crate::wallet::WalletSession;

/// Gas used by a plain ETH transfer
pub const TRANSFER_GAS: u64 = 21_000;

/// Largest value the deposit gas estimate is requested for (1 ETH)
const DEPOSIT_ESTIMATE_CAP_WEI: u64 = 1_000_000_000_000_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Balances {
    pub eth: U256,
    pub weth: U256,
    pub dai: U256,
}

/// WETH/DAI pool reserves oriented by token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolSnapshot {
    pub pair: Address,
    pub reserve_weth: U256,
    pub reserve_dai: U256,
    pub weth_is_token0: bool,
}

impl PoolSnapshot {
    pub fn has_liquidity(&self) -> bool {
        !self.reserve_weth.is_zero() && !self.reserve_dai.is_zero()
    }
}

/// Largest wrappable amount after paying for the deposit
///
/// `gas_limit` is the limit the deposit is submitted with (estimate plus
/// the wrap buffer), so wrapping exactly `max_amount` passes the node's
/// upfront balance check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WrapQuote {
    pub eth_balance: U256,
    pub weth_balance: U256,
    pub gas_price: U256,
    pub gas_limit: U256,
    pub gas_cost: U256,
    pub max_amount: U256,
}

/// Largest sendable amount after paying for a plain transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransactQuote {
    pub eth_balance: U256,
    pub gas_price: U256,
    pub gas_cost: U256,
    pub max_amount: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SwapPreview {
    pub amount_in: U256,
    pub expected_out: U256,
    pub min_out: U256,
    /// Percentage, fee excluded
    pub price_impact: Decimal,
}

#[derive(Clone)]
pub struct BalanceReader {
    session: Arc<WalletSession>,
    addresses: ContractAddresses,
    tolerance: SlippageTolerance,
    wrap_buffer: u64,
}

impl BalanceReader {
    pub fn new(
        session: Arc<WalletSession>,
        addresses: ContractAddresses,
        tolerance: SlippageTolerance,
    ) -> Self {
        Self {
            session,
            addresses,
            tolerance,
            wrap_buffer: 0,
        }
    }

    /// Extra gas added on top of the deposit estimate
    pub fn with_wrap_buffer(mut self, wrap_buffer: u64) -> Self {
        self.wrap_buffer = wrap_buffer;
        self
    }

    pub async fn balances(&self, owner: Address) -> Result<Balances> {
        let client = self.session.client()?;
        let (eth, weth, dai) = futures::try_join!(
            client.eth_balance(owner),
            client.token_balance(self.addresses.weth, owner),
            client.token_balance(self.addresses.dai, owner),
        )?;
        debug!("Balances of {:?}: eth={} weth={} dai={}", owner, eth, weth, dai);
        Ok(Balances { eth, weth, dai })
    }

    /// Balances of the connected account
    pub async fn own_balances(&self) -> Result<Balances> {
        let owner = self.session.client()?.account();
        self.balances(owner).await
    }

    pub async fn pool_snapshot(&self) -> Result<PoolSnapshot> {
        let client = self.session.client()?;
        snapshot(client.as_ref(), &self.addresses).await
    }

    pub async fn wrap_quote(&self, owner: Address) -> Result<WrapQuote> {
        let client = self.session.client()?;
        let (eth_balance, weth_balance, gas_price) = futures::try_join!(
            client.eth_balance(owner),
            client.token_balance(self.addresses.weth, owner),
            client.gas_price(),
        )?;

        let estimate_value = eth_balance.min(U256::from(DEPOSIT_ESTIMATE_CAP_WEI));
        let estimate = client.estimate_deposit_gas(self.addresses.weth, estimate_value).await?;
        let gas_limit = estimate.saturating_add(U256::from(self.wrap_buffer));
        let gas_cost = gas_price.saturating_mul(gas_limit);

        Ok(WrapQuote {
            eth_balance,
            weth_balance,
            gas_price,
            gas_limit,
            gas_cost,
            max_amount: eth_balance.saturating_sub(gas_cost),
        })
    }

    pub async fn max_transact(&self, owner: Address) -> Result<TransactQuote> {
        let client = self.session.client()?;
        let (eth_balance, gas_price) =
            futures::try_join!(client.eth_balance(owner), client.gas_price())?;
        let gas_cost = gas_price.saturating_mul(U256::from(TRANSFER_GAS));

        Ok(TransactQuote {
            eth_balance,
            gas_price,
            gas_cost,
            max_amount: eth_balance.saturating_sub(gas_cost),
        })
    }

    /// Router quote for selling `amount_in` WETH for DAI
    pub async fn swap_preview(&self, amount_in: U256) -> Result<SwapPreview> {
        let client = self.session.client()?;
        let pool = snapshot(client.as_ref(), &self.addresses).await?;
        if !pool.has_liquidity() {
            return Err(ClientError::InsufficientLiquidity);
        }

        let path = [self.addresses.weth, self.addresses.dai];
        let amounts = client.amounts_out(self.addresses.router, amount_in, &path).await?;
        let expected_out = amounts.last().copied().unwrap_or_default();
        let price_impact =
            V2Math::calculate_price_impact(amount_in, pool.reserve_weth, pool.reserve_dai)?;

        Ok(SwapPreview {
            amount_in,
            expected_out,
            min_out: self.tolerance.minimum_amount(expected_out),
            price_impact,
        })
    }
}

/// Pair lookup through the factory and reserves oriented to WETH/DAI
pub(crate) async fn snapshot(
    client: &dyn ChainClient,
    addresses: &ContractAddresses,
) -> Result<PoolSnapshot> {
    let pair = client
        .get_pair(addresses.factory, addresses.weth, addresses.dai)
        .await?;
    if pair.is_zero() {
        return Err(ClientError::PoolNotFound);
    }

    let state = client.pair_state(pair).await?;
    let weth_is_token0 = state.token0 == addresses.weth;
    let (reserve_weth, reserve_dai) = if weth_is_token0 {
        (state.reserve0, state.reserve1)
    } else {
        (state.reserve1, state.reserve0)
    };

    Ok(PoolSnapshot {
        pair,
        reserve_weth,
        reserve_dai,
        weth_is_token0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ether, MockChain};

    async fn reader_with(chain: Arc<MockChain>) -> BalanceReader {
        let session = Arc::new(WalletSession::new());
        session.attach(chain.clone()).await.unwrap();
        BalanceReader::new(session, chain.addresses(), SlippageTolerance::default())
    }

    #[tokio::test]
    async fn test_balances() {
        let chain = Arc::new(MockChain::funded());
        let reader = reader_with(chain.clone()).await;

        let balances = reader.own_balances().await.unwrap();
        assert_eq!(balances.eth, ether(100));
        assert_eq!(balances.weth, ether(10));
        assert_eq!(balances.dai, U256::zero());
    }

    #[tokio::test]
    async fn test_reads_require_connection() {
        let chain = MockChain::funded();
        let reader = BalanceReader::new(
            Arc::new(WalletSession::new()),
            chain.addresses(),
            SlippageTolerance::default(),
        );
        assert!(matches!(
            reader.pool_snapshot().await,
            Err(ClientError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn test_pool_snapshot_orientation() {
        let chain = Arc::new(MockChain::funded());
        chain.seed_pool(ether(10), ether(20_000));
        let reader = reader_with(chain.clone()).await;

        let pool = reader.pool_snapshot().await.unwrap();
        assert_eq!(pool.pair, chain.addresses().weth_dai_pair);
        assert_eq!(pool.reserve_weth, ether(10));
        assert_eq!(pool.reserve_dai, ether(20_000));
        assert!(pool.has_liquidity());
    }

    #[tokio::test]
    async fn test_missing_pool() {
        let chain = Arc::new(MockChain::funded());
        chain.remove_pair();
        let reader = reader_with(chain).await;

        let err = reader.pool_snapshot().await.unwrap_err();
        assert_eq!(err.to_string(), "Pool does not exist");
    }

    #[tokio::test]
    async fn test_wrap_quote_subtracts_estimated_gas() {
        let chain = Arc::new(MockChain::funded());
        let reader = reader_with(chain.clone()).await;

        let quote = reader.wrap_quote(chain.account_address()).await.unwrap();
        let expected_cost = MockChain::GAS_PRICE * U256::from(MockChain::DEPOSIT_ESTIMATE);
        assert_eq!(quote.gas_limit, U256::from(MockChain::DEPOSIT_ESTIMATE));
        assert_eq!(quote.gas_cost, expected_cost);
        assert_eq!(quote.max_amount, ether(100) - expected_cost);
    }

    #[tokio::test]
    async fn test_wrap_quote_includes_buffer() {
        let chain = Arc::new(MockChain::funded());
        let reader = reader_with(chain.clone()).await.with_wrap_buffer(10_000);

        let quote = reader.wrap_quote(chain.account_address()).await.unwrap();
        let limit = U256::from(MockChain::DEPOSIT_ESTIMATE + 10_000);
        assert_eq!(quote.gas_limit, limit);
        assert_eq!(quote.gas_cost, MockChain::GAS_PRICE * limit);
        assert_eq!(quote.max_amount, ether(100) - quote.gas_cost);
    }

    #[tokio::test]
    async fn test_wrap_quote_saturates_on_dust() {
        let chain = Arc::new(MockChain::funded());
        chain.set_eth_balance(chain.account_address(), U256::from(1000u64));
        let reader = reader_with(chain.clone()).await;

        let quote = reader.wrap_quote(chain.account_address()).await.unwrap();
        assert_eq!(quote.max_amount, U256::zero());
    }

    #[tokio::test]
    async fn test_max_transact() {
        let chain = Arc::new(MockChain::funded());
        let reader = reader_with(chain.clone()).await;

        let quote = reader.max_transact(chain.account_address()).await.unwrap();
        assert_eq!(quote.gas_cost, MockChain::GAS_PRICE * U256::from(TRANSFER_GAS));
        assert_eq!(quote.max_amount, ether(100) - quote.gas_cost);
    }

    #[tokio::test]
    async fn test_swap_preview() {
        let chain = Arc::new(MockChain::funded());
        chain.seed_pool(ether(10), ether(20_000));
        let reader = reader_with(chain).await;

        let preview = reader.swap_preview(ether(1)).await.unwrap();
        let expected =
            V2Math::get_amount_out(ether(1), ether(10), ether(20_000), swapdesk_amm::DEFAULT_FEE_BPS)
                .unwrap();
        assert_eq!(preview.expected_out, expected);
        assert_eq!(preview.min_out, expected * U256::from(99u64) / U256::from(100u64));
        assert!(preview.price_impact > Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_swap_preview_on_deep_dai_reserve() {
        let chain = Arc::new(MockChain::funded());
        chain.seed_pool(ether(10), ether(100_000_000_000));
        let reader = reader_with(chain).await;

        let preview = reader.swap_preview(ether(1)).await.unwrap();
        assert!(preview.expected_out > ether(9_000_000_000));
        assert!(preview.price_impact > Decimal::from(17));
        assert!(preview.price_impact < Decimal::from(18));
    }

    #[tokio::test]
    async fn test_swap_preview_empty_pool() {
        let chain = Arc::new(MockChain::funded());
        let reader = reader_with(chain).await;

        let err = reader.swap_preview(ether(1)).await.unwrap_err();
        assert_eq!(err.to_string(), "Insufficient liquidity in the pool");
    }
}
