//! Testing utilities
//!
//! [`MockChain`] is an in-memory chain behind the [`ChainClient`] seam. It
//! keeps ETH and token balances, allowances and one V2 pool per token pair,
//! settles swaps and liquidity with the pair formulas from `swapdesk-amm`
//! and emits pair `Swap` logs, so every flow can run without a node.
//!
//! Reverting calls fail at submission with a ganache-style
//! `VM Exception while processing transaction: revert ...` message.

use async_trait::async_trait;
use ethabi::Token;
use ethers::types::{Address, Bytes, Log, H256, U256, U64};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;

use swapdesk_amm::{V2Math, V2PoolState};
use swapdesk_config::ContractAddresses;
use swapdesk_dex::{SwapEventDecoder, UNISWAP_V2_SWAP};

use crate::chain::{
    ChainClient, LiquidityRequest, PairState, RouterLinks, SwapLogQuery, SwapRequest, TxDetails,
    TxOutcome,
};
use crate::error::{ClientError, Result};

/// `n` whole tokens (18 decimals) in wei
pub fn ether(n: u64) -> U256 {
    U256::from(n) * U256::exp10(18)
}

#[derive(Debug, Clone, Copy)]
struct Pool {
    token0: Address,
    token1: Address,
    reserve0: U256,
    reserve1: U256,
}

impl Pool {
    fn new(token_a: Address, token_b: Address) -> Self {
        let (token0, token1) = sort_tokens(token_a, token_b);
        Self {
            token0,
            token1,
            reserve0: U256::zero(),
            reserve1: U256::zero(),
        }
    }

    /// Reserves as (reserve of `token`, reserve of the other side)
    fn oriented(&self, token: Address) -> (U256, U256) {
        if token == self.token0 {
            (self.reserve0, self.reserve1)
        } else {
            (self.reserve1, self.reserve0)
        }
    }

    fn add(&mut self, token: Address, amount_token: U256, amount_other: U256) {
        if token == self.token0 {
            self.reserve0 += amount_token;
            self.reserve1 += amount_other;
        } else {
            self.reserve1 += amount_token;
            self.reserve0 += amount_other;
        }
    }
}

fn sort_tokens(a: Address, b: Address) -> (Address, Address) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

#[derive(Clone)]
struct ChainState {
    chain_id: u64,
    block: u64,
    timestamp: u64,
    nonce: u64,
    eth: HashMap<Address, U256>,
    tokens: HashMap<(Address, Address), U256>,
    allowances: HashMap<(Address, Address, Address), U256>,
    code: HashMap<Address, usize>,
    pairs: HashMap<(Address, Address), Address>,
    pools: HashMap<Address, Pool>,
    router_links: Option<RouterLinks>,
    receipts: HashMap<H256, TxDetails>,
    logs: Vec<Log>,
    sent: Vec<&'static str>,
    fail_log_queries: bool,
    reject_next: Option<(String, Option<i64>)>,
    receipt_delay: Option<Duration>,
}

pub struct MockChain {
    account: Address,
    addresses: ContractAddresses,
    state: Mutex<ChainState>,
}

impl MockChain {
    pub const GAS_PRICE: U256 = U256([20_000_000_000, 0, 0, 0]);
    pub const CHAIN_ID: u64 = 1337;
    pub const DEPOSIT_ESTIMATE: u64 = 45_000;

    pub const DEPOSIT_GAS_USED: u64 = 45_000;
    pub const WITHDRAW_GAS_USED: u64 = 35_000;
    pub const APPROVE_GAS_USED: u64 = 46_000;
    pub const MINT_GAS_USED: u64 = 51_000;
    pub const SWAP_GAS_USED: u64 = 110_000;
    pub const ADD_LIQUIDITY_GAS_USED: u64 = 180_000;

    /// Empty chain with the default local deployment addresses and no code
    pub fn new(account: Address) -> Self {
        let addresses = ContractAddresses::default();
        let state = ChainState {
            chain_id: Self::CHAIN_ID,
            block: 100,
            timestamp: u64::try_from(chrono::Utc::now().timestamp()).unwrap_or_default(),
            nonce: 0,
            eth: HashMap::new(),
            tokens: HashMap::new(),
            allowances: HashMap::new(),
            code: HashMap::new(),
            pairs: HashMap::new(),
            pools: HashMap::new(),
            router_links: Some(RouterLinks {
                factory: addresses.factory,
                weth: addresses.weth,
            }),
            receipts: HashMap::new(),
            logs: Vec::new(),
            sent: Vec::new(),
            fail_log_queries: false,
            reject_next: None,
            receipt_delay: None,
        };

        Self {
            account,
            addresses,
            state: Mutex::new(state),
        }
    }

    /// Deployed contracts, an empty WETH/DAI pair and an account holding
    /// 100 ETH and 10 WETH
    pub fn funded() -> Self {
        let chain = Self::new(Address::repeat_byte(0x11));
        let addresses = chain.addresses;
        {
            let mut state = chain.state.lock();
            for (_, address) in addresses.labelled() {
                state.code.insert(address, 2_048);
            }
            let key = sort_tokens(addresses.weth, addresses.dai);
            state.pairs.insert(key, addresses.weth_dai_pair);
            state
                .pools
                .insert(addresses.weth_dai_pair, Pool::new(addresses.weth, addresses.dai));
            state.eth.insert(chain.account, ether(100));
            state.tokens.insert((addresses.weth, chain.account), ether(10));
        }
        chain
    }

    pub fn addresses(&self) -> ContractAddresses {
        self.addresses
    }

    pub fn account_address(&self) -> Address {
        self.account
    }

    /// Add reserves to the WETH/DAI pool, creating it if needed
    pub fn seed_pool(&self, weth: U256, dai: U256) {
        let addresses = self.addresses;
        let mut state = self.state.lock();
        let key = sort_tokens(addresses.weth, addresses.dai);
        let pair = *state.pairs.entry(key).or_insert(addresses.weth_dai_pair);
        state
            .pools
            .entry(pair)
            .or_insert_with(|| Pool::new(addresses.weth, addresses.dai))
            .add(addresses.weth, weth, dai);
    }

    pub fn remove_pair(&self) {
        let key = sort_tokens(self.addresses.weth, self.addresses.dai);
        let mut state = self.state.lock();
        if let Some(pair) = state.pairs.remove(&key) {
            state.pools.remove(&pair);
        }
    }

    pub fn set_chain_id(&self, chain_id: u64) {
        self.state.lock().chain_id = chain_id;
    }

    pub fn set_eth_balance(&self, owner: Address, amount: U256) {
        self.state.lock().eth.insert(owner, amount);
    }

    pub fn set_token_balance(&self, token: Address, owner: Address, amount: U256) {
        self.state.lock().tokens.insert((token, owner), amount);
    }

    pub fn set_allowance(&self, token: Address, owner: Address, spender: Address, amount: U256) {
        self.state
            .lock()
            .allowances
            .insert((token, owner, spender), amount);
    }

    pub fn set_code_size(&self, address: Address, size: usize) {
        self.state.lock().code.insert(address, size);
    }

    /// `None` makes `router.factory()` / `router.WETH()` fail
    pub fn set_router_links(&self, links: Option<RouterLinks>) {
        self.state.lock().router_links = links;
    }

    pub fn fail_log_queries(&self, fail: bool) {
        self.state.lock().fail_log_queries = fail;
    }

    /// The next submission fails with `message` (and wallet error `code`)
    pub fn reject_next(&self, message: &str, code: Option<i64>) {
        self.state.lock().reject_next = Some((message.to_string(), code));
    }

    /// Delay every receipt, keeping an action in flight
    pub fn set_receipt_delay(&self, delay: Duration) {
        self.state.lock().receipt_delay = Some(delay);
    }

    pub fn push_log(&self, log: Log) {
        self.state.lock().logs.push(log);
    }

    pub fn eth_of(&self, owner: Address) -> U256 {
        self.state.lock().eth.get(&owner).copied().unwrap_or_default()
    }

    pub fn token_of(&self, token: Address, owner: Address) -> U256 {
        self.state
            .lock()
            .tokens
            .get(&(token, owner))
            .copied()
            .unwrap_or_default()
    }

    pub fn allowance_of(&self, token: Address, owner: Address, spender: Address) -> U256 {
        self.state
            .lock()
            .allowances
            .get(&(token, owner, spender))
            .copied()
            .unwrap_or_default()
    }

    /// Kinds of all successfully submitted transactions, in order
    pub fn sent(&self) -> Vec<&'static str> {
        self.state.lock().sent.clone()
    }

    fn submit<F>(&self, kind: &'static str, value: U256, gas_limit: u64, gas_used: u64, apply: F) -> Result<H256>
    where
        F: FnOnce(&mut ChainState, &mut Vec<Log>) -> std::result::Result<(), String>,
    {
        let mut state = self.state.lock();

        if let Some((message, code)) = state.reject_next.take() {
            return Err(ClientError::classify(&message, code));
        }

        let balance = state.eth.get(&self.account).copied().unwrap_or_default();
        let upfront = value + Self::GAS_PRICE * U256::from(gas_limit);
        if balance < upfront {
            return Err(ClientError::classify(
                "insufficient funds for gas * price + value",
                Some(-32000),
            ));
        }

        // A revert leaves no trace
        let before = state.clone();
        let mut logs = Vec::new();
        if let Err(reason) = apply(&mut *state, &mut logs) {
            *state = before;
            return Err(ClientError::classify(
                &format!("VM Exception while processing transaction: revert {}", reason),
                Some(-32000),
            ));
        }

        let fee = Self::GAS_PRICE * U256::from(gas_used);
        let account_eth = state.eth.entry(self.account).or_default();
        *account_eth = account_eth.saturating_sub(fee);

        state.nonce += 1;
        state.block += 1;
        state.timestamp += 12;
        let hash = H256::from_low_u64_be(0xd00d_0000 + state.nonce);

        for mut log in logs {
            log.transaction_hash = Some(hash);
            log.block_number = Some(U64::from(state.block));
            state.logs.push(log);
        }

        let details = TxDetails {
            outcome: TxOutcome {
                hash,
                gas_used: U256::from(gas_used),
                effective_gas_price: Self::GAS_PRICE,
                success: true,
                block_number: state.block,
            },
            timestamp: state.timestamp,
            nonce: state.nonce - 1,
        };
        state.receipts.insert(hash, details);
        state.sent.push(kind);
        Ok(hash)
    }

    fn token_balance_mut<'a>(state: &'a mut ChainState, token: Address, owner: Address) -> &'a mut U256 {
        state.tokens.entry((token, owner)).or_default()
    }

    /// ERC-20 `transferFrom` by `spender`, as the router pulls tokens
    fn pull(state: &mut ChainState, token: Address, owner: Address, spender: Address, amount: U256) -> std::result::Result<(), String> {
        let allowance = state
            .allowances
            .get(&(token, owner, spender))
            .copied()
            .unwrap_or_default();
        let balance = state.tokens.get(&(token, owner)).copied().unwrap_or_default();
        if allowance < amount || balance < amount {
            return Err("TransferHelper: TRANSFER_FROM_FAILED".to_string());
        }
        state.allowances.insert((token, owner, spender), allowance - amount);
        state.tokens.insert((token, owner), balance - amount);
        Ok(())
    }

    fn swap_log(pair: Address, pool: &Pool, token_in: Address, sender: Address, to: Address, amount_in: U256, amount_out: U256) -> Log {
        let zero = U256::zero();
        let (a0_in, a1_in, a0_out, a1_out) = if token_in == pool.token0 {
            (amount_in, zero, zero, amount_out)
        } else {
            (zero, amount_in, amount_out, zero)
        };
        let data = ethabi::encode(&[
            Token::Uint(a0_in),
            Token::Uint(a1_in),
            Token::Uint(a0_out),
            Token::Uint(a1_out),
        ]);

        Log {
            address: pair,
            topics: vec![
                UNISWAP_V2_SWAP,
                SwapEventDecoder::address_topic(sender),
                SwapEventDecoder::address_topic(to),
            ],
            data: Bytes::from(data),
            ..Default::default()
        }
    }
}

#[async_trait]
impl ChainClient for MockChain {
    fn account(&self) -> Address {
        self.account
    }

    async fn chain_id(&self) -> Result<u64> {
        Ok(self.state.lock().chain_id)
    }

    async fn block_number(&self) -> Result<u64> {
        Ok(self.state.lock().block)
    }

    async fn gas_price(&self) -> Result<U256> {
        Ok(Self::GAS_PRICE)
    }

    async fn eth_balance(&self, owner: Address) -> Result<U256> {
        Ok(self.eth_of(owner))
    }

    async fn code_size(&self, address: Address) -> Result<usize> {
        Ok(self.state.lock().code.get(&address).copied().unwrap_or(0))
    }

    async fn token_balance(&self, token: Address, owner: Address) -> Result<U256> {
        Ok(self.token_of(token, owner))
    }

    async fn allowance(&self, token: Address, owner: Address, spender: Address) -> Result<U256> {
        Ok(self.allowance_of(token, owner, spender))
    }

    async fn send_approve(&self, token: Address, spender: Address, amount: U256, gas: u64) -> Result<H256> {
        let owner = self.account;
        self.submit("approve", U256::zero(), gas, Self::APPROVE_GAS_USED, |state, _| {
            state.allowances.insert((token, owner, spender), amount);
            Ok(())
        })
    }

    async fn estimate_deposit_gas(&self, _weth: Address, value: U256) -> Result<U256> {
        if value > self.eth_of(self.account) {
            return Err(ClientError::InsufficientFunds);
        }
        Ok(U256::from(Self::DEPOSIT_ESTIMATE))
    }

    async fn send_deposit(&self, weth: Address, value: U256, gas: u64) -> Result<H256> {
        let owner = self.account;
        self.submit("deposit", value, gas, Self::DEPOSIT_GAS_USED, |state, _| {
            let eth = state.eth.entry(owner).or_default();
            *eth -= value;
            *Self::token_balance_mut(state, weth, owner) += value;
            Ok(())
        })
    }

    async fn send_withdraw(&self, weth: Address, amount: U256, gas: u64) -> Result<H256> {
        let owner = self.account;
        self.submit("withdraw", U256::zero(), gas, Self::WITHDRAW_GAS_USED, |state, _| {
            let balance = Self::token_balance_mut(state, weth, owner);
            if *balance < amount {
                return Err(String::new());
            }
            *balance -= amount;
            *state.eth.entry(owner).or_default() += amount;
            Ok(())
        })
    }

    async fn send_mint(&self, token: Address, to: Address, amount: U256, gas: u64) -> Result<H256> {
        self.submit("mint", U256::zero(), gas, Self::MINT_GAS_USED, |state, _| {
            *Self::token_balance_mut(state, token, to) += amount;
            Ok(())
        })
    }

    async fn get_pair(&self, _factory: Address, token_a: Address, token_b: Address) -> Result<Address> {
        let key = sort_tokens(token_a, token_b);
        Ok(self.state.lock().pairs.get(&key).copied().unwrap_or_default())
    }

    async fn pair_state(&self, pair: Address) -> Result<PairState> {
        let state = self.state.lock();
        let pool = state
            .pools
            .get(&pair)
            .ok_or_else(|| ClientError::Contract(format!("no pair at {:?}", pair)))?;
        Ok(PairState {
            token0: pool.token0,
            token1: pool.token1,
            reserve0: pool.reserve0,
            reserve1: pool.reserve1,
        })
    }

    async fn router_links(&self, _router: Address) -> Result<RouterLinks> {
        self.state
            .lock()
            .router_links
            .ok_or_else(|| ClientError::Rpc("call to router failed".to_string()))
    }

    async fn amounts_out(&self, _router: Address, amount_in: U256, path: &[Address]) -> Result<Vec<U256>> {
        let state = self.state.lock();
        let mut hops = Vec::with_capacity(path.len().saturating_sub(1));
        for window in path.windows(2) {
            let pair = state
                .pairs
                .get(&sort_tokens(window[0], window[1]))
                .and_then(|pair| state.pools.get(pair))
                .ok_or_else(|| ClientError::Contract("UniswapV2Library: INVALID_PATH".to_string()))?;
            let (reserve_in, reserve_out) = pair.oriented(window[0]);
            hops.push(V2PoolState::new(reserve_in, reserve_out));
        }

        V2Math::get_amounts_out(amount_in, &hops)
            .map_err(|_| ClientError::Contract("UniswapV2Library: INSUFFICIENT_LIQUIDITY".to_string()))
    }

    async fn send_swap(&self, router: Address, request: SwapRequest, gas: u64) -> Result<H256> {
        let owner = self.account;
        self.submit("swap", U256::zero(), gas, Self::SWAP_GAS_USED, |state, logs| {
            if request.deadline < U256::from(state.timestamp) {
                return Err("UniswapV2Router: EXPIRED".to_string());
            }
            let [token_in, token_out] = request.path[..] else {
                return Err("UniswapV2Library: INVALID_PATH".to_string());
            };
            let pair = state
                .pairs
                .get(&sort_tokens(token_in, token_out))
                .copied()
                .ok_or_else(|| "UniswapV2Library: INVALID_PATH".to_string())?;
            let pool = state
                .pools
                .get(&pair)
                .copied()
                .ok_or_else(|| "UniswapV2Library: INVALID_PATH".to_string())?;

            let (reserve_in, reserve_out) = pool.oriented(token_in);
            let amount_out = V2PoolState::new(reserve_in, reserve_out)
                .amount_out(request.amount_in)
                .map_err(|_| "UniswapV2Library: INSUFFICIENT_LIQUIDITY".to_string())?;
            if amount_out < request.amount_out_min {
                return Err("UniswapV2Router: INSUFFICIENT_OUTPUT_AMOUNT".to_string());
            }

            Self::pull(state, token_in, owner, router, request.amount_in)?;
            *Self::token_balance_mut(state, token_out, request.to) += amount_out;

            if let Some(pool) = state.pools.get_mut(&pair) {
                if token_in == pool.token0 {
                    pool.reserve0 += request.amount_in;
                    pool.reserve1 -= amount_out;
                } else {
                    pool.reserve1 += request.amount_in;
                    pool.reserve0 -= amount_out;
                }
            }

            logs.push(Self::swap_log(
                pair,
                &pool,
                token_in,
                router,
                request.to,
                request.amount_in,
                amount_out,
            ));
            Ok(())
        })
    }

    async fn send_add_liquidity(&self, router: Address, request: LiquidityRequest, gas: u64) -> Result<H256> {
        let owner = self.account;
        let fallback_pair = self.addresses.weth_dai_pair;
        self.submit("add_liquidity", U256::zero(), gas, Self::ADD_LIQUIDITY_GAS_USED, |state, _| {
            if request.deadline < U256::from(state.timestamp) {
                return Err("UniswapV2Router: EXPIRED".to_string());
            }

            let key = sort_tokens(request.token_a, request.token_b);
            let pair = *state.pairs.entry(key).or_insert(fallback_pair);
            let pool = *state
                .pools
                .entry(pair)
                .or_insert_with(|| Pool::new(request.token_a, request.token_b));

            let (reserve_a, reserve_b) = pool.oriented(request.token_a);
            let amounts = V2Math::add_liquidity_amounts(
                request.amount_a_desired,
                request.amount_b_desired,
                request.amount_a_min,
                request.amount_b_min,
                reserve_a,
                reserve_b,
            )
            .map_err(|e| format!("UniswapV2Router: {}", e))?;

            Self::pull(state, request.token_a, owner, router, amounts.amount_a)?;
            Self::pull(state, request.token_b, owner, router, amounts.amount_b)?;

            if let Some(pool) = state.pools.get_mut(&pair) {
                pool.add(request.token_a, amounts.amount_a, amounts.amount_b);
            }
            Ok(())
        })
    }

    async fn wait_for_receipt(&self, hash: H256, timeout: Duration) -> Result<TxOutcome> {
        let delay = self.state.lock().receipt_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.state
            .lock()
            .receipts
            .get(&hash)
            .map(|details| details.outcome)
            .ok_or(ClientError::ConfirmationTimeout(hash, timeout.as_secs()))
    }

    async fn tx_details(&self, hash: H256) -> Result<TxDetails> {
        self.state
            .lock()
            .receipts
            .get(&hash)
            .copied()
            .ok_or_else(|| ClientError::Rpc(format!("No receipt for {:#x}", hash)))
    }

    async fn swap_logs(&self, query: SwapLogQuery) -> Result<Vec<Log>> {
        let state = self.state.lock();
        if state.fail_log_queries {
            return Err(ClientError::Rpc("log query failed".to_string()));
        }

        let recipient = SwapEventDecoder::address_topic(query.recipient);
        Ok(state
            .logs
            .iter()
            .filter(|log| {
                let block = log.block_number.map(|n| n.as_u64()).unwrap_or_default();
                log.address == query.pair
                    && log.topics.first() == Some(&UNISWAP_V2_SWAP)
                    && log.topics.get(2) == Some(&recipient)
                    && (query.from_block..=query.to_block).contains(&block)
            })
            .cloned()
            .collect())
    }
}
