//! JSON-RPC implementation of [`ChainClient`]
//!
//! Generic over the ethers middleware so the same code serves a local signing
//! wallet (`SignerMiddleware`) and node-managed accounts (`Provider` with a
//! default sender).

use async_trait::async_trait;
use ethers::abi::Detokenize;
use ethers::contract::{ContractCall, ContractError, EthError};
use ethers::providers::{Middleware, MiddlewareError};
use ethers::types::{Address, BlockNumber, Filter, Log, H256, U256};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use swapdesk_dex::{
    IMockDAI, IUniswapV2Factory, IUniswapV2Pair, IUniswapV2Router02, SwapEventDecoder, IERC20,
    IWETH, UNISWAP_V2_SWAP,
};

use crate::chain::{
    ChainClient, LiquidityRequest, PairState, RouterLinks, SwapLogQuery, SwapRequest, TxDetails,
    TxOutcome,
};
use crate::error::{ClientError, Result};

/// Receipt polling interval while waiting for confirmation
const RECEIPT_POLL_INTERVAL: Duration = Duration::from_millis(500);

pub struct EthersChain<M> {
    client: Arc<M>,
    account: Address,
}

impl<M: Middleware + 'static> EthersChain<M> {
    pub fn new(client: Arc<M>, account: Address) -> Self {
        Self { client, account }
    }

    /// Send through the middleware directly so a node error keeps its message
    async fn send<D: Detokenize>(&self, call: ContractCall<M, D>, label: &str) -> Result<H256> {
        let pending = self
            .client
            .send_transaction(call.tx, call.block)
            .await
            .map_err(node_error)?;
        let hash = pending.tx_hash();
        info!("📤 {} submitted: 0x{:x}", label, hash);
        Ok(hash)
    }
}

/// Map a failed send or estimate onto the client vocabulary
///
/// Nodes report reverts either as `Error(string)` data or only in the
/// message (ganache: `VM Exception while processing transaction: revert ..`).
fn node_error<E: MiddlewareError>(err: E) -> ClientError {
    let Some(response) = err.as_error_response() else {
        return ClientError::classify(&err.to_string(), None);
    };

    let reason = response
        .as_revert_data()
        .and_then(|data| String::decode_with_selector(&data));
    ClientError::classify(
        reason.as_deref().unwrap_or(&response.message),
        Some(response.code),
    )
}

/// Reads only become contract errors when the call reverted
fn read_error<M: Middleware>(err: ContractError<M>) -> ClientError {
    match err.decode_revert::<String>() {
        Some(reason) => ClientError::classify(&reason, None),
        None if err.is_revert() => ClientError::Contract(err.to_string()),
        None => ClientError::Rpc(err.to_string()),
    }
}

fn rpc_error<E: std::fmt::Display>(err: E) -> ClientError {
    ClientError::Rpc(err.to_string())
}

#[async_trait]
impl<M: Middleware + 'static> ChainClient for EthersChain<M> {
    fn account(&self) -> Address {
        self.account
    }

    async fn chain_id(&self) -> Result<u64> {
        let id = self.client.get_chainid().await.map_err(rpc_error)?;
        Ok(id.as_u64())
    }

    async fn block_number(&self) -> Result<u64> {
        let number = self.client.get_block_number().await.map_err(rpc_error)?;
        Ok(number.as_u64())
    }

    async fn gas_price(&self) -> Result<U256> {
        self.client.get_gas_price().await.map_err(rpc_error)
    }

    async fn eth_balance(&self, owner: Address) -> Result<U256> {
        self.client.get_balance(owner, None).await.map_err(rpc_error)
    }

    async fn code_size(&self, address: Address) -> Result<usize> {
        let code = self.client.get_code(address, None).await.map_err(rpc_error)?;
        Ok(code.len())
    }

    async fn token_balance(&self, token: Address, owner: Address) -> Result<U256> {
        IERC20::new(token, self.client.clone())
            .balance_of(owner)
            .call()
            .await
            .map_err(read_error::<M>)
    }

    async fn allowance(&self, token: Address, owner: Address, spender: Address) -> Result<U256> {
        IERC20::new(token, self.client.clone())
            .allowance(owner, spender)
            .call()
            .await
            .map_err(read_error::<M>)
    }

    async fn send_approve(&self, token: Address, spender: Address, amount: U256, gas: u64) -> Result<H256> {
        let erc20 = IERC20::new(token, self.client.clone());
        self.send(erc20.approve(spender, amount).gas(gas), "approve").await
    }

    async fn estimate_deposit_gas(&self, weth: Address, value: U256) -> Result<U256> {
        let call = IWETH::new(weth, self.client.clone())
            .deposit()
            .value(value)
            .from(self.account);
        self.client
            .estimate_gas(&call.tx, call.block)
            .await
            .map_err(node_error)
    }

    async fn send_deposit(&self, weth: Address, value: U256, gas: u64) -> Result<H256> {
        let weth = IWETH::new(weth, self.client.clone());
        self.send(weth.deposit().value(value).gas(gas), "deposit").await
    }

    async fn send_withdraw(&self, weth: Address, amount: U256, gas: u64) -> Result<H256> {
        let weth = IWETH::new(weth, self.client.clone());
        self.send(weth.withdraw(amount).gas(gas), "withdraw").await
    }

    async fn send_mint(&self, token: Address, to: Address, amount: U256, gas: u64) -> Result<H256> {
        let dai = IMockDAI::new(token, self.client.clone());
        self.send(dai.mint(to, amount).gas(gas), "mint").await
    }

    async fn get_pair(&self, factory: Address, token_a: Address, token_b: Address) -> Result<Address> {
        IUniswapV2Factory::new(factory, self.client.clone())
            .get_pair(token_a, token_b)
            .call()
            .await
            .map_err(read_error::<M>)
    }

    async fn pair_state(&self, pair: Address) -> Result<PairState> {
        let contract = IUniswapV2Pair::new(pair, self.client.clone());

        let (reserve0, reserve1, _last) = contract
            .get_reserves()
            .call()
            .await
            .map_err(read_error::<M>)?;
        let token0 = contract.token_0().call().await.map_err(read_error::<M>)?;
        let token1 = contract.token_1().call().await.map_err(read_error::<M>)?;

        Ok(PairState {
            token0,
            token1,
            reserve0: U256::from(reserve0),
            reserve1: U256::from(reserve1),
        })
    }

    async fn router_links(&self, router: Address) -> Result<RouterLinks> {
        let contract = IUniswapV2Router02::new(router, self.client.clone());
        let factory = contract.factory().call().await.map_err(read_error::<M>)?;
        let weth = contract.weth().call().await.map_err(read_error::<M>)?;
        Ok(RouterLinks { factory, weth })
    }

    async fn amounts_out(&self, router: Address, amount_in: U256, path: &[Address]) -> Result<Vec<U256>> {
        IUniswapV2Router02::new(router, self.client.clone())
            .get_amounts_out(amount_in, path.to_vec())
            .call()
            .await
            .map_err(read_error::<M>)
    }

    async fn send_swap(&self, router: Address, request: SwapRequest, gas: u64) -> Result<H256> {
        let contract = IUniswapV2Router02::new(router, self.client.clone());
        let call = contract
            .swap_exact_tokens_for_tokens(
                request.amount_in,
                request.amount_out_min,
                request.path,
                request.to,
                request.deadline,
            )
            .gas(gas);
        self.send(call, "swapExactTokensForTokens").await
    }

    async fn send_add_liquidity(&self, router: Address, request: LiquidityRequest, gas: u64) -> Result<H256> {
        let contract = IUniswapV2Router02::new(router, self.client.clone());
        let call = contract
            .add_liquidity(
                request.token_a,
                request.token_b,
                request.amount_a_desired,
                request.amount_b_desired,
                request.amount_a_min,
                request.amount_b_min,
                request.to,
                request.deadline,
            )
            .gas(gas);
        self.send(call, "addLiquidity").await
    }

    async fn wait_for_receipt(&self, hash: H256, timeout: Duration) -> Result<TxOutcome> {
        debug!("⏳ Waiting for confirmation of 0x{:x}", hash);
        let start = Instant::now();

        loop {
            if start.elapsed() > timeout {
                return Err(ClientError::ConfirmationTimeout(hash, timeout.as_secs()));
            }

            match self.client.get_transaction_receipt(hash).await {
                Ok(Some(receipt)) => {
                    let outcome = TxOutcome {
                        hash,
                        gas_used: receipt.gas_used.unwrap_or_default(),
                        effective_gas_price: receipt.effective_gas_price.unwrap_or_default(),
                        success: receipt.status.map(|s| s.as_u64() == 1).unwrap_or(false),
                        block_number: receipt.block_number.map(|n| n.as_u64()).unwrap_or_default(),
                    };
                    info!(
                        "✅ Transaction 0x{:x} mined in block {} (gas used {})",
                        hash, outcome.block_number, outcome.gas_used
                    );
                    return Ok(outcome);
                }
                Ok(None) => {}
                Err(e) => warn!("Error checking transaction receipt: {}", e),
            }

            tokio::time::sleep(RECEIPT_POLL_INTERVAL).await;
        }
    }

    async fn tx_details(&self, hash: H256) -> Result<TxDetails> {
        let receipt = self
            .client
            .get_transaction_receipt(hash)
            .await
            .map_err(rpc_error)?
            .ok_or_else(|| ClientError::Rpc(format!("No receipt for 0x{:x}", hash)))?;
        let tx = self
            .client
            .get_transaction(hash)
            .await
            .map_err(rpc_error)?
            .ok_or_else(|| ClientError::Rpc(format!("Unknown transaction 0x{:x}", hash)))?;

        let block_number = receipt
            .block_number
            .ok_or_else(|| ClientError::Rpc(format!("0x{:x} is not mined", hash)))?;
        let block = self
            .client
            .get_block(block_number)
            .await
            .map_err(rpc_error)?
            .ok_or_else(|| ClientError::Rpc(format!("Unknown block {}", block_number)))?;

        let effective_gas_price = receipt
            .effective_gas_price
            .or(tx.gas_price)
            .unwrap_or_default();

        Ok(TxDetails {
            outcome: TxOutcome {
                hash,
                gas_used: receipt.gas_used.unwrap_or_default(),
                effective_gas_price,
                success: receipt.status.map(|s| s.as_u64() == 1).unwrap_or(false),
                block_number: block_number.as_u64(),
            },
            timestamp: block.timestamp.as_u64(),
            nonce: tx.nonce.as_u64(),
        })
    }

    async fn swap_logs(&self, query: SwapLogQuery) -> Result<Vec<Log>> {
        let filter = Filter::new()
            .address(query.pair)
            .topic0(UNISWAP_V2_SWAP)
            .topic2(SwapEventDecoder::address_topic(query.recipient))
            .from_block(BlockNumber::Number(query.from_block.into()))
            .to_block(BlockNumber::Number(query.to_block.into()));

        let logs = self.client.get_logs(&filter).await.map_err(rpc_error)?;
        debug!(
            "Found {} Swap logs for {:?} in blocks {}..={}",
            logs.len(),
            query.recipient,
            query.from_block,
            query.to_block
        );
        Ok(logs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethabi::Token;
    use ethers::providers::{JsonRpcError, MockProvider, MockResponse, Provider};
    use ethers::types::{Block, Bytes, Transaction, TransactionReceipt, U64};
    use serde_json::json;

    fn mocked_chain() -> (EthersChain<Provider<MockProvider>>, MockProvider) {
        let (provider, mock) = Provider::mocked();
        let account = Address::repeat_byte(0x11);
        (EthersChain::new(Arc::new(provider), account), mock)
    }

    fn error_response(code: i64, message: &str, data: Option<serde_json::Value>) -> MockResponse {
        MockResponse::Error(JsonRpcError {
            code,
            message: message.to_string(),
            data,
        })
    }

    /// ABI-encoded `Error(string)` revert payload
    fn revert_data(reason: &str) -> Bytes {
        let mut data = vec![0x08, 0xc3, 0x79, 0xa0];
        data.extend(ethabi::encode(&[Token::String(reason.to_string())]));
        Bytes::from(data)
    }

    #[tokio::test]
    async fn test_swap_log_filter() {
        let (chain, mock) = mocked_chain();
        let pair = Address::repeat_byte(0x55);
        let user = Address::repeat_byte(0x22);
        mock.push::<Vec<Log>, _>(Vec::new()).unwrap();

        let logs = chain
            .swap_logs(SwapLogQuery {
                pair,
                recipient: user,
                from_block: 100,
                to_block: 200,
            })
            .await
            .unwrap();
        assert!(logs.is_empty());

        let expected = json!({
            "fromBlock": "0x64",
            "toBlock": "0xc8",
            "address": pair,
            "topics": [UNISWAP_V2_SWAP, null, SwapEventDecoder::address_topic(user)],
        });
        mock.assert_request("eth_getLogs", [expected]).unwrap();
    }

    #[tokio::test]
    async fn test_node_revert_message_maps_to_price_impact() {
        let (chain, mock) = mocked_chain();
        mock.push_response(error_response(
            -32000,
            "VM Exception while processing transaction: revert UniswapV2Router: INSUFFICIENT_OUTPUT_AMOUNT",
            None,
        ));

        let err = chain
            .estimate_deposit_gas(Address::repeat_byte(0x33), U256::one())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::PriceImpact));
    }

    #[tokio::test]
    async fn test_revert_data_is_decoded() {
        let (chain, mock) = mocked_chain();
        let router = Address::repeat_byte(0x44);
        let path = [Address::repeat_byte(0x01), Address::repeat_byte(0x02)];

        mock.push_response(error_response(
            3,
            "execution reverted",
            Some(json!(revert_data("UniswapV2Router: INSUFFICIENT_OUTPUT_AMOUNT"))),
        ));
        let err = chain.amounts_out(router, U256::one(), &path).await.unwrap_err();
        assert!(matches!(err, ClientError::PriceImpact));

        mock.push_response(error_response(
            3,
            "execution reverted",
            Some(json!(revert_data("UniswapV2Library: INSUFFICIENT_LIQUIDITY"))),
        ));
        let err = chain.amounts_out(router, U256::one(), &path).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Contract error: UniswapV2Library: INSUFFICIENT_LIQUIDITY"
        );
    }

    #[tokio::test]
    async fn test_wallet_rejection_code() {
        let (chain, mock) = mocked_chain();
        mock.push_response(error_response(4001, "User denied transaction signature.", None));

        let err = chain
            .estimate_deposit_gas(Address::repeat_byte(0x33), U256::one())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Rejected));
    }

    #[tokio::test]
    async fn test_failed_read_without_revert_is_rpc_error() {
        let (chain, mock) = mocked_chain();
        mock.push_response(error_response(-32603, "header not found", None));

        let err = chain
            .token_balance(Address::repeat_byte(0x33), Address::repeat_byte(0x22))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Rpc(_)));
    }

    #[tokio::test]
    async fn test_reverted_receipt() {
        let (chain, mock) = mocked_chain();
        let hash = H256::repeat_byte(0xab);
        let receipt = TransactionReceipt {
            transaction_hash: hash,
            block_number: Some(U64::from(7u64)),
            gas_used: Some(U256::from(90_000u64)),
            effective_gas_price: Some(U256::from(2_000_000_000u64)),
            status: Some(U64::zero()),
            ..Default::default()
        };
        mock.push::<TransactionReceipt, _>(receipt).unwrap();

        let outcome = chain
            .wait_for_receipt(hash, Duration::from_secs(5))
            .await
            .unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.block_number, 7);
        assert_eq!(outcome.gas_cost(), U256::from(180_000_000_000_000u64));
        mock.assert_request("eth_getTransactionReceipt", [hash]).unwrap();
    }

    #[tokio::test]
    async fn test_receipt_wait_times_out() {
        let (chain, _mock) = mocked_chain();
        let hash = H256::repeat_byte(0xcd);

        // No receipt ever arrives
        let err = chain
            .wait_for_receipt(hash, Duration::from_millis(1))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::ConfirmationTimeout(h, _) if h == hash));
    }

    #[tokio::test]
    async fn test_tx_details_falls_back_to_gas_price() {
        let (chain, mock) = mocked_chain();
        let hash = H256::repeat_byte(0xef);

        let receipt = TransactionReceipt {
            transaction_hash: hash,
            block_number: Some(U64::from(9u64)),
            gas_used: Some(U256::from(110_000u64)),
            status: Some(U64::one()),
            ..Default::default()
        };
        let tx = Transaction {
            hash,
            nonce: U256::from(4u64),
            gas_price: Some(U256::from(20_000_000_000u64)),
            ..Default::default()
        };
        let block = Block::<H256> {
            number: Some(U64::from(9u64)),
            timestamp: U256::from(1_710_513_000u64),
            ..Default::default()
        };

        // Responses are served last-in first-out
        mock.push::<Block<H256>, _>(block).unwrap();
        mock.push::<Transaction, _>(tx).unwrap();
        mock.push::<TransactionReceipt, _>(receipt).unwrap();

        let details = chain.tx_details(hash).await.unwrap();
        assert_eq!(details.nonce, 4);
        assert_eq!(details.timestamp, 1_710_513_000);
        assert_eq!(details.outcome.effective_gas_price, U256::from(20_000_000_000u64));
        assert!(details.outcome.success);
    }
}
