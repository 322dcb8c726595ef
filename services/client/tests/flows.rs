//! End-to-end flows over the in-memory chain

use ethers::types::{Address, Bytes, Log, H256, U256, U64};
use std::sync::Arc;
use std::time::Duration;

use swapdesk_client::chain::RouterLinks;
use swapdesk_client::testing::{ether, MockChain};
use swapdesk_client::{
    AddLiquidityRequest, ClientError, HistorySource, LinkCheck, SwapDesk, TxStatus,
};
use swapdesk_config::ClientSettings;
use swapdesk_dex::{SwapEventDecoder, UNISWAP_V2_SWAP};

async fn connected(chain: &Arc<MockChain>) -> SwapDesk {
    let desk = SwapDesk::new(chain.addresses(), ClientSettings::default()).unwrap();
    desk.session.attach(chain.clone()).await.unwrap();
    desk
}

fn pooled_chain() -> Arc<MockChain> {
    let chain = Arc::new(MockChain::funded());
    chain.seed_pool(ether(10), ether(20_000));
    chain
}

#[tokio::test]
async fn test_actions_require_wallet() {
    let chain = MockChain::funded();
    let desk = SwapDesk::new(chain.addresses(), ClientSettings::default()).unwrap();

    let err = desk.submitter.wrap(ether(1)).await.unwrap_err();
    assert!(matches!(err, ClientError::NotConnected));
    assert_eq!(desk.submitter.status().to_string(), "Wallet not connected");
}

#[tokio::test]
async fn test_wrap_validation() {
    let chain = Arc::new(MockChain::funded());
    let desk = connected(&chain).await;

    let err = desk.submitter.wrap(U256::zero()).await.unwrap_err();
    assert_eq!(err.to_string(), "Please enter a valid amount");

    // The whole balance leaves nothing for gas
    let err = desk.submitter.wrap(ether(100)).await.unwrap_err();
    assert!(matches!(err, ClientError::ExceedsMaximum));
    assert_eq!(
        desk.submitter.status().to_string(),
        "Amount exceeds maximum (including gas fees)"
    );
    assert!(chain.sent().is_empty());
}

#[tokio::test]
async fn test_wrap_exactly_the_quoted_maximum() {
    let chain = Arc::new(MockChain::funded());
    let desk = connected(&chain).await;
    let owner = chain.account_address();

    let quote = desk.reader.wrap_quote(owner).await.unwrap();
    assert_eq!(
        quote.gas_limit,
        U256::from(MockChain::DEPOSIT_ESTIMATE + ClientSettings::default().gas.wrap_buffer)
    );

    let outcome = desk.submitter.wrap(quote.max_amount).await.unwrap();
    assert_eq!(
        chain.token_of(chain.addresses().weth, owner),
        ether(10) + quote.max_amount
    );
    assert_eq!(
        chain.eth_of(owner),
        ether(100) - quote.max_amount - outcome.gas_cost()
    );

    let err = desk.submitter.wrap(U256::one()).await.unwrap_err();
    assert!(matches!(err, ClientError::ExceedsMaximum));
}

#[tokio::test]
async fn test_wrap_rejected_by_wallet() {
    let chain = Arc::new(MockChain::funded());
    let desk = connected(&chain).await;

    chain.reject_next("MetaMask Tx Signature: User denied transaction signature.", Some(4001));
    let err = desk.submitter.wrap(ether(1)).await.unwrap_err();

    assert!(matches!(err, ClientError::Rejected));
    assert_eq!(
        desk.submitter.status().to_string(),
        "Failed to wrap ETH: Transaction was rejected"
    );
    assert_eq!(chain.token_of(chain.addresses().weth, chain.account_address()), ether(10));
}

#[tokio::test]
async fn test_unwrap() {
    let chain = Arc::new(MockChain::funded());
    let desk = connected(&chain).await;
    let owner = chain.account_address();
    let weth = chain.addresses().weth;

    let outcome = desk.submitter.unwrap(ether(2)).await.unwrap();
    assert_eq!(chain.token_of(weth, owner), ether(8));
    assert_eq!(chain.eth_of(owner), ether(102) - outcome.gas_cost());
    assert_eq!(desk.submitter.status().to_string(), "WETH Unwrapped Successfully!");

    let err = desk.submitter.unwrap(ether(20)).await.unwrap_err();
    assert_eq!(err.to_string(), "Insufficient WETH balance");
}

#[tokio::test]
async fn test_swap_requires_pool_and_liquidity() {
    let chain = Arc::new(MockChain::funded());
    let desk = connected(&chain).await;

    let err = desk.submitter.swap(ether(1)).await.unwrap_err();
    assert_eq!(err.to_string(), "Insufficient liquidity in the pool");

    chain.remove_pair();
    let err = desk.submitter.swap(ether(1)).await.unwrap_err();
    assert_eq!(err.to_string(), "Pool does not exist");
    assert!(chain.sent().is_empty());
}

#[tokio::test]
async fn test_swap_approval_failure_is_wrapped() {
    let chain = pooled_chain();
    let desk = connected(&chain).await;

    chain.reject_next("user rejected transaction", None);
    let err = desk.submitter.swap(ether(1)).await.unwrap_err();

    assert!(matches!(err, ClientError::Approval { token: "WETH", .. }));
    assert_eq!(
        desk.submitter.status().to_string(),
        "Failed to swap tokens: Failed to approve WETH transfer: Transaction was rejected"
    );
}

#[tokio::test]
async fn test_swap_slippage_revert() {
    let chain = pooled_chain();
    let desk = connected(&chain).await;
    let addresses = chain.addresses();
    chain.set_allowance(addresses.weth, chain.account_address(), addresses.router, ether(10));

    chain.reject_next(
        "VM Exception while processing transaction: revert UniswapV2Router: INSUFFICIENT_OUTPUT_AMOUNT",
        Some(-32000),
    );
    let err = desk.submitter.swap(ether(1)).await.unwrap_err();

    assert!(matches!(err, ClientError::PriceImpact));
    assert_eq!(
        desk.submitter.status().to_string(),
        "Failed to swap tokens: Price impact too high"
    );
}

#[tokio::test]
async fn test_second_action_refused_while_pending() {
    let chain = pooled_chain();
    let desk = connected(&chain).await;
    chain.set_receipt_delay(Duration::from_millis(200));

    let (first, second) = tokio::join!(desk.submitter.wrap(ether(1)), async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(desk.submitter.is_pending());
        desk.submitter.swap(ether(1)).await
    });

    assert!(first.is_ok());
    assert!(matches!(second, Err(ClientError::ActionPending)));
    assert!(!desk.submitter.is_pending());
    assert_eq!(desk.submitter.status().to_string(), "ETH Wrapped Successfully!");
    assert_eq!(chain.sent(), vec!["deposit"]);
}

#[tokio::test]
async fn test_add_liquidity_with_mint() {
    let chain = Arc::new(MockChain::funded());
    let desk = connected(&chain).await;
    let addresses = chain.addresses();
    let owner = chain.account_address();

    let report = desk
        .submitter
        .add_liquidity(AddLiquidityRequest {
            eth_amount: ether(5),
            dai_amount: ether(10_000),
            mint_dai: true,
        })
        .await
        .unwrap();

    assert_eq!(
        chain.sent(),
        vec!["mint", "deposit", "approve", "approve", "add_liquidity"]
    );
    assert_eq!(report.pair, addresses.weth_dai_pair);
    assert_eq!(report.reserve_weth, ether(5));
    assert_eq!(report.reserve_dai, ether(10_000));

    // WETH and DAI legs went into the pool; the pre-existing WETH stays
    assert_eq!(chain.token_of(addresses.weth, owner), ether(10));
    assert_eq!(chain.token_of(addresses.dai, owner), U256::zero());
    assert!(chain.eth_of(owner) < ether(95));
    assert_eq!(
        desk.submitter.status().to_string(),
        "Liquidity added successfully!"
    );
}

#[tokio::test]
async fn test_add_liquidity_skips_covered_approvals() {
    let chain = pooled_chain();
    let desk = connected(&chain).await;
    let addresses = chain.addresses();
    let owner = chain.account_address();

    chain.set_token_balance(addresses.dai, owner, ether(2_000));
    chain.set_allowance(addresses.weth, owner, addresses.router, ether(100));
    chain.set_allowance(addresses.dai, owner, addresses.router, ether(100_000));

    let report = desk
        .submitter
        .add_liquidity(AddLiquidityRequest {
            eth_amount: ether(1),
            dai_amount: ether(2_000),
            mint_dai: false,
        })
        .await
        .unwrap();

    assert_eq!(chain.sent(), vec!["deposit", "add_liquidity"]);
    assert_eq!(report.reserve_weth, ether(11));
    assert_eq!(report.reserve_dai, ether(22_000));
}

#[tokio::test]
async fn test_add_liquidity_balance_checks() {
    let chain = Arc::new(MockChain::funded());
    let desk = connected(&chain).await;
    let owner = chain.account_address();

    let err = desk
        .submitter
        .add_liquidity(AddLiquidityRequest {
            eth_amount: ether(1),
            dai_amount: ether(2_000),
            mint_dai: false,
        })
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Insufficient DAI balance");

    chain.set_eth_balance(owner, ether(5));
    let err = desk
        .submitter
        .add_liquidity(AddLiquidityRequest {
            eth_amount: ether(5),
            dai_amount: ether(10_000),
            mint_dai: true,
        })
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Insufficient ETH balance. Need at least 5.1 ETH (including gas)"
    );
    assert_eq!(desk.submitter.status().to_string(), err.to_string());
    assert!(chain.sent().is_empty());
}

#[tokio::test]
async fn test_history_from_chain() {
    let chain = pooled_chain();
    let desk = connected(&chain).await;
    let owner = chain.account_address();
    let addresses = chain.addresses();

    desk.submitter.swap(ether(1)).await.unwrap();
    desk.submitter.swap(ether(2)).await.unwrap();

    // A log whose transaction cannot be enriched is dropped
    chain.push_log(Log {
        address: addresses.weth_dai_pair,
        topics: vec![
            UNISWAP_V2_SWAP,
            SwapEventDecoder::address_topic(addresses.router),
            SwapEventDecoder::address_topic(owner),
        ],
        data: Bytes::from(vec![0u8; 128]),
        transaction_hash: Some(H256::repeat_byte(0xee)),
        block_number: Some(U64::from(101u64)),
        ..Default::default()
    });

    // Swaps paid out to someone else are not ours
    chain.push_log(Log {
        address: addresses.weth_dai_pair,
        topics: vec![
            UNISWAP_V2_SWAP,
            SwapEventDecoder::address_topic(addresses.router),
            SwapEventDecoder::address_topic(Address::repeat_byte(0x99)),
        ],
        data: Bytes::from(vec![0u8; 128]),
        block_number: Some(U64::from(101u64)),
        ..Default::default()
    });

    let history = desk.history.load().await.unwrap();
    assert_eq!(history.source, HistorySource::Chain);
    assert_eq!(history.notice, None);
    assert_eq!(history.entries.len(), 2);

    let latest = &history.entries[0];
    let earlier = &history.entries[1];
    assert!(latest.timestamp > earlier.timestamp);
    assert_eq!(latest.input_amount, "2.0");
    assert_eq!(earlier.input_amount, "1.0");
    assert_eq!(latest.status, TxStatus::Success);
    assert_eq!(latest.to, Some(owner));
    // 110_000 gas at 20 gwei
    assert_eq!(latest.gas_cost, "0.0022");
    // approve, swap, approve, swap
    assert_eq!(earlier.nonce, 1);
    assert_eq!(latest.nonce, 3);
}

#[tokio::test]
async fn test_history_follows_factory_pair() {
    let chain = pooled_chain();
    let mut addresses = chain.addresses();
    addresses.weth_dai_pair = Address::repeat_byte(0x77);

    let desk = SwapDesk::new(addresses, ClientSettings::default()).unwrap();
    desk.session.attach(chain.clone()).await.unwrap();
    desk.submitter.swap(ether(1)).await.unwrap();

    let history = desk.history.load().await.unwrap();
    assert_eq!(history.source, HistorySource::Chain);
    assert_eq!(history.entries.len(), 1);
    assert_eq!(history.entries[0].input_amount, "1.0");
}

#[tokio::test]
async fn test_history_without_pool_shows_notice() {
    let chain = Arc::new(MockChain::funded());
    let desk = connected(&chain).await;
    chain.remove_pair();

    let history = desk.history.load().await.unwrap();
    assert_eq!(history.source, HistorySource::Example);
    assert!(history.notice.is_some());
}

#[tokio::test]
async fn test_history_truncates_to_max_entries() {
    let chain = pooled_chain();
    let mut settings = ClientSettings::default();
    settings.history.max_entries = 2;
    let desk = SwapDesk::new(chain.addresses(), settings).unwrap();
    desk.session.attach(chain.clone()).await.unwrap();

    let addresses = chain.addresses();
    chain.set_allowance(addresses.weth, chain.account_address(), addresses.router, ether(10));
    for _ in 0..3 {
        desk.submitter.swap(ether(1)).await.unwrap();
    }

    let history = desk.history.load().await.unwrap();
    assert_eq!(history.entries.len(), 2);
    assert_eq!(history.entries[0].nonce, 2);
}

#[tokio::test]
async fn test_verify_healthy_deployment() {
    let chain = Arc::new(MockChain::funded());
    let desk = connected(&chain).await;

    let report = desk.verifier.verify().await.unwrap();
    assert!(report.is_healthy());
    let labels: Vec<_> = report.contracts.iter().map(|c| c.label).collect();
    assert_eq!(labels, vec!["WETH", "Factory", "Router", "DAI", "WETH-DAI Pair"]);
}

#[tokio::test]
async fn test_verify_reports_problems() {
    let chain = Arc::new(MockChain::funded());
    let desk = connected(&chain).await;
    let addresses = chain.addresses();

    chain.set_code_size(addresses.weth_dai_pair, 0);
    chain.set_router_links(Some(RouterLinks {
        factory: Address::repeat_byte(0x42),
        weth: addresses.weth,
    }));

    let report = desk.verifier.verify().await.unwrap();
    assert!(!report.is_healthy());
    assert!(!report.contracts[4].is_contract);
    assert_eq!(
        report.router_factory,
        LinkCheck::Mismatch {
            expected: addresses.factory,
            actual: Address::repeat_byte(0x42)
        }
    );
    assert_eq!(report.router_weth, LinkCheck::Matches);

    chain.set_router_links(None);
    let report = desk.verifier.verify().await.unwrap();
    assert!(matches!(report.router_factory, LinkCheck::Unreadable(_)));
    assert!(matches!(report.router_weth, LinkCheck::Unreadable(_)));
}
