//! Transaction submitter
//!
//! Runs the state-changing flows (wrap, unwrap, swap, add liquidity) one at
//! a time. Each flow validates client-side first, then submits, waits for the
//! receipt and publishes its progress on a status channel. Nothing is retried
//! or rolled back: a failure part way through add-liquidity leaves the
//! earlier transactions in place.

use ethers::types::{Address, H256, U256};
use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use swapdesk_amm::{deadline_from, SlippageTolerance};
use swapdesk_config::{ClientSettings, ContractAddresses};

use crate::chain::{ChainClient, LiquidityRequest, SwapRequest, TxOutcome};
use crate::error::{ClientError, Result};
use crate::reader::BalanceReader;
use crate::units::format_amount;
use crate::wallet::WalletSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Action {
    Wrap,
    Unwrap,
    Swap,
    AddLiquidity,
}

impl Action {
    fn failure_prefix(self) -> &'static str {
        match self {
            Action::Wrap => "Failed to wrap ETH",
            Action::Unwrap => "Failed to unwrap WETH",
            Action::Swap => "Failed to swap tokens",
            Action::AddLiquidity => "Failed to add liquidity",
        }
    }

    fn success_message(self) -> &'static str {
        match self {
            Action::Wrap => "ETH Wrapped Successfully!",
            Action::Unwrap => "WETH Unwrapped Successfully!",
            Action::Swap => "Tokens swapped successfully!",
            Action::AddLiquidity => "Liquidity added successfully!",
        }
    }

    fn verb(self) -> &'static str {
        match self {
            Action::Wrap => "wrap",
            Action::Unwrap => "unwrap",
            Action::Swap => "swap",
            Action::AddLiquidity => "add liquidity",
        }
    }
}

/// Progress of the current (or last) action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionStatus {
    Idle,
    Initiating(Action),
    Approving(&'static str),
    Quoted {
        amount_in: U256,
        expected_out: U256,
        min_out: U256,
    },
    Submitted(H256),
    Confirmed { action: Action, hash: H256 },
    Failed(String),
}

impl fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionStatus::Idle => Ok(()),
            ActionStatus::Initiating(action) => write!(f, "Initiating {}...", action.verb()),
            ActionStatus::Approving(token) => write!(f, "Approving {} transfer...", token),
            ActionStatus::Quoted {
                amount_in,
                expected_out,
                ..
            } => write!(
                f,
                "Swapping {} WETH for approximately {} DAI...",
                format_amount(*amount_in),
                format_amount(*expected_out)
            ),
            ActionStatus::Submitted(_) => {
                write!(f, "Transaction submitted. Waiting for confirmation...")
            }
            ActionStatus::Confirmed { action, .. } => write!(f, "{}", action.success_message()),
            ActionStatus::Failed(message) => write!(f, "{}", message),
        }
    }
}

/// Status line for a failed action; pre-submission checks are shown bare
pub fn failure_message(action: Action, err: &ClientError) -> String {
    if err.is_precheck() {
        err.to_string()
    } else {
        format!("{}: {}", action.failure_prefix(), err)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SwapReceipt {
    pub outcome: TxOutcome,
    pub expected_out: U256,
    pub min_out: U256,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddLiquidityRequest {
    pub eth_amount: U256,
    pub dai_amount: U256,
    /// Mint the DAI leg from MockDAI instead of using the existing balance
    pub mint_dai: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LiquidityReport {
    pub outcome: TxOutcome,
    pub pair: Address,
    pub reserve_weth: U256,
    pub reserve_dai: U256,
}

/// Clears the pending flag when the flow ends, however it ends
struct PendingGuard<'a>(&'a AtomicBool);

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct TransactionSubmitter {
    session: Arc<WalletSession>,
    reader: BalanceReader,
    addresses: ContractAddresses,
    settings: ClientSettings,
    tolerance: SlippageTolerance,
    pending: AtomicBool,
    status: watch::Sender<ActionStatus>,
}

impl TransactionSubmitter {
    pub fn new(
        session: Arc<WalletSession>,
        addresses: ContractAddresses,
        settings: ClientSettings,
    ) -> Result<Self> {
        let tolerance = SlippageTolerance::from_bps(settings.slippage_bps)?;
        let reader = BalanceReader::new(session.clone(), addresses, tolerance)
            .with_wrap_buffer(settings.gas.wrap_buffer);
        let (status, _) = watch::channel(ActionStatus::Idle);

        Ok(Self {
            session,
            reader,
            addresses,
            settings,
            tolerance,
            pending: AtomicBool::new(false),
            status,
        })
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    pub fn status(&self) -> ActionStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<ActionStatus> {
        self.status.subscribe()
    }

    /// Wrap `amount` ETH into WETH
    pub async fn wrap(&self, amount: U256) -> Result<TxOutcome> {
        self.run(Action::Wrap, self.wrap_flow(amount)).await
    }

    /// Unwrap `amount` WETH back into ETH
    pub async fn unwrap(&self, amount: U256) -> Result<TxOutcome> {
        self.run(Action::Unwrap, self.unwrap_flow(amount)).await
    }

    /// Sell exactly `amount_in` WETH for DAI at the configured tolerance
    pub async fn swap(&self, amount_in: U256) -> Result<SwapReceipt> {
        self.run(Action::Swap, self.swap_flow(amount_in)).await
    }

    pub async fn add_liquidity(&self, request: AddLiquidityRequest) -> Result<LiquidityReport> {
        self.run(Action::AddLiquidity, self.add_liquidity_flow(request))
            .await
    }

    async fn run<T, F>(&self, action: Action, flow: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if self
            .pending
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(ClientError::ActionPending);
        }
        let _guard = PendingGuard(&self.pending);

        self.set_status(ActionStatus::Initiating(action));
        match flow.await {
            Ok(value) => Ok(value),
            Err(err) => {
                let message = failure_message(action, &err);
                warn!("❌ {}", message);
                self.set_status(ActionStatus::Failed(message));
                Err(err)
            }
        }
    }

    async fn wrap_flow(&self, amount: U256) -> Result<TxOutcome> {
        if amount.is_zero() {
            return Err(ClientError::InvalidAmount);
        }
        let client = self.session.client()?;

        let quote = self.reader.wrap_quote(client.account()).await?;
        if amount > quote.max_amount {
            return Err(ClientError::ExceedsMaximum);
        }

        // Same limit the maximum was derived from
        let gas = quote.gas_limit.min(U256::from(u64::MAX)).as_u64();
        debug!("Deposit gas limit {}", gas);

        let hash = client.send_deposit(self.addresses.weth, amount, gas).await?;
        let outcome = self.confirm(client.as_ref(), hash).await?;

        info!("✅ Wrapped {} ETH", format_amount(amount));
        self.finish(Action::Wrap, hash);
        Ok(outcome)
    }

    async fn unwrap_flow(&self, amount: U256) -> Result<TxOutcome> {
        if amount.is_zero() {
            return Err(ClientError::InvalidAmount);
        }
        let client = self.session.client()?;

        let balance = client
            .token_balance(self.addresses.weth, client.account())
            .await?;
        if amount > balance {
            return Err(ClientError::InsufficientBalance("WETH"));
        }

        let hash = client
            .send_withdraw(self.addresses.weth, amount, self.settings.gas.withdraw)
            .await?;
        let outcome = self.confirm(client.as_ref(), hash).await?;

        info!("✅ Unwrapped {} WETH", format_amount(amount));
        self.finish(Action::Unwrap, hash);
        Ok(outcome)
    }

    async fn swap_flow(&self, amount_in: U256) -> Result<SwapReceipt> {
        if amount_in.is_zero() {
            return Err(ClientError::InvalidAmount);
        }
        let client = self.session.client()?;
        let owner = client.account();

        let balance = client.token_balance(self.addresses.weth, owner).await?;
        if amount_in > balance {
            return Err(ClientError::InsufficientBalance("WETH"));
        }

        let pool = self.reader.pool_snapshot().await?;
        if !pool.has_liquidity() {
            return Err(ClientError::InsufficientLiquidity);
        }

        self.ensure_allowance(
            client.as_ref(),
            self.addresses.weth,
            "WETH",
            self.addresses.router,
            amount_in,
        )
        .await?;

        let path = vec![self.addresses.weth, self.addresses.dai];
        let amounts = client
            .amounts_out(self.addresses.router, amount_in, &path)
            .await?;
        let expected_out = amounts.last().copied().unwrap_or_default();
        let min_out = self.tolerance.minimum_amount(expected_out);
        self.set_status(ActionStatus::Quoted {
            amount_in,
            expected_out,
            min_out,
        });

        let request = SwapRequest {
            amount_in,
            amount_out_min: min_out,
            path,
            to: owner,
            deadline: deadline_from(now_secs(), self.settings.swap_deadline_secs),
        };
        let hash = client
            .send_swap(self.addresses.router, request, self.settings.gas.swap)
            .await?;
        let outcome = self.confirm(client.as_ref(), hash).await?;

        info!(
            "✅ Swapped {} WETH for at least {} DAI",
            format_amount(amount_in),
            format_amount(min_out)
        );
        self.finish(Action::Swap, hash);
        Ok(SwapReceipt {
            outcome,
            expected_out,
            min_out,
        })
    }

    async fn add_liquidity_flow(&self, request: AddLiquidityRequest) -> Result<LiquidityReport> {
        if request.eth_amount.is_zero() || request.dai_amount.is_zero() {
            return Err(ClientError::InvalidAmount);
        }
        let client = self.session.client()?;
        let owner = client.account();
        let gas = self.settings.gas;

        let required = request
            .eth_amount
            .saturating_add(U256::from(self.settings.liquidity_gas_reserve_wei));
        let eth_balance = client.eth_balance(owner).await?;
        if eth_balance < required {
            return Err(ClientError::InsufficientEth { required });
        }

        if request.mint_dai {
            info!("🪙 Minting {} DAI", format_amount(request.dai_amount));
            let hash = client
                .send_mint(self.addresses.dai, owner, request.dai_amount, gas.mint)
                .await?;
            self.confirm(client.as_ref(), hash).await?;
        } else {
            let dai_balance = client.token_balance(self.addresses.dai, owner).await?;
            if dai_balance < request.dai_amount {
                return Err(ClientError::InsufficientBalance("DAI"));
            }
        }

        info!("💧 Wrapping {} ETH", format_amount(request.eth_amount));
        let hash = client
            .send_deposit(self.addresses.weth, request.eth_amount, gas.deposit)
            .await?;
        self.confirm(client.as_ref(), hash).await?;

        let router = self.addresses.router;
        self.ensure_allowance(client.as_ref(), self.addresses.weth, "WETH", router, request.eth_amount)
            .await?;
        self.ensure_allowance(client.as_ref(), self.addresses.dai, "DAI", router, request.dai_amount)
            .await?;

        let pair = client
            .get_pair(self.addresses.factory, self.addresses.weth, self.addresses.dai)
            .await?;
        if pair.is_zero() {
            info!("Pair does not exist yet; the router will create it");
        } else {
            debug!("Adding to existing pair {:?}", pair);
        }

        let liquidity = LiquidityRequest {
            token_a: self.addresses.weth,
            token_b: self.addresses.dai,
            amount_a_desired: request.eth_amount,
            amount_b_desired: request.dai_amount,
            amount_a_min: self.tolerance.minimum_amount(request.eth_amount),
            amount_b_min: self.tolerance.minimum_amount(request.dai_amount),
            to: owner,
            deadline: deadline_from(now_secs(), self.settings.liquidity_deadline_secs),
        };
        let hash = client
            .send_add_liquidity(router, liquidity, gas.add_liquidity)
            .await?;
        let outcome = self.confirm(client.as_ref(), hash).await?;

        let pool = self.reader.pool_snapshot().await?;
        info!(
            "✅ Pool reserves now {} WETH / {} DAI",
            format_amount(pool.reserve_weth),
            format_amount(pool.reserve_dai)
        );
        self.finish(Action::AddLiquidity, hash);

        Ok(LiquidityReport {
            outcome,
            pair: pool.pair,
            reserve_weth: pool.reserve_weth,
            reserve_dai: pool.reserve_dai,
        })
    }

    /// Approve `spender` for exactly `amount` unless the allowance already covers it
    async fn ensure_allowance(
        &self,
        client: &dyn ChainClient,
        token: Address,
        label: &'static str,
        spender: Address,
        amount: U256,
    ) -> Result<Option<TxOutcome>> {
        self.approve_if_short(client, token, label, spender, amount)
            .await
            .map_err(|source| ClientError::Approval {
                token: label,
                source: Box::new(source),
            })
    }

    async fn approve_if_short(
        &self,
        client: &dyn ChainClient,
        token: Address,
        label: &'static str,
        spender: Address,
        amount: U256,
    ) -> Result<Option<TxOutcome>> {
        let current = client.allowance(token, client.account(), spender).await?;
        if current >= amount {
            debug!("{} allowance {} covers {}, skipping approve", label, current, amount);
            return Ok(None);
        }

        self.set_status(ActionStatus::Approving(label));
        let hash = client
            .send_approve(token, spender, amount, self.settings.gas.approve)
            .await?;
        self.await_receipt(client, hash).await.map(Some)
    }

    async fn confirm(&self, client: &dyn ChainClient, hash: H256) -> Result<TxOutcome> {
        self.set_status(ActionStatus::Submitted(hash));
        self.await_receipt(client, hash).await
    }

    async fn await_receipt(&self, client: &dyn ChainClient, hash: H256) -> Result<TxOutcome> {
        let timeout = Duration::from_secs(self.settings.confirmation_timeout_secs);
        let outcome = client.wait_for_receipt(hash, timeout).await?;
        if !outcome.success {
            return Err(ClientError::Reverted(hash));
        }
        Ok(outcome)
    }

    fn finish(&self, action: Action, hash: H256) {
        self.set_status(ActionStatus::Confirmed { action, hash });
    }

    fn set_status(&self, status: ActionStatus) {
        debug!("Status: {:?}", status);
        self.status.send_replace(status);
    }
}

fn now_secs() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp()).unwrap_or_default()
}
