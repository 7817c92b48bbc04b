// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{
    contracts::{ConfidentialLottery, LotteryCall, RoundRecord, SubmittedTx},
    error::{classify_contract, classify_transport, ChainError},
    wallet::{ApprovalRequest, LocalWallet, NetworkEndpoint},
};
use alloy::{
    network::ReceiptResponse as _,
    primitives::{Address, Signature, U256},
    providers::{DynProvider, Provider},
    rpc::types::TransactionReceipt,
    signers::Signer,
};
use alloy_dyn_abi::TypedData;
use async_trait::async_trait;
use lottery_config::ChainConfig;
use lottery_utils::{retry_with_backoff, RetryError, BACKOFF_DELAY, BACKOFF_MAX_RETRIES};
use std::{
    future::Future,
    sync::{PoisonError, RwLock},
};
use tracing::{info, warn};

/// Result of a successful wallet authentication
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub account: Address,
    pub chain_id: u64,
    pub balance: U256,
}

/// Which path the two phase network switch took
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkSwitch {
    Switched,
    AddedAndSwitched,
}

/// Access to the lottery ledger through a signing account
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// The chain the lottery lives on
    fn required_chain_id(&self) -> u64;

    /// The lottery contract address
    fn contract_address(&self) -> Address;

    /// Authenticate the account and verify it targets the required network
    async fn connect(&self) -> Result<Connection, ChainError>;

    /// Point the wallet at the required network, adding it first when the wallet does
    /// not know it
    async fn switch_network(&self) -> Result<NetworkSwitch, ChainError>;

    async fn ticket_price(&self) -> Result<U256, ChainError>;

    async fn prize_amount(&self) -> Result<U256, ChainError>;

    /// Native balance held by the lottery contract
    async fn pool_balance(&self) -> Result<U256, ChainError>;

    /// The next round id the contract will hand out
    async fn current_round(&self) -> Result<U256, ChainError>;

    async fn round(&self, round_id: U256) -> Result<RoundRecord, ChainError>;

    async fn balance(&self, account: Address) -> Result<U256, ChainError>;

    /// Send a state changing call and wait until it is included in a block. Never retried.
    async fn submit(&self, call: LotteryCall) -> Result<SubmittedTx, ChainError>;

    /// Sign an EIP-712 payload with the connected account
    async fn sign_typed_data(&self, payload: &TypedData) -> Result<Signature, ChainError>;
}

struct Connected {
    account: Address,
    provider: DynProvider,
}

/// [`ChainClient`] backed by a JSON-RPC node and a [`LocalWallet`]
pub struct EvmChainClient {
    wallet: LocalWallet,
    lottery_network: NetworkEndpoint,
    contract_address: Address,
    connected: RwLock<Option<Connected>>,
}

impl EvmChainClient {
    pub fn new(wallet: LocalWallet, chain: &ChainConfig) -> Result<Self, ChainError> {
        let contract_address = chain
            .contracts
            .lottery
            .parsed_address()
            .map_err(|e| ChainError::NetworkError(e.to_string()))?;
        Ok(Self {
            wallet,
            lottery_network: NetworkEndpoint::from_chain_config(chain)?,
            contract_address,
            connected: RwLock::new(None),
        })
    }

    pub fn wallet(&self) -> &LocalWallet {
        &self.wallet
    }

    fn provider(&self) -> Result<DynProvider, ChainError> {
        self.connected
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|c| c.provider.clone())
            .ok_or(ChainError::NotConnected)
    }

    fn lottery(
        &self,
    ) -> Result<ConfidentialLottery::ConfidentialLotteryInstance<DynProvider>, ChainError> {
        Ok(ConfidentialLottery::new(self.contract_address, self.provider()?))
    }

    fn account(&self) -> Result<Address, ChainError> {
        self.connected
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|c| c.account)
            .ok_or(ChainError::NotConnected)
    }

    async fn send(&self, call: &LotteryCall) -> Result<TransactionReceipt, ChainError> {
        let lottery = self.lottery()?;
        let pending = match call {
            LotteryCall::BuyTicket {
                handle,
                proof,
                value,
            } => {
                lottery
                    .buyTicket(*handle, proof.clone())
                    .value(*value)
                    .send()
                    .await
            }
            LotteryCall::DrawLottery { round_id } => lottery.drawLottery(*round_id).send().await,
            LotteryCall::CheckWinner { round_id } => lottery.checkWinner(*round_id).send().await,
            LotteryCall::SettleLottery {
                round_id,
                is_winner,
            } => lottery.settleLottery(*round_id, *is_winner).send().await,
        }
        .map_err(classify_contract)?;

        pending
            .get_receipt()
            .await
            .map_err(|e| ChainError::NetworkError(e.to_string()))
    }
}

/// Run an idempotent read, retrying transport failures with backoff
async fn read_with_retry<T, F, Fut>(name: &str, read_fn: F) -> Result<T, ChainError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, ChainError>>,
{
    retry_with_backoff(
        || {
            let fut = read_fn();
            async move {
                fut.await.map_err(|e| {
                    if e.is_transient() {
                        warn!("{}: transient failure: {}", name, e);
                        RetryError::Retry(e)
                    } else {
                        RetryError::Failure(e)
                    }
                })
            }
        },
        BACKOFF_MAX_RETRIES,
        BACKOFF_DELAY,
    )
    .await
}

#[async_trait]
impl ChainClient for EvmChainClient {
    fn required_chain_id(&self) -> u64 {
        self.lottery_network.chain_id
    }

    fn contract_address(&self) -> Address {
        self.contract_address
    }

    async fn connect(&self) -> Result<Connection, ChainError> {
        let signer = self.wallet.signer()?;
        let account = signer.address();

        if !self.wallet.approve(ApprovalRequest::Connect { account }).await {
            return Err(ChainError::UserRejected);
        }

        let expected = self.required_chain_id();
        // A chain the wallet has no endpoint for is resolved by the network switch
        let network = self.wallet.active_network().map_err(|err| {
            let actual = self.wallet.active_chain();
            warn!("Wallet is on chain {}: {}", actual, err);
            ChainError::WrongNetwork { expected, actual }
        })?;
        let provider = network.provider.create_signer_provider(signer).await?;
        let chain_id = read_with_retry("chainId", || async {
            provider.get_chain_id().await.map_err(|e| classify_transport(&e))
        })
        .await?;

        if chain_id != expected {
            warn!(
                "Wallet is on chain {} ({}), lottery requires chain {}",
                chain_id, network.name, expected
            );
            return Err(ChainError::WrongNetwork {
                expected,
                actual: chain_id,
            });
        }

        let balance = read_with_retry("balance", || async {
            provider
                .get_balance(account)
                .await
                .map_err(|e| classify_transport(&e))
        })
        .await?;

        *self.connected.write().unwrap_or_else(PoisonError::into_inner) =
            Some(Connected { account, provider });

        info!("Connected {} on chain {}", account, chain_id);
        Ok(Connection {
            account,
            chain_id,
            balance,
        })
    }

    async fn switch_network(&self) -> Result<NetworkSwitch, ChainError> {
        let target = self.required_chain_id();
        match self.wallet.switch_chain(target).await {
            Ok(()) => Ok(NetworkSwitch::Switched),
            Err(ChainError::UnknownChain(reason)) => {
                info!("Wallet does not know chain {} ({}), adding it", target, reason);
                self.wallet.add_chain(self.lottery_network.clone()).await?;
                self.wallet.switch_chain(target).await?;
                Ok(NetworkSwitch::AddedAndSwitched)
            }
            Err(e) => Err(e),
        }
    }

    async fn ticket_price(&self) -> Result<U256, ChainError> {
        let lottery = self.lottery()?;
        read_with_retry("TICKET_PRICE", || async {
            lottery.TICKET_PRICE().call().await.map_err(classify_contract)
        })
        .await
    }

    async fn prize_amount(&self) -> Result<U256, ChainError> {
        let lottery = self.lottery()?;
        read_with_retry("PRIZE_AMOUNT", || async {
            lottery.PRIZE_AMOUNT().call().await.map_err(classify_contract)
        })
        .await
    }

    async fn pool_balance(&self) -> Result<U256, ChainError> {
        self.balance(self.contract_address).await
    }

    async fn current_round(&self) -> Result<U256, ChainError> {
        let lottery = self.lottery()?;
        read_with_retry("currentRound", || async {
            lottery.currentRound().call().await.map_err(classify_contract)
        })
        .await
    }

    async fn round(&self, round_id: U256) -> Result<RoundRecord, ChainError> {
        let lottery = self.lottery()?;
        read_with_retry("rounds", || async {
            lottery
                .rounds(round_id)
                .call()
                .await
                .map(RoundRecord::from)
                .map_err(classify_contract)
        })
        .await
    }

    async fn balance(&self, account: Address) -> Result<U256, ChainError> {
        let provider = self.provider()?;
        read_with_retry("balance", || async {
            provider
                .get_balance(account)
                .await
                .map_err(|e| classify_transport(&e))
        })
        .await
    }

    async fn submit(&self, call: LotteryCall) -> Result<SubmittedTx, ChainError> {
        self.account()?;

        let request = ApprovalRequest::Transaction {
            description: call.to_string(),
            value: call.value(),
        };
        if !self.wallet.approve(request).await {
            return Err(ChainError::TransactionRejected);
        }

        info!("Sending {}", call);
        let receipt = self.send(&call).await?;
        if !receipt.status() {
            return Err(ChainError::TransactionReverted(format!(
                "{} reverted in tx {}",
                call.name(),
                receipt.transaction_hash
            )));
        }

        info!(
            "{} included in block {:?} (tx {})",
            call.name(),
            receipt.block_number,
            receipt.transaction_hash
        );
        Ok(SubmittedTx {
            tx_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
        })
    }

    async fn sign_typed_data(&self, payload: &TypedData) -> Result<Signature, ChainError> {
        self.account()?;
        let signer = self.wallet.signer()?;

        let domain = payload.domain.name.as_deref().unwrap_or("unnamed domain");
        let request = ApprovalRequest::SignTypedData {
            description: format!("{} for {}", payload.primary_type, domain),
        };
        if !self.wallet.approve(request).await {
            return Err(ChainError::UserRejected);
        }

        signer
            .sign_dynamic_typed_data(payload)
            .await
            .map_err(|e| ChainError::NetworkError(format!("Signing failed: {}", e)))
    }
}
