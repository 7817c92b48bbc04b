// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::FakeCoprocessor;
use alloy::{
    primitives::{Address, Signature, B256, U256},
    signers::{local::PrivateKeySigner, Signer},
};
use alloy_dyn_abi::TypedData;
use async_trait::async_trait;
use lottery_chain::{
    ChainClient, ChainError, Connection, LotteryCall, NetworkSwitch, RoundRecord, SubmittedTx,
};
use lottery_fhe::{proof::InputProof, ClearValue};
use std::{
    collections::BTreeSet,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};
use tokio::sync::Notify;
use tracing::debug;

pub const SEPOLIA_CHAIN_ID: u64 = 11155111;

/// 0.0001 ETH
pub const DEFAULT_TICKET_PRICE: u64 = 100_000_000_000_000;
/// 0.0005 ETH
pub const DEFAULT_PRIZE_AMOUNT: u64 = 500_000_000_000_000;
/// 1 ETH
pub const DEFAULT_FUNDS: u64 = 1_000_000_000_000_000_000;

struct Ledger {
    wallet_available: bool,
    reject_connect: bool,
    wallet_chain: u64,
    known_chains: BTreeSet<u64>,
    connected: bool,
    reject_next_tx: bool,
    failing_reads: u32,
    ticket_price: U256,
    quoted_price: Option<U256>,
    prize_amount: U256,
    pool: U256,
    balance: U256,
    next_winning_number: u8,
    rounds: Vec<RoundRecord>,
    calls: Vec<LotteryCall>,
    connects: u32,
    switches: u32,
    signatures: u32,
    block: u64,
}

/// In-memory lottery ledger with a single funded player account. Draws and comparisons
/// run on the shared [`FakeCoprocessor`] so the relayer double can decrypt the results.
pub struct MockChain {
    coprocessor: FakeCoprocessor,
    signer: PrivateKeySigner,
    contract: Address,
    required_chain_id: u64,
    ledger: Mutex<Ledger>,
    hold: Mutex<Option<Arc<Notify>>>,
}

impl MockChain {
    pub fn new(coprocessor: FakeCoprocessor) -> Self {
        let mut known_chains = BTreeSet::new();
        known_chains.insert(SEPOLIA_CHAIN_ID);
        Self {
            coprocessor,
            signer: PrivateKeySigner::random(),
            contract: Address::repeat_byte(0x98),
            required_chain_id: SEPOLIA_CHAIN_ID,
            ledger: Mutex::new(Ledger {
                wallet_available: true,
                reject_connect: false,
                wallet_chain: SEPOLIA_CHAIN_ID,
                known_chains,
                connected: false,
                reject_next_tx: false,
                failing_reads: 0,
                ticket_price: U256::from(DEFAULT_TICKET_PRICE),
                quoted_price: None,
                prize_amount: U256::from(DEFAULT_PRIZE_AMOUNT),
                pool: U256::from(DEFAULT_FUNDS),
                balance: U256::from(DEFAULT_FUNDS),
                next_winning_number: 5,
                rounds: Vec::new(),
                calls: Vec::new(),
                connects: 0,
                switches: 0,
                signatures: 0,
                block: 1,
            }),
            hold: Mutex::new(None),
        }
    }

    fn ledger(&self) -> MutexGuard<'_, Ledger> {
        self.ledger.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Put the wallet on another chain. When `known` is false the wallet also has to
    /// add the lottery chain before it can switch.
    pub fn with_wallet_on(self, chain_id: u64, known: bool) -> Self {
        {
            let mut ledger = self.ledger();
            ledger.wallet_chain = chain_id;
            ledger.known_chains.insert(chain_id);
            if !known {
                ledger.known_chains.remove(&self.required_chain_id);
            }
        }
        self
    }

    pub fn without_wallet(self) -> Self {
        self.ledger().wallet_available = false;
        self
    }

    pub fn rejecting_connect(self) -> Self {
        self.ledger().reject_connect = true;
        self
    }

    pub fn with_pool(self, pool: U256) -> Self {
        self.ledger().pool = pool;
        self
    }

    pub fn with_balance(self, balance: U256) -> Self {
        self.ledger().balance = balance;
        self
    }

    /// Value the next draw stores as the encrypted winning number
    pub fn set_winning_number(&self, number: u8) {
        self.ledger().next_winning_number = number;
    }

    /// Make price reads report a stale quote while purchases still check the real price
    pub fn quote_price(&self, price: U256) {
        self.ledger().quoted_price = Some(price);
    }

    pub fn reject_next_transaction(&self) {
        self.ledger().reject_next_tx = true;
    }

    /// The next `count` reads fail with a network error
    pub fn fail_reads(&self, count: u32) {
        self.ledger().failing_reads = count;
    }

    /// Park the next submission until the returned notify fires
    pub fn hold_next_submission(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        *self.hold.lock().unwrap_or_else(PoisonError::into_inner) = Some(notify.clone());
        notify
    }

    /// Append a round bought by someone else
    pub fn push_foreign_round(&self, player: Address) -> U256 {
        let handle = self.coprocessor.register(ClearValue::Uint8(1));
        let mut ledger = self.ledger();
        let price = ledger.ticket_price;
        ledger.rounds.push(RoundRecord {
            player,
            encrypted_number: handle,
            ticket_price: price,
            ..Default::default()
        });
        U256::from(ledger.rounds.len() - 1)
    }

    pub fn account(&self) -> Address {
        self.signer.address()
    }

    pub fn balance_of_player(&self) -> U256 {
        self.ledger().balance
    }

    pub fn pool(&self) -> U256 {
        self.ledger().pool
    }

    pub fn wallet_chain(&self) -> u64 {
        self.ledger().wallet_chain
    }

    pub fn round_record(&self, round_id: usize) -> Option<RoundRecord> {
        self.ledger().rounds.get(round_id).cloned()
    }

    pub fn round_count(&self) -> usize {
        self.ledger().rounds.len()
    }

    pub fn calls(&self) -> Vec<LotteryCall> {
        self.ledger().calls.clone()
    }

    pub fn connects(&self) -> u32 {
        self.ledger().connects
    }

    pub fn switches(&self) -> u32 {
        self.ledger().switches
    }

    pub fn signatures(&self) -> u32 {
        self.ledger().signatures
    }

    fn read<T>(&self, read_fn: impl FnOnce(&Ledger) -> T) -> Result<T, ChainError> {
        let mut ledger = self.ledger();
        if !ledger.connected {
            return Err(ChainError::NotConnected);
        }
        if ledger.failing_reads > 0 {
            ledger.failing_reads -= 1;
            return Err(ChainError::NetworkError("connection reset".to_string()));
        }
        Ok(read_fn(&ledger))
    }

    fn apply(&self, ledger: &mut Ledger, call: &LotteryCall) -> Result<(), ChainError> {
        let player = self.signer.address();
        match call {
            LotteryCall::BuyTicket {
                handle,
                proof,
                value,
            } => {
                if *value < ledger.ticket_price {
                    return Err(revert("Insufficient payment"));
                }
                if *value > ledger.balance {
                    return Err(ChainError::NetworkError(
                        "insufficient funds for gas * price + value".to_string(),
                    ));
                }
                let valid = InputProof::parse(proof)
                    .map(|proof| proof.contains(handle))
                    .unwrap_or(false);
                if !valid || self.coprocessor.value(handle).is_none() {
                    return Err(revert("Invalid input proof"));
                }
                ledger.balance -= *value;
                ledger.pool += *value;
                let timestamp = U256::from(ledger.block * 12);
                ledger.rounds.push(RoundRecord {
                    player,
                    encrypted_number: *handle,
                    timestamp,
                    ticket_price: *value,
                    ..Default::default()
                });
            }
            LotteryCall::DrawLottery { round_id } => {
                let winning_number = ledger.next_winning_number;
                let round = own_round(ledger, *round_id, player)?;
                if round.is_drawn {
                    return Err(revert("Already drawn"));
                }
                round.winning_number = self
                    .coprocessor
                    .register(ClearValue::Uint8(winning_number));
                round.is_drawn = true;
            }
            LotteryCall::CheckWinner { round_id } => {
                let round = own_round(ledger, *round_id, player)?;
                if !round.is_drawn {
                    return Err(revert("Not drawn yet"));
                }
                let chosen = self.coprocessor.value(&round.encrypted_number);
                let winning = self.coprocessor.value(&round.winning_number);
                let is_winner = chosen.is_some() && chosen == winning;
                round.is_winner = self.coprocessor.register(ClearValue::Bool(is_winner));
            }
            LotteryCall::SettleLottery {
                round_id,
                is_winner,
            } => {
                let prize = ledger.prize_amount;
                let pool = ledger.pool;
                let round = own_round(ledger, *round_id, player)?;
                if !round.is_compared() {
                    return Err(revert("Not checked yet"));
                }
                if round.is_settled {
                    return Err(revert("Already settled"));
                }
                let actual = self
                    .coprocessor
                    .value(&round.is_winner)
                    .and_then(|v| v.as_bool())
                    .unwrap_or(false);
                if *is_winner != actual {
                    return Err(revert("Result does not match"));
                }
                if *is_winner && pool < prize {
                    return Err(revert("Insufficient prize pool"));
                }
                round.is_settled = true;
                if *is_winner {
                    ledger.pool -= prize;
                    ledger.balance += prize;
                }
            }
        }
        Ok(())
    }
}

fn revert(reason: &str) -> ChainError {
    ChainError::TransactionReverted(format!("execution reverted: {}", reason))
}

fn own_round(
    ledger: &mut Ledger,
    round_id: U256,
    player: Address,
) -> Result<&mut RoundRecord, ChainError> {
    let round = usize::try_from(round_id)
        .ok()
        .and_then(|id| ledger.rounds.get_mut(id))
        .ok_or_else(|| revert("Invalid round"))?;
    if round.player != player {
        return Err(revert("Not your round"));
    }
    Ok(round)
}

#[async_trait]
impl ChainClient for MockChain {
    fn required_chain_id(&self) -> u64 {
        self.required_chain_id
    }

    fn contract_address(&self) -> Address {
        self.contract
    }

    async fn connect(&self) -> Result<Connection, ChainError> {
        let mut ledger = self.ledger();
        ledger.connects += 1;
        if !ledger.wallet_available {
            return Err(ChainError::NoWallet("no signer configured".to_string()));
        }
        if ledger.reject_connect {
            return Err(ChainError::UserRejected);
        }
        if ledger.wallet_chain != self.required_chain_id {
            return Err(ChainError::WrongNetwork {
                expected: self.required_chain_id,
                actual: ledger.wallet_chain,
            });
        }
        ledger.connected = true;
        Ok(Connection {
            account: self.signer.address(),
            chain_id: ledger.wallet_chain,
            balance: ledger.balance,
        })
    }

    async fn switch_network(&self) -> Result<NetworkSwitch, ChainError> {
        let mut ledger = self.ledger();
        ledger.switches += 1;
        ledger.wallet_chain = self.required_chain_id;
        if ledger.known_chains.insert(self.required_chain_id) {
            Ok(NetworkSwitch::AddedAndSwitched)
        } else {
            Ok(NetworkSwitch::Switched)
        }
    }

    async fn ticket_price(&self) -> Result<U256, ChainError> {
        self.read(|ledger| ledger.quoted_price.unwrap_or(ledger.ticket_price))
    }

    async fn prize_amount(&self) -> Result<U256, ChainError> {
        self.read(|ledger| ledger.prize_amount)
    }

    async fn pool_balance(&self) -> Result<U256, ChainError> {
        self.read(|ledger| ledger.pool)
    }

    async fn current_round(&self) -> Result<U256, ChainError> {
        self.read(|ledger| U256::from(ledger.rounds.len()))
    }

    async fn round(&self, round_id: U256) -> Result<RoundRecord, ChainError> {
        // Unknown ids read as an empty record, like a contract mapping
        self.read(|ledger| {
            usize::try_from(round_id)
                .ok()
                .and_then(|id| ledger.rounds.get(id).cloned())
                .unwrap_or_default()
        })
    }

    async fn balance(&self, account: Address) -> Result<U256, ChainError> {
        let player = self.signer.address();
        self.read(|ledger| {
            if account == player {
                ledger.balance
            } else {
                U256::ZERO
            }
        })
    }

    async fn submit(&self, call: LotteryCall) -> Result<SubmittedTx, ChainError> {
        let hold = self
            .hold
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(notify) = hold {
            notify.notified().await;
        }

        let mut ledger = self.ledger();
        if !ledger.connected {
            return Err(ChainError::NotConnected);
        }
        if ledger.reject_next_tx {
            ledger.reject_next_tx = false;
            return Err(ChainError::TransactionRejected);
        }
        self.apply(&mut ledger, &call)?;
        ledger.block += 1;
        debug!("Mined {} in block {}", call, ledger.block);
        ledger.calls.push(call);
        Ok(SubmittedTx {
            tx_hash: B256::left_padding_from(&ledger.block.to_be_bytes()),
            block_number: Some(ledger.block),
        })
    }

    async fn sign_typed_data(&self, payload: &TypedData) -> Result<Signature, ChainError> {
        if !self.ledger().connected {
            return Err(ChainError::NotConnected);
        }
        let signature = self
            .signer
            .sign_dynamic_typed_data(payload)
            .await
            .map_err(|e| ChainError::NetworkError(e.to_string()))?;
        self.ledger().signatures += 1;
        Ok(signature)
    }
}
