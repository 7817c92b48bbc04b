// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{
    guard::{BusyGuard, Shared},
    ContractInfo, ProtocolError, ProtocolSettings, Session, SessionSnapshot, Stage,
};
use alloy_primitives::{utils::format_ether, Address, Signature, B256, U256};
use lottery_chain::{ChainClient, Connection, LotteryCall, RoundRecord, SubmittedTx};
use lottery_fhe::{
    ClearValue, DecryptionAuthorization, DecryptionKeypair, EncryptedInput, EncryptionProvider,
    HandleContractPair, UserDecryptRequest,
};
use lottery_utils::short_hex;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// How many rounds back `bind_round` looks for the purchase
const ROUND_LOOKBACK: u64 = 16;

/// Source of the current unix time in seconds
pub type Clock = Arc<dyn Fn() -> u64 + Send + Sync>;

fn system_clock() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp()).unwrap_or_default()
}

/// A signed decryption authorization kept for reuse until it expires
#[derive(Debug, Clone)]
struct DecryptionCredential {
    keypair: DecryptionKeypair,
    authorization: DecryptionAuthorization,
    signature: Signature,
}

/// Drives one user's ticket through the lottery stages.
///
/// Every action checks the current stage, holds the busy flag while it runs and either
/// advances the stage or records the error on the session. Observers follow along via
/// [`TicketProtocol::subscribe`].
pub struct TicketProtocol<C, E> {
    chain: Arc<C>,
    encryption: Arc<E>,
    settings: ProtocolSettings,
    shared: Shared,
    credential: Mutex<Option<DecryptionCredential>>,
    clock: Clock,
}

impl<C, E> TicketProtocol<C, E>
where
    C: ChainClient,
    E: EncryptionProvider,
{
    pub fn new(chain: Arc<C>, encryption: Arc<E>, settings: ProtocolSettings) -> Self {
        let session = Session::new(settings.default_number);
        Self {
            chain,
            encryption,
            settings,
            shared: Shared::new(session),
            credential: Mutex::new(None),
            clock: Arc::new(system_clock),
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn settings(&self) -> &ProtocolSettings {
        &self.settings
    }

    pub fn chain(&self) -> &Arc<C> {
        &self.chain
    }

    pub fn encryption(&self) -> &Arc<E> {
        &self.encryption
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.shared.snapshot()
    }

    pub fn stage(&self) -> Stage {
        self.shared.read().stage
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.shared.subscribe()
    }

    /// Connect the wallet and bind the account. A wallet on the wrong chain leaves the
    /// session waiting with a network switch requested.
    pub async fn connect_wallet(&self) -> Result<Stage, ProtocolError> {
        let _guard = self.begin("connect_wallet", &[Stage::AwaitingWallet])?;
        let result = self.connect_once().await;
        self.finish_or(
            "connect_wallet",
            result,
            apply_connection,
            request_switch_on_wrong_network,
        )
    }

    /// Move the wallet to the lottery chain, then connect again
    pub async fn switch_network(&self) -> Result<Stage, ProtocolError> {
        let _guard = self.begin("switch_network", &[Stage::AwaitingWallet])?;
        let result = self.switch_and_connect().await;
        self.finish_or(
            "switch_network",
            result,
            apply_connection,
            request_switch_on_wrong_network,
        )
    }

    /// Read the contract constants and bring the encryption provider up
    pub async fn init_contract(&self) -> Result<Stage, ProtocolError> {
        let _guard = self.begin("init_contract", &[Stage::AwaitingContractReady])?;
        let result = self.load_contract().await;
        self.finish("init_contract", result, |session, info| {
            session.contract = Some(info);
            Stage::AwaitingSelection
        })
    }

    pub fn select_number(&self, number: u8) -> Result<Stage, ProtocolError> {
        let _guard = self.begin("select_number", &[Stage::AwaitingSelection])?;
        let (min, max) = (self.settings.min_number, self.settings.max_number);
        let result = if (min..=max).contains(&number) {
            Ok(number)
        } else {
            Err(ProtocolError::NumberOutOfRange { number, min, max })
        };
        self.finish("select_number", result, |session, number| {
            session.chosen_number = number;
            Stage::Encrypting
        })
    }

    pub async fn encrypt_number(&self) -> Result<Stage, ProtocolError> {
        let _guard = self.begin("encrypt_number", &[Stage::Encrypting])?;
        let result = self.encrypt_chosen().await;
        self.finish("encrypt_number", result, |session, input| {
            session.encrypted_input = Some(input);
            Stage::Submitting
        })
    }

    /// Buy the ticket. Any failure sends the session back to number selection and drops
    /// the encrypted input.
    pub async fn submit_ticket(&self) -> Result<Stage, ProtocolError> {
        let _guard = self.begin("submit_ticket", &[Stage::Submitting])?;
        let result = self.purchase().await;
        self.finish_or(
            "submit_ticket",
            result,
            |session, tx| {
                session.last_tx = Some(tx);
                Stage::RoundBound
            },
            |session, _| {
                session.encrypted_input = None;
                session.stage = Stage::AwaitingSelection;
            },
        )
    }

    /// Find the round the purchase created and check it belongs to the account
    pub async fn bind_round(&self) -> Result<Stage, ProtocolError> {
        let _guard = self.begin("bind_round", &[Stage::RoundBound])?;
        let result = self.derive_round().await;
        self.finish("bind_round", result, |session, (round_id, record)| {
            session.round_id = Some(round_id);
            session.round = Some(record);
            Stage::AwaitingDraw
        })
    }

    pub async fn draw(&self) -> Result<Stage, ProtocolError> {
        let _guard = self.begin("draw", &[Stage::AwaitingDraw])?;
        let result = self
            .submit_for_round(|round_id| LotteryCall::DrawLottery { round_id })
            .await;
        self.finish("draw", result, |session, tx| {
            session.last_tx = Some(tx);
            Stage::AwaitingComparison
        })
    }

    pub async fn check_winner(&self) -> Result<Stage, ProtocolError> {
        let _guard = self.begin("check_winner", &[Stage::AwaitingComparison])?;
        let result = self
            .submit_for_round(|round_id| LotteryCall::CheckWinner { round_id })
            .await;
        self.finish("check_winner", result, |session, tx| {
            session.last_tx = Some(tx);
            Stage::AwaitingDecryptTrigger
        })
    }

    /// Load the round record holding the handles to decrypt
    pub async fn fetch_round(&self) -> Result<Stage, ProtocolError> {
        let _guard = self.begin("fetch_round", &[Stage::AwaitingDecryptTrigger])?;
        let result = self.load_round().await;
        self.finish("fetch_round", result, |session, record| {
            session.round = Some(record);
            Stage::Decrypting
        })
    }

    /// Decrypt the winning number and the outcome. Both land on the session together or
    /// not at all. A result the network has not produced yet leaves the stage unchanged.
    pub async fn decrypt_result(&self) -> Result<Stage, ProtocolError> {
        let _guard = self.begin("decrypt_result", &[Stage::Decrypting])?;
        let result = self.decrypt_outcome().await;
        self.finish(
            "decrypt_result",
            result,
            |session, (winning_number, is_winner)| {
                session.winning_number = Some(winning_number);
                session.is_winner = Some(is_winner);
                Stage::ResultReady
            },
        )
    }

    pub fn begin_settlement(&self) -> Result<Stage, ProtocolError> {
        let _guard = self.begin("begin_settlement", &[Stage::ResultReady])?;
        let decrypted = {
            let session = self.shared.read();
            session.winning_number.is_some() && session.is_winner.is_some()
        };
        let result = if decrypted {
            Ok(())
        } else {
            Err(ProtocolError::RoundNotReady(
                "the result has not been decrypted".to_string(),
            ))
        };
        self.finish("begin_settlement", result, |_, ()| Stage::Settling)
    }

    pub async fn settle(&self) -> Result<Stage, ProtocolError> {
        let _guard = self.begin("settle", &[Stage::Settling])?;
        let result = self.submit_settlement().await;
        self.finish("settle", result, |session, tx| {
            session.last_tx = Some(tx);
            Stage::Completed
        })
    }

    /// Start over with a new ticket. The account and contract binding are kept.
    pub fn reset(&self) -> Result<Stage, ProtocolError> {
        let _guard = self.begin(
            "reset",
            &[
                Stage::ResultReady,
                Stage::Completed,
                Stage::AwaitingSelection,
            ],
        )?;
        let default_number = self.settings.default_number;
        self.finish("reset", Ok(()), |session, ()| {
            session.clear_round(default_number);
            Stage::AwaitingSelection
        })
    }

    /// Pick up a round bought in an earlier session. The stage is derived from what the
    /// contract already recorded for the round.
    pub async fn resume_round(&self, round_id: U256) -> Result<Stage, ProtocolError> {
        let _guard = self.begin("resume_round", &[Stage::AwaitingSelection])?;
        let result = self.recover_round(round_id).await;
        self.finish("resume_round", result, |session, record| {
            let stage = if !record.is_drawn {
                Stage::AwaitingDraw
            } else if !record.is_compared() {
                Stage::AwaitingComparison
            } else {
                Stage::AwaitingDecryptTrigger
            };
            session.round_id = Some(round_id);
            session.round = Some(record);
            session.encrypted_input = None;
            stage
        })
    }

    /// Run the action the current stage exposes, using the session's chosen number for
    /// the selection.
    pub async fn advance(&self) -> Result<Stage, ProtocolError> {
        let (stage, switch_requested, number) = {
            let session = self.shared.read();
            (
                session.stage,
                session.network_switch_requested,
                session.chosen_number,
            )
        };
        match stage {
            Stage::AwaitingWallet if switch_requested => self.switch_network().await,
            Stage::AwaitingWallet => self.connect_wallet().await,
            Stage::AwaitingContractReady => self.init_contract().await,
            Stage::AwaitingSelection => self.select_number(number),
            Stage::Encrypting => self.encrypt_number().await,
            Stage::Submitting => self.submit_ticket().await,
            Stage::RoundBound => self.bind_round().await,
            Stage::AwaitingDraw => self.draw().await,
            Stage::AwaitingComparison => self.check_winner().await,
            Stage::AwaitingDecryptTrigger => self.fetch_round().await,
            Stage::Decrypting => self.decrypt_result().await,
            Stage::ResultReady => self.begin_settlement(),
            Stage::Settling => self.settle().await,
            Stage::Completed => Ok(Stage::Completed),
        }
    }

    fn begin(
        &self,
        action: &'static str,
        allowed: &[Stage],
    ) -> Result<BusyGuard<'_>, ProtocolError> {
        let guard = BusyGuard::acquire(&self.shared).ok_or(ProtocolError::ActionInProgress)?;
        let mut session = self.shared.write();
        if !allowed.contains(&session.stage) {
            let err = ProtocolError::InvalidStageTransition {
                action,
                actual: session.stage,
            };
            error!("{}", err);
            session.error = Some(err.clone());
            return Err(err);
        }
        session.error = None;
        debug!("{} started at {}", action, session.stage);
        Ok(guard)
    }

    fn finish<T>(
        &self,
        action: &'static str,
        result: Result<T, ProtocolError>,
        apply: impl FnOnce(&mut Session, T) -> Stage,
    ) -> Result<Stage, ProtocolError> {
        self.finish_or(action, result, apply, |_, _| {})
    }

    fn finish_or<T>(
        &self,
        action: &'static str,
        result: Result<T, ProtocolError>,
        apply: impl FnOnce(&mut Session, T) -> Stage,
        on_error: impl FnOnce(&mut Session, &ProtocolError),
    ) -> Result<Stage, ProtocolError> {
        let mut session = self.shared.write();
        match result {
            Ok(value) => {
                let from = session.stage;
                let to = apply(&mut *session, value);
                session.stage = to;
                info!("{}: {} -> {}", action, from, to);
                Ok(to)
            }
            Err(err) => {
                if err.is_expected() {
                    warn!("{}: {}", action, err);
                } else {
                    error!("{} failed: {}", action, err);
                }
                on_error(&mut *session, &err);
                session.error = Some(err.clone());
                Err(err)
            }
        }
    }

    fn account(&self) -> Result<Address, ProtocolError> {
        self.shared
            .read()
            .account
            .ok_or_else(|| ProtocolError::WalletUnavailable("no account is bound".to_string()))
    }

    fn round_id(&self) -> Result<U256, ProtocolError> {
        self.shared
            .read()
            .round_id
            .ok_or_else(|| ProtocolError::RoundNotReady("no round is bound".to_string()))
    }

    async fn connect_once(&self) -> Result<Connection, ProtocolError> {
        let connection = self.chain.connect().await?;
        if connection.balance < self.settings.min_balance {
            warn!(
                "Balance of {} is {} ETH, below the recommended {} ETH",
                connection.account,
                format_ether(connection.balance),
                format_ether(self.settings.min_balance)
            );
        }
        Ok(connection)
    }

    async fn switch_and_connect(&self) -> Result<Connection, ProtocolError> {
        let requested = self.shared.read().network_switch_requested;
        if !requested {
            return Err(ProtocolError::InvalidStageTransition {
                action: "switch_network",
                actual: Stage::AwaitingWallet,
            });
        }
        let switch = self.chain.switch_network().await?;
        info!(
            "Wallet moved to chain {} ({:?})",
            self.chain.required_chain_id(),
            switch
        );
        self.connect_once().await
    }

    async fn load_contract(&self) -> Result<ContractInfo, ProtocolError> {
        let ticket_price = self.chain.ticket_price().await?;
        let prize_amount = self.chain.prize_amount().await?;
        let pool_balance = self.chain.pool_balance().await?;
        if pool_balance < prize_amount {
            warn!(
                "Prize pool holds {} ETH but a win pays {} ETH",
                format_ether(pool_balance),
                format_ether(prize_amount)
            );
        }
        self.encryption.init().await?;
        Ok(ContractInfo {
            ticket_price,
            prize_amount,
            pool_balance,
        })
    }

    async fn encrypt_chosen(&self) -> Result<EncryptedInput, ProtocolError> {
        let account = self.account()?;
        let number = self.shared.read().chosen_number;
        let input = self
            .encryption
            .encrypt(
                ClearValue::Uint8(number),
                self.chain.contract_address(),
                account,
            )
            .await?;
        debug!(
            "Encrypted ticket number under handle {}",
            short_hex(input.handle.as_slice())
        );
        Ok(input)
    }

    async fn purchase(&self) -> Result<SubmittedTx, ProtocolError> {
        let input = self.shared.read().encrypted_input.clone().ok_or_else(|| {
            ProtocolError::EncryptionFailed("no encrypted input to submit".to_string())
        })?;
        // Always pay the price the contract currently asks for
        let value = self.chain.ticket_price().await?;
        let tx = self
            .chain
            .submit(LotteryCall::BuyTicket {
                handle: input.handle,
                proof: input.proof,
                value,
            })
            .await?;
        Ok(tx)
    }

    /// Walk back from the newest round to the one holding this purchase. Other players
    /// may have bought tickets between the purchase and this call.
    async fn derive_round(&self) -> Result<(U256, RoundRecord), ProtocolError> {
        let account = self.account()?;
        let handle = self
            .shared
            .read()
            .encrypted_input
            .as_ref()
            .map(|input| input.handle);
        let counter = self.chain.current_round().await?;
        let newest = counter.checked_sub(U256::from(1u64)).ok_or_else(|| {
            ProtocolError::RoundNotReady("the round counter has not moved".to_string())
        })?;

        let mut round_id = newest;
        for _ in 0..ROUND_LOOKBACK {
            let record = self.chain.round(round_id).await?;
            let ours = record.player == account
                && !record.is_settled
                && handle.is_none_or(|h| h == record.encrypted_number);
            if ours {
                if round_id != newest {
                    warn!(
                        "{} rounds were bought after ours, bound to round {}",
                        newest - round_id,
                        round_id
                    );
                }
                info!("Ticket bound to round {}", round_id);
                return Ok((round_id, record));
            }
            match round_id.checked_sub(U256::from(1u64)) {
                Some(previous) => round_id = previous,
                None => break,
            }
        }
        Err(ProtocolError::RoundMismatch(format!(
            "none of the last {} rounds up to {} holds this ticket",
            ROUND_LOOKBACK, newest
        )))
    }

    async fn submit_for_round(
        &self,
        call: impl FnOnce(U256) -> LotteryCall,
    ) -> Result<SubmittedTx, ProtocolError> {
        let round_id = self.round_id()?;
        Ok(self.chain.submit(call(round_id)).await?)
    }

    async fn load_round(&self) -> Result<RoundRecord, ProtocolError> {
        let account = self.account()?;
        let round_id = self.round_id()?;
        let record = self.chain.round(round_id).await?;
        if record.player != account {
            return Err(ProtocolError::RoundMismatch(format!(
                "round {} belongs to {}",
                round_id, record.player
            )));
        }
        if !record.is_drawn {
            return Err(ProtocolError::RoundNotReady(format!(
                "round {} has not been drawn",
                round_id
            )));
        }
        if !record.is_compared() {
            return Err(ProtocolError::RoundNotReady(format!(
                "round {} has not been compared",
                round_id
            )));
        }
        Ok(record)
    }

    async fn recover_round(&self, round_id: U256) -> Result<RoundRecord, ProtocolError> {
        let account = self.account()?;
        let record = self.chain.round(round_id).await?;
        if record.player != account {
            return Err(ProtocolError::RoundMismatch(format!(
                "round {} was bought by {}",
                round_id, record.player
            )));
        }
        if record.is_settled {
            return Err(ProtocolError::RoundMismatch(format!(
                "round {} is already settled",
                round_id
            )));
        }
        info!("Resuming round {}", round_id);
        Ok(record)
    }

    async fn decrypt_outcome(&self) -> Result<(u8, bool), ProtocolError> {
        let account = self.account()?;
        let record = self.shared.read().round.clone().ok_or_else(|| {
            ProtocolError::RoundNotReady("the round record has not been loaded".to_string())
        })?;
        let contract = self.chain.contract_address();
        let credential = self.credential(account, contract).await?;

        let winning = self
            .decrypt_handle(&credential, record.winning_number, contract, account)
            .await?;
        let outcome = self
            .decrypt_handle(&credential, record.is_winner, contract, account)
            .await?;

        let ClearValue::Uint8(winning_number) = winning else {
            return Err(ProtocolError::MalformedDecryption(format!(
                "winning number {} is not a u8",
                winning
            )));
        };
        let is_winner = outcome.as_bool().ok_or_else(|| {
            ProtocolError::MalformedDecryption(format!("outcome {} is not a boolean", outcome))
        })?;
        Ok((winning_number, is_winner))
    }

    async fn decrypt_handle(
        &self,
        credential: &DecryptionCredential,
        handle: B256,
        contract: Address,
        user: Address,
    ) -> Result<ClearValue, ProtocolError> {
        let request = UserDecryptRequest {
            handles: vec![HandleContractPair { handle, contract }],
            keypair: credential.keypair.clone(),
            signature: credential.signature,
            contract_addresses: credential.authorization.contract_addresses.clone(),
            user,
            valid_from: credential.authorization.valid_from,
            validity_days: credential.authorization.validity_days,
        };
        let mut values = self.encryption.decrypt(&request).await?;
        values.remove(&handle).ok_or_else(|| {
            ProtocolError::MalformedDecryption(format!(
                "no value returned for {}",
                short_hex(handle.as_slice())
            ))
        })
    }

    /// Reuse the signed authorization until it expires, then issue and sign a new one
    async fn credential(
        &self,
        account: Address,
        contract: Address,
    ) -> Result<DecryptionCredential, ProtocolError> {
        let now = (self.clock)();
        let cached = self
            .credential
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(credential) = cached {
            if !credential.authorization.is_expired(now) {
                return Ok(credential);
            }
            info!("Decryption authorization expired, requesting a new signature");
        }

        let keypair = self.encryption.generate_keypair()?;
        let authorization = self.encryption.authorize_decryption(
            &keypair.public_key,
            &[contract],
            now,
            self.settings.validity_days,
        )?;
        let signature = self.chain.sign_typed_data(&authorization.typed_data).await?;
        debug!(
            "Decryption authorized for {} until {}",
            account,
            authorization.expires_at()
        );

        let credential = DecryptionCredential {
            keypair,
            authorization,
            signature,
        };
        *self
            .credential
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(credential.clone());
        Ok(credential)
    }

    async fn submit_settlement(&self) -> Result<SubmittedTx, ProtocolError> {
        let round_id = self.round_id()?;
        let is_winner = self.shared.read().is_winner.ok_or_else(|| {
            ProtocolError::RoundNotReady("the result has not been decrypted".to_string())
        })?;
        let tx = self
            .chain
            .submit(LotteryCall::SettleLottery {
                round_id,
                is_winner,
            })
            .await?;
        if is_winner {
            info!("Round {} settled, the prize was paid out", round_id);
        } else {
            info!("Round {} settled", round_id);
        }
        Ok(tx)
    }
}

fn apply_connection(session: &mut Session, connection: Connection) -> Stage {
    session.account = Some(connection.account);
    session.chain_id = Some(connection.chain_id);
    session.network_switch_requested = false;
    Stage::AwaitingContractReady
}

fn request_switch_on_wrong_network(session: &mut Session, err: &ProtocolError) {
    if let ProtocolError::WrongNetwork { .. } = err {
        session.network_switch_requested = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lottery_test_helpers::{mock_backends, MockChain, MockRelayer};
    use std::sync::atomic::{AtomicU64, Ordering};

    type Protocol = TicketProtocol<MockChain, MockRelayer>;

    fn protocol() -> (Protocol, Arc<MockChain>, Arc<MockRelayer>) {
        let (chain, relayer) = mock_backends();
        let protocol =
            TicketProtocol::new(chain.clone(), relayer.clone(), ProtocolSettings::default());
        (protocol, chain, relayer)
    }

    async fn advance_to(protocol: &Protocol, target: Stage) -> Result<(), ProtocolError> {
        while protocol.stage() != target {
            protocol.advance().await?;
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_advance_runs_every_stage() -> Result<(), ProtocolError> {
        let (protocol, chain, _) = protocol();
        let mut visited = vec![protocol.stage()];
        while !protocol.stage().is_terminal() {
            visited.push(protocol.advance().await?);
        }
        assert_eq!(visited.len(), 13);
        assert_eq!(chain.calls().len(), 4);
        assert_eq!(protocol.advance().await?, Stage::Completed);
        Ok(())
    }

    #[tokio::test]
    async fn test_concurrent_action_is_refused() -> Result<(), ProtocolError> {
        let (protocol, chain, _) = protocol();
        advance_to(&protocol, Stage::AwaitingDraw).await?;

        let release = chain.hold_next_submission();
        let draw = protocol.draw();
        let competing = async {
            tokio::task::yield_now().await;
            let refused = protocol.draw().await;
            let busy = protocol.snapshot().busy;
            release.notify_one();
            (refused, busy)
        };
        let (drawn, (refused, busy)) = tokio::join!(draw, competing);

        assert_eq!(refused, Err(ProtocolError::ActionInProgress));
        assert!(busy);
        assert_eq!(drawn, Ok(Stage::AwaitingComparison));
        assert!(!protocol.snapshot().busy);
        assert!(protocol.snapshot().error().is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_authorization_is_reused_until_expiry() -> Result<(), ProtocolError> {
        let now = Arc::new(AtomicU64::new(1_700_000_000));
        let clock = now.clone();
        let (protocol, chain, relayer) = protocol();
        let protocol = protocol.with_clock(Arc::new(move || clock.load(Ordering::SeqCst)));

        advance_to(&protocol, Stage::ResultReady).await?;
        assert_eq!(chain.signatures(), 1);

        // A second round inside the validity window signs nothing new
        protocol.reset()?;
        advance_to(&protocol, Stage::ResultReady).await?;
        assert_eq!(chain.signatures(), 1);
        assert_eq!(relayer.keypairs(), 1);

        now.fetch_add(31 * 86_400, Ordering::SeqCst);
        protocol.reset()?;
        advance_to(&protocol, Stage::ResultReady).await?;
        assert_eq!(chain.signatures(), 2);
        assert_eq!(relayer.keypairs(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_snapshots_follow_transitions() -> Result<(), ProtocolError> {
        let (protocol, _, _) = protocol();
        let mut rx = protocol.subscribe();
        protocol.connect_wallet().await?;

        rx.changed().await.ok();
        let snapshot = rx.borrow_and_update().clone();
        assert_eq!(snapshot.stage(), Stage::AwaitingContractReady);
        assert!(!snapshot.busy);
        assert!(snapshot.session.account.is_some());
        Ok(())
    }
}
