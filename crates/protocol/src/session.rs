// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{ProtocolError, Stage};
use alloy_primitives::{utils::parse_ether, Address, U256};
use anyhow::{Context, Result};
use lottery_chain::{RoundRecord, SubmittedTx};
use lottery_config::LotteryConfig;
use lottery_fhe::EncryptedInput;

/// Contract constants loaded when the contract becomes ready
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContractInfo {
    pub ticket_price: U256,
    pub prize_amount: U256,
    pub pool_balance: U256,
}

/// The single in-flight ticket purchase of one user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub account: Option<Address>,
    pub chain_id: Option<u64>,
    pub stage: Stage,
    pub chosen_number: u8,
    pub round_id: Option<U256>,
    pub winning_number: Option<u8>,
    pub is_winner: Option<bool>,
    pub error: Option<ProtocolError>,
    /// Set when connecting failed on the wrong network
    pub network_switch_requested: bool,
    pub contract: Option<ContractInfo>,
    pub encrypted_input: Option<EncryptedInput>,
    pub round: Option<RoundRecord>,
    pub last_tx: Option<SubmittedTx>,
}

impl Session {
    pub fn new(default_number: u8) -> Self {
        Self {
            account: None,
            chain_id: None,
            stage: Stage::AwaitingWallet,
            chosen_number: default_number,
            round_id: None,
            winning_number: None,
            is_winner: None,
            error: None,
            network_switch_requested: false,
            contract: None,
            encrypted_input: None,
            round: None,
            last_tx: None,
        }
    }

    /// Drop everything tied to the current round. Account and contract binding stay.
    pub(crate) fn clear_round(&mut self, default_number: u8) {
        self.chosen_number = default_number;
        self.round_id = None;
        self.winning_number = None;
        self.is_winner = None;
        self.error = None;
        self.encrypted_input = None;
        self.round = None;
        self.last_tx = None;
        self.stage = Stage::AwaitingSelection;
    }
}

/// What the presentation layer sees
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub session: Session,
    pub busy: bool,
}

impl SessionSnapshot {
    pub fn stage(&self) -> Stage {
        self.session.stage
    }

    pub fn error(&self) -> Option<&ProtocolError> {
        self.session.error.as_ref()
    }
}

/// Knobs of the state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolSettings {
    pub min_number: u8,
    pub max_number: u8,
    pub default_number: u8,
    pub validity_days: u64,
    /// Balance below which a warning is logged after connecting
    pub min_balance: U256,
}

impl Default for ProtocolSettings {
    fn default() -> Self {
        Self {
            min_number: 1,
            max_number: 9,
            default_number: 1,
            validity_days: 30,
            min_balance: U256::from(10_000_000_000_000_000u64),
        }
    }
}

impl ProtocolSettings {
    pub fn from_config(config: &LotteryConfig) -> Result<Self> {
        let min_balance = parse_ether(&config.wallet.min_balance)
            .with_context(|| format!("Invalid wallet.min_balance '{}'", config.wallet.min_balance))?;
        Ok(Self {
            min_number: config.ticket.min_number,
            max_number: config.ticket.max_number,
            default_number: config.ticket.default_number,
            validity_days: config.decryption.validity_days,
            min_balance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_from_default_config() -> Result<()> {
        let settings = ProtocolSettings::from_config(&LotteryConfig::default())?;
        assert_eq!(settings, ProtocolSettings::default());
        Ok(())
    }

    #[test]
    fn test_clear_round_keeps_binding() {
        let mut session = Session::new(1);
        session.account = Some(Address::repeat_byte(1));
        session.stage = Stage::Completed;
        session.chosen_number = 5;
        session.round_id = Some(U256::from(3u64));
        session.winning_number = Some(5);
        session.is_winner = Some(true);

        session.clear_round(1);
        assert_eq!(session.stage, Stage::AwaitingSelection);
        assert_eq!(session.account, Some(Address::repeat_byte(1)));
        assert_eq!(session.chosen_number, 1);
        assert!(session.round_id.is_none());
        assert!(session.winning_number.is_none());
        assert!(session.is_winner.is_none());
    }
}
