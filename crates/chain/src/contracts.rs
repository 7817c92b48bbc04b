// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::{
    primitives::{Address, Bytes, B256, U256},
    sol,
};
use lottery_utils::short_hex;
use std::fmt;

sol! {
    #[derive(Debug)]
    #[sol(rpc)]
    contract ConfidentialLottery {
        function TICKET_PRICE() external view returns (uint256);
        function PRIZE_AMOUNT() external view returns (uint256);
        function currentRound() external view returns (uint256);
        function rounds(uint256 roundId) external view returns (
            address player,
            bytes32 encryptedNumber,
            bytes32 winningNumber,
            bytes32 isWinner,
            bool isDrawn,
            bool isSettled,
            uint256 timestamp,
            uint256 ticketPrice
        );
        function buyTicket(bytes32 encryptedNumber, bytes calldata inputProof) external payable;
        function drawLottery(uint256 roundId) external;
        function checkWinner(uint256 roundId) external;
        function settleLottery(uint256 roundId, bool isWinner) external;
    }
}

/// A round as stored on the ledger. Ciphertext handles are zero until the contract has
/// computed them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RoundRecord {
    pub player: Address,
    pub encrypted_number: B256,
    pub winning_number: B256,
    pub is_winner: B256,
    pub is_drawn: bool,
    pub is_settled: bool,
    pub timestamp: U256,
    pub ticket_price: U256,
}

impl RoundRecord {
    /// The encrypted comparison has run for this round
    pub fn is_compared(&self) -> bool {
        !self.is_winner.is_zero()
    }
}

impl From<ConfidentialLottery::roundsReturn> for RoundRecord {
    fn from(value: ConfidentialLottery::roundsReturn) -> Self {
        Self {
            player: value.player,
            encrypted_number: value.encryptedNumber,
            winning_number: value.winningNumber,
            is_winner: value.isWinner,
            is_drawn: value.isDrawn,
            is_settled: value.isSettled,
            timestamp: value.timestamp,
            ticket_price: value.ticketPrice,
        }
    }
}

/// State changing operations on the lottery contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LotteryCall {
    BuyTicket {
        handle: B256,
        proof: Bytes,
        value: U256,
    },
    DrawLottery {
        round_id: U256,
    },
    CheckWinner {
        round_id: U256,
    },
    SettleLottery {
        round_id: U256,
        is_winner: bool,
    },
}

impl LotteryCall {
    pub fn name(&self) -> &'static str {
        match self {
            LotteryCall::BuyTicket { .. } => "buyTicket",
            LotteryCall::DrawLottery { .. } => "drawLottery",
            LotteryCall::CheckWinner { .. } => "checkWinner",
            LotteryCall::SettleLottery { .. } => "settleLottery",
        }
    }

    /// Native value attached to the transaction
    pub fn value(&self) -> U256 {
        match self {
            LotteryCall::BuyTicket { value, .. } => *value,
            _ => U256::ZERO,
        }
    }
}

impl fmt::Display for LotteryCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LotteryCall::BuyTicket {
                handle,
                proof,
                value,
            } => write!(
                f,
                "buyTicket(handle={}, proof={}) value={} wei",
                short_hex(handle.as_slice()),
                short_hex(proof),
                value
            ),
            LotteryCall::DrawLottery { round_id } => write!(f, "drawLottery({})", round_id),
            LotteryCall::CheckWinner { round_id } => write!(f, "checkWinner({})", round_id),
            LotteryCall::SettleLottery {
                round_id,
                is_winner,
            } => write!(f, "settleLottery({}, {})", round_id, is_winner),
        }
    }
}

/// A transaction that made it into a block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedTx {
    pub tx_hash: B256,
    pub block_number: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_record_conversion() {
        let player = Address::repeat_byte(0x11);
        let raw = ConfidentialLottery::roundsReturn {
            player,
            encryptedNumber: B256::repeat_byte(1),
            winningNumber: B256::repeat_byte(2),
            isWinner: B256::ZERO,
            isDrawn: true,
            isSettled: false,
            timestamp: U256::from(1_700_000_000u64),
            ticketPrice: U256::from(10u64),
        };

        let record = RoundRecord::from(raw);
        assert_eq!(record.player, player);
        assert!(record.is_drawn);
        assert!(!record.is_compared());
        assert_eq!(record.ticket_price, U256::from(10u64));
    }

    #[test]
    fn test_call_display() {
        let call = LotteryCall::SettleLottery {
            round_id: U256::from(4u64),
            is_winner: true,
        };
        assert_eq!(call.to_string(), "settleLottery(4, true)");
        assert_eq!(call.value(), U256::ZERO);
        assert_eq!(call.name(), "settleLottery");

        let buy = LotteryCall::BuyTicket {
            handle: B256::ZERO,
            proof: Bytes::from_static(&[1, 2, 3]),
            value: U256::from(7u64),
        };
        assert_eq!(buy.value(), U256::from(7u64));
        assert!(buy.to_string().ends_with("value=7 wei"));
    }
}
