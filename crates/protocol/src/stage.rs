// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use strum::{Display, EnumIter};

/// Position of a session in the ticket protocol. Stages only move forward except for
/// an explicit reset or a failed purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter)]
pub enum Stage {
    AwaitingWallet,
    AwaitingContractReady,
    AwaitingSelection,
    Encrypting,
    Submitting,
    RoundBound,
    AwaitingDraw,
    AwaitingComparison,
    AwaitingDecryptTrigger,
    Decrypting,
    ResultReady,
    Settling,
    Completed,
}

impl Stage {
    /// Name of the one action this stage exposes
    pub fn action(&self) -> &'static str {
        match self {
            Stage::AwaitingWallet => "connect_wallet",
            Stage::AwaitingContractReady => "init_contract",
            Stage::AwaitingSelection => "select_number",
            Stage::Encrypting => "encrypt_number",
            Stage::Submitting => "submit_ticket",
            Stage::RoundBound => "bind_round",
            Stage::AwaitingDraw => "draw",
            Stage::AwaitingComparison => "check_winner",
            Stage::AwaitingDecryptTrigger => "fetch_round",
            Stage::Decrypting => "decrypt_result",
            Stage::ResultReady => "begin_settlement",
            Stage::Settling => "settle",
            Stage::Completed => "reset",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Completed)
    }

    /// A round id is bound from this stage on
    pub fn has_round(&self) -> bool {
        *self >= Stage::AwaitingDraw
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_stage_order() {
        let stages: Vec<Stage> = Stage::iter().collect();
        assert_eq!(stages.len(), 13);
        assert_eq!(stages.first(), Some(&Stage::AwaitingWallet));
        assert_eq!(stages.last(), Some(&Stage::Completed));
        assert!(stages.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_actions_are_unique() {
        let mut actions: Vec<&str> = Stage::iter().map(|s| s.action()).collect();
        actions.sort();
        actions.dedup();
        assert_eq!(actions.len(), 13);
        assert_eq!(Stage::Decrypting.to_string(), "Decrypting");
    }
}
