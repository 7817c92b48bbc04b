// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use super::prompt::{confirm, PromptApprover};
use anyhow::Result;
use lottery_chain::{
    Approver, AutoApprove, ChainClient, EvmChainClient, LocalWallet, SubmittedTx,
};
use lottery_config::LotteryConfig;
use lottery_fhe::{EncryptionProvider, RelayerProvider};
use lottery_protocol::{ProtocolError, ProtocolSettings, Stage, TicketProtocol};
use lottery_utils::short_hex;
use std::sync::Arc;

pub type LotteryProtocol = TicketProtocol<EvmChainClient, RelayerProvider>;

pub fn approver(yes: bool) -> Arc<dyn Approver> {
    if yes {
        Arc::new(AutoApprove)
    } else {
        Arc::new(PromptApprover)
    }
}

pub fn chain_client(config: &LotteryConfig, approver: Arc<dyn Approver>) -> Result<EvmChainClient> {
    let wallet = LocalWallet::from_config(&config.wallet, &config.chain, approver)?;
    Ok(EvmChainClient::new(wallet, &config.chain)?)
}

pub fn build_protocol(config: &LotteryConfig, yes: bool) -> Result<LotteryProtocol> {
    let chain = chain_client(config, approver(yes))?;
    let relayer = RelayerProvider::from_config(&config.relayer, config.chain.chain_id)?;
    let settings = ProtocolSettings::from_config(config)?;
    Ok(TicketProtocol::new(
        Arc::new(chain),
        Arc::new(relayer),
        settings,
    ))
}

/// What the user sees once a stage has been reached
fn describe(stage: Stage) -> &'static str {
    match stage {
        Stage::AwaitingWallet => "Waiting for the wallet",
        Stage::AwaitingContractReady => "Wallet connected",
        Stage::AwaitingSelection => "Lottery contract ready",
        Stage::Encrypting => "Number selected",
        Stage::Submitting => "Number encrypted",
        Stage::RoundBound => "Ticket bought",
        Stage::AwaitingDraw => "Round bound",
        Stage::AwaitingComparison => "Winning number drawn",
        Stage::AwaitingDecryptTrigger => "Ticket compared against the winning number",
        Stage::Decrypting => "Round loaded",
        Stage::ResultReady => "Result decrypted",
        Stage::Settling => "Settling",
        Stage::Completed => "Round settled",
    }
}

/// Steps the session forward while reporting progress on the terminal
pub struct Driver<'a, C, E> {
    protocol: &'a TicketProtocol<C, E>,
    config: &'a LotteryConfig,
    yes: bool,
}

impl<'a, C, E> Driver<'a, C, E>
where
    C: ChainClient,
    E: EncryptionProvider,
{
    pub fn new(protocol: &'a TicketProtocol<C, E>, config: &'a LotteryConfig, yes: bool) -> Self {
        Self {
            protocol,
            config,
            yes,
        }
    }

    /// Run one action. Returns false when the session should stop for now.
    async fn step(&self) -> Result<bool> {
        let before = self.protocol.snapshot();
        match self.protocol.advance().await {
            Ok(stage) => {
                println!("{}", describe(stage));
                let after = self.protocol.snapshot();
                if after.session.last_tx != before.session.last_tx {
                    if let Some(tx) = after.session.last_tx {
                        self.print_tx(&tx);
                    }
                }
                Ok(true)
            }
            Err(err @ ProtocolError::WrongNetwork { .. })
                if !before.session.network_switch_requested =>
            {
                println!("{}", err);
                Ok(true)
            }
            Err(err) if err.is_retryable() => {
                println!("{}", err);
                Ok(!self.yes && confirm("Retry now?")?)
            }
            Err(err) => Err(err.into()),
        }
    }

    fn print_tx(&self, tx: &SubmittedTx) {
        let hash = tx.tx_hash.to_string();
        match self.config.chain.explorer_tx_url(&hash) {
            Some(url) => println!("  {}", url),
            None => println!("  tx {}", short_hex(tx.tx_hash.as_slice())),
        }
    }

    /// Advance until `target` is reached. Returns false when stopped early.
    pub async fn run_until(&self, target: Stage) -> Result<bool> {
        while self.protocol.stage() != target {
            if !self.step().await? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// How to pick the bound round up again, once one is bound and not yet settled
    pub fn resume_hint(&self) -> Option<String> {
        let session = self.protocol.snapshot().session;
        if !session.stage.has_round() || session.stage.is_terminal() {
            return None;
        }
        session
            .round_id
            .map(|round_id| format!("Continue later with `lottery resume --round {}`", round_id))
    }

    /// Play the bound ticket to the end and print the outcome
    pub async fn finish(&self) -> Result<()> {
        let completed = self.run_until(Stage::Completed).await;
        if !matches!(completed, Ok(true)) {
            if let Some(hint) = self.resume_hint() {
                println!("{}", hint);
            }
            return completed.map(|_| ());
        }

        let session = self.protocol.snapshot().session;
        if let (Some(winning_number), Some(is_winner)) =
            (session.winning_number, session.is_winner)
        {
            println!("Winning number: {}", winning_number);
            if is_winner {
                println!("Your ticket won the prize");
            } else {
                println!("No win this time");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lottery_test_helpers::mock_backends;

    #[tokio::test]
    async fn test_failed_draw_stops_with_resume_hint() -> Result<()> {
        let (chain, relayer) = mock_backends();
        let protocol = TicketProtocol::new(chain.clone(), relayer, ProtocolSettings::default());
        let config = LotteryConfig::default();
        let driver = Driver::new(&protocol, &config, true);

        assert!(driver.run_until(Stage::AwaitingDraw).await?);
        assert!(driver.resume_hint().is_some_and(|hint| hint.contains("--round 0")));

        chain.reject_next_transaction();
        driver.finish().await?;
        assert_eq!(protocol.stage(), Stage::AwaitingDraw);
        assert!(matches!(
            protocol.snapshot().error(),
            Some(ProtocolError::TransactionRejected)
        ));

        driver.finish().await?;
        assert_eq!(protocol.stage(), Stage::Completed);
        assert!(driver.resume_hint().is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_no_hint_before_a_round_is_bound() -> Result<()> {
        let (chain, relayer) = mock_backends();
        let protocol = TicketProtocol::new(chain, relayer, ProtocolSettings::default());
        let config = LotteryConfig::default();
        let driver = Driver::new(&protocol, &config, true);

        assert!(driver.run_until(Stage::AwaitingSelection).await?);
        assert!(driver.resume_hint().is_none());
        Ok(())
    }
}
