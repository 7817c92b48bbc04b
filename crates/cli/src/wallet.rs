// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::Result;
use clap::Subcommand;
use lottery_chain::{AutoApprove, LocalWallet};
use lottery_config::LotteryConfig;
use std::sync::Arc;

#[derive(Subcommand, Debug)]
pub enum WalletCommands {
    /// Print the address of the configured private key
    Address,
}

pub fn execute(command: WalletCommands, config: &LotteryConfig) -> Result<()> {
    match command {
        WalletCommands::Address => {
            let wallet =
                LocalWallet::from_config(&config.wallet, &config.chain, Arc::new(AutoApprove))?;
            println!("{}", wallet.address()?);
        }
    };

    Ok(())
}
