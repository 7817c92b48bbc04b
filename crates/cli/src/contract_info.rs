// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::helpers::session::{approver, chain_client};
use alloy_primitives::utils::format_ether;
use anyhow::Result;
use lottery_chain::ChainClient;
use lottery_config::LotteryConfig;
use tracing::instrument;

#[instrument(skip_all)]
pub async fn execute(config: &LotteryConfig) -> Result<()> {
    let client = chain_client(config, approver(true))?;
    let connection = client.connect().await?;

    let ticket_price = client.ticket_price().await?;
    let prize_amount = client.prize_amount().await?;
    let pool = client.pool_balance().await?;
    let rounds = client.current_round().await?;

    println!("Network:      {} ({})", config.chain.name, config.chain.chain_id);
    println!("Contract:     {}", client.contract_address());
    println!("Ticket price: {} ETH", format_ether(ticket_price));
    println!("Prize:        {} ETH", format_ether(prize_amount));
    println!("Prize pool:   {} ETH", format_ether(pool));
    println!("Rounds:       {}", rounds);
    println!("Account:      {}", connection.account);
    println!("Balance:      {} ETH", format_ether(connection.balance));

    Ok(())
}
