// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::helpers::session::{approver, chain_client};
use alloy_primitives::{utils::format_ether, B256, U256};
use anyhow::{bail, Result};
use lottery_chain::ChainClient;
use lottery_config::LotteryConfig;
use lottery_utils::short_hex;
use tracing::instrument;

fn handle(value: &B256) -> String {
    if value.is_zero() {
        "-".to_string()
    } else {
        short_hex(value.as_slice())
    }
}

#[instrument(skip(config))]
pub async fn execute(config: &LotteryConfig, id: u64) -> Result<()> {
    let client = chain_client(config, approver(true))?;
    client.connect().await?;

    let round_id = U256::from(id);
    let rounds = client.current_round().await?;
    if round_id >= rounds {
        bail!("Round {} does not exist yet, {} rounds were played", id, rounds);
    }
    let record = client.round(round_id).await?;

    println!("Round:          {}", id);
    println!("Player:         {}", record.player);
    println!("Ticket price:   {} ETH", format_ether(record.ticket_price));
    println!("Bought at:      {}", record.timestamp);
    println!("Number handle:  {}", handle(&record.encrypted_number));
    println!("Drawn:          {}", record.is_drawn);
    println!("Winning handle: {}", handle(&record.winning_number));
    println!("Compared:       {}", record.is_compared());
    println!("Result handle:  {}", handle(&record.is_winner));
    println!("Settled:        {}", record.is_settled);

    Ok(())
}
