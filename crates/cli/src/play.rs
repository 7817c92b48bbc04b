// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::helpers::{
    prompt::prompt_number,
    session::{build_protocol, Driver},
};
use alloy_primitives::utils::format_ether;
use anyhow::Result;
use lottery_config::LotteryConfig;
use lottery_protocol::Stage;
use tracing::instrument;

#[instrument(skip(config))]
pub async fn execute(config: &LotteryConfig, number: Option<u8>, yes: bool) -> Result<()> {
    let protocol = build_protocol(config, yes)?;
    let driver = Driver::new(&protocol, config, yes);
    if !driver.run_until(Stage::AwaitingSelection).await? {
        return Ok(());
    }

    if let Some(contract) = protocol.snapshot().session.contract {
        println!(
            "Ticket price {} ETH, prize {} ETH, pool {} ETH",
            format_ether(contract.ticket_price),
            format_ether(contract.prize_amount),
            format_ether(contract.pool_balance)
        );
    }

    let number = match number {
        Some(number) => number,
        None if yes => protocol.settings().default_number,
        None => prompt_number(protocol.settings())?,
    };
    protocol.select_number(number)?;

    driver.finish().await
}
