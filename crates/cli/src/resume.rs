// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::helpers::session::{build_protocol, Driver};
use alloy_primitives::U256;
use anyhow::Result;
use lottery_config::LotteryConfig;
use lottery_protocol::Stage;
use tracing::instrument;

#[instrument(skip(config))]
pub async fn execute(config: &LotteryConfig, round: u64, yes: bool) -> Result<()> {
    let protocol = build_protocol(config, yes)?;
    let driver = Driver::new(&protocol, config, yes);
    if !driver.run_until(Stage::AwaitingSelection).await? {
        return Ok(());
    }

    let stage = protocol.resume_round(U256::from(round)).await?;
    println!("Resuming round {} at {}", round, stage);

    driver.finish().await
}
