// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::Result;
use async_trait::async_trait;
use dialoguer::{theme::ColorfulTheme, Confirm, Input};
use lottery_chain::{ApprovalRequest, Approver};
use lottery_protocol::ProtocolSettings;
use tracing::warn;

/// Asks on the terminal before the wallet connects, switches network, sends a
/// transaction or signs
pub struct PromptApprover;

#[async_trait]
impl Approver for PromptApprover {
    async fn approve(&self, request: &ApprovalRequest) -> bool {
        let prompt = request.to_string();
        let answer = tokio::task::spawn_blocking(move || confirm(&prompt)).await;
        match answer {
            Ok(Ok(approved)) => approved,
            Ok(Err(e)) => {
                warn!("Could not read the answer: {}", e);
                false
            }
            Err(e) => {
                warn!("Prompt task failed: {}", e);
                false
            }
        }
    }
}

pub fn confirm(prompt: &str) -> Result<bool> {
    let answer = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(true)
        .interact()?;

    Ok(answer)
}

pub fn prompt_number(settings: &ProtocolSettings) -> Result<u8> {
    let (min, max) = (settings.min_number, settings.max_number);
    let number = Input::<u8>::with_theme(&ColorfulTheme::default())
        .with_prompt(format!("Pick your number ({}-{})", min, max))
        .default(settings.default_number)
        .validate_with(|n: &u8| -> Result<(), String> {
            if (min..=max).contains(n) {
                Ok(())
            } else {
                Err(format!("The number must lie between {} and {}", min, max))
            }
        })
        .interact_text()?;

    Ok(number)
}
