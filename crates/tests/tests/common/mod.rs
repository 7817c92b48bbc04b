// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

#![allow(dead_code)]

use anyhow::{bail, Result};
use lottery_protocol::{ProtocolSettings, Stage, TicketProtocol};
use lottery_test_helpers::{FakeCoprocessor, MockChain, MockRelayer};
use std::sync::Arc;

pub type Protocol = TicketProtocol<MockChain, MockRelayer>;

pub struct Harness {
    pub protocol: Protocol,
    pub chain: Arc<MockChain>,
    pub relayer: Arc<MockRelayer>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with(|chain| chain, |relayer| relayer)
    }

    /// Build a harness after adjusting the ledger and relayer doubles
    pub fn with(
        chain: impl FnOnce(MockChain) -> MockChain,
        relayer: impl FnOnce(MockRelayer) -> MockRelayer,
    ) -> Self {
        let coprocessor = FakeCoprocessor::new();
        let chain = Arc::new(chain(MockChain::new(coprocessor.clone())));
        let relayer = Arc::new(relayer(MockRelayer::new(coprocessor)));
        Self::attach(chain, relayer)
    }

    /// A fresh session on top of existing doubles
    pub fn attach(chain: Arc<MockChain>, relayer: Arc<MockRelayer>) -> Self {
        let protocol =
            TicketProtocol::new(chain.clone(), relayer.clone(), ProtocolSettings::default());
        Self {
            protocol,
            chain,
            relayer,
        }
    }

    /// Drive the session with `advance` until it reaches `target`
    pub async fn advance_to(&self, target: Stage) -> Result<()> {
        for _ in 0..32 {
            if self.protocol.stage() == target {
                return Ok(());
            }
            self.protocol.advance().await?;
        }
        bail!("session never reached {}", target)
    }

    /// Connect, load the contract and pick `number`
    pub async fn select(&self, number: u8) -> Result<()> {
        self.advance_to(Stage::AwaitingSelection).await?;
        self.protocol.select_number(number)?;
        Ok(())
    }
}
