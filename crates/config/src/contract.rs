// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy_primitives::Address;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Hash, Eq, Deserialize, Serialize, PartialEq)]
#[serde(untagged)]
pub enum Contract {
    Full {
        address: String,
        deploy_block: Option<u64>,
    },
    AddressOnly(String),
}

impl Contract {
    pub fn address(&self) -> &String {
        use Contract::*;
        match self {
            Full { address, .. } => address,
            AddressOnly(v) => v,
        }
    }

    pub fn parsed_address(&self) -> Result<Address> {
        self.address()
            .parse()
            .with_context(|| format!("Invalid contract address '{}'", self.address()))
    }
}

#[derive(Debug, Clone, Hash, PartialEq, Eq, Deserialize, Serialize)]
pub struct ContractAddresses {
    /// The confidential lottery contract
    pub lottery: Contract,
}

impl Default for ContractAddresses {
    fn default() -> Self {
        Self {
            lottery: Contract::AddressOnly(
                "0x98002AB8529Df26C1ebC877D4ebDD1BfeA6Fd45d".to_string(),
            ),
        }
    }
}
