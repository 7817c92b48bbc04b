// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{
    contract::ContractAddresses,
    rpc::{RpcAuth, RPC},
};
use anyhow::*;
use serde::{Deserialize, Serialize};

pub const SEPOLIA_CHAIN_ID: u64 = 11155111;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

impl Default for NativeCurrency {
    fn default() -> Self {
        Self {
            name: "Sepolia ETH".to_string(),
            symbol: "ETH".to_string(),
            decimals: 18,
        }
    }
}

/// The network the lottery contract lives on. The session refuses to proceed on any
/// other chain id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(default)]
pub struct ChainConfig {
    pub name: String,
    pub chain_id: u64,
    pub rpc_url: String,
    pub rpc_auth: RpcAuth,
    pub contracts: ContractAddresses,
    pub explorer_url: Option<String>,
    pub native_currency: NativeCurrency,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            name: "Sepolia Test Network".to_string(),
            chain_id: SEPOLIA_CHAIN_ID,
            rpc_url: "https://ethereum-sepolia-rpc.publicnode.com".to_string(),
            rpc_auth: RpcAuth::None,
            contracts: ContractAddresses::default(),
            explorer_url: Some("https://sepolia.etherscan.io".to_string()),
            native_currency: NativeCurrency::default(),
        }
    }
}

impl ChainConfig {
    pub fn rpc_url(&self) -> Result<RPC> {
        RPC::from_url(&self.rpc_url)
            .map_err(|e| anyhow!("Failed to parse RPC URL for chain {}: {}", self.name, e))
    }

    /// Link to a transaction on the configured block explorer
    pub fn explorer_tx_url(&self, tx_hash: &str) -> Option<String> {
        self.explorer_url
            .as_ref()
            .map(|base| format!("{}/tx/{}", base.trim_end_matches('/'), tx_hash))
    }
}
