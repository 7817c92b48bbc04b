// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::rpc::RpcAuth;
use serde::{Deserialize, Serialize};

/// A network the wallet already knows about besides the lottery chain
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct KnownNetwork {
    pub chain_id: u64,
    pub name: String,
    pub rpc_url: String,
    #[serde(default)]
    pub rpc_auth: RpcAuth,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct WalletConfig {
    /// Environment variable holding the hex encoded private key
    pub private_key_env: String,
    /// Chain the wallet is pointed at when the session starts. Defaults to the lottery chain.
    pub chain_id: Option<u64>,
    /// Networks the wallet can switch to without adding them first
    pub networks: Vec<KnownNetwork>,
    /// Below this balance (in ether) a warning is logged after connecting
    pub min_balance: String,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            private_key_env: "LOTTERY_PRIVATE_KEY".to_string(),
            chain_id: None,
            networks: vec![],
            min_balance: "0.01".to_string(),
        }
    }
}
