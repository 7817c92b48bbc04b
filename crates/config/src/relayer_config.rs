// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use serde::{Deserialize, Serialize};

/// Where to find the decryption relayer and how to address its gateway chain
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RelayerConfig {
    /// Relayer base url. Takes precedence over `url_env` and `preset`.
    pub url: Option<String>,
    /// Environment variable consulted when `url` is not set
    pub url_env: String,
    /// Named network preset used as the last resort (eg. "sepolia")
    pub preset: Option<String>,
    /// Chain id used in the EIP-712 domain of decryption requests
    pub gateway_chain_id: u64,
    /// Contract verifying user decryption requests on the gateway chain
    pub verifying_contract: Option<String>,
    /// HTTP timeout for relayer calls in seconds
    pub timeout_secs: u64,
}

impl Default for RelayerConfig {
    fn default() -> Self {
        Self {
            url: None,
            url_env: "LOTTERY_RELAYER_URL".to_string(),
            preset: Some("sepolia".to_string()),
            gateway_chain_id: 55815,
            verifying_contract: None,
            timeout_secs: 60,
        }
    }
}
