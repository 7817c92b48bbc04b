// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{DecryptionAuthorization, FheError};
use alloy_dyn_abi::TypedData;
use alloy_primitives::{Address, Bytes};
use serde_json::json;

pub const DECRYPTION_DOMAIN_NAME: &str = "Decryption";
pub const DECRYPTION_DOMAIN_VERSION: &str = "1";
pub const USER_DECRYPT_PRIMARY_TYPE: &str = "UserDecryptRequestVerification";

/// Domain the gateway verifies user decryption requests under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecryptionDomain {
    pub gateway_chain_id: u64,
    pub verifying_contract: Address,
}

impl DecryptionDomain {
    /// Build the `UserDecryptRequestVerification` payload for the wallet to sign
    pub fn user_decrypt_request(
        &self,
        public_key: &Bytes,
        contract_addresses: &[Address],
        valid_from: u64,
        validity_days: u64,
    ) -> Result<DecryptionAuthorization, FheError> {
        if contract_addresses.is_empty() {
            return Err(FheError::Authorization(
                "at least one contract address is required".to_string(),
            ));
        }
        if validity_days == 0 {
            return Err(FheError::Authorization(
                "validity must be at least one day".to_string(),
            ));
        }

        let payload = json!({
            "types": {
                "EIP712Domain": [
                    { "name": "name", "type": "string" },
                    { "name": "version", "type": "string" },
                    { "name": "chainId", "type": "uint256" },
                    { "name": "verifyingContract", "type": "address" }
                ],
                "UserDecryptRequestVerification": [
                    { "name": "publicKey", "type": "bytes" },
                    { "name": "contractAddresses", "type": "address[]" },
                    { "name": "startTimestamp", "type": "uint256" },
                    { "name": "durationDays", "type": "uint256" },
                    { "name": "extraData", "type": "bytes" }
                ]
            },
            "primaryType": USER_DECRYPT_PRIMARY_TYPE,
            "domain": {
                "name": DECRYPTION_DOMAIN_NAME,
                "version": DECRYPTION_DOMAIN_VERSION,
                "chainId": self.gateway_chain_id,
                "verifyingContract": self.verifying_contract.to_string()
            },
            "message": {
                "publicKey": format!("0x{}", hex::encode(public_key)),
                "contractAddresses": contract_addresses
                    .iter()
                    .map(|a| a.to_string())
                    .collect::<Vec<_>>(),
                "startTimestamp": valid_from.to_string(),
                "durationDays": validity_days.to_string(),
                "extraData": "0x00"
            }
        });

        let typed_data: TypedData = serde_json::from_value(payload)
            .map_err(|e| FheError::Authorization(format!("Invalid typed data: {}", e)))?;

        Ok(DecryptionAuthorization {
            typed_data,
            public_key: public_key.clone(),
            contract_addresses: contract_addresses.to_vec(),
            valid_from,
            validity_days,
        })
    }
}
