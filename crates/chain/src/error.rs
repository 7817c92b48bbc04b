// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::transports::TransportError;
use thiserror::Error;

/// EIP-1193 user rejected request
pub const CODE_USER_REJECTED: i64 = 4001;
/// EIP-1193 / EIP-3326 unrecognized chain id
pub const CODE_UNKNOWN_CHAIN: i64 = 4902;
/// JSON-RPC execution reverted
pub const CODE_EXECUTION_REVERTED: i64 = 3;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("No wallet available: {0}")]
    NoWallet(String),
    #[error("User rejected the request")]
    UserRejected,
    #[error("Wrong network: expected chain {expected} but the wallet is on chain {actual}")]
    WrongNetwork { expected: u64, actual: u64 },
    #[error("Unknown chain: {0}")]
    UnknownChain(String),
    #[error("Transaction rejected by the user")]
    TransactionRejected,
    #[error("Transaction reverted: {0}")]
    TransactionReverted(String),
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Wallet is not connected")]
    NotConnected,
}

impl ChainError {
    /// Only transport level failures are worth repeating
    pub fn is_transient(&self) -> bool {
        matches!(self, ChainError::NetworkError(_))
    }
}

/// Map a JSON-RPC error payload onto the chain error taxonomy
pub fn classify_payload(code: i64, message: &str) -> ChainError {
    match code {
        CODE_USER_REJECTED => ChainError::TransactionRejected,
        CODE_UNKNOWN_CHAIN => ChainError::UnknownChain(message.to_string()),
        CODE_EXECUTION_REVERTED => ChainError::TransactionReverted(message.to_string()),
        _ if message.to_lowercase().contains("revert") => {
            ChainError::TransactionReverted(message.to_string())
        }
        _ => ChainError::NetworkError(format!("{} (code {})", message, code)),
    }
}

pub fn classify_transport(err: &TransportError) -> ChainError {
    match err.as_error_resp() {
        Some(payload) => classify_payload(payload.code, &payload.message),
        None => ChainError::NetworkError(err.to_string()),
    }
}

pub fn classify_contract(err: alloy::contract::Error) -> ChainError {
    match &err {
        alloy::contract::Error::TransportError(e) => classify_transport(e),
        _ => ChainError::NetworkError(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_payload() {
        assert_eq!(
            classify_payload(4001, "User denied transaction signature"),
            ChainError::TransactionRejected
        );
        assert!(matches!(
            classify_payload(4902, "Unrecognized chain ID"),
            ChainError::UnknownChain(_)
        ));
        assert!(matches!(
            classify_payload(3, "execution reverted: Incorrect ticket price"),
            ChainError::TransactionReverted(_)
        ));
        assert!(matches!(
            classify_payload(-32000, "execution reverted"),
            ChainError::TransactionReverted(_)
        ));

        let err = classify_payload(-32005, "rate limited");
        assert!(matches!(err, ChainError::NetworkError(_)));
        assert!(err.is_transient());
        assert!(!ChainError::TransactionRejected.is_transient());
    }
}
