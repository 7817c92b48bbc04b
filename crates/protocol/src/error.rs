// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::Stage;
use lottery_chain::ChainError;
use lottery_fhe::FheError;
use thiserror::Error;

/// Everything a stage action can report to the presentation layer
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("No wallet available: {0}")]
    WalletUnavailable(String),
    #[error("The request was rejected in the wallet")]
    UserRejected,
    #[error("Wrong network: the lottery runs on chain {expected} but the wallet is on chain {actual}")]
    WrongNetwork { expected: u64, actual: u64 },
    #[error("Encryption SDK unavailable: {0}")]
    SdkUnavailable(String),
    #[error("Encryption SDK failed to initialize: {0}")]
    SdkInitFailed(String),
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),
    #[error("The transaction was rejected in the wallet")]
    TransactionRejected,
    #[error("Transaction reverted: {0}")]
    TransactionReverted(String),
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("The result is not decryptable yet. The network is still computing it, try again in a few minutes.")]
    DecryptionNotReady,
    #[error("Decryption denied: {0}")]
    DecryptionDenied(String),
    #[error("Malformed decryption: {0}")]
    MalformedDecryption(String),
    #[error("{action} is not available while the session is at {actual}")]
    InvalidStageTransition { action: &'static str, actual: Stage },
    #[error("Number {number} is outside {min}..={max}")]
    NumberOutOfRange { number: u8, min: u8, max: u8 },
    #[error("Another action is still running")]
    ActionInProgress,
    #[error("Round mismatch: {0}")]
    RoundMismatch(String),
    #[error("Round not ready: {0}")]
    RoundNotReady(String),
}

impl ProtocolError {
    /// Expected, non terminal conditions that only need a later retry
    pub fn is_expected(&self) -> bool {
        matches!(self, ProtocolError::DecryptionNotReady)
    }

    /// The session stays where it was and the same action can be run again. Only misuse
    /// of the state machine itself is not worth retrying.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            ProtocolError::InvalidStageTransition { .. } | ProtocolError::ActionInProgress
        )
    }
}

impl From<ChainError> for ProtocolError {
    fn from(value: ChainError) -> Self {
        match value {
            ChainError::NoWallet(reason) => ProtocolError::WalletUnavailable(reason),
            ChainError::NotConnected => {
                ProtocolError::WalletUnavailable("wallet is not connected".to_string())
            }
            ChainError::UserRejected => ProtocolError::UserRejected,
            ChainError::WrongNetwork { expected, actual } => {
                ProtocolError::WrongNetwork { expected, actual }
            }
            ChainError::UnknownChain(reason) => ProtocolError::NetworkError(reason),
            ChainError::TransactionRejected => ProtocolError::TransactionRejected,
            ChainError::TransactionReverted(reason) => ProtocolError::TransactionReverted(reason),
            ChainError::NetworkError(reason) => ProtocolError::NetworkError(reason),
        }
    }
}

impl From<FheError> for ProtocolError {
    fn from(value: FheError) -> Self {
        match value {
            FheError::SdkUnavailable(reason) => ProtocolError::SdkUnavailable(reason),
            FheError::SdkInitFailed(reason) => ProtocolError::SdkInitFailed(reason),
            FheError::NotInitialized => {
                ProtocolError::SdkInitFailed("encryption provider is not initialized".to_string())
            }
            FheError::EncryptionFailed(reason) | FheError::KeyGeneration(reason) => {
                ProtocolError::EncryptionFailed(reason)
            }
            FheError::NotReady => ProtocolError::DecryptionNotReady,
            FheError::DecryptionDenied(reason) => ProtocolError::DecryptionDenied(reason),
            FheError::Authorization(reason) | FheError::MalformedRequest(reason) => {
                ProtocolError::MalformedDecryption(reason)
            }
            FheError::MissingHandle(handle) => {
                ProtocolError::MalformedDecryption(format!("no value returned for {}", handle))
            }
            FheError::Relayer(reason) => ProtocolError::NetworkError(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversions() {
        assert_eq!(
            ProtocolError::from(FheError::NotReady),
            ProtocolError::DecryptionNotReady
        );
        assert!(ProtocolError::from(FheError::NotReady).is_expected());
        assert!(!ProtocolError::TransactionRejected.is_expected());
        assert_eq!(
            ProtocolError::from(ChainError::WrongNetwork {
                expected: 11155111,
                actual: 1
            }),
            ProtocolError::WrongNetwork {
                expected: 11155111,
                actual: 1
            }
        );
        assert!(matches!(
            ProtocolError::from(ChainError::NoWallet("none".to_string())),
            ProtocolError::WalletUnavailable(_)
        ));
    }

    #[test]
    fn test_retryable_failures() {
        assert!(ProtocolError::NetworkError("timeout".to_string()).is_retryable());
        assert!(ProtocolError::TransactionReverted("already drawn".to_string()).is_retryable());
        assert!(ProtocolError::TransactionRejected.is_retryable());
        assert!(ProtocolError::DecryptionDenied("no acl".to_string()).is_retryable());
        assert!(!ProtocolError::ActionInProgress.is_retryable());
        assert!(!ProtocolError::InvalidStageTransition {
            action: "draw",
            actual: Stage::Completed
        }
        .is_retryable());
    }

    #[test]
    fn test_not_ready_carries_guidance() {
        assert!(ProtocolError::DecryptionNotReady
            .to_string()
            .contains("try again"));
    }
}
