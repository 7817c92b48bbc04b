// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FheError {
    #[error("Encryption SDK unavailable: {0}")]
    SdkUnavailable(String),
    #[error("Encryption SDK failed to initialize: {0}")]
    SdkInitFailed(String),
    #[error("Encryption provider used before init")]
    NotInitialized,
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),
    #[error("Keypair generation failed: {0}")]
    KeyGeneration(String),
    #[error("Could not build decryption authorization: {0}")]
    Authorization(String),
    /// The ciphertexts still need off-band computation before plaintext exists
    #[error("Decryption not ready yet")]
    NotReady,
    #[error("Decryption denied: {0}")]
    DecryptionDenied(String),
    #[error("Malformed decryption request: {0}")]
    MalformedRequest(String),
    #[error("Relayer error: {0}")]
    Relayer(String),
    #[error("Relayer response is missing handle {0}")]
    MissingHandle(String),
}

impl FheError {
    pub fn is_not_ready(&self) -> bool {
        matches!(self, FheError::NotReady)
    }
}
