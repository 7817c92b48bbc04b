// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{
    ClearValue, DecryptionAuthorization, DecryptionKeypair, EncryptedInput, FheError,
    UserDecryptRequest,
};
use alloy_primitives::{Address, Bytes, B256};
use async_trait::async_trait;
use std::collections::HashMap;

/// Client side primitives of the homomorphic scheme
#[async_trait]
pub trait EncryptionProvider: Send + Sync {
    /// Load scheme parameters. Idempotent and required before anything else.
    async fn init(&self) -> Result<(), FheError>;

    /// Encrypt `value` for use by `contract` on behalf of `user`
    async fn encrypt(
        &self,
        value: ClearValue,
        contract: Address,
        user: Address,
    ) -> Result<EncryptedInput, FheError>;

    /// Fresh keypair for receiving re-encrypted results
    fn generate_keypair(&self) -> Result<DecryptionKeypair, FheError>;

    /// Build the payload the wallet has to sign before decrypting
    fn authorize_decryption(
        &self,
        public_key: &Bytes,
        contract_addresses: &[Address],
        valid_from: u64,
        validity_days: u64,
    ) -> Result<DecryptionAuthorization, FheError>;

    /// Decrypt the requested handles. Fails with [`FheError::NotReady`] while the
    /// ciphertexts are still being computed.
    async fn decrypt(
        &self,
        request: &UserDecryptRequest,
    ) -> Result<HashMap<B256, ClearValue>, FheError>;
}
