// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::FakeCoprocessor;
use alloy::primitives::{Address, Bytes, B256};
use async_trait::async_trait;
use lottery_fhe::{
    eip712::DecryptionDomain, proof::InputProof, ClearValue, DecryptionAuthorization,
    DecryptionKeypair, EncryptedInput, EncryptionProvider, FheError, UserDecryptRequest,
};
use rand::RngCore;
use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, PoisonError},
};
use tracing::debug;
use zeroize::Zeroizing;

#[derive(Default)]
struct RelayerState {
    initialized: bool,
    unavailable: bool,
    fail_encryption: bool,
    deny: bool,
    pending_skip: u32,
    pending: u32,
    inits: u32,
    encryptions: u32,
    decryptions: u32,
    keypairs: u32,
}

/// Relayer double backed by the [`FakeCoprocessor`]. It checks that every decryption
/// request carries a signature from the requesting user over the authorization.
pub struct MockRelayer {
    coprocessor: FakeCoprocessor,
    domain: DecryptionDomain,
    state: Mutex<RelayerState>,
}

impl MockRelayer {
    pub fn new(coprocessor: FakeCoprocessor) -> Self {
        Self {
            coprocessor,
            domain: DecryptionDomain {
                gateway_chain_id: 55815,
                verifying_contract: Address::repeat_byte(0xb6),
            },
            state: Mutex::new(RelayerState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, RelayerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn unavailable(self) -> Self {
        self.state().unavailable = true;
        self
    }

    pub fn fail_encryption(&self) {
        self.state().fail_encryption = true;
    }

    pub fn deny_decryption(&self) {
        self.state().deny = true;
    }

    /// The next `count` decryption requests answer that the result is still computing
    pub fn set_pending(&self, count: u32) {
        self.set_pending_after(0, count);
    }

    /// Let `answered` requests through, then answer `count` requests as still computing
    pub fn set_pending_after(&self, answered: u32, count: u32) {
        let mut state = self.state();
        state.pending_skip = answered;
        state.pending = count;
    }

    pub fn inits(&self) -> u32 {
        self.state().inits
    }

    pub fn encryptions(&self) -> u32 {
        self.state().encryptions
    }

    pub fn decryptions(&self) -> u32 {
        self.state().decryptions
    }

    pub fn keypairs(&self) -> u32 {
        self.state().keypairs
    }

    fn verify_signature(&self, request: &UserDecryptRequest) -> Result<(), FheError> {
        let authorization = self.domain.user_decrypt_request(
            &request.keypair.public_key,
            &request.contract_addresses,
            request.valid_from,
            request.validity_days,
        )?;
        let hash = authorization
            .typed_data
            .eip712_signing_hash()
            .map_err(|e| FheError::MalformedRequest(e.to_string()))?;
        let signer = request
            .signature
            .recover_address_from_prehash(&hash)
            .map_err(|e| FheError::DecryptionDenied(e.to_string()))?;
        if signer != request.user {
            return Err(FheError::DecryptionDenied(format!(
                "signature by {} does not match user {}",
                signer, request.user
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl EncryptionProvider for MockRelayer {
    async fn init(&self) -> Result<(), FheError> {
        let mut state = self.state();
        state.inits += 1;
        if state.unavailable {
            return Err(FheError::SdkUnavailable(
                "no relayer endpoint answered".to_string(),
            ));
        }
        state.initialized = true;
        Ok(())
    }

    async fn encrypt(
        &self,
        value: ClearValue,
        contract: Address,
        user: Address,
    ) -> Result<EncryptedInput, FheError> {
        {
            let mut state = self.state();
            if !state.initialized {
                return Err(FheError::NotInitialized);
            }
            if state.fail_encryption {
                return Err(FheError::EncryptionFailed(
                    "input proof verification failed".to_string(),
                ));
            }
            state.encryptions += 1;
        }
        let handle = self.coprocessor.register(value);
        let proof = InputProof {
            handles: vec![handle],
            signatures: vec![[0x11; 65]],
            extra_data: Bytes::new(),
        }
        .pack()?;
        debug!("Encrypted {} for {} under {}", value, user, contract);
        Ok(EncryptedInput { handle, proof })
    }

    fn generate_keypair(&self) -> Result<DecryptionKeypair, FheError> {
        self.state().keypairs += 1;
        let mut rng = rand::thread_rng();
        let mut public_key = vec![0u8; 64];
        let mut private_key = vec![0u8; 32];
        rng.fill_bytes(&mut public_key);
        rng.fill_bytes(&mut private_key);
        Ok(DecryptionKeypair {
            public_key: Bytes::from(public_key),
            private_key: Zeroizing::new(private_key),
        })
    }

    fn authorize_decryption(
        &self,
        public_key: &Bytes,
        contract_addresses: &[Address],
        valid_from: u64,
        validity_days: u64,
    ) -> Result<DecryptionAuthorization, FheError> {
        self.domain
            .user_decrypt_request(public_key, contract_addresses, valid_from, validity_days)
    }

    async fn decrypt(
        &self,
        request: &UserDecryptRequest,
    ) -> Result<HashMap<B256, ClearValue>, FheError> {
        {
            let mut state = self.state();
            if !state.initialized {
                return Err(FheError::NotInitialized);
            }
            state.decryptions += 1;
            if state.deny {
                return Err(FheError::DecryptionDenied(
                    "user is not allowed to decrypt".to_string(),
                ));
            }
            if state.pending > 0 {
                if state.pending_skip > 0 {
                    state.pending_skip -= 1;
                } else {
                    state.pending -= 1;
                    return Err(FheError::NotReady);
                }
            }
        }
        self.verify_signature(request)?;

        request
            .handles
            .iter()
            .map(|pair| {
                self.coprocessor
                    .value(&pair.handle)
                    .map(|value| (pair.handle, value))
                    .ok_or_else(|| FheError::MissingHandle(pair.handle.to_string()))
            })
            .collect()
    }
}
