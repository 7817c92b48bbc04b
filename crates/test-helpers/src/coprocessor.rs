// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::primitives::B256;
use lottery_fhe::{ClearValue, HANDLE_TYPE_BYTE};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

#[derive(Default)]
struct Ciphertexts {
    next: u64,
    values: HashMap<B256, ClearValue>,
}

/// Plaintext stand-in for the FHE coprocessor. Handles minted here carry the value type
/// in the same byte a real handle does. Clones share the same store so the ledger and
/// the relayer double see the same ciphertexts.
#[derive(Clone, Default)]
pub struct FakeCoprocessor {
    inner: Arc<Mutex<Ciphertexts>>,
}

impl FakeCoprocessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value and hand back its fresh, non zero handle
    pub fn register(&self, value: ClearValue) -> B256 {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.next += 1;
        let mut handle = [0u8; 32];
        handle[..8].copy_from_slice(&inner.next.to_be_bytes());
        handle[HANDLE_TYPE_BYTE] = value.fhe_type() as u8;
        let handle = B256::from(handle);
        inner.values.insert(handle, value);
        handle
    }

    pub fn value(&self, handle: &B256) -> Option<ClearValue> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values
            .get(handle)
            .copied()
    }

    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lottery_fhe::FheType;

    #[test]
    fn test_handles_are_typed_and_unique() {
        let coprocessor = FakeCoprocessor::new();
        let a = coprocessor.register(ClearValue::Uint8(7));
        let b = coprocessor.clone().register(ClearValue::Bool(true));

        assert_ne!(a, b);
        assert_eq!(FheType::from_handle(&a).ok(), Some(FheType::Uint8));
        assert_eq!(FheType::from_handle(&b).ok(), Some(FheType::Bool));
        assert_eq!(coprocessor.value(&b), Some(ClearValue::Bool(true)));
        assert_eq!(coprocessor.len(), 2);
    }
}
