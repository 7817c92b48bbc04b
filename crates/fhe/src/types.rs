// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy_dyn_abi::TypedData;
use alloy_primitives::{Address, Bytes, Signature, B256};
use std::fmt;
use zeroize::Zeroizing;

use crate::FheError;

const SECONDS_PER_DAY: u64 = 86_400;

/// Position of the type discriminant inside a 32 byte ciphertext handle
pub const HANDLE_TYPE_BYTE: usize = 30;

/// Encrypted slot types the lottery uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FheType {
    Bool = 0,
    Uint8 = 2,
    Uint16 = 3,
    Uint32 = 4,
    Uint64 = 5,
}

impl FheType {
    pub fn from_handle(handle: &B256) -> Result<Self, FheError> {
        Self::try_from(handle[HANDLE_TYPE_BYTE])
    }

    pub fn bits(&self) -> u32 {
        match self {
            FheType::Bool => 1,
            FheType::Uint8 => 8,
            FheType::Uint16 => 16,
            FheType::Uint32 => 32,
            FheType::Uint64 => 64,
        }
    }
}

impl TryFrom<u8> for FheType {
    type Error = FheError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(FheType::Bool),
            2 => Ok(FheType::Uint8),
            3 => Ok(FheType::Uint16),
            4 => Ok(FheType::Uint32),
            5 => Ok(FheType::Uint64),
            other => Err(FheError::MalformedRequest(format!(
                "unsupported ciphertext type {}",
                other
            ))),
        }
    }
}

/// A plaintext going into or coming out of the encryption provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClearValue {
    Bool(bool),
    Uint8(u8),
    Uint16(u16),
    Uint32(u32),
    Uint64(u64),
}

impl ClearValue {
    pub fn fhe_type(&self) -> FheType {
        match self {
            ClearValue::Bool(_) => FheType::Bool,
            ClearValue::Uint8(_) => FheType::Uint8,
            ClearValue::Uint16(_) => FheType::Uint16,
            ClearValue::Uint32(_) => FheType::Uint32,
            ClearValue::Uint64(_) => FheType::Uint64,
        }
    }

    pub fn as_u64(&self) -> u64 {
        match *self {
            ClearValue::Bool(v) => v as u64,
            ClearValue::Uint8(v) => v as u64,
            ClearValue::Uint16(v) => v as u64,
            ClearValue::Uint32(v) => v as u64,
            ClearValue::Uint64(v) => v,
        }
    }

    /// Type a raw decrypted word according to the slot it came from. Words that do not
    /// fit the slot mean the share was decrypted with the wrong key.
    pub fn from_raw(fhe_type: FheType, raw: u64) -> Result<Self, FheError> {
        let out_of_range =
            || FheError::MalformedRequest(format!("{} does not fit a {:?} value", raw, fhe_type));
        Ok(match fhe_type {
            FheType::Bool => match raw {
                0 => ClearValue::Bool(false),
                1 => ClearValue::Bool(true),
                _ => return Err(out_of_range()),
            },
            FheType::Uint8 => ClearValue::Uint8(u8::try_from(raw).map_err(|_| out_of_range())?),
            FheType::Uint16 => {
                ClearValue::Uint16(u16::try_from(raw).map_err(|_| out_of_range())?)
            }
            FheType::Uint32 => {
                ClearValue::Uint32(u32::try_from(raw).map_err(|_| out_of_range())?)
            }
            FheType::Uint64 => ClearValue::Uint64(raw),
        })
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ClearValue::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for ClearValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClearValue::Bool(v) => write!(f, "{}", v),
            other => write!(f, "{}", other.as_u64()),
        }
    }
}

/// Ciphertext handle plus the validity proof the contract checks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedInput {
    pub handle: B256,
    pub proof: Bytes,
}

/// Keypair used only to receive re-encrypted results
#[derive(Clone)]
pub struct DecryptionKeypair {
    pub public_key: Bytes,
    pub private_key: Zeroizing<Vec<u8>>,
}

impl fmt::Debug for DecryptionKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecryptionKeypair")
            .field("public_key_len", &self.public_key.len())
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// A signable, time bounded statement granting decryption of handles under given
/// contracts to a public key
#[derive(Debug, Clone)]
pub struct DecryptionAuthorization {
    pub typed_data: TypedData,
    pub public_key: Bytes,
    pub contract_addresses: Vec<Address>,
    pub valid_from: u64,
    pub validity_days: u64,
}

impl DecryptionAuthorization {
    pub fn expires_at(&self) -> u64 {
        self.valid_from
            .saturating_add(self.validity_days.saturating_mul(SECONDS_PER_DAY))
    }

    pub fn is_expired(&self, now: u64) -> bool {
        now >= self.expires_at()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandleContractPair {
    pub handle: B256,
    pub contract: Address,
}

/// Everything the relayer needs to re-encrypt handles for the user
#[derive(Debug, Clone)]
pub struct UserDecryptRequest {
    pub handles: Vec<HandleContractPair>,
    pub keypair: DecryptionKeypair,
    pub signature: Signature,
    pub contract_addresses: Vec<Address>,
    pub user: Address,
    pub valid_from: u64,
    pub validity_days: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle_with_type(t: u8) -> B256 {
        let mut bytes = [0xaau8; 32];
        bytes[HANDLE_TYPE_BYTE] = t;
        B256::from(bytes)
    }

    #[test]
    fn test_handle_type() {
        assert_eq!(FheType::from_handle(&handle_with_type(0)), Ok(FheType::Bool));
        assert_eq!(FheType::from_handle(&handle_with_type(2)), Ok(FheType::Uint8));
        assert!(FheType::from_handle(&handle_with_type(9)).is_err());
    }

    #[test]
    fn test_clear_value_typing() {
        assert_eq!(ClearValue::from_raw(FheType::Bool, 1), Ok(ClearValue::Bool(true)));
        assert_eq!(ClearValue::from_raw(FheType::Uint8, 5), Ok(ClearValue::Uint8(5)));
        assert_eq!(ClearValue::Uint8(7).fhe_type(), FheType::Uint8);
        assert_eq!(ClearValue::Bool(true).as_u64(), 1);
        assert_eq!(ClearValue::Uint8(3).as_bool(), None);
        assert_eq!(ClearValue::Bool(false).to_string(), "false");
    }

    #[test]
    fn test_raw_word_must_fit_its_type() {
        assert!(matches!(
            ClearValue::from_raw(FheType::Uint8, 261),
            Err(FheError::MalformedRequest(_))
        ));
        assert!(matches!(
            ClearValue::from_raw(FheType::Bool, 7),
            Err(FheError::MalformedRequest(_))
        ));
        assert!(ClearValue::from_raw(FheType::Uint16, 70_000).is_err());
        assert_eq!(
            ClearValue::from_raw(FheType::Uint32, u64::from(u32::MAX)),
            Ok(ClearValue::Uint32(u32::MAX))
        );
        assert_eq!(ClearValue::from_raw(FheType::Bool, 0), Ok(ClearValue::Bool(false)));
    }

    #[test]
    fn test_keypair_debug_redacts() {
        let keypair = DecryptionKeypair {
            public_key: Bytes::from_static(&[1, 2, 3]),
            private_key: Zeroizing::new(vec![9, 9, 9]),
        };
        let shown = format!("{:?}", keypair);
        assert!(shown.contains("redacted"));
        assert!(!shown.contains("9, 9"));
    }
}
