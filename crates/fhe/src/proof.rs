// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::FheError;
use alloy_primitives::{Bytes, B256};

pub const SIGNATURE_LEN: usize = 65;

/// Input proof layout: `numHandles (u8) | numSigners (u8) | handles (32 bytes each) |
/// signatures (65 bytes each) | extraData`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputProof {
    pub handles: Vec<B256>,
    pub signatures: Vec<[u8; SIGNATURE_LEN]>,
    pub extra_data: Bytes,
}

impl InputProof {
    pub fn pack(&self) -> Result<Bytes, FheError> {
        let num_handles = u8::try_from(self.handles.len())
            .map_err(|_| FheError::EncryptionFailed("too many handles".to_string()))?;
        let num_signers = u8::try_from(self.signatures.len())
            .map_err(|_| FheError::EncryptionFailed("too many signers".to_string()))?;

        let mut out = Vec::with_capacity(
            2 + self.handles.len() * 32 + self.signatures.len() * SIGNATURE_LEN + self.extra_data.len(),
        );
        out.push(num_handles);
        out.push(num_signers);
        for handle in &self.handles {
            out.extend_from_slice(handle.as_slice());
        }
        for sig in &self.signatures {
            out.extend_from_slice(sig);
        }
        out.extend_from_slice(&self.extra_data);
        Ok(Bytes::from(out))
    }

    pub fn parse(bytes: &[u8]) -> Result<Self, FheError> {
        let malformed = |msg: &str| FheError::MalformedRequest(format!("input proof: {}", msg));
        let [num_handles, num_signers, rest @ ..] = bytes else {
            return Err(malformed("missing header"));
        };
        let handles_len = *num_handles as usize * 32;
        let sigs_len = *num_signers as usize * SIGNATURE_LEN;
        if rest.len() < handles_len + sigs_len {
            return Err(malformed("truncated"));
        }

        let (handle_bytes, rest) = rest.split_at(handles_len);
        let (sig_bytes, extra) = rest.split_at(sigs_len);

        let handles = handle_bytes.chunks_exact(32).map(B256::from_slice).collect();
        let signatures = sig_bytes
            .chunks_exact(SIGNATURE_LEN)
            .map(|chunk| {
                let mut sig = [0u8; SIGNATURE_LEN];
                sig.copy_from_slice(chunk);
                sig
            })
            .collect();

        Ok(Self {
            handles,
            signatures,
            extra_data: Bytes::copy_from_slice(extra),
        })
    }

    pub fn contains(&self, handle: &B256) -> bool {
        self.handles.contains(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn test_layout() -> Result<()> {
        let proof = InputProof {
            handles: vec![B256::repeat_byte(1), B256::repeat_byte(2)],
            signatures: vec![[7u8; SIGNATURE_LEN]],
            extra_data: Bytes::from_static(&[0]),
        };

        let packed = proof.pack()?;
        assert_eq!(packed.len(), 2 + 64 + 65 + 1);
        assert_eq!(packed[0], 2);
        assert_eq!(packed[1], 1);
        assert_eq!(&packed[2..34], B256::repeat_byte(1).as_slice());

        let parsed = InputProof::parse(&packed)?;
        assert_eq!(parsed, proof);
        assert!(parsed.contains(&B256::repeat_byte(2)));
        assert!(!parsed.contains(&B256::repeat_byte(3)));
        Ok(())
    }

    #[test]
    fn test_truncated() {
        assert!(InputProof::parse(&[]).is_err());
        assert!(InputProof::parse(&[1, 0, 0xaa]).is_err());
    }
}
