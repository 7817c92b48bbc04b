// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{DecryptionKeypair, FheError};
use alloy_primitives::Bytes;
use fhe::bfv::{
    BfvParameters, BfvParametersBuilder, Ciphertext, Encoding, Plaintext, PublicKey, SecretKey,
};
use fhe_traits::{
    DeserializeParametrized, FheDecoder, FheDecrypter, FheEncoder, FheEncrypter, Serialize,
};
use rand::thread_rng;
use serde::Deserialize;
use std::sync::Arc;
use zeroize::Zeroizing;

/// BFV parameter set as announced by the relayer
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, Deserialize)]
pub struct BfvParamSet {
    pub degree: usize,
    pub plaintext_modulus: u64,
    pub moduli: Vec<u64>,
}

impl Default for BfvParamSet {
    /// - Degree: 2048
    /// - Plaintext modulus: 1032193
    /// - Moduli: [0x3FFFFFFF000001]
    fn default() -> Self {
        Self {
            degree: 2048,
            plaintext_modulus: 1032193,
            moduli: vec![0x3FFFFFFF000001],
        }
    }
}

impl BfvParamSet {
    pub fn build(&self) -> Result<Arc<BfvParameters>, FheError> {
        BfvParametersBuilder::new()
            .set_degree(self.degree)
            .set_plaintext_modulus(self.plaintext_modulus)
            .set_moduli(&self.moduli)
            .build_arc()
            .map_err(|e| FheError::SdkInitFailed(format!("Failed to build BFV parameters: {}", e)))
    }
}

/// Encrypt a single word under a serialized public key
pub fn bfv_encrypt_u64(
    value: u64,
    public_key: &[u8],
    params: &Arc<BfvParameters>,
) -> Result<Vec<u8>, FheError> {
    if value >= params.plaintext() {
        return Err(FheError::EncryptionFailed(format!(
            "value {} exceeds the plaintext modulus",
            value
        )));
    }

    let pk = PublicKey::from_bytes(public_key, params)
        .map_err(|e| FheError::EncryptionFailed(format!("Error deserializing public key: {}", e)))?;

    let values = vec![value];
    let pt = Plaintext::try_encode(values.as_slice(), Encoding::poly(), params)
        .map_err(|e| FheError::EncryptionFailed(format!("Error encoding plaintext: {}", e)))?;

    let ct: Ciphertext = pk
        .try_encrypt(&pt, &mut thread_rng())
        .map_err(|e| FheError::EncryptionFailed(format!("Error encrypting data: {}", e)))?;

    Ok(ct.to_bytes())
}

/// Decrypt a ciphertext produced for our own keypair and return its first word
pub fn bfv_decrypt_u64(
    ciphertext: &[u8],
    private_key: &[u8],
    params: &Arc<BfvParameters>,
) -> Result<u64, FheError> {
    let sk = SecretKeySerializer::from_bytes(private_key, params)?;
    let ct = Ciphertext::from_bytes(ciphertext, params)
        .map_err(|e| FheError::MalformedRequest(format!("Error deserializing ciphertext: {}", e)))?;
    let pt = sk
        .try_decrypt(&ct)
        .map_err(|e| FheError::MalformedRequest(format!("Error decrypting share: {}", e)))?;
    let decoded = Vec::<u64>::try_decode(&pt, Encoding::poly())
        .map_err(|e| FheError::MalformedRequest(format!("Error decoding plaintext: {}", e)))?;

    decoded
        .first()
        .copied()
        .ok_or_else(|| FheError::MalformedRequest("empty plaintext".to_string()))
}

/// Generate a keypair the relayer can re-encrypt results for
pub fn generate_bfv_keypair(params: &Arc<BfvParameters>) -> Result<DecryptionKeypair, FheError> {
    let mut rng = thread_rng();
    let sk = SecretKey::random(params, &mut rng);
    let pk = PublicKey::new(&sk, &mut rng);

    Ok(DecryptionKeypair {
        public_key: Bytes::from(pk.to_bytes()),
        private_key: SecretKeySerializer::to_bytes(&sk)?,
    })
}

#[derive(serde::Serialize, Deserialize)]
struct SecretKeyData {
    coeffs: Box<[i64]>,
}

struct SecretKeySerializer;

impl SecretKeySerializer {
    fn to_bytes(sk: &SecretKey) -> Result<Zeroizing<Vec<u8>>, FheError> {
        let data = SecretKeyData {
            coeffs: sk.coeffs.clone(),
        };
        bincode::serialize(&data)
            .map(Zeroizing::new)
            .map_err(|e| FheError::KeyGeneration(e.to_string()))
    }

    fn from_bytes(bytes: &[u8], params: &Arc<BfvParameters>) -> Result<SecretKey, FheError> {
        let SecretKeyData { coeffs } = bincode::deserialize(bytes)
            .map_err(|e| FheError::MalformedRequest(format!("Invalid private key: {}", e)))?;
        if coeffs.len() != params.degree() {
            return Err(FheError::MalformedRequest(
                "private key does not match the BFV parameters".to_string(),
            ));
        }
        Ok(SecretKey::new(coeffs.to_vec(), params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn test_keypair_encrypt_decrypt() -> Result<()> {
        let params = BfvParamSet::default().build()?;
        let keypair = generate_bfv_keypair(&params)?;

        let ct = bfv_encrypt_u64(5, &keypair.public_key, &params)?;
        let value = bfv_decrypt_u64(&ct, &keypair.private_key, &params)?;
        assert_eq!(value, 5);

        // fresh keys every time
        let other = generate_bfv_keypair(&params)?;
        assert_ne!(other.public_key, keypair.public_key);
        Ok(())
    }

    #[test]
    fn test_value_out_of_range() -> Result<()> {
        let params = BfvParamSet::default().build()?;
        let keypair = generate_bfv_keypair(&params)?;
        assert!(matches!(
            bfv_encrypt_u64(2_000_000, &keypair.public_key, &params),
            Err(FheError::EncryptionFailed(_))
        ));
        Ok(())
    }

    #[test]
    fn test_garbage_private_key() -> Result<()> {
        let params = BfvParamSet::default().build()?;
        let keypair = generate_bfv_keypair(&params)?;
        let ct = bfv_encrypt_u64(1, &keypair.public_key, &params)?;
        assert!(matches!(
            bfv_decrypt_u64(&ct, &[1, 2, 3], &params),
            Err(FheError::MalformedRequest(_))
        ));
        Ok(())
    }
}
