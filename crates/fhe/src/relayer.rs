// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{
    bfv::{bfv_decrypt_u64, bfv_encrypt_u64, generate_bfv_keypair, BfvParamSet},
    eip712::DecryptionDomain,
    proof::{InputProof, SIGNATURE_LEN},
    sdk::SdkResolver,
    ClearValue, DecryptionAuthorization, DecryptionKeypair, EncryptedInput, EncryptionProvider,
    FheError, FheType, UserDecryptRequest,
};
use alloy_primitives::{Address, Bytes, B256};
use async_trait::async_trait;
use fhe::bfv::{BfvParameters, PublicKey};
use fhe_traits::DeserializeParametrized;
use lottery_config::RelayerConfig;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};
use url::Url;

const KEY_URL_PATH: &str = "v1/keyurl";
const INPUT_PROOF_PATH: &str = "v1/input-proof";
const USER_DECRYPT_PATH: &str = "v1/user-decrypt";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KeyUrlResponse {
    public_key: String,
    params: BfvParamSet,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InputProofRequest {
    contract_address: String,
    user_address: String,
    contract_chain_id: u64,
    fhe_types: Vec<u8>,
    ciphertext_with_input_verification: String,
    extra_data: String,
}

#[derive(Debug, Deserialize)]
struct InputProofResponse {
    response: InputProofPayload,
}

#[derive(Debug, Deserialize)]
struct InputProofPayload {
    handles: Vec<String>,
    signatures: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HandleContractPairJson {
    handle: String,
    contract_address: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RequestValidity {
    start_timestamp: String,
    duration_days: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UserDecryptBody {
    handle_contract_pairs: Vec<HandleContractPairJson>,
    request_validity: RequestValidity,
    contracts_chain_id: String,
    contract_addresses: Vec<String>,
    user_address: String,
    signature: String,
    public_key: String,
    extra_data: String,
}

#[derive(Debug, Deserialize)]
struct UserDecryptResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    response: Vec<ReencryptedShare>,
}

/// A result ciphertext re-encrypted under the user's public key
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReencryptedShare {
    pub handle: String,
    pub payload: String,
}

/// State fetched once from the relayer
struct RelayerState {
    base: Url,
    params: Arc<BfvParameters>,
    network_key: Vec<u8>,
    domain: DecryptionDomain,
}

/// [`EncryptionProvider`] talking to a user decryption relayer over HTTP
pub struct RelayerProvider {
    resolver: SdkResolver,
    chain_id: u64,
    http: Client,
    state: OnceCell<RelayerState>,
}

impl RelayerProvider {
    pub fn new(resolver: SdkResolver, chain_id: u64, timeout: Duration) -> Result<Self, FheError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FheError::SdkInitFailed(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            resolver,
            chain_id,
            http,
            state: OnceCell::new(),
        })
    }

    pub fn from_config(config: &RelayerConfig, chain_id: u64) -> Result<Self, FheError> {
        Self::new(
            SdkResolver::from_config(config),
            chain_id,
            Duration::from_secs(config.timeout_secs),
        )
    }

    fn state(&self) -> Result<&RelayerState, FheError> {
        self.state.get().ok_or(FheError::NotInitialized)
    }

    async fn load_state(&self) -> Result<RelayerState, FheError> {
        let resolved = self.resolver.resolve()?;
        let url = endpoint(&resolved.url, KEY_URL_PATH)?;
        info!("Loading encryption parameters from {}", url);

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| FheError::SdkInitFailed(format!("Relayer unreachable: {}", e)))?;
        if !response.status().is_success() {
            return Err(FheError::SdkInitFailed(format!(
                "Relayer returned {} for {}",
                response.status(),
                KEY_URL_PATH
            )));
        }
        let keys: KeyUrlResponse = response
            .json()
            .await
            .map_err(|e| FheError::SdkInitFailed(format!("Invalid key response: {}", e)))?;

        let params = keys.params.build()?;
        let network_key = decode_hex(&keys.public_key)
            .map_err(|e| FheError::SdkInitFailed(format!("Invalid network public key: {}", e)))?;
        PublicKey::from_bytes(&network_key, &params)
            .map_err(|e| FheError::SdkInitFailed(format!("Invalid network public key: {}", e)))?;

        Ok(RelayerState {
            base: resolved.url,
            params,
            network_key,
            domain: DecryptionDomain {
                gateway_chain_id: resolved.gateway_chain_id,
                verifying_contract: resolved.verifying_contract,
            },
        })
    }
}

#[async_trait]
impl EncryptionProvider for RelayerProvider {
    async fn init(&self) -> Result<(), FheError> {
        self.state
            .get_or_try_init(|| self.load_state())
            .await
            .map(|_| ())
    }

    async fn encrypt(
        &self,
        value: ClearValue,
        contract: Address,
        user: Address,
    ) -> Result<EncryptedInput, FheError> {
        let state = self.state()?;
        let ciphertext = bfv_encrypt_u64(value.as_u64(), &state.network_key, &state.params)?;

        let body = InputProofRequest {
            contract_address: contract.to_string(),
            user_address: user.to_string(),
            contract_chain_id: self.chain_id,
            fhe_types: vec![value.fhe_type() as u8],
            ciphertext_with_input_verification: hex::encode(&ciphertext),
            extra_data: "0x00".to_string(),
        };

        let response = self
            .http
            .post(endpoint(&state.base, INPUT_PROOF_PATH)?)
            .json(&body)
            .send()
            .await
            .map_err(|e| FheError::EncryptionFailed(format!("Relayer unreachable: {}", e)))?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(FheError::EncryptionFailed(format!(
                "Input verification failed ({}): {}",
                status, text
            )));
        }
        let payload: InputProofResponse = response
            .json()
            .await
            .map_err(|e| FheError::EncryptionFailed(format!("Invalid input proof response: {}", e)))?;

        input_from_proof_response(payload.response, value.fhe_type())
    }

    fn generate_keypair(&self) -> Result<DecryptionKeypair, FheError> {
        generate_bfv_keypair(&self.state()?.params)
    }

    fn authorize_decryption(
        &self,
        public_key: &Bytes,
        contract_addresses: &[Address],
        valid_from: u64,
        validity_days: u64,
    ) -> Result<DecryptionAuthorization, FheError> {
        self.state()?.domain.user_decrypt_request(
            public_key,
            contract_addresses,
            valid_from,
            validity_days,
        )
    }

    async fn decrypt(
        &self,
        request: &UserDecryptRequest,
    ) -> Result<HashMap<B256, ClearValue>, FheError> {
        let state = self.state()?;
        let body = UserDecryptBody {
            handle_contract_pairs: request
                .handles
                .iter()
                .map(|pair| HandleContractPairJson {
                    handle: pair.handle.to_string(),
                    contract_address: pair.contract.to_string(),
                })
                .collect(),
            request_validity: RequestValidity {
                start_timestamp: request.valid_from.to_string(),
                duration_days: request.validity_days.to_string(),
            },
            contracts_chain_id: self.chain_id.to_string(),
            contract_addresses: request
                .contract_addresses
                .iter()
                .map(|a| a.to_string())
                .collect(),
            user_address: request.user.to_string(),
            signature: hex::encode(request.signature.as_bytes()),
            public_key: hex::encode(&request.keypair.public_key),
            extra_data: "0x00".to_string(),
        };

        debug!("Requesting user decryption of {} handles", request.handles.len());
        let response = self
            .http
            .post(endpoint(&state.base, USER_DECRYPT_PATH)?)
            .json(&body)
            .send()
            .await
            .map_err(|e| FheError::Relayer(format!("Relayer unreachable: {}", e)))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| FheError::Relayer(format!("Could not read relayer response: {}", e)))?;

        let shares = parse_decrypt_response(status, &text)?;

        let mut results = HashMap::new();
        for pair in &request.handles {
            let share = shares
                .iter()
                .find(|s| parse_handle(&s.handle).ok() == Some(pair.handle))
                .ok_or_else(|| FheError::MissingHandle(pair.handle.to_string()))?;
            let ciphertext = decode_hex(&share.payload)
                .map_err(|e| FheError::MalformedRequest(format!("Invalid share payload: {}", e)))?;
            let raw = bfv_decrypt_u64(&ciphertext, &request.keypair.private_key, &state.params)?;
            let value = ClearValue::from_raw(FheType::from_handle(&pair.handle)?, raw)?;
            results.insert(pair.handle, value);
        }

        Ok(results)
    }
}

/// Map a user decryption response onto shares or the matching failure kind
pub fn parse_decrypt_response(
    status: StatusCode,
    body: &str,
) -> Result<Vec<ReencryptedShare>, FheError> {
    match status {
        StatusCode::ACCEPTED => {
            warn!("Relayer reports decryption still pending");
            return Err(FheError::NotReady);
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            return Err(FheError::DecryptionDenied(body.to_string()))
        }
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            return Err(FheError::MalformedRequest(body.to_string()))
        }
        s if !s.is_success() => {
            return Err(FheError::Relayer(format!("{}: {}", s, body)));
        }
        _ => {}
    }

    let parsed: UserDecryptResponse = serde_json::from_str(body)
        .map_err(|e| FheError::Relayer(format!("Invalid user decryption response: {}", e)))?;
    if parsed
        .status
        .as_deref()
        .is_some_and(|s| s.eq_ignore_ascii_case("pending"))
    {
        warn!("Relayer reports decryption still pending");
        return Err(FheError::NotReady);
    }
    Ok(parsed.response)
}

fn input_from_proof_response(
    payload: InputProofPayload,
    expected: FheType,
) -> Result<EncryptedInput, FheError> {
    let handles = payload
        .handles
        .iter()
        .map(|h| parse_handle(h))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| FheError::EncryptionFailed(format!("Invalid handle: {}", e)))?;
    let signatures = payload
        .signatures
        .iter()
        .map(|s| {
            let bytes = decode_hex(s).map_err(|e| e.to_string())?;
            <[u8; SIGNATURE_LEN]>::try_from(bytes.as_slice())
                .map_err(|_| format!("expected {} byte signature", SIGNATURE_LEN))
        })
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| FheError::EncryptionFailed(format!("Invalid coprocessor signature: {}", e)))?;

    let handle = *handles
        .first()
        .ok_or_else(|| FheError::EncryptionFailed("relayer returned no handle".to_string()))?;
    if FheType::from_handle(&handle).ok() != Some(expected) {
        return Err(FheError::EncryptionFailed(format!(
            "relayer returned a handle of the wrong type for {:?}",
            expected
        )));
    }

    let proof = InputProof {
        handles,
        signatures,
        extra_data: Bytes::from_static(&[0]),
    }
    .pack()?;

    Ok(EncryptedInput { handle, proof })
}

fn endpoint(base: &Url, path: &str) -> Result<Url, FheError> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let with_slash = format!("{}/", base.path());
        base.set_path(&with_slash);
    }
    base.join(path)
        .map_err(|e| FheError::Relayer(format!("Invalid relayer endpoint {}: {}", path, e)))
}

fn decode_hex(value: &str) -> Result<Vec<u8>, hex::FromHexError> {
    hex::decode(value.trim_start_matches("0x"))
}

fn parse_handle(value: &str) -> Result<B256, String> {
    let bytes = decode_hex(value).map_err(|e| e.to_string())?;
    if bytes.len() != 32 {
        return Err(format!("expected 32 bytes, got {}", bytes.len()));
    }
    Ok(B256::from_slice(&bytes))
}
