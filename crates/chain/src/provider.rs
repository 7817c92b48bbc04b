// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::error::ChainError;
use alloy::{
    network::EthereumWallet,
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::client::RpcClient,
    signers::local::PrivateKeySigner,
    transports::{
        http::{
            reqwest::{
                header::{HeaderMap, HeaderValue, AUTHORIZATION},
                Client, Url,
            },
            Http,
        },
        ws::{WebSocketConfig, WsConnect},
        Authorization,
    },
};
use base64::{engine::general_purpose::STANDARD, Engine};
use lottery_config::{RpcAuth, RPC};

pub trait AuthConversions {
    fn to_header_value(&self) -> Option<HeaderValue>;
    fn to_ws_auth(&self) -> Option<Authorization>;
}

impl AuthConversions for RpcAuth {
    fn to_header_value(&self) -> Option<HeaderValue> {
        match self {
            RpcAuth::None => None,
            RpcAuth::Basic { username, password } => {
                let credentials = STANDARD.encode(format!("{}:{}", username, password));
                HeaderValue::from_str(&format!("Basic {}", credentials)).ok()
            }
            RpcAuth::Bearer(token) => HeaderValue::from_str(&format!("Bearer {}", token)).ok(),
        }
    }

    fn to_ws_auth(&self) -> Option<Authorization> {
        match self {
            RpcAuth::None => None,
            RpcAuth::Basic { username, password } => Some(Authorization::basic(username, password)),
            RpcAuth::Bearer(token) => Some(Authorization::bearer(token)),
        }
    }
}

/// Builds signing providers for one RPC endpoint
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    rpc: RPC,
    auth: RpcAuth,
}

impl ProviderConfig {
    pub fn new(rpc: RPC, auth: RpcAuth) -> Self {
        Self { rpc, auth }
    }

    pub fn rpc(&self) -> &RPC {
        &self.rpc
    }

    pub async fn create_signer_provider(
        &self,
        signer: &PrivateKeySigner,
    ) -> Result<DynProvider, ChainError> {
        let wallet = EthereumWallet::from(signer.clone());

        let provider = if self.rpc.is_websocket() {
            ProviderBuilder::new()
                .wallet(wallet)
                .connect_ws(self.create_ws_connect()?)
                .await
                .map_err(|e| {
                    ChainError::NetworkError(format!(
                        "Failed to connect to WebSocket RPC. Check if the node is running and URL is correct: {}",
                        e
                    ))
                })?
                .erased()
        } else {
            ProviderBuilder::new()
                .wallet(wallet)
                .connect_client(self.create_http_client()?)
                .erased()
        };

        Ok(provider)
    }

    fn create_ws_connect(&self) -> Result<WsConnect, ChainError> {
        let config = WebSocketConfig::default()
            .max_frame_size(Some(32 * 1024 * 1024))
            .max_message_size(Some(32 * 1024 * 1024));

        let url = self
            .rpc
            .as_ws_url()
            .map_err(|e| ChainError::NetworkError(e.to_string()))?;
        let mut ws_connect = WsConnect::new(url).with_config(config);

        if let Some(auth) = self.auth.to_ws_auth() {
            ws_connect = ws_connect.with_auth(auth);
        }

        Ok(ws_connect)
    }

    fn create_http_client(&self) -> Result<RpcClient, ChainError> {
        let mut headers = HeaderMap::new();
        if let Some(auth_header) = self.auth.to_header_value() {
            headers.insert(AUTHORIZATION, auth_header);
        }

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| ChainError::NetworkError(format!("Failed to create HTTP client: {}", e)))?;

        let url = self
            .rpc
            .as_http_url()
            .map_err(|e| ChainError::NetworkError(e.to_string()))?
            .parse::<Url>()
            .map_err(|e| ChainError::NetworkError(format!("Invalid RPC url: {}", e)))?;

        let http = Http::with_client(client, url);
        Ok(RpcClient::new(http, self.rpc.is_local()))
    }
}
