// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{error::ChainError, provider::ProviderConfig};
use alloy::{
    primitives::{Address, U256},
    signers::local::PrivateKeySigner,
};
use async_trait::async_trait;
use lottery_config::{ChainConfig, KnownNetwork, RpcAuth, WalletConfig, RPC};
use std::{
    collections::BTreeMap,
    env, fmt,
    sync::{Arc, PoisonError, RwLock},
};
use tracing::{debug, info};

/// Something the wallet needs the user to confirm
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApprovalRequest {
    Connect { account: Address },
    SwitchNetwork { chain_id: u64, name: String },
    AddNetwork { chain_id: u64, name: String, rpc_url: String },
    Transaction { description: String, value: U256 },
    SignTypedData { description: String },
}

impl fmt::Display for ApprovalRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApprovalRequest::Connect { account } => write!(f, "Connect account {}", account),
            ApprovalRequest::SwitchNetwork { chain_id, name } => {
                write!(f, "Switch to {} (chain {})", name, chain_id)
            }
            ApprovalRequest::AddNetwork {
                chain_id,
                name,
                rpc_url,
            } => write!(f, "Add network {} (chain {}) via {}", name, chain_id, rpc_url),
            ApprovalRequest::Transaction { description, value } if value.is_zero() => {
                write!(f, "Send transaction {}", description)
            }
            ApprovalRequest::Transaction { description, value } => {
                write!(f, "Send transaction {} paying {} wei", description, value)
            }
            ApprovalRequest::SignTypedData { description } => write!(f, "Sign {}", description),
        }
    }
}

/// Gate for every wallet interaction that a user would normally confirm
#[async_trait]
pub trait Approver: Send + Sync {
    async fn approve(&self, request: &ApprovalRequest) -> bool;
}

/// Approves everything. For non-interactive runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoApprove;

#[async_trait]
impl Approver for AutoApprove {
    async fn approve(&self, request: &ApprovalRequest) -> bool {
        debug!("Auto approving: {}", request);
        true
    }
}

/// A network the wallet can point at
#[derive(Debug, Clone)]
pub struct NetworkEndpoint {
    pub chain_id: u64,
    pub name: String,
    pub provider: ProviderConfig,
}

impl NetworkEndpoint {
    pub fn new(chain_id: u64, name: &str, rpc_url: &str, auth: RpcAuth) -> Result<Self, ChainError> {
        let rpc = RPC::from_url(rpc_url)
            .map_err(|e| ChainError::NetworkError(format!("{}: {}", name, e)))?;
        Ok(Self {
            chain_id,
            name: name.to_string(),
            provider: ProviderConfig::new(rpc, auth),
        })
    }

    pub fn from_chain_config(config: &ChainConfig) -> Result<Self, ChainError> {
        Self::new(
            config.chain_id,
            &config.name,
            &config.rpc_url,
            config.rpc_auth.clone(),
        )
    }

    pub fn from_known(network: &KnownNetwork) -> Result<Self, ChainError> {
        Self::new(
            network.chain_id,
            &network.name,
            &network.rpc_url,
            network.rpc_auth.clone(),
        )
    }
}

#[derive(Debug)]
struct WalletState {
    networks: BTreeMap<u64, NetworkEndpoint>,
    active_chain: u64,
}

/// A local key with a set of networks it knows about and one active network
pub struct LocalWallet {
    signer: Option<PrivateKeySigner>,
    state: RwLock<WalletState>,
    approver: Arc<dyn Approver>,
}

pub fn load_signer_from_env(var: &str) -> Result<Option<PrivateKeySigner>, ChainError> {
    let Ok(private_key) = env::var(var) else {
        return Ok(None);
    };
    private_key
        .trim()
        .parse()
        .map(Some)
        .map_err(|e| ChainError::NoWallet(format!("Invalid private key in {}: {}", var, e)))
}

impl LocalWallet {
    pub fn new(
        signer: Option<PrivateKeySigner>,
        networks: Vec<NetworkEndpoint>,
        active_chain: u64,
        approver: Arc<dyn Approver>,
    ) -> Self {
        let networks = networks.into_iter().map(|n| (n.chain_id, n)).collect();
        Self {
            signer,
            state: RwLock::new(WalletState {
                networks,
                active_chain,
            }),
            approver,
        }
    }

    /// Build a wallet from configuration. When the wallet starts on the lottery chain that
    /// chain is known up front; otherwise it has to be added before switching to it.
    pub fn from_config(
        wallet: &WalletConfig,
        chain: &ChainConfig,
        approver: Arc<dyn Approver>,
    ) -> Result<Self, ChainError> {
        let signer = load_signer_from_env(&wallet.private_key_env)?;
        let active_chain = wallet.chain_id.unwrap_or(chain.chain_id);

        let mut networks = wallet
            .networks
            .iter()
            .map(NetworkEndpoint::from_known)
            .collect::<Result<Vec<_>, _>>()?;
        if active_chain == chain.chain_id {
            networks.push(NetworkEndpoint::from_chain_config(chain)?);
        }

        Ok(Self::new(signer, networks, active_chain, approver))
    }

    pub fn signer(&self) -> Result<&PrivateKeySigner, ChainError> {
        self.signer.as_ref().ok_or_else(|| {
            ChainError::NoWallet("no private key configured for the wallet".to_string())
        })
    }

    pub fn address(&self) -> Result<Address, ChainError> {
        Ok(self.signer()?.address())
    }

    pub fn active_chain(&self) -> u64 {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .active_chain
    }

    pub fn active_network(&self) -> Result<NetworkEndpoint, ChainError> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state
            .networks
            .get(&state.active_chain)
            .cloned()
            .ok_or_else(|| ChainError::UnknownChain(format!("chain {}", state.active_chain)))
    }

    pub fn knows_chain(&self, chain_id: u64) -> bool {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .networks
            .contains_key(&chain_id)
    }

    pub async fn approve(&self, request: ApprovalRequest) -> bool {
        self.approver.approve(&request).await
    }

    /// `wallet_switchEthereumChain`
    pub async fn switch_chain(&self, chain_id: u64) -> Result<(), ChainError> {
        let name = {
            let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
            match state.networks.get(&chain_id) {
                Some(network) => network.name.clone(),
                None => return Err(ChainError::UnknownChain(format!("chain {}", chain_id))),
            }
        };

        if !self
            .approve(ApprovalRequest::SwitchNetwork { chain_id, name })
            .await
        {
            return Err(ChainError::UserRejected);
        }

        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .active_chain = chain_id;
        info!("Wallet switched to chain {}", chain_id);
        Ok(())
    }

    /// `wallet_addEthereumChain`
    pub async fn add_chain(&self, network: NetworkEndpoint) -> Result<(), ChainError> {
        let request = ApprovalRequest::AddNetwork {
            chain_id: network.chain_id,
            name: network.name.clone(),
            rpc_url: network.provider.rpc().url().to_string(),
        };
        if !self.approve(request).await {
            return Err(ChainError::UserRejected);
        }

        info!("Wallet added network {} (chain {})", network.name, network.chain_id);
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .networks
            .insert(network.chain_id, network);
        Ok(())
    }
}
