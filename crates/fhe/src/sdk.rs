// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::FheError;
use alloy_primitives::Address;
use lottery_config::RelayerConfig;
use std::{env, fmt};
use tracing::debug;
use url::Url;

/// Well known relayer deployments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkPreset {
    pub name: &'static str,
    pub relayer_url: &'static str,
    pub gateway_chain_id: u64,
    pub verifying_contract: &'static str,
}

pub const PRESETS: &[NetworkPreset] = &[NetworkPreset {
    name: "sepolia",
    relayer_url: "https://relayer.sepolia.zama.ai",
    gateway_chain_id: 55815,
    verifying_contract: "0xb6E160B1ff80D67Bfe90A85eE06Ce0A2613607D1",
}];

pub fn find_preset(name: &str) -> Option<&'static NetworkPreset> {
    PRESETS.iter().find(|p| p.name.eq_ignore_ascii_case(name))
}

/// One place a relayer endpoint may come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SdkSource {
    /// Url written in the configuration
    Configured(String),
    /// Environment variable holding the url
    Env(String),
    /// Named network preset
    Preset(String),
}

impl SdkSource {
    fn locate(&self) -> Option<String> {
        match self {
            SdkSource::Configured(url) => Some(url.clone()),
            SdkSource::Env(var) => env::var(var).ok().filter(|v| !v.trim().is_empty()),
            SdkSource::Preset(name) => find_preset(name).map(|p| p.relayer_url.to_string()),
        }
    }
}

impl fmt::Display for SdkSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SdkSource::Configured(_) => write!(f, "config"),
            SdkSource::Env(var) => write!(f, "env:{}", var),
            SdkSource::Preset(name) => write!(f, "preset:{}", name),
        }
    }
}

/// Where the relayer was found and how to address its gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSdk {
    pub url: Url,
    pub source: SdkSource,
    pub gateway_chain_id: u64,
    pub verifying_contract: Address,
}

/// Ordered fallback list of relayer sources; the first that yields a url wins
#[derive(Debug, Clone)]
pub struct SdkResolver {
    sources: Vec<SdkSource>,
    gateway_chain_id: u64,
    verifying_contract: Option<String>,
}

impl SdkResolver {
    pub fn new(
        sources: Vec<SdkSource>,
        gateway_chain_id: u64,
        verifying_contract: Option<String>,
    ) -> Self {
        Self {
            sources,
            gateway_chain_id,
            verifying_contract,
        }
    }

    pub fn from_config(config: &RelayerConfig) -> Self {
        let mut sources = vec![];
        if let Some(url) = &config.url {
            sources.push(SdkSource::Configured(url.clone()));
        }
        sources.push(SdkSource::Env(config.url_env.clone()));
        if let Some(preset) = &config.preset {
            sources.push(SdkSource::Preset(preset.clone()));
        }

        let verifying_contract = config.verifying_contract.clone().or_else(|| {
            config
                .preset
                .as_deref()
                .and_then(find_preset)
                .map(|p| p.verifying_contract.to_string())
        });

        Self::new(sources, config.gateway_chain_id, verifying_contract)
    }

    pub fn sources(&self) -> &[SdkSource] {
        &self.sources
    }

    pub fn resolve(&self) -> Result<ResolvedSdk, FheError> {
        let Some((source, raw)) = self
            .sources
            .iter()
            .find_map(|s| s.locate().map(|url| (s.clone(), url)))
        else {
            let tried = self
                .sources
                .iter()
                .map(|s| s.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            return Err(FheError::SdkUnavailable(format!(
                "no relayer found (tried: {})",
                tried
            )));
        };

        debug!("Relayer located via {}", source);
        let url = Url::parse(&raw)
            .map_err(|e| FheError::SdkInitFailed(format!("Invalid relayer url '{}': {}", raw, e)))?;

        let verifying_contract = self
            .verifying_contract
            .as_deref()
            .ok_or_else(|| {
                FheError::SdkUnavailable("no decryption verifying contract configured".to_string())
            })?
            .parse::<Address>()
            .map_err(|e| FheError::SdkInitFailed(format!("Invalid verifying contract: {}", e)))?;

        Ok(ResolvedSdk {
            url,
            source,
            gateway_chain_id: self.gateway_chain_id,
            verifying_contract,
        })
    }
}
