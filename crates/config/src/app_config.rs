// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::chain_config::ChainConfig;
use crate::load_config::{find_in_parent, resolve_config_path, ConfigLocation, DEFAULT_CONFIG_NAME};
use crate::relayer_config::RelayerConfig;
use crate::wallet_config::WalletConfig;
use crate::yaml::load_yaml_with_env;
use anyhow::{anyhow, bail, Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::{env, path::PathBuf};
use tracing::debug;

/// Bounds for the number a player may pick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct TicketConfig {
    pub min_number: u8,
    pub max_number: u8,
    pub default_number: u8,
}

impl Default for TicketConfig {
    fn default() -> Self {
        Self {
            min_number: 1,
            max_number: 9,
            default_number: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct DecryptionConfig {
    /// How long a signed decryption authorization stays valid
    pub validity_days: u64,
}

impl Default for DecryptionConfig {
    fn default() -> Self {
        Self { validity_days: 30 }
    }
}

/// The config actually used throughout the app
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct LotteryConfig {
    /// The lottery chain and contract
    pub chain: ChainConfig,
    /// The signing wallet
    pub wallet: WalletConfig,
    /// The decryption relayer
    pub relayer: RelayerConfig,
    pub decryption: DecryptionConfig,
    pub ticket: TicketConfig,
    /// Set the Open Telemetry collector grpc endpoint. Eg. http://127.0.0.1:4317
    pub otel: Option<String>,
    /// The file this configuration was read from, if any
    #[serde(skip)]
    config_file: Option<PathBuf>,
}

impl LotteryConfig {
    pub fn config_file(&self) -> Option<&PathBuf> {
        self.config_file.as_ref()
    }

    pub fn otel(&self) -> Option<String> {
        self.otel.clone()
    }

    /// The chain the wallet starts on
    pub fn wallet_chain_id(&self) -> u64 {
        self.wallet.chain_id.unwrap_or(self.chain.chain_id)
    }

    pub fn validate(&self) -> Result<()> {
        let ticket = &self.ticket;
        if ticket.min_number > ticket.max_number {
            bail!(
                "ticket.min_number ({}) must not exceed ticket.max_number ({})",
                ticket.min_number,
                ticket.max_number
            );
        }
        if !(ticket.min_number..=ticket.max_number).contains(&ticket.default_number) {
            bail!(
                "ticket.default_number ({}) must lie within {}..={}",
                ticket.default_number,
                ticket.min_number,
                ticket.max_number
            );
        }
        if self.decryption.validity_days == 0 {
            bail!("decryption.validity_days must be at least 1");
        }
        self.chain.rpc_url()?;
        self.chain.contracts.lottery.parsed_address()?;
        Ok(())
    }
}

/// Value struct for passing configuration from the cli to the configuration
#[derive(Default, Serialize, Deserialize, Clone, Debug)]
struct CliOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otel: Option<String>,
}

/// Load the config at the config_file or the default location if not provided.
///
/// Precedence from lowest to highest: built in defaults, the yaml file, `LOTTERY_` prefixed
/// environment variables (nested keys separated by `__`), cli overrides.
pub fn load_config(config_file: Option<String>, otel: Option<String>) -> Result<LotteryConfig> {
    let location = resolve_config_path(
        find_in_parent,
        env::current_dir()?,
        OsDirs::config_dir()?,
        DEFAULT_CONFIG_NAME,
        config_file.map(PathBuf::from),
    );

    let (loaded_yaml, config_file) = match &location {
        ConfigLocation::Default(path) if !path.exists() => {
            debug!("No configuration at {:?}, using defaults", path);
            (String::new(), None)
        }
        _ => {
            let path = location.path().to_path_buf();
            let yaml = load_yaml_with_env(&path).context("Configuration file not found")?;
            (yaml, Some(path))
        }
    };

    let mut config: LotteryConfig = Figment::from(Serialized::defaults(LotteryConfig::default()))
        .merge(Yaml::string(&loaded_yaml))
        .merge(Env::prefixed("LOTTERY_").split("__"))
        .merge(Serialized::defaults(CliOverrides { otel }))
        .extract()
        .context("Could not parse configuration")?;

    config.config_file = config_file;
    config.validate()?;
    Ok(config)
}

pub struct OsDirs;
impl OsDirs {
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("lottery"))
            .ok_or_else(|| anyhow!("The OS did not provide a config dir. See https://docs.rs/dirs for more information."))
    }
}
