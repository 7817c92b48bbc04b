// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::helpers::telemetry::setup_tracing;
use crate::wallet::WalletCommands;
use crate::{contract_info, play, resume, round_show, wallet};
use anyhow::{bail, Result};
use clap::{command, ArgAction, Parser, Subcommand};
use lottery_config::validation::ValidUrl;
use lottery_config::{load_config, LotteryConfig};
use tracing::{info, instrument, Level};

#[derive(Parser, Debug)]
#[command(name = "lottery")]
#[command(about = "Play the confidential lottery: your number stays encrypted on chain until you decrypt the result", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,

    /// Indicate error levels by adding additional `-v` arguments. Eg. `lottery -vvv` will give
    /// you trace level output
    #[arg(
        short,
        long,
        action = ArgAction::Count,
        global = true
    )]
    pub verbose: u8,

    /// Silence all output. This argument cannot be used alongside `-v`
    #[arg(
        short,
        long,
        action = ArgAction::SetTrue,
        conflicts_with = "verbose",
        global = true
    )]
    quiet: bool,

    /// Set the Open Telemetry collector grpc endpoint. Eg. http://localhost:4317
    #[arg(long = "otel", global = true)]
    pub otel: Option<ValidUrl>,
}

impl Cli {
    pub fn log_level(&self) -> Level {
        if self.quiet {
            Level::ERROR
        } else {
            match self.verbose {
                0 => Level::WARN,  //
                1 => Level::INFO,  // -v
                2 => Level::DEBUG, // -vv
                _ => Level::TRACE, // -vvv
            }
        }
    }

    #[instrument(skip_all)]
    pub async fn execute(self) -> Result<()> {
        let config = match self.load_config() {
            Ok(config) => config,
            Err(e)
                if matches!(
                    e.downcast_ref::<std::io::Error>(),
                    Some(ioe) if ioe.kind() == std::io::ErrorKind::NotFound
                ) =>
            {
                bail!(
                    "Configuration file not found. Create lottery.config.yaml or pass `--config <path>`."
                )
            }
            Err(e) => return Err(e),
        };

        setup_tracing(&config, self.log_level())?;
        info!("Config loaded from: {:?}", config.config_file());

        match self.command {
            Commands::Play { number, yes } => play::execute(&config, number, yes).await?,
            Commands::Resume { round, yes } => resume::execute(&config, round, yes).await?,
            Commands::Info => contract_info::execute(&config).await?,
            Commands::Round { id } => round_show::execute(&config, id).await?,
            Commands::Wallet { command } => wallet::execute(command, &config)?,
        }

        Ok(())
    }

    pub fn load_config(&self) -> Result<LotteryConfig> {
        load_config(self.config.clone(), self.otel.clone().map(Into::into))
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Buy a ticket and play it through to settlement
    Play {
        /// The number to play. Prompted for when omitted
        #[arg(short, long)]
        number: Option<u8>,

        /// Approve every wallet request without prompting
        #[arg(short, long)]
        yes: bool,
    },

    /// Continue a round bought earlier
    Resume {
        /// Round id shown when the ticket was bought
        #[arg(long)]
        round: u64,

        /// Approve every wallet request without prompting
        #[arg(short, long)]
        yes: bool,
    },

    /// Show ticket price, prize and pool of the lottery contract
    Info,

    /// Show the on chain record of a round
    Round {
        /// Round id
        id: u64,
    },

    /// Wallet management commands
    Wallet {
        #[command(subcommand)]
        command: WalletCommands,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_play() -> Result<()> {
        let cli = Cli::try_parse_from(["lottery", "-vv", "play", "--number", "5", "--yes"])?;
        assert_eq!(cli.log_level(), Level::DEBUG);
        assert!(matches!(
            cli.command,
            Commands::Play {
                number: Some(5),
                yes: true
            }
        ));
        Ok(())
    }

    #[test]
    fn test_parse_resume_and_quiet() -> Result<()> {
        let cli = Cli::try_parse_from(["lottery", "--quiet", "resume", "--round", "3"])?;
        assert_eq!(cli.log_level(), Level::ERROR);
        assert!(matches!(
            cli.command,
            Commands::Resume {
                round: 3,
                yes: false
            }
        ));
        assert!(Cli::try_parse_from(["lottery", "-q", "-v", "info"]).is_err());
        Ok(())
    }
}
