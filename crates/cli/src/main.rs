// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use clap::Parser;
use cli::Cli;

mod cli;
mod helpers;
mod contract_info;
mod play;
mod resume;
mod round_show;
mod wallet;

#[tokio::main]
pub async fn main() {
    if let Err(err) = Cli::parse().execute().await {
        eprintln!("{:#}", err);
        std::process::exit(1);
    }
}
