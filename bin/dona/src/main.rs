/* This file is part of DarkFi (https://dark.fi)
 *
 * Copyright (C) 2020-2026 Dyne.org foundation
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as
 * published by the Free Software Foundation, either version 3 of the
 * License, or (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

use std::{fs, process::exit, sync::Arc, time::Duration};

use structopt_toml::{serde::Deserialize, structopt::StructOpt, StructOptToml};
use tracing::{debug, info};
use url::Url;

use donachain::{
    cli_desc,
    contract::Deployment,
    donation::Currency,
    system::ExecutorPtr,
    util::{
        cli::{init_logger, spawn_config},
        parse::parse_address,
        path::{expand_path, get_config_path},
    },
    wallet::EthersWallet,
    Error, Result,
};

/// CLI utility functions
mod cli_util;

/// Client state and the commands acting on it
mod dona;
use dona::Dona;

/// Interactive donation shell
mod interactive;

const CONFIG_FILE: &str = "dona_config.toml";
const CONFIG_FILE_CONTENTS: &str = include_str!("../dona_config.toml");

#[derive(StructOpt)]
#[structopt(name = "dona", about = cli_desc!())]
struct Args {
    #[structopt(flatten)]
    settings: Settings,

    #[structopt(subcommand)]
    /// Sub command to execute
    command: Subcmd,
}

/// Settings that may also come from the config file.
#[derive(Clone, Debug, Deserialize, StructOpt, StructOptToml)]
#[serde(default)]
#[structopt(name = "dona")]
struct Settings {
    #[structopt(short, long)]
    /// Configuration file to use
    config: Option<String>,

    #[structopt(short, long, default_value = "http://127.0.0.1:8545")]
    /// Wallet provider JSON-RPC endpoint
    endpoint: Url,

    #[structopt(long, default_value = "0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512")]
    /// DonationPlatform contract address
    platform: String,

    #[structopt(long)]
    /// DonaToken contract address
    token: Option<String>,

    #[structopt(long, default_value = "1")]
    /// Confirmations to wait for after inclusion
    confirmations: usize,

    #[structopt(long, default_value = "2000")]
    /// Polling interval in milliseconds
    accounts_poll: u64,

    #[structopt(long)]
    /// Set log file to output into
    log: Option<String>,

    #[structopt(short, parse(from_occurrences))]
    /// Increase verbosity (-vvv supported)
    verbose: u8,
}

impl Settings {
    fn deployment(&self) -> Result<Deployment> {
        let platform = parse_address(&self.platform)?;
        let token = self.token.as_deref().map(parse_address).transpose()?;
        Ok(Deployment { platform, token })
    }
}

#[derive(Clone, Debug, StructOpt)]
enum Subcmd {
    /// Connect the wallet and print the active account
    Connect,

    /// Send a donation and wait for it to be confirmed
    Donate {
        /// Recipient address
        recipient: String,

        /// Amount to donate, in ETH or DONA
        amount: String,

        #[structopt(short, long, default_value = "")]
        /// Message for the recipient
        message: String,

        #[structopt(short, long)]
        /// Pay in `eth` or `dona` (default: dona when a token is configured)
        currency: Option<Currency>,
    },

    /// Allow the platform to move the given amount of DONA
    Approve {
        /// Amount of DONA to approve
        amount: String,
    },

    /// Print the DONA allowance granted to the platform
    Allowance,

    /// Estimate the DONA equivalent of an ETH amount
    Estimate {
        /// Amount of ETH
        amount: String,
    },

    /// Print the donation history
    History {
        #[structopt(short, long)]
        /// Keep running and reprint on every new donation
        watch: bool,
    },

    /// Edit and send donations from an interactive shell
    Interactive,
}

async fn realmain(command: Subcmd, settings: Settings, ex: ExecutorPtr) -> Result<()> {
    let deployment = settings.deployment()?;
    let default_currency = if deployment.token.is_some() { Currency::Token } else { Currency::Eth };

    let wallet = EthersWallet::connect_http(
        settings.endpoint,
        settings.confirmations,
        Duration::from_millis(settings.accounts_poll),
    );
    let dona = Dona::new(Arc::new(wallet), deployment, default_currency, ex);

    let result = run_command(&dona, command).await;
    dona.teardown().await;
    result
}

async fn run_command(dona: &Dona, command: Subcmd) -> Result<()> {
    match command {
        Subcmd::Connect => {
            dona.connect().await?;
            Ok(())
        }

        Subcmd::Donate { recipient, amount, message, currency } => {
            dona.connect().await?;
            let currency = currency.unwrap_or(dona.default_currency);
            dona.donate(&recipient, &amount, &message, currency).await
        }

        Subcmd::Approve { amount } => {
            dona.connect().await?;
            dona.approve(&amount).await
        }

        Subcmd::Allowance => {
            dona.connect().await?;
            dona.allowance().await
        }

        Subcmd::Estimate { amount } => {
            dona.connect().await?;
            dona.estimate(&amount).await;
            Ok(())
        }

        Subcmd::History { watch } => {
            dona.connect().await?;
            if watch {
                return dona.watch_history().await
            }
            dona.history().await
        }

        Subcmd::Interactive => interactive::interactive(dona).await,
    }
}

fn main() {
    let matches = Args::clap().get_matches();
    let args = Args::from_clap(&matches);

    if let Err(e) = run(args, &matches) {
        eprintln!("Error: {e}");
        exit(2);
    }
}

fn run(args: Args, matches: &structopt::clap::ArgMatches) -> Result<()> {
    let cfg_path = get_config_path(args.settings.config.clone(), CONFIG_FILE)?;
    spawn_config(&cfg_path, CONFIG_FILE_CONTENTS.as_bytes())?;

    let settings = Settings::from_clap_with_toml(&fs::read_to_string(&cfg_path)?, matches)
        .map_err(|e| Error::ConfigInvalid(e.to_string()))?;

    let log_path = settings.log.as_deref().map(expand_path).transpose()?;
    let _log_guard = init_logger(settings.verbose, log_path.as_deref())?;
    debug!(target: "dona", "Using config file {:?}", cfg_path);

    // The HTTP transport runs on Tokio's reactor, everything else on smol
    let rt = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
    let _rt_guard = rt.enter();

    let ex = Arc::new(smol::Executor::new());
    let result = smol::block_on(ex.run(realmain(args.command, settings, ex.clone())));
    info!(target: "dona", "Exiting");
    result
}
