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

use std::{io::Write, sync::Arc};

use ethers::types::U256;
use futures::FutureExt;
use smol::{
    io::{AsyncBufReadExt, BufReader},
    lock::Mutex,
    stream::StreamExt,
    Unblock,
};
use tracing::debug;

use donachain::{
    donation::{estimate_tokens, Currency, DonationForm, FormState},
    session::SessionEvent,
    util::parse::{encode_base10, short_address, BASE10_DECIMALS},
    Error, Result,
};

use crate::{cli_util::spawn_signal_handler, dona::Dona};

/// A line typed into the shell.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ShellCommand {
    Help,
    Connect,
    Recipient(String),
    Amount(String),
    Message(String),
    Currency(Currency),
    Show,
    Approve,
    Allowance,
    Donate,
    History,
    Quit,
    Empty,
}

fn parse_command(line: &str) -> Result<ShellCommand> {
    let line = line.trim();
    let (cmd, rest) = match line.split_once(char::is_whitespace) {
        Some((cmd, rest)) => (cmd, rest.trim()),
        None => (line, ""),
    };

    let command = match cmd {
        "" => ShellCommand::Empty,
        "help" | "?" => ShellCommand::Help,
        "connect" => ShellCommand::Connect,
        "recipient" | "to" => ShellCommand::Recipient(rest.to_string()),
        "amount" => ShellCommand::Amount(rest.to_string()),
        "message" | "msg" => ShellCommand::Message(rest.to_string()),
        "currency" => ShellCommand::Currency(rest.parse()?),
        "show" => ShellCommand::Show,
        "approve" => ShellCommand::Approve,
        "allowance" => ShellCommand::Allowance,
        "donate" | "send" => ShellCommand::Donate,
        "history" => ShellCommand::History,
        "quit" | "exit" => ShellCommand::Quit,
        _ => return Err(Error::ParseFailed("Unknown command, type `help` for a list")),
    };

    Ok(command)
}

fn print_help() {
    println!("Commands:");
    println!("    connect              Request account access from the wallet");
    println!("    recipient <address>  Set the recipient");
    println!("    amount <amount>      Set the amount");
    println!("    message <text>       Set the message");
    println!("    currency <eth|dona>  Pay in ETH or DONA");
    println!("    show                 Print the current draft");
    println!("    approve              Approve the drafted DONA amount");
    println!("    allowance            Print the current DONA allowance");
    println!("    donate               Send the drafted donation");
    println!("    history              Print the donation history");
    println!("    quit                 Leave the shell");
}

/// Latest token estimate and the ETH amount it was made for
type EstimatePtr = Arc<Mutex<Option<(String, U256)>>>;

/// Estimate the token equivalent of `amount` in the background.
fn spawn_estimate(dona: &Dona, amount: String, estimate: EstimatePtr) {
    let session = dona.session.clone();
    dona.executor()
        .spawn(async move {
            let tokens = estimate_tokens(&session, &amount).await;
            println!("\r{} ETH ~ {} DONA", amount, encode_base10(tokens, BASE10_DECIMALS));
            *estimate.lock().await = Some((amount, tokens));
        })
        .detach();
}

async fn show(form: &DonationForm, estimate: &EstimatePtr) {
    let draft = form.draft();
    println!("Recipient: {}", draft.recipient);
    println!("Amount:    {} {}", draft.amount, draft.currency);
    println!("Message:   {}", draft.message);

    if draft.currency == Currency::Eth {
        if let Some((amount, tokens)) = estimate.lock().await.as_ref() {
            if *amount == draft.amount {
                println!("Estimate:  {} DONA", encode_base10(*tokens, BASE10_DECIMALS));
            }
        }
    }

    if let FormState::Failed(reason) = form.state() {
        println!("Last error: {reason}");
    }
}

async fn prompt(dona: &Dona) {
    let account = match dona.session.account().await {
        Some(account) => short_address(&account),
        None => "not connected".to_string(),
    };
    print!("dona [{account}]> ");
    let _ = std::io::stdout().flush();
}

/// Run the draft-editing shell until `quit`, end of input or a
/// termination signal.
pub async fn interactive(dona: &Dona) -> Result<()> {
    print_help();
    if let Err(e) = dona.connect().await {
        eprintln!("Error: {e}");
    }

    let mut form = dona.form(dona.default_currency);
    let estimate = EstimatePtr::default();
    let session_events = dona.session.subscribe().await;

    let (handle, term_rx) = spawn_signal_handler(&dona.executor())?;
    let mut lines = BufReader::new(Unblock::new(std::io::stdin())).lines();

    loop {
        prompt(dona).await;

        let line = futures::select! {
            line = lines.next().fuse() => line,
            event = session_events.receive().fuse() => {
                match event {
                    Ok(SessionEvent::AccountChanged(account)) => {
                        println!("\rWallet switched to {account:?}")
                    }
                    Ok(SessionEvent::Disconnected) => println!("\rWallet disconnected"),
                    Ok(SessionEvent::Connected(_)) | Err(_) => {}
                }
                continue
            }
            _ = term_rx.recv().fuse() => None,
        };

        let Some(line) = line else { break };
        let command = match parse_command(&line?) {
            Ok(command) => command,
            Err(e) => {
                eprintln!("Error: {e}");
                continue
            }
        };
        debug!(target: "dona::interactive", "Command: {:?}", command);

        let result = match command {
            ShellCommand::Empty => Ok(()),
            ShellCommand::Help => {
                print_help();
                Ok(())
            }
            ShellCommand::Connect => dona.connect().await.map(|_| ()),
            ShellCommand::Recipient(recipient) => {
                form.set_recipient(&recipient);
                Ok(())
            }
            ShellCommand::Amount(amount) => {
                let changed = form.draft().amount != amount;
                form.set_amount(&amount);
                if changed && form.draft().currency == Currency::Eth {
                    spawn_estimate(dona, form.draft().amount.clone(), estimate.clone());
                }
                Ok(())
            }
            ShellCommand::Message(message) => {
                form.set_message(&message);
                Ok(())
            }
            ShellCommand::Currency(currency) => {
                let changed = form.draft().currency != currency;
                form.set_currency(currency);
                if changed && currency == Currency::Eth && !form.draft().amount.is_empty() {
                    spawn_estimate(dona, form.draft().amount.clone(), estimate.clone());
                }
                Ok(())
            }
            ShellCommand::Show => {
                show(&form, &estimate).await;
                Ok(())
            }
            ShellCommand::Approve => dona.approve_form(&mut form).await,
            ShellCommand::Allowance => dona.allowance().await,
            ShellCommand::Donate => dona.submit(&mut form).await,
            ShellCommand::History => dona.history().await,
            ShellCommand::Quit => break,
        };

        if let Err(e) = result {
            eprintln!("Error: {e}");
        }
    }

    handle.close();
    session_events.unsubscribe().await;
    Ok(())
}
