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

use ethers::types::Address;
use futures::FutureExt;
use tracing::info;

use donachain::{
    contract::Deployment,
    donation::{estimate_tokens, Currency, DonationForm, DonationHistory, DonationHistoryPtr},
    session::{Session, SessionEvent, SessionPtr},
    system::ExecutorPtr,
    util::parse::{encode_base10, short_address, BASE10_DECIMALS},
    wallet::WalletPtr,
    Error, Result,
};

use crate::cli_util::{print_history, spawn_signal_handler};

/// Why a history watch stopped.
#[derive(Debug)]
enum WatchEnd {
    Signal,
    Failed(Error),
}

impl WatchEnd {
    /// Shown on the way out, only when the user interrupted the watch.
    fn notice(&self) -> Option<&'static str> {
        match self {
            Self::Signal => Some("Caught termination signal, cleaning up and exiting..."),
            Self::Failed(_) => None,
        }
    }

    fn into_result(self) -> Result<()> {
        match self {
            Self::Signal => Ok(()),
            Self::Failed(e) => Err(e),
        }
    }
}

/// CLI-util structure
pub struct Dona {
    /// Wallet session shared by every command
    pub session: SessionPtr,
    /// Donation list reader
    pub history: DonationHistoryPtr,
    /// Currency used when a command does not name one
    pub default_currency: Currency,
}

impl Dona {
    pub fn new(
        wallet: WalletPtr,
        deployment: Deployment,
        default_currency: Currency,
        ex: ExecutorPtr,
    ) -> Self {
        let session = Session::new(wallet, deployment, ex);
        let history = DonationHistory::new(session.clone());
        Self { session, history, default_currency }
    }

    pub fn executor(&self) -> ExecutorPtr {
        self.session.executor()
    }

    /// A fresh donation form on the shared session.
    pub fn form(&self, currency: Currency) -> DonationForm {
        DonationForm::new(self.session.clone(), currency)
    }

    pub async fn connect(&self) -> Result<Address> {
        eprintln!("Requesting account access from the wallet...");
        let account = self.session.connect().await?;
        println!("Connected account: {account:?}");
        Ok(account)
    }

    pub async fn donate(
        &self,
        recipient: &str,
        amount: &str,
        message: &str,
        currency: Currency,
    ) -> Result<()> {
        let mut form = self.form(currency);
        form.set_recipient(recipient);
        form.set_amount(amount);
        form.set_message(message);
        self.submit(&mut form).await
    }

    /// Submit a filled-in form and report the outcome.
    pub async fn submit(&self, form: &mut DonationForm) -> Result<()> {
        let draft = form.draft().clone();
        eprintln!("Sending {} {} to {}...", draft.amount, draft.currency, draft.recipient);

        let receipt = form.submit().await?;
        println!("Donation sent successfully! Transaction: {:?}", receipt.transaction_hash);
        Ok(())
    }

    pub async fn approve(&self, amount: &str) -> Result<()> {
        let mut form = self.form(Currency::Token);
        form.set_amount(amount);
        self.approve_form(&mut form).await
    }

    /// Approve the form's amount and report the outcome.
    pub async fn approve_form(&self, form: &mut DonationForm) -> Result<()> {
        eprintln!("Approving {} DONA for the platform...", form.draft().amount);
        let receipt = form.approve().await?;
        println!("Token approval successful! Transaction: {:?}", receipt.transaction_hash);
        Ok(())
    }

    pub async fn allowance(&self) -> Result<()> {
        let allowance = self.form(Currency::Token).allowance().await?;
        println!("Allowance: {} DONA", encode_base10(allowance, BASE10_DECIMALS));
        Ok(())
    }

    pub async fn estimate(&self, amount: &str) {
        let tokens = estimate_tokens(&self.session, amount).await;
        println!("{} ETH ~ {} DONA", amount.trim(), encode_base10(tokens, BASE10_DECIMALS));
    }

    pub async fn history(&self) -> Result<()> {
        let records = self.history.refresh().await?;
        print_history(&records);
        Ok(())
    }

    /// Print the history, then reprint it on every new donation until a
    /// termination signal arrives. Rebinds when the wallet switches
    /// accounts.
    pub async fn watch_history(&self) -> Result<()> {
        let session_events = self.session.subscribe().await;
        print_history(&self.history.mount().await?);
        let updates = self.history.subscribe().await;

        let (handle, term_rx) = spawn_signal_handler(&self.executor())?;
        eprintln!("Watching for new donations, press Ctrl-C to stop");

        let end = loop {
            futures::select! {
                records = updates.receive().fuse() => match records {
                    Ok(records) => print_history(&records),
                    Err(e) => break WatchEnd::Failed(e),
                },

                event = session_events.receive().fuse() => match event {
                    Ok(SessionEvent::AccountChanged(account)) => {
                        info!(target: "dona", "Account changed to {}", short_address(&account));
                        if let Err(e) = self.history.mount().await {
                            break WatchEnd::Failed(e)
                        }
                    }
                    Ok(_) => {}
                    Err(e) => break WatchEnd::Failed(e),
                },

                _ = term_rx.recv().fuse() => break WatchEnd::Signal,
            }
        };

        if let Some(notice) = end.notice() {
            print!("\r");
            info!(target: "dona", "{}", notice);
        }
        handle.close();
        updates.unsubscribe().await;
        session_events.unsubscribe().await;
        self.history.teardown().await;
        end.into_result()
    }

    pub async fn teardown(&self) {
        self.history.teardown().await;
        self.session.teardown().await;
    }
}
