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

use ethers::types::{Address, TransactionReceipt, TxHash, U256};
use tracing::{debug, error, info};

use super::{Currency, DonationDraft, FormState};
use crate::{
    contract::{PlatformPtr, TokenPtr},
    session::{Session, SessionPtr},
    util::parse::parse_amount,
    wallet::WalletPtr,
    Error, Result,
};

/// The donation form: a draft plus the operations that act on it.
pub struct DonationForm {
    session: SessionPtr,
    draft: DonationDraft,
    state: FormState,
}

impl DonationForm {
    pub fn new(session: SessionPtr, currency: Currency) -> Self {
        Self { session, draft: DonationDraft::new(currency), state: FormState::Idle }
    }

    pub fn draft(&self) -> &DonationDraft {
        &self.draft
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn set_recipient(&mut self, recipient: &str) {
        self.draft.recipient = recipient.trim().to_string();
    }

    pub fn set_amount(&mut self, amount: &str) {
        self.draft.amount = amount.trim().to_string();
    }

    pub fn set_message(&mut self, message: &str) {
        self.draft.message = message.to_string();
    }

    pub fn set_currency(&mut self, currency: Currency) {
        self.draft.currency = currency;
    }

    /// Submit the draft as a donation and wait for it to be confirmed.
    ///
    /// Session and input problems are reported without touching the
    /// chain or the form state. Token donations read the current
    /// allowance first and are not sent when it falls short of the
    /// amount. The draft is cleared only once the donation is confirmed.
    pub async fn submit(&mut self) -> Result<TransactionReceipt> {
        let session = self.session.snapshot().await;
        let (account, platform, wallet) = session.require_platform()?;
        let token = match self.draft.currency {
            Currency::Token => Some(session.require_token()?.2),
            Currency::Eth => None,
        };

        let (recipient, amount) = self.draft.validate()?;

        self.state = FormState::Submitting;
        let result = send_donation(
            account,
            &platform,
            token.as_ref(),
            &wallet,
            recipient,
            amount,
            self.draft.message.clone(),
        )
        .await;

        match result {
            Ok(receipt) => {
                info!(
                    target: "donation::submit",
                    "Donation of {} {} to {:?} confirmed in {:?}",
                    self.draft.amount, self.draft.currency, recipient, receipt.transaction_hash,
                );
                self.draft.clear();
                self.state = FormState::Idle;
                Ok(receipt)
            }
            Err(e) => {
                error!(target: "donation::submit", "Failed to send donation: {}", e);
                self.state = FormState::Failed(e.to_string());
                Err(e)
            }
        }
    }

    /// Approve the platform to move the draft amount of DONA on the
    /// account's behalf. Never called implicitly by [`DonationForm::submit`].
    pub async fn approve(&mut self) -> Result<TransactionReceipt> {
        let session = self.session.snapshot().await;
        let (_, platform, token, wallet) = session.require_token()?;
        let amount = parse_amount(&self.draft.amount)?;

        self.state = FormState::Approving;
        let result = send_approval(&platform, &token, &wallet, amount).await;
        self.state = FormState::Idle;

        match &result {
            Ok(_) => info!(target: "donation::approve", "Token approval successful"),
            Err(e) => error!(target: "donation::approve", "Failed to approve tokens: {}", e),
        }
        result
    }

    /// Current allowance granted by the account to the platform.
    pub async fn allowance(&self) -> Result<U256> {
        let session = self.session.snapshot().await;
        let (account, platform, token, _) = session.require_token()?;
        token.allowance(account, platform.address()).await
    }
}

async fn send_donation(
    account: Address,
    platform: &PlatformPtr,
    token: Option<&TokenPtr>,
    wallet: &WalletPtr,
    recipient: Address,
    amount: U256,
    message: String,
) -> Result<TransactionReceipt> {
    let tx_hash: TxHash = match token {
        Some(token) => {
            let allowance = token.allowance(account, platform.address()).await?;
            debug!(target: "donation::submit", "Allowance: {}, requested: {}", allowance, amount);
            if allowance < amount {
                return Err(Error::InsufficientAllowance { allowance, requested: amount })
            }
            platform.donate(recipient, amount, message).await?
        }
        None => platform.donate_with_eth(recipient, amount, message).await?,
    };

    debug!(target: "donation::submit", "Waiting for confirmation of {:?}", tx_hash);
    wallet.wait_for_confirmation(tx_hash).await
}

async fn send_approval(
    platform: &PlatformPtr,
    token: &TokenPtr,
    wallet: &WalletPtr,
    amount: U256,
) -> Result<TransactionReceipt> {
    let tx_hash = token.approve(platform.address(), amount).await?;
    wallet.wait_for_confirmation(tx_hash).await
}

/// Token equivalent of a decimal ETH amount at the platform's current
/// rate. Any failure is logged and yields zero.
pub async fn estimate_tokens(session: &Session, eth_amount: &str) -> U256 {
    let estimate = async {
        let Some(platform) = session.snapshot().await.platform else {
            return Err(Error::WalletNotConnected)
        };
        let amount = parse_amount(eth_amount)?;
        platform.eth_to_dona_rate(amount).await
    };

    match estimate.await {
        Ok(tokens) => tokens,
        Err(e) => {
            error!(target: "donation::estimate", "Error getting token estimate: {}", e);
            U256::zero()
        }
    }
}
