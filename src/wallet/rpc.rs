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

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use ethers::{
    providers::{Http, JsonRpcClient, Middleware, PendingTransaction, Provider},
    types::{Address, TransactionReceipt, TxHash},
};
use tracing::{debug, info, warn};
use url::Url;

use super::{check_receipt, WalletProvider};
use crate::{
    contract::{self, ContractSet, Deployment},
    system::SubscriberPtr,
    Result,
};

/// Wallet provider talking to an Ethereum JSON-RPC endpoint that holds the
/// user's keys (an external signer, or a node with unlocked accounts).
/// Transactions are handed over with `eth_sendTransaction` and signed there.
pub struct EthersWallet<P: JsonRpcClient> {
    provider: Arc<Provider<P>>,
    /// Blocks to wait on top of the inclusion block
    confirmations: usize,
    /// How often pending transactions, filters and accounts are polled
    poll_interval: Duration,
}

impl EthersWallet<Http> {
    /// Create a wallet provider for the given HTTP(S) endpoint.
    pub fn connect_http(endpoint: Url, confirmations: usize, poll_interval: Duration) -> Self {
        info!(target: "wallet::rpc", "Using wallet provider at {}", endpoint);
        Self::new(Provider::new(Http::new(endpoint)), confirmations, poll_interval)
    }
}

impl<P: JsonRpcClient + 'static> EthersWallet<P> {
    pub fn new(provider: Provider<P>, confirmations: usize, poll_interval: Duration) -> Self {
        let provider = Arc::new(provider.interval(poll_interval));
        Self { provider, confirmations, poll_interval }
    }
}

#[async_trait]
impl<P: JsonRpcClient + 'static> WalletProvider for EthersWallet<P> {
    async fn request_accounts(&self) -> Result<Vec<Address>> {
        debug!(target: "wallet::rpc", "Requesting account access");
        let accounts: Vec<Address> = self.provider.request("eth_requestAccounts", ()).await?;
        Ok(accounts)
    }

    fn bind_contracts(
        &self,
        signer: Option<Address>,
        deployment: &Deployment,
    ) -> Result<ContractSet> {
        contract::bind(self.provider.clone(), signer, deployment)
    }

    async fn wait_for_confirmation(&self, tx_hash: TxHash) -> Result<TransactionReceipt> {
        debug!(
            target: "wallet::rpc",
            "Waiting for {} confirmation(s) of {:?}", self.confirmations, tx_hash,
        );
        let receipt = PendingTransaction::new(tx_hash, self.provider.as_ref())
            .interval(self.poll_interval)
            .confirmations(self.confirmations)
            .await?;

        check_receipt(tx_hash, receipt)
    }

    async fn watch_accounts(&self, notify: SubscriberPtr<Vec<Address>>) -> Result<()> {
        let mut last: Option<Vec<Address>> = None;

        loop {
            match self.provider.get_accounts().await {
                Ok(accounts) if last.as_ref() != Some(&accounts) => {
                    debug!(target: "wallet::rpc", "Wallet accounts changed: {:?}", accounts);
                    last = Some(accounts.clone());
                    notify.notify(accounts).await;
                }
                Ok(_) => {}
                Err(e) => warn!(target: "wallet::rpc", "Polling wallet accounts failed: {}", e),
            }

            smol::Timer::after(self.poll_interval).await;
        }
    }
}
