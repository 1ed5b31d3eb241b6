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

//! Opaque wallet provider capability.
//!
//! The rest of the crate only ever talks to the user's wallet through
//! [`WalletProvider`]: account discovery, contract binding for a signer,
//! transaction confirmation and account-change notifications. Key
//! material and signing stay on the wallet's side.

use std::sync::Arc;

use async_trait::async_trait;
use ethers::types::{Address, TransactionReceipt, TxHash, U64};

use crate::{
    contract::{ContractSet, Deployment},
    system::SubscriberPtr,
    Error, Result,
};

/// Wallet provider backed by an Ethereum JSON-RPC endpoint
pub mod rpc;
pub use rpc::EthersWallet;

pub type WalletPtr = Arc<dyn WalletProvider>;

#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Ask the wallet for account access. This is the call that prompts
    /// the user to pick an account, and may be refused.
    async fn request_accounts(&self) -> Result<Vec<Address>>;

    /// Produce contract handles for `deployment` whose transactions are
    /// signed by `signer`. Fails with [`Error::NoSigner`] when there is none.
    fn bind_contracts(&self, signer: Option<Address>, deployment: &Deployment)
        -> Result<ContractSet>;

    /// Wait until the given transaction is confirmed on chain.
    async fn wait_for_confirmation(&self, tx_hash: TxHash) -> Result<TransactionReceipt>;

    /// Publish the wallet's account list to `notify` whenever it changes.
    /// Runs until the wallet goes away or the calling task is stopped.
    async fn watch_accounts(&self, notify: SubscriberPtr<Vec<Address>>) -> Result<()>;
}

/// Turn the outcome of waiting on a pending transaction into a result:
/// no receipt means the transaction was dropped, a zero status means it
/// reverted.
pub fn check_receipt(
    tx_hash: TxHash,
    receipt: Option<TransactionReceipt>,
) -> Result<TransactionReceipt> {
    let Some(receipt) = receipt else { return Err(Error::TransactionDropped(tx_hash)) };

    if receipt.status != Some(U64::from(1)) {
        return Err(Error::TransactionReverted(tx_hash))
    }

    Ok(receipt)
}
