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

use std::sync::Arc;

use async_trait::async_trait;
use ethers::{
    providers::Middleware,
    types::{Address, TxHash, U256},
};
use tracing::debug;

use super::{DonaToken, TokenContract};
use crate::Result;

/// [`TokenContract`] backed by the generated ethers binding.
pub struct EthToken<M: Middleware> {
    contract: DonaToken<M>,
    signer: Address,
}

impl<M: Middleware> EthToken<M> {
    pub fn new(address: Address, client: Arc<M>, signer: Address) -> Self {
        Self { contract: DonaToken::new(address, client), signer }
    }
}

#[async_trait]
impl<M: Middleware + 'static> TokenContract for EthToken<M> {
    fn address(&self) -> Address {
        self.contract.address()
    }

    async fn approve(&self, spender: Address, amount: U256) -> Result<TxHash> {
        let call = self.contract.approve(spender, amount).from(self.signer);
        let pending = call.send().await?;
        debug!(target: "contract::token", "approve() sent: {:?}", pending.tx_hash());
        Ok(pending.tx_hash())
    }

    async fn allowance(&self, owner: Address, spender: Address) -> Result<U256> {
        Ok(self.contract.allowance(owner, spender).call().await?)
    }
}
