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

//! Typed handles to the DonaChain contracts.
//!
//! The raw bindings are generated by `abigen!` from the ABI descriptions
//! in `abi/`. The rest of the crate uses them through the
//! [`PlatformContract`] and [`TokenContract`] traits, so the workflow and
//! history code can be exercised against in-memory doubles.

use std::sync::Arc;

use async_trait::async_trait;
use ethers::{
    prelude::abigen,
    providers::Middleware,
    types::{Address, TxHash, U256},
};

use crate::{system::SubscriberPtr, Error, Result};

abigen!(DonationPlatform, "abi/DonationPlatform.json");
abigen!(DonaToken, "abi/DonaToken.json");

/// Donation platform contract binding
pub mod platform;
pub use platform::EthPlatform;

/// DONA token contract binding
pub mod token;
pub use token::EthToken;

/// Where the contracts live. Configured, never discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deployment {
    pub platform: Address,
    pub token: Option<Address>,
}

/// A donation as stored by the platform contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DonationRecord {
    /// Position in the contract's donation list
    pub index: u64,
    pub donor: Address,
    pub recipient: Address,
    /// Base units, 18 decimals
    pub amount: U256,
    /// Base units, 18 decimals
    pub fee: U256,
    pub message: String,
    /// Unix seconds
    pub timestamp: u64,
}

/// Payload of a `DonationMade` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DonationNotice {
    pub donor: Address,
    pub recipient: Address,
    pub amount: U256,
    pub fee: U256,
}

pub type PlatformPtr = Arc<dyn PlatformContract>;
pub type TokenPtr = Arc<dyn TokenContract>;

#[async_trait]
pub trait PlatformContract: Send + Sync {
    fn address(&self) -> Address;

    /// `donate(recipient, amount, message)`, paying in DONA tokens.
    async fn donate(&self, recipient: Address, amount: U256, message: String) -> Result<TxHash>;

    /// `donateWithEth(recipient, message)` carrying `value` wei.
    async fn donate_with_eth(
        &self,
        recipient: Address,
        value: U256,
        message: String,
    ) -> Result<TxHash>;

    async fn donation_count(&self) -> Result<u64>;

    async fn donation(&self, index: u64) -> Result<DonationRecord>;

    /// Token amount the platform gives for `eth_amount` wei.
    async fn eth_to_dona_rate(&self, eth_amount: U256) -> Result<U256>;

    /// Publish every `DonationMade` event to `notify` until the event
    /// stream ends or the calling task is stopped.
    async fn watch_donations(&self, notify: SubscriberPtr<DonationNotice>) -> Result<()>;
}

#[async_trait]
pub trait TokenContract: Send + Sync {
    fn address(&self) -> Address;

    async fn approve(&self, spender: Address, amount: U256) -> Result<TxHash>;

    async fn allowance(&self, owner: Address, spender: Address) -> Result<U256>;
}

/// Contract handles bound to one signing account.
#[derive(Clone)]
pub struct ContractSet {
    pub platform: PlatformPtr,
    /// Absent when the deployment has no token configured
    pub token: Option<TokenPtr>,
}

/// Bind the deployment's contracts to `client`, sending transactions as
/// `signer`.
pub fn bind<M: Middleware + 'static>(
    client: Arc<M>,
    signer: Option<Address>,
    deployment: &Deployment,
) -> Result<ContractSet> {
    let Some(signer) = signer else { return Err(Error::NoSigner) };

    let platform: PlatformPtr =
        Arc::new(EthPlatform::new(deployment.platform, client.clone(), signer));

    let token = deployment
        .token
        .map(|address| Arc::new(EthToken::new(address, client.clone(), signer)) as TokenPtr);

    Ok(ContractSet { platform, token })
}

/// Narrow a contract-supplied integer, failing instead of truncating.
pub(crate) fn to_u64(value: U256, what: &str) -> Result<u64> {
    if value.bits() > 64 {
        return Err(Error::ContractError(format!("{} out of range: {}", what, value)))
    }
    Ok(value.low_u64())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrowing() {
        assert_eq!(to_u64(U256::from(42), "count"), Ok(42));
        assert_eq!(to_u64(U256::from(u64::MAX), "count"), Ok(u64::MAX));
        assert!(matches!(
            to_u64(U256::from(u64::MAX) + 1, "count"),
            Err(Error::ContractError(_))
        ));
    }

    #[test]
    fn bind_without_token() -> Result<()> {
        let (provider, _mock) = ethers::providers::Provider::mocked();
        let deployment = Deployment { platform: Address::repeat_byte(0x01), token: None };

        let contracts = bind(Arc::new(provider), Some(Address::repeat_byte(0x02)), &deployment)?;
        assert_eq!(contracts.platform.address(), Address::repeat_byte(0x01));
        assert!(contracts.token.is_none());
        Ok(())
    }
}
