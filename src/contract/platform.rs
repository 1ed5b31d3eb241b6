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
use smol::stream::StreamExt as _;
use tracing::{debug, warn};

use super::{to_u64, DonationNotice, DonationPlatform, DonationRecord, PlatformContract};
use crate::{system::SubscriberPtr, Error, Result};

/// [`PlatformContract`] backed by the generated ethers binding.
pub struct EthPlatform<M: Middleware> {
    contract: DonationPlatform<M>,
    signer: Address,
}

impl<M: Middleware> EthPlatform<M> {
    pub fn new(address: Address, client: Arc<M>, signer: Address) -> Self {
        Self { contract: DonationPlatform::new(address, client), signer }
    }
}

#[async_trait]
impl<M: Middleware + 'static> PlatformContract for EthPlatform<M> {
    fn address(&self) -> Address {
        self.contract.address()
    }

    async fn donate(&self, recipient: Address, amount: U256, message: String) -> Result<TxHash> {
        let call = self.contract.donate(recipient, amount, message).from(self.signer);
        let pending = call.send().await?;
        debug!(target: "contract::platform", "donate() sent: {:?}", pending.tx_hash());
        Ok(pending.tx_hash())
    }

    async fn donate_with_eth(
        &self,
        recipient: Address,
        value: U256,
        message: String,
    ) -> Result<TxHash> {
        let call = self.contract.donate_with_eth(recipient, message).from(self.signer).value(value);
        let pending = call.send().await?;
        debug!(target: "contract::platform", "donateWithEth() sent: {:?}", pending.tx_hash());
        Ok(pending.tx_hash())
    }

    async fn donation_count(&self) -> Result<u64> {
        let count = self.contract.get_donation_count().call().await?;
        to_u64(count, "donation count")
    }

    async fn donation(&self, index: u64) -> Result<DonationRecord> {
        let (donor, recipient, amount, fee, timestamp, message) =
            self.contract.get_donation(U256::from(index)).call().await?;

        Ok(DonationRecord {
            index,
            donor,
            recipient,
            amount,
            fee,
            message,
            timestamp: to_u64(timestamp, "donation timestamp")?,
        })
    }

    async fn eth_to_dona_rate(&self, eth_amount: U256) -> Result<U256> {
        Ok(self.contract.get_eth_to_dona_rate(eth_amount).call().await?)
    }

    async fn watch_donations(&self, notify: SubscriberPtr<DonationNotice>) -> Result<()> {
        let events = self.contract.donation_made_filter();
        let mut stream = events.stream().await?;
        debug!(target: "contract::platform", "Watching DonationMade events");

        while let Some(event) = stream.next().await {
            match event {
                Ok(event) => {
                    notify
                        .notify(DonationNotice {
                            donor: event.donor,
                            recipient: event.recipient,
                            amount: event.amount,
                            fee: event.fee,
                        })
                        .await
                }
                Err(e) => {
                    warn!(target: "contract::platform", "Failed decoding DonationMade event: {}", e)
                }
            }
        }

        Err(Error::ProviderError("DonationMade event stream ended".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::{
        abi::{encode, Token},
        providers::Provider,
        types::Bytes,
    };

    #[test]
    fn decode_donation_record() -> Result<()> {
        let (provider, mock) = Provider::mocked();
        let platform =
            EthPlatform::new(Address::repeat_byte(0xaa), Arc::new(provider), Address::zero());

        let donor = Address::repeat_byte(0x01);
        let recipient = Address::repeat_byte(0x02);
        let encoded = encode(&[
            Token::Address(donor),
            Token::Address(recipient),
            Token::Uint(U256::exp10(18) * 5),
            Token::Uint(U256::exp10(17)),
            Token::Uint(U256::from(1_700_000_000u64)),
            Token::String("keep going".to_string()),
        ]);
        mock.push::<Bytes, _>(Bytes::from(encoded)).unwrap();

        let record = smol::block_on(platform.donation(3))?;
        assert_eq!(
            record,
            DonationRecord {
                index: 3,
                donor,
                recipient,
                amount: U256::exp10(18) * 5,
                fee: U256::exp10(17),
                message: "keep going".to_string(),
                timestamp: 1_700_000_000,
            }
        );
        Ok(())
    }

    #[test]
    fn donation_count_and_rate() -> Result<()> {
        let (provider, mock) = Provider::mocked();
        let platform =
            EthPlatform::new(Address::repeat_byte(0xaa), Arc::new(provider), Address::zero());

        mock.push::<Bytes, _>(Bytes::from(encode(&[Token::Uint(U256::from(7))]))).unwrap();
        assert_eq!(smol::block_on(platform.donation_count())?, 7);

        let rate = U256::exp10(18) * 1000;
        mock.push::<Bytes, _>(Bytes::from(encode(&[Token::Uint(rate)]))).unwrap();
        assert_eq!(smol::block_on(platform.eth_to_dona_rate(U256::exp10(18)))?, rate);
        Ok(())
    }
}
