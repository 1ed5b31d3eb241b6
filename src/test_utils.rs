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

//! In-memory wallet and contract doubles shared by the unit tests.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex,
};

use async_trait::async_trait;
use ethers::types::{Address, TransactionReceipt, TxHash, H160, U256, U64};

use crate::{
    contract::{
        ContractSet, Deployment, DonationNotice, DonationRecord, PlatformContract, TokenContract,
    },
    system::SubscriberPtr,
    wallet::WalletProvider,
    Error, Result,
};

pub const PLATFORM: Address = H160([0xaa; 20]);
pub const TOKEN: Address = H160([0xbb; 20]);
pub const ALICE: Address = H160([0x01; 20]);
pub const BOB: Address = H160([0x02; 20]);

pub fn deployment() -> Deployment {
    Deployment { platform: PLATFORM, token: Some(TOKEN) }
}

/// Every chain-facing call the doubles see, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    RequestAccounts,
    Bind(Address),
    Donate { recipient: Address, amount: U256, message: String },
    DonateWithEth { recipient: Address, value: U256, message: String },
    DonationCount,
    Donation(u64),
    Rate(U256),
    Approve { spender: Address, amount: U256 },
    Allowance { owner: Address, spender: Address },
    Confirm(TxHash),
}

pub type CallLog = Arc<Mutex<Vec<Call>>>;

fn record(log: &CallLog, call: Call) {
    log.lock().unwrap().push(call);
}

static NEXT_TX: AtomicU64 = AtomicU64::new(1);

fn next_tx() -> TxHash {
    TxHash::from_low_u64_be(NEXT_TX.fetch_add(1, Ordering::SeqCst))
}

pub struct MockPlatform {
    pub log: CallLog,
    pub records: Mutex<Vec<DonationRecord>>,
    pub rate: Mutex<Result<U256>>,
    pub send_error: Mutex<Option<Error>>,
    pub fetch_error: Mutex<Option<Error>>,
    /// Reported by `donation_count` instead of the number of records
    pub count: Mutex<Option<u64>>,
    events: (smol::channel::Sender<DonationNotice>, smol::channel::Receiver<DonationNotice>),
}

impl MockPlatform {
    pub fn new(log: CallLog) -> Arc<Self> {
        Arc::new(Self {
            log,
            records: Mutex::new(vec![]),
            rate: Mutex::new(Ok(U256::zero())),
            send_error: Mutex::new(None),
            fetch_error: Mutex::new(None),
            count: Mutex::new(None),
            events: smol::channel::unbounded(),
        })
    }

    /// Append a record and emit the matching `DonationMade` event.
    pub async fn emit(&self, record: DonationRecord) {
        let notice = DonationNotice {
            donor: record.donor,
            recipient: record.recipient,
            amount: record.amount,
            fee: record.fee,
        };
        self.records.lock().unwrap().push(record);
        self.events.0.send(notice).await.unwrap();
    }
}

#[async_trait]
impl PlatformContract for MockPlatform {
    fn address(&self) -> Address {
        PLATFORM
    }

    async fn donate(&self, recipient: Address, amount: U256, message: String) -> Result<TxHash> {
        record(&self.log, Call::Donate { recipient, amount, message });
        match self.send_error.lock().unwrap().clone() {
            Some(e) => Err(e),
            None => Ok(next_tx()),
        }
    }

    async fn donate_with_eth(
        &self,
        recipient: Address,
        value: U256,
        message: String,
    ) -> Result<TxHash> {
        record(&self.log, Call::DonateWithEth { recipient, value, message });
        match self.send_error.lock().unwrap().clone() {
            Some(e) => Err(e),
            None => Ok(next_tx()),
        }
    }

    async fn donation_count(&self) -> Result<u64> {
        record(&self.log, Call::DonationCount);
        if let Some(e) = self.fetch_error.lock().unwrap().clone() {
            return Err(e)
        }
        if let Some(count) = *self.count.lock().unwrap() {
            return Ok(count)
        }
        Ok(self.records.lock().unwrap().len() as u64)
    }

    async fn donation(&self, index: u64) -> Result<DonationRecord> {
        record(&self.log, Call::Donation(index));
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.index == index)
            .cloned()
            .ok_or(Error::ContractError("index out of bounds".to_string()))
    }

    async fn eth_to_dona_rate(&self, eth_amount: U256) -> Result<U256> {
        record(&self.log, Call::Rate(eth_amount));
        self.rate.lock().unwrap().clone()
    }

    async fn watch_donations(&self, notify: SubscriberPtr<DonationNotice>) -> Result<()> {
        loop {
            let notice = self.events.1.recv().await.map_err(|_| Error::SubscriptionClosed)?;
            notify.notify(notice).await;
        }
    }
}

pub struct MockToken {
    pub log: CallLog,
    pub allowance: Mutex<U256>,
}

impl MockToken {
    pub fn new(log: CallLog, allowance: U256) -> Arc<Self> {
        Arc::new(Self { log, allowance: Mutex::new(allowance) })
    }
}

#[async_trait]
impl TokenContract for MockToken {
    fn address(&self) -> Address {
        TOKEN
    }

    async fn approve(&self, spender: Address, amount: U256) -> Result<TxHash> {
        record(&self.log, Call::Approve { spender, amount });
        *self.allowance.lock().unwrap() = amount;
        Ok(next_tx())
    }

    async fn allowance(&self, owner: Address, spender: Address) -> Result<U256> {
        record(&self.log, Call::Allowance { owner, spender });
        Ok(*self.allowance.lock().unwrap())
    }
}

pub struct MockWallet {
    pub log: CallLog,
    pub platform: Arc<MockPlatform>,
    pub token: Option<Arc<MockToken>>,
    pub accounts: Mutex<Result<Vec<Address>>>,
    pub confirm_error: Mutex<Option<Error>>,
    /// When set, each account request waits for one message on it
    gate: Mutex<Option<smol::channel::Receiver<()>>>,
    feed: (smol::channel::Sender<Vec<Address>>, smol::channel::Receiver<Vec<Address>>),
}

impl MockWallet {
    pub fn new(accounts: Vec<Address>, allowance: U256) -> Arc<Self> {
        Self::build(accounts, Some(allowance))
    }

    /// Wallet for a deployment without a token contract.
    pub fn without_token(accounts: Vec<Address>) -> Arc<Self> {
        Self::build(accounts, None)
    }

    fn build(accounts: Vec<Address>, allowance: Option<U256>) -> Arc<Self> {
        let log = CallLog::default();
        Arc::new(Self {
            platform: MockPlatform::new(log.clone()),
            token: allowance.map(|a| MockToken::new(log.clone(), a)),
            log,
            accounts: Mutex::new(Ok(accounts)),
            confirm_error: Mutex::new(None),
            gate: Mutex::new(None),
            feed: smol::channel::unbounded(),
        })
    }

    /// Simulate the wallet switching accounts.
    pub async fn set_accounts(&self, accounts: Vec<Address>) {
        *self.accounts.lock().unwrap() = Ok(accounts.clone());
        self.feed.0.send(accounts).await.unwrap();
    }

    /// Hold account requests until the returned sender releases them,
    /// one per message.
    pub fn hold_requests(&self) -> smol::channel::Sender<()> {
        let (tx, rx) = smol::channel::unbounded();
        *self.gate.lock().unwrap() = Some(rx);
        tx
    }

    pub fn calls(&self) -> Vec<Call> {
        self.log.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.log.lock().unwrap().clear();
    }
}

#[async_trait]
impl WalletProvider for MockWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>> {
        record(&self.log, Call::RequestAccounts);
        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.recv().await.map_err(|_| Error::SubscriptionClosed)?;
        }
        self.accounts.lock().unwrap().clone()
    }

    fn bind_contracts(
        &self,
        signer: Option<Address>,
        _deployment: &Deployment,
    ) -> Result<ContractSet> {
        let Some(signer) = signer else { return Err(Error::NoSigner) };
        record(&self.log, Call::Bind(signer));
        Ok(ContractSet {
            platform: self.platform.clone(),
            token: self.token.clone().map(|t| t as Arc<dyn TokenContract>),
        })
    }

    async fn wait_for_confirmation(&self, tx_hash: TxHash) -> Result<TransactionReceipt> {
        record(&self.log, Call::Confirm(tx_hash));
        if let Some(e) = self.confirm_error.lock().unwrap().clone() {
            return Err(e)
        }
        Ok(TransactionReceipt {
            transaction_hash: tx_hash,
            status: Some(U64::from(1)),
            ..Default::default()
        })
    }

    async fn watch_accounts(&self, notify: SubscriberPtr<Vec<Address>>) -> Result<()> {
        loop {
            let accounts = self.feed.1.recv().await.map_err(|_| Error::SubscriptionClosed)?;
            notify.notify(accounts).await;
        }
    }
}
