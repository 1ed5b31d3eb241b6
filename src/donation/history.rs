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

use smol::lock::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use crate::{
    contract::{DonationNotice, DonationRecord, PlatformContract, PlatformPtr},
    session::SessionPtr,
    system::{StoppableTask, StoppableTaskPtr, Subscriber, SubscriberPtr, Subscription},
    Error, Result,
};

/// Read every donation from the platform contract, newest first.
pub async fn fetch_donations(platform: &dyn PlatformContract) -> Result<Vec<DonationRecord>> {
    let count = platform.donation_count().await?;
    debug!(target: "donation::history", "Fetching {} donations", count);

    // Untrusted count, grow as records arrive
    let mut records = vec![];
    for index in 0..count {
        records.push(platform.donation(index).await?);
    }

    sort_newest_first(&mut records);
    Ok(records)
}

/// Descending timestamp; equal timestamps by descending index.
pub fn sort_newest_first(records: &mut [DonationRecord]) {
    records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.index.cmp(&a.index)));
}

pub type DonationHistoryPtr = Arc<DonationHistory>;

/// Donation list kept in sync with the platform contract.
///
/// [`DonationHistory::mount`] loads the list and starts listening for
/// `DonationMade` events; every event triggers a full re-read.
pub struct DonationHistory {
    session: SessionPtr,
    records: RwLock<Vec<DonationRecord>>,
    listener: Mutex<Option<StoppableTaskPtr>>,
    subscriber: SubscriberPtr<Vec<DonationRecord>>,
}

impl DonationHistory {
    pub fn new(session: SessionPtr) -> DonationHistoryPtr {
        Arc::new(Self {
            session,
            records: RwLock::new(vec![]),
            listener: Mutex::new(None),
            subscriber: Subscriber::new(),
        })
    }

    /// Latest list read, newest first.
    pub async fn records(&self) -> Vec<DonationRecord> {
        self.records.read().await.clone()
    }

    /// Subscribe to list updates.
    pub async fn subscribe(&self) -> Subscription<Vec<DonationRecord>> {
        self.subscriber.clone().subscribe().await
    }

    async fn platform(&self) -> Result<PlatformPtr> {
        self.session.snapshot().await.platform.ok_or(Error::WalletNotConnected)
    }

    /// Load the list with the session's current platform binding and
    /// follow `DonationMade` events from then on. Mounting again replaces
    /// a running listener.
    pub async fn mount(self: &Arc<Self>) -> Result<Vec<DonationRecord>> {
        self.teardown().await;

        let platform = self.platform().await?;
        let records = self.load(platform.as_ref()).await?;

        let notices = Subscriber::new();
        let subscription = notices.clone().subscribe().await;
        let history = self.clone();

        let task = StoppableTask::new();
        task.clone().start(
            async move {
                smol::future::or(
                    platform.watch_donations(notices),
                    history.event_loop(platform.clone(), subscription),
                )
                .await
            },
            |res| async move {
                match res {
                    Ok(()) | Err(Error::TaskStopped) => {
                        debug!(target: "donation::history", "Donation listener stopped")
                    }
                    Err(e) => {
                        error!(target: "donation::history", "Donation listener failed: {}", e)
                    }
                }
            },
            Error::TaskStopped,
            self.session.executor(),
        );

        *self.listener.lock().await = Some(task);
        Ok(records)
    }

    /// Re-read the whole list.
    pub async fn refresh(&self) -> Result<Vec<DonationRecord>> {
        let platform = self.platform().await?;
        self.load(platform.as_ref()).await
    }

    async fn load(&self, platform: &dyn PlatformContract) -> Result<Vec<DonationRecord>> {
        let records = fetch_donations(platform).await?;
        *self.records.write().await = records.clone();
        self.subscriber.notify(records.clone()).await;
        Ok(records)
    }

    async fn event_loop(
        &self,
        platform: PlatformPtr,
        subscription: Subscription<DonationNotice>,
    ) -> Result<()> {
        loop {
            let notice = subscription.receive().await?;
            info!(
                target: "donation::history",
                "New donation from {:?} to {:?}", notice.donor, notice.recipient,
            );

            if let Err(e) = self.load(platform.as_ref()).await {
                warn!(target: "donation::history", "Error fetching donations: {}", e);
            }
        }
    }

    /// Stop following events. The last list read stays available.
    pub async fn teardown(&self) {
        if let Some(task) = self.listener.lock().await.take() {
            task.stop().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        session::Session,
        test_utils::{deployment, Call, MockWallet, ALICE, BOB},
    };
    use ethers::types::U256;
    use smol::Executor;

    fn record(index: u64, timestamp: u64) -> DonationRecord {
        DonationRecord {
            index,
            donor: ALICE,
            recipient: BOB,
            amount: U256::exp10(18),
            fee: U256::exp10(16),
            message: format!("donation {index}"),
            timestamp,
        }
    }

    fn order(records: &[DonationRecord]) -> Vec<u64> {
        records.iter().map(|r| r.index).collect()
    }

    #[test]
    fn newest_first_for_any_permutation() {
        let records = [record(0, 100), record(1, 200), record(2, 200), record(3, 300)];

        // All 24 orderings of four records
        let mut perm = [0usize, 1, 2, 3];
        let mut seen = 0;
        loop {
            let mut shuffled: Vec<_> = perm.iter().map(|&i| records[i].clone()).collect();
            sort_newest_first(&mut shuffled);
            assert_eq!(order(&shuffled), vec![3, 2, 1, 0]);
            seen += 1;

            // Next lexicographic permutation
            let Some(i) = (0..3).rev().find(|&i| perm[i] < perm[i + 1]) else { break };
            let j = (i + 1..4).rev().find(|&j| perm[j] > perm[i]).unwrap();
            perm.swap(i, j);
            perm[i + 1..].reverse();
        }
        assert_eq!(seen, 24);
    }

    #[test]
    fn fetch_reads_every_index() -> Result<()> {
        let wallet = MockWallet::new(vec![ALICE], U256::zero());
        *wallet.platform.records.lock().unwrap() =
            vec![record(0, 10), record(1, 30), record(2, 20)];

        let records = smol::block_on(fetch_donations(wallet.platform.as_ref()))?;
        assert_eq!(order(&records), vec![1, 2, 0]);
        Ok(())
    }

    #[test]
    fn fetch_stops_at_missing_record() {
        let wallet = MockWallet::new(vec![ALICE], U256::zero());
        *wallet.platform.records.lock().unwrap() = vec![record(0, 10)];
        *wallet.platform.count.lock().unwrap() = Some(u64::MAX);

        let result = smol::block_on(fetch_donations(wallet.platform.as_ref()));
        assert!(matches!(result, Err(Error::ContractError(_))));
        let calls = vec![Call::DonationCount, Call::Donation(0), Call::Donation(1)];
        assert_eq!(wallet.calls(), calls);
    }

    #[test]
    fn mount_follows_events() -> Result<()> {
        let wallet = MockWallet::new(vec![ALICE], U256::zero());
        *wallet.platform.records.lock().unwrap() = vec![record(0, 10), record(1, 20)];

        let ex = Arc::new(Executor::new());
        let session = Session::new(wallet.clone(), deployment(), ex.clone());
        let history = DonationHistory::new(session.clone());

        smol::block_on(ex.run(async {
            assert_eq!(history.mount().await, Err(Error::WalletNotConnected));

            session.connect().await?;
            let updates = history.subscribe().await;
            assert_eq!(order(&history.mount().await?), vec![1, 0]);
            assert_eq!(order(&updates.receive().await?), vec![1, 0]);

            wallet.platform.emit(record(2, 30)).await;
            assert_eq!(order(&updates.receive().await?), vec![2, 1, 0]);
            assert_eq!(order(&history.records().await), vec![2, 1, 0]);

            // A failing re-read keeps the previous list
            *wallet.platform.fetch_error.lock().unwrap() =
                Some(Error::ProviderError("node unavailable".to_string()));
            wallet.platform.emit(record(3, 40)).await;
            crate::system::msleep(50).await;
            assert_eq!(order(&history.records().await), vec![2, 1, 0]);

            *wallet.platform.fetch_error.lock().unwrap() = None;
            wallet.platform.emit(record(4, 50)).await;
            assert_eq!(order(&updates.receive().await?), vec![4, 3, 2, 1, 0]);

            history.teardown().await;
            session.teardown().await;
            Ok(())
        }))
    }

    #[test]
    fn teardown_stops_refreshing() -> Result<()> {
        let wallet = MockWallet::new(vec![ALICE], U256::zero());
        let ex = Arc::new(Executor::new());
        let session = Session::new(wallet.clone(), deployment(), ex.clone());
        let history = DonationHistory::new(session.clone());

        smol::block_on(ex.run(async {
            session.connect().await?;
            history.mount().await?;
            history.teardown().await;
            // Let the stop handler run
            crate::system::msleep(50).await;

            wallet.clear_calls();
            wallet.platform.emit(record(0, 10)).await;
            crate::system::msleep(50).await;
            assert!(wallet.calls().is_empty());
            assert!(history.records().await.is_empty());

            // Mounting again picks the new record up
            assert_eq!(order(&history.mount().await?), vec![0]);
            history.teardown().await;
            session.teardown().await;
            Ok(())
        }))
    }
}
