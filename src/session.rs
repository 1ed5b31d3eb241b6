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

//! The wallet session: which account is connected and the contract
//! handles bound to it.
//!
//! One [`Session`] exists per process and is handed around as a
//! [`SessionPtr`]. State is only ever replaced whole under a single write
//! lock, so readers see either the old or the new account together with
//! its bindings.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use ethers::types::Address;
use smol::lock::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use crate::{
    contract::{Deployment, PlatformPtr, TokenPtr},
    system::{
        ExecutorPtr, StoppableTask, StoppableTaskPtr, Subscriber, SubscriberPtr, Subscription,
    },
    wallet::WalletPtr,
    Error, Result,
};

pub type SessionPtr = Arc<Session>;

/// Broadcast to session subscribers on every change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Connected(Address),
    AccountChanged(Address),
    /// The wallet no longer exposes any account
    Disconnected,
}

/// Consistent copy of the session fields.
#[derive(Clone, Default)]
pub struct SessionState {
    pub account: Option<Address>,
    pub provider: Option<WalletPtr>,
    pub platform: Option<PlatformPtr>,
    pub token: Option<TokenPtr>,
}

impl SessionState {
    /// Account and platform binding, or [`Error::WalletNotConnected`].
    pub fn require_platform(&self) -> Result<(Address, PlatformPtr, WalletPtr)> {
        match (self.account, &self.platform, &self.provider) {
            (Some(account), Some(platform), Some(provider)) => {
                Ok((account, platform.clone(), provider.clone()))
            }
            _ => Err(Error::WalletNotConnected),
        }
    }

    /// Like [`SessionState::require_platform`], also requiring the token binding.
    pub fn require_token(&self) -> Result<(Address, PlatformPtr, TokenPtr, WalletPtr)> {
        let (account, platform, provider) = self.require_platform()?;
        let Some(token) = self.token.clone() else { return Err(Error::TokenNotConfigured) };
        Ok((account, platform, token, provider))
    }
}

pub struct Session {
    wallet: WalletPtr,
    deployment: Deployment,
    state: RwLock<SessionState>,
    /// Connect attempts in flight
    connecting: AtomicUsize,
    /// Account-change listener, started by the first successful connect
    listener: Mutex<Option<StoppableTaskPtr>>,
    subscriber: SubscriberPtr<SessionEvent>,
    executor: ExecutorPtr,
}

impl Session {
    pub fn new(wallet: WalletPtr, deployment: Deployment, executor: ExecutorPtr) -> SessionPtr {
        Arc::new(Self {
            wallet,
            deployment,
            state: RwLock::new(SessionState::default()),
            connecting: AtomicUsize::new(0),
            listener: Mutex::new(None),
            subscriber: Subscriber::new(),
            executor,
        })
    }

    pub async fn snapshot(&self) -> SessionState {
        self.state.read().await.clone()
    }

    pub async fn account(&self) -> Option<Address> {
        self.state.read().await.account
    }

    pub fn is_connecting(&self) -> bool {
        self.connecting.load(Ordering::SeqCst) > 0
    }

    pub fn executor(&self) -> ExecutorPtr {
        self.executor.clone()
    }

    pub async fn subscribe(&self) -> Subscription<SessionEvent> {
        self.subscriber.clone().subscribe().await
    }

    /// Ask the wallet for account access and bind the contracts to the
    /// first account it hands out. On failure the previous session state
    /// is left untouched.
    pub async fn connect(self: &Arc<Self>) -> Result<Address> {
        self.connecting.fetch_add(1, Ordering::SeqCst);
        let result = self.try_connect().await;
        self.connecting.fetch_sub(1, Ordering::SeqCst);

        if let Err(e) = &result {
            error!(target: "session::connect", "Error connecting wallet: {}", e);
        }
        result
    }

    async fn try_connect(self: &Arc<Self>) -> Result<Address> {
        let accounts = self.wallet.request_accounts().await?;
        let Some(account) = accounts.first().copied() else { return Err(Error::NoAccounts) };

        let contracts = self.wallet.bind_contracts(Some(account), &self.deployment)?;

        *self.state.write().await = SessionState {
            account: Some(account),
            provider: Some(self.wallet.clone()),
            platform: Some(contracts.platform),
            token: contracts.token,
        };
        info!(target: "session::connect", "Connected account {:?}", account);

        self.start_listener().await;
        self.subscriber.notify(SessionEvent::Connected(account)).await;
        Ok(account)
    }

    async fn start_listener(self: &Arc<Self>) {
        let mut listener = self.listener.lock().await;
        if listener.is_some() {
            return
        }

        let accounts = Subscriber::new();
        let subscription = accounts.clone().subscribe().await;
        let wallet = self.wallet.clone();
        let session = self.clone();

        let task = StoppableTask::new();
        task.clone().start(
            async move {
                smol::future::or(
                    wallet.watch_accounts(accounts),
                    session.account_listener(subscription),
                )
                .await
            },
            |res| async move {
                match res {
                    Ok(()) | Err(Error::TaskStopped) => {
                        debug!(target: "session::listener", "Account listener stopped")
                    }
                    Err(e) => error!(target: "session::listener", "Account listener failed: {}", e),
                }
            },
            Error::TaskStopped,
            self.executor.clone(),
        );

        *listener = Some(task);
    }

    async fn account_listener(&self, subscription: Subscription<Vec<Address>>) -> Result<()> {
        loop {
            let accounts = subscription.receive().await?;
            self.handle_accounts_changed(accounts).await;
        }
    }

    /// Apply an account list reported by the wallet. An empty list clears
    /// the account and leaves the bindings as they were; a different
    /// first account gets freshly bound contracts.
    pub async fn handle_accounts_changed(&self, accounts: Vec<Address>) {
        let event = {
            let mut state = self.state.write().await;

            match accounts.first().copied() {
                None => {
                    if state.account.take().is_none() {
                        return
                    }
                    info!(target: "session::listener", "Wallet exposes no accounts anymore");
                    SessionEvent::Disconnected
                }

                Some(account) if state.account == Some(account) => return,

                Some(account) => {
                    let contracts =
                        match self.wallet.bind_contracts(Some(account), &self.deployment) {
                            Ok(v) => v,
                            Err(e) => {
                                warn!(
                                    target: "session::listener",
                                    "Failed binding contracts for {:?}: {}", account, e,
                                );
                                return
                            }
                        };

                    *state = SessionState {
                        account: Some(account),
                        provider: Some(self.wallet.clone()),
                        platform: Some(contracts.platform),
                        token: contracts.token,
                    };
                    info!(target: "session::listener", "Switched to account {:?}", account);
                    SessionEvent::AccountChanged(account)
                }
            }
        };

        self.subscriber.notify(event).await;
    }

    /// Stop the account-change listener. A later connect starts a new one.
    pub async fn teardown(&self) {
        if let Some(task) = self.listener.lock().await.take() {
            task.stop().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{deployment, Call, MockWallet, ALICE, BOB};
    use ethers::types::U256;
    use smol::Executor;

    fn session(wallet: Arc<MockWallet>) -> SessionPtr {
        Session::new(wallet, deployment(), Arc::new(Executor::new()))
    }

    #[test]
    fn connect_binds_first_account() -> Result<()> {
        let wallet = MockWallet::new(vec![ALICE, BOB], U256::zero());
        let session = session(wallet.clone());

        smol::block_on(async {
            assert!(session.account().await.is_none());
            assert!(!session.is_connecting());

            assert_eq!(session.connect().await?, ALICE);
            assert!(!session.is_connecting());

            let state = session.snapshot().await;
            assert_eq!(state.account, Some(ALICE));
            assert!(state.provider.is_some());
            assert!(state.platform.is_some());
            assert!(state.token.is_some());
            assert_eq!(wallet.calls(), vec![Call::RequestAccounts, Call::Bind(ALICE)]);

            session.teardown().await;
            Ok(())
        })
    }

    #[test]
    fn overlapping_connects_stay_connecting() -> Result<()> {
        let wallet = MockWallet::new(vec![ALICE], U256::zero());
        let release = wallet.hold_requests();
        let ex = Arc::new(Executor::new());
        let session = Session::new(wallet.clone(), deployment(), ex.clone());

        smol::block_on(ex.run(async {
            let first = ex.spawn({
                let session = session.clone();
                async move { session.connect().await }
            });
            let second = ex.spawn({
                let session = session.clone();
                async move { session.connect().await }
            });
            crate::system::msleep(50).await;
            assert!(session.is_connecting());

            // One attempt finishes while the other is still waiting
            release.send(()).await.unwrap();
            crate::system::msleep(50).await;
            assert!(session.is_connecting());
            assert_eq!(session.account().await, Some(ALICE));

            release.send(()).await.unwrap();
            assert_eq!(first.await?, ALICE);
            assert_eq!(second.await?, ALICE);
            assert!(!session.is_connecting());

            session.teardown().await;
            Ok(())
        }))
    }

    #[test]
    fn failed_connect_keeps_state() -> Result<()> {
        let wallet = MockWallet::new(vec![], U256::zero());
        let session = session(wallet.clone());

        smol::block_on(async {
            assert_eq!(session.connect().await, Err(Error::NoAccounts));
            assert!(session.snapshot().await.platform.is_none());

            *wallet.accounts.lock().unwrap() =
                Err(Error::ProviderError("User rejected the request".to_string()));
            assert!(matches!(session.connect().await, Err(Error::ProviderError(_))));
            assert!(session.account().await.is_none());
            assert!(!session.is_connecting());
            Ok(())
        })
    }

    #[test]
    fn account_changes_are_applied() -> Result<()> {
        let wallet = MockWallet::new(vec![ALICE], U256::zero());
        let ex = Arc::new(Executor::new());
        let session = Session::new(wallet.clone(), deployment(), ex.clone());

        smol::block_on(ex.run(async {
            let events = session.subscribe().await;
            session.connect().await?;
            assert_eq!(events.receive().await?, SessionEvent::Connected(ALICE));

            // Wallet locked: account goes away, bindings stay
            wallet.set_accounts(vec![]).await;
            assert_eq!(events.receive().await?, SessionEvent::Disconnected);
            let state = session.snapshot().await;
            assert!(state.account.is_none());
            assert!(state.platform.is_some());
            assert_eq!(state.require_platform().err(), Some(Error::WalletNotConnected));

            // Different account: rebound together with it
            wallet.set_accounts(vec![BOB]).await;
            assert_eq!(events.receive().await?, SessionEvent::AccountChanged(BOB));
            assert_eq!(session.account().await, Some(BOB));
            assert_eq!(wallet.calls().last(), Some(&Call::Bind(BOB)));

            session.teardown().await;
            Ok(())
        }))
    }

    #[test]
    fn unchanged_account_is_ignored() -> Result<()> {
        let wallet = MockWallet::new(vec![ALICE], U256::zero());
        let session = session(wallet.clone());

        smol::block_on(async {
            session.connect().await?;
            let events = session.subscribe().await;
            wallet.clear_calls();

            session.handle_accounts_changed(vec![ALICE]).await;
            assert!(wallet.calls().is_empty());

            session.handle_accounts_changed(vec![]).await;
            assert_eq!(events.receive().await?, SessionEvent::Disconnected);

            // Already cleared, nothing more to publish
            session.handle_accounts_changed(vec![]).await;
            session.handle_accounts_changed(vec![BOB]).await;
            assert_eq!(events.receive().await?, SessionEvent::AccountChanged(BOB));

            session.teardown().await;
            Ok(())
        })
    }
}
