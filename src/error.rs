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

// Hello developer. Please add your error to the according subsection
// that is commented, or make a new subsection. Keep it clean.

use ethers::types::{TxHash, U256};

/// Main result type used throughout the codebase.
pub type Result<T> = std::result::Result<T, Error>;

/// General library errors used throughout the codebase.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    // ==============
    // Parsing errors
    // ==============
    #[error("Parse failed: {0}")]
    ParseFailed(&'static str),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    // ======================
    // Session-related errors
    // ======================
    #[error("Please connect your wallet first")]
    WalletNotConnected,

    #[error("Wallet returned no accounts")]
    NoAccounts,

    #[error("Contract binding requires a signer")]
    NoSigner,

    #[error("No token contract configured for this deployment")]
    TokenNotConfigured,

    // ============================
    // Authorization-related errors
    // ============================
    #[error("Please approve tokens first (allowance {allowance}, requested {requested})")]
    InsufficientAllowance { allowance: U256, requested: U256 },

    // ===================
    // Chain/wallet errors
    // ===================
    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Contract error: {0}")]
    ContractError(String),

    #[error("Transaction {0:?} reverted")]
    TransactionReverted(TxHash),

    #[error("Transaction {0:?} was dropped from the mempool")]
    TransactionDropped(TxHash),

    // ====================
    // Miscellaneous errors
    // ====================
    #[error("IO error: {0}")]
    Io(std::io::ErrorKind),

    #[error("Invalid config file detected: {0}")]
    ConfigInvalid(String),

    #[error("Logger initialization failed: {0}")]
    SetLoggerError(String),

    #[error("Task stopped")]
    TaskStopped,

    #[error("Subscription closed")]
    SubscriptionClosed,
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.kind())
    }
}

impl From<ethers::providers::ProviderError> for Error {
    fn from(err: ethers::providers::ProviderError) -> Self {
        Self::ProviderError(err.to_string())
    }
}

impl<M: ethers::providers::Middleware> From<ethers::contract::ContractError<M>> for Error {
    fn from(err: ethers::contract::ContractError<M>) -> Self {
        // Prefer the revert reason when the node hands one back
        if let Some(reason) = err.decode_revert::<String>() {
            return Self::ContractError(reason)
        }
        Self::ContractError(err.to_string())
    }
}

impl From<tracing::subscriber::SetGlobalDefaultError> for Error {
    fn from(err: tracing::subscriber::SetGlobalDefaultError) -> Self {
        Self::SetLoggerError(err.to_string())
    }
}
