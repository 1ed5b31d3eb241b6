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

//! Donations: the submission form and the history reader.

use std::{fmt, str::FromStr};

use crate::Error;

/// Donation draft and form state
pub mod draft;
pub use draft::{DonationDraft, FormState};

/// approve/allowance/donate sequence
pub mod workflow;
pub use workflow::{estimate_tokens, DonationForm};

/// Donation list read from the platform contract
pub mod history;
pub use history::{fetch_donations, sort_newest_first, DonationHistory, DonationHistoryPtr};

/// What a donation is paid in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Currency {
    /// Native ether, sent as transaction value
    Eth,
    /// DONA tokens, moved by the platform under an allowance
    Token,
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eth => write!(f, "ETH"),
            Self::Token => write!(f, "DONA"),
        }
    }
}

impl FromStr for Currency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "eth" => Ok(Self::Eth),
            "dona" | "token" => Ok(Self::Token),
            _ => Err(Error::ParseFailed("Unknown currency, expected eth or dona")),
        }
    }
}
