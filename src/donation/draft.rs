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

use ethers::types::{Address, U256};

use super::Currency;
use crate::{
    util::parse::{parse_address, parse_amount},
    Result,
};

/// User input of the donation form, kept as typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DonationDraft {
    pub recipient: String,
    /// Decimal amount, 18 fractional digits at most
    pub amount: String,
    pub message: String,
    pub currency: Currency,
}

impl DonationDraft {
    pub fn new(currency: Currency) -> Self {
        Self { recipient: String::new(), amount: String::new(), message: String::new(), currency }
    }

    /// Empty the text fields. The currency selection is kept.
    pub fn clear(&mut self) {
        self.recipient.clear();
        self.amount.clear();
        self.message.clear();
    }

    /// Recipient and amount in base units, or a validation error.
    pub fn validate(&self) -> Result<(Address, U256)> {
        let recipient = parse_address(&self.recipient)?;
        let amount = parse_amount(&self.amount)?;
        Ok((recipient, amount))
    }
}

/// Where the form is in its submission lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FormState {
    #[default]
    Idle,
    Approving,
    Submitting,
    /// Last submission failed with the given reason
    Failed(String),
}
