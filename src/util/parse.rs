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

use crate::{Error, Result};

/// Number of decimals used by ETH and the DONA token.
pub const BASE10_DECIMALS: usize = 18;

/// Decode a base10 decimal string into base units, scaling by `decimals`.
/// If `strict` is set, more fractional digits than `decimals` is an error,
/// otherwise the extra digits are truncated.
pub fn decode_base10(amount: &str, decimals: usize, strict: bool) -> Result<U256> {
    let amount = amount.trim();
    if amount.is_empty() {
        return Err(Error::InvalidAmount("empty amount".to_string()))
    }

    let (int_part, frac_part) = match amount.split_once('.') {
        Some((i, f)) => (i, f),
        None => (amount, ""),
    };

    if int_part.is_empty() && frac_part.is_empty() {
        return Err(Error::InvalidAmount(amount.to_string()))
    }

    if !int_part.chars().all(|c| c.is_ascii_digit()) ||
        !frac_part.chars().all(|c| c.is_ascii_digit())
    {
        return Err(Error::InvalidAmount(amount.to_string()))
    }

    if strict && frac_part.len() > decimals {
        return Err(Error::InvalidAmount(format!("{amount} has more than {decimals} decimals")))
    }

    let mut digits = String::with_capacity(int_part.len() + decimals);
    digits.push_str(int_part);
    let frac_len = frac_part.len().min(decimals);
    digits.push_str(&frac_part[..frac_len]);
    for _ in frac_len..decimals {
        digits.push('0');
    }

    let digits = digits.trim_start_matches('0');
    if digits.is_empty() {
        return Ok(U256::zero())
    }

    U256::from_dec_str(digits)
        .map_err(|_| Error::InvalidAmount(format!("{amount} is out of range")))
}

/// Encode base units into a base10 decimal string with `decimals` places,
/// dropping trailing fractional zeros.
pub fn encode_base10(amount: U256, decimals: usize) -> String {
    let mut s = amount.to_string();
    if s.len() <= decimals {
        s = format!("{}{}", "0".repeat(decimals - s.len() + 1), s);
    }

    let (int_part, frac_part) = s.split_at(s.len() - decimals);
    let frac_part = frac_part.trim_end_matches('0');
    if frac_part.is_empty() {
        return int_part.to_string()
    }

    format!("{int_part}.{frac_part}")
}

/// Parse a user-supplied donation amount. Zero is rejected.
pub fn parse_amount(amount: &str) -> Result<U256> {
    let value = decode_base10(amount, BASE10_DECIMALS, true)?;
    if value.is_zero() {
        return Err(Error::InvalidAmount(format!("{} must be greater than zero", amount.trim())))
    }
    Ok(value)
}

/// Parse a hex-encoded account or contract address.
pub fn parse_address(address: &str) -> Result<Address> {
    let address = address.trim();
    let hex = address.strip_prefix("0x").or_else(|| address.strip_prefix("0X"));
    match hex {
        Some(h) if h.len() == 40 => {
            h.parse::<Address>().map_err(|_| Error::InvalidAddress(address.to_string()))
        }
        _ => Err(Error::InvalidAddress(address.to_string())),
    }
}

/// Shorten an address for display, e.g. `0x1234...abcd`.
pub fn short_address(address: &Address) -> String {
    let full = format!("{address:?}");
    format!("{}...{}", &full[..6], &full[full.len() - 4..])
}
