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

use chrono::DateTime;

/// Render a unix timestamp (seconds) as a UTC date string. Non-positive or
/// unrepresentable timestamps render as an empty string.
pub fn timestamp_to_date(timestamp: i64) -> String {
    if timestamp <= 0 {
        return "".to_string()
    }

    let Some(datetime) = DateTime::from_timestamp(timestamp, 0) else { return "".to_string() };

    datetime.format("%Y-%m-%d").to_string()
}
