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

use prettytable::{format, row, Table};
use signal_hook::consts::{SIGINT, SIGQUIT, SIGTERM};
use signal_hook_async_std::{Handle, Signals};
use smol::stream::StreamExt;

use donachain::{
    contract::DonationRecord,
    system::ExecutorPtr,
    util::{
        parse::{encode_base10, short_address, BASE10_DECIMALS},
        time::timestamp_to_date,
    },
    Result,
};

/// Build the donation history table, rows in the given order.
pub fn history_table(records: &[DonationRecord]) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_NO_BORDER_LINE_SEPARATOR);
    table.set_titles(row!["Date", "Donor", "Recipient", "Amount", "Fee", "Message"]);

    for record in records {
        table.add_row(row![
            timestamp_to_date(record.timestamp as i64),
            short_address(&record.donor),
            short_address(&record.recipient),
            encode_base10(record.amount, BASE10_DECIMALS),
            encode_base10(record.fee, BASE10_DECIMALS),
            record.message,
        ]);
    }

    table
}

pub fn print_history(records: &[DonationRecord]) {
    if records.is_empty() {
        println!("No donations found");
        return
    }
    println!("{}", history_table(records));
}

/// Listen for termination signals on `ex`. The returned channel is closed
/// once one arrives; the handle must be closed when done.
pub fn spawn_signal_handler(ex: &ExecutorPtr) -> Result<(Handle, smol::channel::Receiver<()>)> {
    let mut signals = Signals::new([SIGTERM, SIGINT, SIGQUIT])?;
    let handle = signals.handle();
    let (term_tx, term_rx) = smol::channel::bounded::<()>(1);

    ex.spawn(async move {
        while let Some(signal) = signals.next().await {
            match signal {
                SIGTERM | SIGINT | SIGQUIT => term_tx.close(),
                _ => unreachable!(),
            };
        }
    })
    .detach();

    Ok((handle, term_rx))
}
