// Copyright 2025 Salescope (https://github.com/salescope)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Row-oriented text encoding for exports.

use salescope_core::OrderExportRow;
use std::borrow::Cow;
use std::fmt::Write;

/// Turns row batches into an output format. One encoder instance serves
/// all batches of an export, so implementations must be stateless or
/// internally synchronized.
pub trait RowEncoder<R>: Send + Sync {
    /// Header emitted once, before the first batch.
    fn header(&self) -> String;

    /// Encode one batch of rows.
    fn encode_batch(&self, rows: &[R]) -> anyhow::Result<Vec<u8>>;
}

/// CSV encoder for order export rows: fixed column header, one line per
/// record, quoting for fields containing separator, quote or newline.
pub struct CsvEncoder;

const COLUMNS: &str =
    "order_id,placed_on,store,category,product,quantity,unit_price_cents,total_cents,payment_method";

fn field(value: &str) -> Cow<'_, str> {
    if value.contains(|c| matches!(c, ',' | '"' | '\n' | '\r')) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

impl RowEncoder<OrderExportRow> for CsvEncoder {
    fn header(&self) -> String {
        format!("{}\n", COLUMNS)
    }

    fn encode_batch(&self, rows: &[OrderExportRow]) -> anyhow::Result<Vec<u8>> {
        let mut out = String::with_capacity(rows.len() * 64);
        for row in rows {
            writeln!(
                out,
                "{},{},{},{},{},{},{},{},{}",
                row.order_id,
                row.placed_on,
                field(&row.store),
                field(&row.category),
                field(&row.product),
                row.quantity,
                row.unit_price_cents,
                row.total_cents,
                field(&row.payment_method),
            )?;
        }
        Ok(out.into_bytes())
    }
}
