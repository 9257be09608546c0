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

//! Flat row representation used by bulk exports.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One exported order line.
///
/// Rows are produced by the data source in a defined order (typically
/// date-descending) and that order is preserved end to end through the
/// batched export pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderExportRow {
    pub order_id: u64,
    pub placed_on: NaiveDate,
    pub store: String,
    pub category: String,
    pub product: String,
    pub quantity: u64,
    pub unit_price_cents: u64,
    pub total_cents: u64,
    pub payment_method: String,
}
