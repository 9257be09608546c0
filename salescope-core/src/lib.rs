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

//! Salescope Core
//!
//! Value types and shared utilities for the sales statistics engine:
//! date ranges, aggregate result structures, the central error type, and
//! the top-N ranking helper. This crate performs no I/O.

pub mod error;
pub mod export;
pub mod range;
pub mod ranking;
pub mod stats;

pub use error::{Result, SalescopeError};
pub use export::OrderExportRow;
pub use range::DateRange;
pub use ranking::rank_top_n;
pub use stats::{
    AggregatedStats, CategorySales, OrderTotals, PaymentMethodStats, PaymentSlice, ProductSales,
    StoreSales,
};
