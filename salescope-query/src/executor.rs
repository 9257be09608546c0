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

//! The data-source capability consumed by the aggregator and exporter.

use async_trait::async_trait;
use salescope_core::{
    CategorySales, DateRange, OrderExportRow, OrderTotals, PaymentSlice, ProductSales, Result,
    StoreSales,
};

/// Read operations the underlying sales data source must provide.
///
/// Each aggregate read is independent of the others so the caller is free
/// to run them in parallel. Implementations (SQL, remote RPC, in-memory
/// fixtures) live outside this crate; failures surface as
/// [`salescope_core::SalescopeError::Query`].
#[async_trait]
pub trait SalesQueryExecutor: Send + Sync {
    /// Revenue and order count over the whole range.
    async fn global_totals(&self, range: DateRange) -> Result<OrderTotals>;

    /// Revenue and order count per product category.
    async fn category_totals(&self, range: DateRange) -> Result<Vec<CategorySales>>;

    /// Best-selling products by revenue. Implementations may return the
    /// list unordered; the aggregator ranks and truncates it.
    async fn top_products(&self, range: DateRange, limit: usize) -> Result<Vec<ProductSales>>;

    /// Highest-revenue stores. Same ordering contract as `top_products`.
    async fn top_stores(&self, range: DateRange, limit: usize) -> Result<Vec<StoreSales>>;

    /// Order count and amount per payment method.
    async fn payment_breakdown(&self, range: DateRange) -> Result<Vec<PaymentSlice>>;

    /// Every order line in the range, in the source's export order.
    async fn export_rows(&self, range: DateRange) -> Result<Vec<OrderExportRow>>;
}
