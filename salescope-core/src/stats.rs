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

//! Aggregate sales statistics structures.
//!
//! Monetary amounts are carried as integer minor units (cents) so that
//! merging and caching stay exact; display-layer formatting is a caller
//! concern. `AggregatedStats::assemble` is the single merge point for the
//! five independent sub-aggregations and is pure, so the merge semantics
//! are testable without any orchestration.

use crate::ranking::rank_top_n;
use serde::{Deserialize, Serialize};

/// Global order totals for a date range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    pub revenue_cents: u64,
    pub order_count: u64,
    /// Derived: `revenue_cents / order_count`, zero when there are no orders.
    pub avg_order_cents: u64,
}

impl OrderTotals {
    pub fn new(revenue_cents: u64, order_count: u64) -> Self {
        let avg_order_cents = if order_count == 0 {
            0
        } else {
            revenue_cents / order_count
        };
        Self {
            revenue_cents,
            order_count,
            avg_order_cents,
        }
    }
}

/// Revenue and order count for one product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySales {
    pub category: String,
    pub revenue_cents: u64,
    pub order_count: u64,
}

/// Sales figures for one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSales {
    pub product_id: u64,
    pub name: String,
    pub quantity: u64,
    pub revenue_cents: u64,
}

/// Sales figures for one store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSales {
    pub store_id: u64,
    pub name: String,
    pub order_count: u64,
    pub revenue_cents: u64,
}

/// Raw payment-method totals as produced by the data source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSlice {
    pub method: String,
    pub order_count: u64,
    pub amount_cents: u64,
}

/// A payment-method slice with its share of the grand total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentMethodStats {
    pub method: String,
    pub order_count: u64,
    pub amount_cents: u64,
    /// Share of the grand total in percent. Shares sum to ~100 whenever the
    /// grand total is non-zero; zero otherwise.
    pub percentage: f64,
}

/// The composite statistics result for one date range.
///
/// All collections are present (possibly empty) even when the range holds
/// no data — callers never see a null section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregatedStats {
    pub totals: OrderTotals,
    pub categories: Vec<CategorySales>,
    pub top_products: Vec<ProductSales>,
    pub top_stores: Vec<StoreSales>,
    pub payment_methods: Vec<PaymentMethodStats>,
}

impl AggregatedStats {
    /// Merge the five independent sub-aggregations into one result.
    ///
    /// Categories and payment methods are ordered by descending revenue,
    /// products and stores are ranked and truncated to `top_limit`. The
    /// ordering does not depend on the order the data source returned, so
    /// repeated assembly over unchanged data is byte-for-byte identical.
    pub fn assemble(
        totals: OrderTotals,
        categories: Vec<CategorySales>,
        products: Vec<ProductSales>,
        stores: Vec<StoreSales>,
        payments: Vec<PaymentSlice>,
        top_limit: usize,
    ) -> Self {
        let category_count = categories.len();
        let categories = rank_top_n(categories, |c| c.revenue_cents, category_count);
        let top_products = rank_top_n(products, |p| p.revenue_cents, top_limit);
        let top_stores = rank_top_n(stores, |s| s.revenue_cents, top_limit);

        let grand_total: u64 = payments.iter().map(|p| p.amount_cents).sum();
        let payment_count = payments.len();
        let payments = rank_top_n(payments, |p| p.amount_cents, payment_count);
        let payment_methods = payments
            .into_iter()
            .map(|slice| {
                let percentage = if grand_total == 0 {
                    0.0
                } else {
                    (slice.amount_cents as f64 / grand_total as f64) * 100.0
                };
                PaymentMethodStats {
                    method: slice.method,
                    order_count: slice.order_count,
                    amount_cents: slice.amount_cents,
                    percentage,
                }
            })
            .collect();

        Self {
            totals,
            categories,
            top_products,
            top_stores,
            payment_methods,
        }
    }
}
