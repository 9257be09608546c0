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

//! Integration tests for the cache-fronted fan-out aggregator.

use async_trait::async_trait;
use chrono::NaiveDate;
use salescope_cache::ShardedCache;
use salescope_core::{
    AggregatedStats, CategorySales, DateRange, OrderExportRow, OrderTotals, PaymentSlice,
    ProductSales, Result, SalescopeError, StoreSales,
};
use salescope_query::{AggregatorConfig, SalesQueryExecutor, StatsAggregator, BRANCH_COUNT};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Fixed data source: 100 orders totaling 5000.00 across two categories,
/// three products, two stores and two payment methods. Counts every
/// aggregate query it serves.
struct FixtureExecutor {
    calls: AtomicUsize,
    fail_payments: bool,
    delay: Duration,
}

impl FixtureExecutor {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_payments: false,
            delay: Duration::ZERO,
        }
    }

    fn failing_payments() -> Self {
        Self {
            fail_payments: true,
            ..Self::new()
        }
    }

    fn slow(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::new()
        }
    }

    fn query_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn record_query(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

#[async_trait]
impl SalesQueryExecutor for FixtureExecutor {
    async fn global_totals(&self, _range: DateRange) -> Result<OrderTotals> {
        self.record_query().await;
        Ok(OrderTotals::new(500_000, 100))
    }

    async fn category_totals(&self, _range: DateRange) -> Result<Vec<CategorySales>> {
        self.record_query().await;
        Ok(vec![
            CategorySales {
                category: "apparel".into(),
                revenue_cents: 300_000,
                order_count: 55,
            },
            CategorySales {
                category: "home".into(),
                revenue_cents: 200_000,
                order_count: 45,
            },
        ])
    }

    async fn top_products(&self, _range: DateRange, _limit: usize) -> Result<Vec<ProductSales>> {
        self.record_query().await;
        // Deliberately unordered; the aggregator ranks.
        Ok(vec![
            ProductSales {
                product_id: 7,
                name: "mug".into(),
                quantity: 80,
                revenue_cents: 120_000,
            },
            ProductSales {
                product_id: 3,
                name: "hoodie".into(),
                quantity: 40,
                revenue_cents: 260_000,
            },
            ProductSales {
                product_id: 9,
                name: "poster".into(),
                quantity: 60,
                revenue_cents: 120_000,
            },
        ])
    }

    async fn top_stores(&self, _range: DateRange, _limit: usize) -> Result<Vec<StoreSales>> {
        self.record_query().await;
        Ok(vec![
            StoreSales {
                store_id: 1,
                name: "downtown".into(),
                order_count: 62,
                revenue_cents: 320_000,
            },
            StoreSales {
                store_id: 2,
                name: "airport".into(),
                order_count: 38,
                revenue_cents: 180_000,
            },
        ])
    }

    async fn payment_breakdown(&self, _range: DateRange) -> Result<Vec<PaymentSlice>> {
        self.record_query().await;
        if self.fail_payments {
            return Err(SalescopeError::Query(
                "payment breakdown query timed out".into(),
            ));
        }
        Ok(vec![
            PaymentSlice {
                method: "card".into(),
                order_count: 60,
                amount_cents: 300_000,
            },
            PaymentSlice {
                method: "cash".into(),
                order_count: 40,
                amount_cents: 200_000,
            },
        ])
    }

    async fn export_rows(&self, _range: DateRange) -> Result<Vec<OrderExportRow>> {
        Ok(vec![])
    }
}

fn thirty_day_range() -> DateRange {
    DateRange::new(
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
        NaiveDate::from_ymd_opt(2025, 6, 30).unwrap(),
    )
    .unwrap()
}

fn aggregator(
    executor: Arc<FixtureExecutor>,
    config: AggregatorConfig,
) -> (
    StatsAggregator<FixtureExecutor>,
    Arc<ShardedCache<AggregatedStats>>,
) {
    let cache = Arc::new(ShardedCache::new(16).unwrap());
    let agg = StatsAggregator::new(executor, Arc::clone(&cache), config);
    (agg, cache)
}

#[tokio::test]
async fn test_aggregate_end_to_end() {
    let executor = Arc::new(FixtureExecutor::new());
    let (agg, _cache) = aggregator(Arc::clone(&executor), AggregatorConfig::default());

    let stats = agg.get_aggregate(thirty_day_range()).await.unwrap();

    assert_eq!(stats.totals.order_count, 100);
    assert_eq!(stats.totals.revenue_cents, 500_000);
    assert_eq!(stats.totals.avg_order_cents, 5_000);

    assert_eq!(stats.categories[0].category, "apparel");
    assert_eq!(stats.top_products[0].product_id, 3);
    // Equal-revenue products keep source order (stable tie-break).
    assert_eq!(stats.top_products[1].product_id, 7);
    assert_eq!(stats.top_products[2].product_id, 9);
    assert_eq!(stats.top_stores[0].name, "downtown");

    let share_sum: f64 = stats.payment_methods.iter().map(|p| p.percentage).sum();
    assert!((share_sum - 100.0).abs() < 1e-9);
    assert!((stats.payment_methods[0].percentage - 60.0).abs() < 1e-9);

    assert_eq!(executor.query_count(), BRANCH_COUNT);
}

#[tokio::test]
async fn test_second_call_within_ttl_hits_cache() {
    let executor = Arc::new(FixtureExecutor::new());
    let (agg, _cache) = aggregator(Arc::clone(&executor), AggregatorConfig::default());
    let range = thirty_day_range();

    let first = agg.get_aggregate(range).await.unwrap();
    let second = agg.get_aggregate(range).await.unwrap();

    assert_eq!(first, second);
    // The hit never reached the data source.
    assert_eq!(executor.query_count(), BRANCH_COUNT);
}

#[tokio::test]
async fn test_expired_entry_triggers_fresh_fan_out() {
    let executor = Arc::new(FixtureExecutor::new());
    let config = AggregatorConfig {
        cache_ttl: Duration::from_millis(40),
        ..AggregatorConfig::default()
    };
    let (agg, _cache) = aggregator(Arc::clone(&executor), config);
    let range = thirty_day_range();

    agg.get_aggregate(range).await.unwrap();
    assert_eq!(executor.query_count(), BRANCH_COUNT);

    agg.get_aggregate(range).await.unwrap();
    assert_eq!(executor.query_count(), BRANCH_COUNT);

    tokio::time::sleep(Duration::from_millis(80)).await;

    agg.get_aggregate(range).await.unwrap();
    assert_eq!(executor.query_count(), 2 * BRANCH_COUNT);
}

#[tokio::test]
async fn test_distinct_ranges_are_cached_independently() {
    let executor = Arc::new(FixtureExecutor::new());
    let (agg, cache) = aggregator(Arc::clone(&executor), AggregatorConfig::default());

    let june = thirty_day_range();
    let july = DateRange::new(
        NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
        NaiveDate::from_ymd_opt(2025, 7, 31).unwrap(),
    )
    .unwrap();

    agg.get_aggregate(june).await.unwrap();
    agg.get_aggregate(july).await.unwrap();

    assert_eq!(executor.query_count(), 2 * BRANCH_COUNT);
    assert_eq!(cache.len(), 2);
}

#[tokio::test]
async fn test_result_is_deterministic_byte_for_byte() {
    let range = thirty_day_range();

    let executor = Arc::new(FixtureExecutor::new());
    let (agg_a, _cache_a) = aggregator(Arc::clone(&executor), AggregatorConfig::default());
    let (agg_b, _cache_b) = aggregator(Arc::clone(&executor), AggregatorConfig::default());

    let a = agg_a.get_aggregate(range).await.unwrap();
    let b = agg_b.get_aggregate(range).await.unwrap();

    assert_eq!(
        serde_json::to_vec(&a).unwrap(),
        serde_json::to_vec(&b).unwrap()
    );
}

#[tokio::test]
async fn test_branch_failure_discards_partial_results() {
    let executor = Arc::new(FixtureExecutor::failing_payments());
    let (agg, cache) = aggregator(Arc::clone(&executor), AggregatorConfig::default());
    let range = thirty_day_range();

    let err = agg.get_aggregate(range).await.unwrap_err();
    assert!(matches!(err, SalescopeError::Query(_)));

    // Every branch still ran to the join barrier, but nothing was cached.
    assert_eq!(executor.query_count(), BRANCH_COUNT);
    let key = StatsAggregator::<FixtureExecutor>::cache_key(range);
    assert!(!cache.has(&key));
    assert!(cache.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_misses_collapse_into_one_flight() {
    let executor = Arc::new(FixtureExecutor::slow(Duration::from_millis(40)));
    let (agg, _cache) = aggregator(Arc::clone(&executor), AggregatorConfig::default());
    let agg = Arc::new(agg);
    let range = thirty_day_range();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let agg = Arc::clone(&agg);
        handles.push(tokio::spawn(async move { agg.get_aggregate(range).await }));
    }

    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await.unwrap().unwrap());
    }

    let first = &results[0];
    assert!(results.iter().all(|r| r == first));
    // One flight of queries, not eight.
    assert_eq!(executor.query_count(), BRANCH_COUNT);
}
