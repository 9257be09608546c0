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

//! Cache-fronted fan-out aggregation.
//!
//! A statistics request fans out into [`BRANCH_COUNT`] independent query
//! branches, each owning one disjoint slice of the composite result. The
//! branches report over a channel sized to the branch count, so no branch
//! ever blocks on delivering its outcome. The orchestrator merges only
//! after every branch has reported; any branch failure fails the whole
//! call and nothing is cached.

use crate::executor::SalesQueryExecutor;
use dashmap::DashMap;
use salescope_cache::{KeyBuilder, ShardedCache};
use salescope_core::{
    AggregatedStats, CategorySales, DateRange, OrderTotals, PaymentSlice, ProductSales, Result,
    SalescopeError, StoreSales,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, warn};

/// Number of parallel aggregation branches per statistics request.
pub const BRANCH_COUNT: usize = 5;

/// Aggregator tuning, fixed at construction.
#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// Length of the ranked product/store lists.
    pub top_limit: usize,
    /// How long a merged result stays servable from cache.
    pub cache_ttl: Duration,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            top_limit: 10,
            cache_ttl: Duration::from_secs(300),
        }
    }
}

/// One branch's contribution to the composite result.
enum SubAggregation {
    Totals(OrderTotals),
    Categories(Vec<CategorySales>),
    Products(Vec<ProductSales>),
    Stores(Vec<StoreSales>),
    Payments(Vec<PaymentSlice>),
}

type BranchResult = Result<SubAggregation>;

/// Computes and caches [`AggregatedStats`] for date ranges.
///
/// Cheap to share behind an `Arc`; safe for concurrent callers. The cache
/// and executor are injected so one cache instance can front several
/// consumers.
pub struct StatsAggregator<E> {
    executor: Arc<E>,
    cache: Arc<ShardedCache<AggregatedStats>>,
    config: AggregatorConfig,
    /// Per-key guards collapsing concurrent cache misses into one flight.
    inflight: DashMap<String, Arc<Mutex<()>>>,
}

impl<E> StatsAggregator<E> {
    /// Cache key for a range, discretized to epoch days.
    pub fn cache_key(range: DateRange) -> String {
        KeyBuilder::new("sales-stats")
            .push_int(range.start_epoch_day())
            .push_int(range.end_epoch_day())
            .build()
    }
}

impl<E: SalesQueryExecutor + 'static> StatsAggregator<E> {
    pub fn new(
        executor: Arc<E>,
        cache: Arc<ShardedCache<AggregatedStats>>,
        config: AggregatorConfig,
    ) -> Self {
        Self {
            executor,
            cache,
            config,
            inflight: DashMap::new(),
        }
    }

    /// Aggregate statistics for `range`, served from cache when possible.
    ///
    /// A cache hit returns without touching the data source. On a miss,
    /// concurrent callers for the same range are collapsed into a single
    /// fan-out; the rest find the freshly stored result when the leader
    /// finishes.
    pub async fn get_aggregate(&self, range: DateRange) -> Result<AggregatedStats> {
        let key = Self::cache_key(range);

        if let Some(stats) = self.cache.get(&key) {
            debug!(key = %key, "aggregate served from cache");
            return Ok(stats);
        }

        let flight = self
            .inflight
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = flight.lock().await;

        // A concurrent leader may have filled the cache while we waited.
        if let Some(stats) = self.cache.get(&key) {
            debug!(key = %key, "aggregate computed by concurrent caller");
            return Ok(stats);
        }

        let result = self.fan_out(range).await;
        match &result {
            Ok(stats) => {
                self.cache
                    .set(key.clone(), stats.clone(), self.config.cache_ttl);
                debug!(key = %key, ttl_secs = self.config.cache_ttl.as_secs(), "aggregate cached");
            }
            Err(err) => {
                warn!(key = %key, error = %err, "aggregation failed, nothing cached");
            }
        }

        drop(guard);
        self.inflight.remove(&key);
        result
    }

    /// Run all branches in parallel and join their results.
    async fn fan_out(&self, range: DateRange) -> Result<AggregatedStats> {
        debug!(
            start = %range.start(),
            end = %range.end(),
            branches = BRANCH_COUNT,
            "fanning out aggregation queries"
        );

        // Buffer sized to the branch count: a branch can always deliver
        // its result without blocking, even if the orchestrator is slow.
        let (tx, mut rx) = mpsc::channel::<BranchResult>(BRANCH_COUNT);
        let top_limit = self.config.top_limit;

        {
            let executor = Arc::clone(&self.executor);
            let tx = tx.clone();
            tokio::spawn(async move {
                let res = executor.global_totals(range).await;
                let _ = tx.send(res.map(SubAggregation::Totals)).await;
            });
        }
        {
            let executor = Arc::clone(&self.executor);
            let tx = tx.clone();
            tokio::spawn(async move {
                let res = executor.category_totals(range).await;
                let _ = tx.send(res.map(SubAggregation::Categories)).await;
            });
        }
        {
            let executor = Arc::clone(&self.executor);
            let tx = tx.clone();
            tokio::spawn(async move {
                let res = executor.top_products(range, top_limit).await;
                let _ = tx.send(res.map(SubAggregation::Products)).await;
            });
        }
        {
            let executor = Arc::clone(&self.executor);
            let tx = tx.clone();
            tokio::spawn(async move {
                let res = executor.top_stores(range, top_limit).await;
                let _ = tx.send(res.map(SubAggregation::Stores)).await;
            });
        }
        {
            let executor = Arc::clone(&self.executor);
            tokio::spawn(async move {
                let res = executor.payment_breakdown(range).await;
                let _ = tx.send(res.map(SubAggregation::Payments)).await;
            });
        }

        // Join barrier: the channel closes once every branch has sent,
        // so draining it waits for all of them — success or failure.
        let mut totals = None;
        let mut categories = None;
        let mut products = None;
        let mut stores = None;
        let mut payments = None;
        let mut errors: Vec<SalescopeError> = Vec::new();

        while let Some(branch) = rx.recv().await {
            match branch {
                Ok(SubAggregation::Totals(v)) => totals = Some(v),
                Ok(SubAggregation::Categories(v)) => categories = Some(v),
                Ok(SubAggregation::Products(v)) => products = Some(v),
                Ok(SubAggregation::Stores(v)) => stores = Some(v),
                Ok(SubAggregation::Payments(v)) => payments = Some(v),
                Err(err) => errors.push(err),
            }
        }

        if !errors.is_empty() {
            warn!(
                failed = errors.len(),
                "aggregation branches failed, discarding partial results"
            );
            return Err(errors.swap_remove(0));
        }

        match (totals, categories, products, stores, payments) {
            (Some(totals), Some(categories), Some(products), Some(stores), Some(payments)) => {
                Ok(AggregatedStats::assemble(
                    totals, categories, products, stores, payments, top_limit,
                ))
            }
            // Unreachable while every branch sends exactly once, but a
            // lost branch must not turn into a partially merged success.
            _ => Err(SalescopeError::Query(
                "aggregation branch terminated without reporting".into(),
            )),
        }
    }
}
