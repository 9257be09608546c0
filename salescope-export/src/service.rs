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

//! High-level export entry point: data source → batches → CSV bytes.

use crate::csv::{CsvEncoder, RowEncoder};
use crate::pool::{PoolConfig, WorkerPool};
use crate::streamer::{BatchStreamer, StreamerConfig};
use salescope_core::{DateRange, Result};
use salescope_query::SalesQueryExecutor;
use std::sync::Arc;
use tracing::info;

/// Produces bulk CSV exports for a date range.
///
/// Each export runs on its own freshly constructed worker pool, so
/// concurrent exports never share a queue and a failed export leaves no
/// state behind.
pub struct ExportService<E> {
    executor: Arc<E>,
    streamer: BatchStreamer,
    pool_config: PoolConfig,
}

impl<E: SalesQueryExecutor + 'static> ExportService<E> {
    pub fn new(
        executor: Arc<E>,
        streamer_config: StreamerConfig,
        pool_config: PoolConfig,
    ) -> Result<Self> {
        Ok(Self {
            executor,
            streamer: BatchStreamer::new(streamer_config)?,
            pool_config,
        })
    }

    /// Export every order line in `range` as CSV: fixed header, rows in
    /// the data source's order.
    pub async fn export_csv(&self, range: DateRange) -> Result<Vec<u8>> {
        let rows = self.executor.export_rows(range).await?;
        info!(
            rows = rows.len(),
            start = %range.start(),
            end = %range.end(),
            "starting batched CSV export"
        );

        let encoder = Arc::new(CsvEncoder);
        let mut pool = WorkerPool::new(self.pool_config.clone())?;

        let body = {
            let encoder = Arc::clone(&encoder);
            self.streamer
                .stream(&mut pool, rows, move |batch| encoder.encode_batch(batch))
                .await?
        };

        let mut out = encoder.header().into_bytes();
        out.extend_from_slice(&body);
        Ok(out)
    }
}
