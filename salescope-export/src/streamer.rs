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

//! Ordered batch streaming over the worker pool.
//!
//! Rows are partitioned into consecutive batches of at most `batch_size`
//! (the last batch may be shorter) and each batch becomes one pool task.
//! Batches are encoded concurrently, but every batch writes into its
//! sequence-indexed slot under one merge lock and the final output is
//! concatenated in sequence order, so the export byte stream always
//! matches the input row order regardless of which worker finished first.

use crate::pool::WorkerPool;
use parking_lot::Mutex;
use salescope_core::{Result, SalescopeError};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Streaming parameters, fixed at construction.
#[derive(Debug, Clone)]
pub struct StreamerConfig {
    /// Maximum rows per batch.
    pub batch_size: usize,
}

impl Default for StreamerConfig {
    fn default() -> Self {
        Self { batch_size: 1000 }
    }
}

/// Splits row sets into batches and drives them through a [`WorkerPool`].
pub struct BatchStreamer {
    config: StreamerConfig,
}

impl BatchStreamer {
    pub fn new(config: StreamerConfig) -> Result<Self> {
        if config.batch_size == 0 {
            return Err(SalescopeError::Config(
                "batch size must be non-zero".into(),
            ));
        }
        Ok(Self { config })
    }

    /// Encode `rows` in batches on `pool` and return the merged output.
    ///
    /// Starts the pool if needed and drains it before returning. On any
    /// batch failure the whole export fails with the lowest failed batch
    /// sequence number; the remaining batches still ran (or were skipped
    /// by the pool's own shutdown), their output is discarded.
    pub async fn stream<R, F>(&self, pool: &mut WorkerPool, rows: Vec<R>, encode: F) -> Result<Vec<u8>>
    where
        R: Send + 'static,
        F: Fn(&[R]) -> anyhow::Result<Vec<u8>> + Clone + Send + Sync + 'static,
    {
        let batch_size = self.config.batch_size;
        let batch_count = rows.len().div_ceil(batch_size);
        debug!(
            rows = rows.len(),
            batch_size, batch_count, "streaming rows in batches"
        );

        // One slot per batch, filled concurrently under a single merge lock.
        let slots: Arc<Mutex<Vec<Option<Vec<u8>>>>> =
            Arc::new(Mutex::new(vec![None; batch_count]));
        let mut batch_of_task: HashMap<u64, usize> = HashMap::with_capacity(batch_count);

        pool.start();

        let mut remaining = rows;
        let mut seq = 0usize;
        while !remaining.is_empty() {
            let rest = remaining.split_off(batch_size.min(remaining.len()));
            let batch = std::mem::replace(&mut remaining, rest);

            let slots = Arc::clone(&slots);
            let encode = encode.clone();
            let task_id = pool
                .submit(Box::new(move || {
                    let bytes = encode(&batch)?;
                    slots.lock()[seq] = Some(bytes);
                    Ok(())
                }))
                .await?;
            batch_of_task.insert(task_id, seq);
            seq += 1;
        }

        pool.wait().await;

        let mut failures = pool.take_errors();
        if !failures.is_empty() {
            failures.sort_by_key(|e| batch_of_task.get(&e.task_id).copied());
            let first = &failures[0];
            let batch = batch_of_task.get(&first.task_id).copied().unwrap_or(0);
            return Err(SalescopeError::Export {
                batch,
                message: first.source.to_string(),
            });
        }

        let mut slots = slots.lock();
        let mut merged = Vec::new();
        for (index, slot) in slots.iter_mut().enumerate() {
            match slot.take() {
                Some(bytes) => merged.extend_from_slice(&bytes),
                None => {
                    // A task that neither failed nor filled its slot means
                    // the pool was stopped underneath us.
                    return Err(SalescopeError::Export {
                        batch: index,
                        message: "batch produced no output".into(),
                    });
                }
            }
        }

        debug!(bytes = merged.len(), "export batches merged");
        Ok(merged)
    }
}
