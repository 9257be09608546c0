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

//! Error types shared across the Salescope crates.

use thiserror::Error;

/// Central error type for all Salescope operations.
#[derive(Debug, Error)]
pub enum SalescopeError {
    /// Invalid construction-time configuration (shard count, pool size, ...).
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A date range whose start lies after its end.
    #[error("invalid date range: {0}")]
    InvalidRange(String),

    /// An aggregation branch's query against the data source failed.
    /// Surfaces to callers as "stats unavailable for this range".
    #[error("query failed: {0}")]
    Query(String),

    /// Task submission after the worker pool stopped accepting work.
    #[error("worker pool is closed")]
    PoolClosed,

    /// A batch export failed; `batch` names the first failed batch so the
    /// caller can report "export incomplete, batch N failed".
    #[error("export incomplete, batch {batch} failed: {message}")]
    Export { batch: usize, message: String },
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, SalescopeError>;
