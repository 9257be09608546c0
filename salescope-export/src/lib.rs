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

//! Salescope Export
//!
//! Bulk export pipeline: an ordered row set is split into fixed-size
//! batches, each batch is serialized by a bounded worker pool, and the
//! encoded batches are merged back in their original order. The pool's
//! bounded queue is the backpressure mechanism; task failures are
//! accumulated, never dropped, and fail the export naming the first
//! broken batch.

pub mod csv;
pub mod pool;
pub mod service;
pub mod streamer;

pub use csv::{CsvEncoder, RowEncoder};
pub use pool::{PoolConfig, Task, TaskError, WorkerPool};
pub use service::ExportService;
pub use streamer::{BatchStreamer, StreamerConfig};
