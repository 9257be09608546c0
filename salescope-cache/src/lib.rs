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

//! Salescope Cache
//!
//! A sharded, TTL-based in-memory cache. Keys map to one of a fixed,
//! power-of-two number of shards, each guarded by its own read-write lock,
//! so unrelated keys never contend. Expiration is lazy on read with a
//! periodic best-effort sweep for housekeeping.

pub mod key;
pub mod sharded;

pub use key::KeyBuilder;
pub use sharded::{CacheConfig, CacheStats, ShardedCache, SweeperHandle};
