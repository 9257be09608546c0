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

//! Salescope Query
//!
//! The aggregation orchestrator: fans out the five independent statistics
//! queries for a date range in parallel, joins their results into one
//! [`salescope_core::AggregatedStats`], and fronts the whole computation
//! with the sharded TTL cache. The data source is an injected
//! [`SalesQueryExecutor`] capability; this crate never talks to storage
//! directly.

pub mod aggregator;
pub mod executor;

pub use aggregator::{AggregatorConfig, StatsAggregator, BRANCH_COUNT};
pub use executor::SalesQueryExecutor;
