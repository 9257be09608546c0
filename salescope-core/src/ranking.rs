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

//! Top-N ranking by a numeric measure.

use std::cmp::Reverse;

/// Order `items` descending by `measure` and keep at most `limit` of them.
///
/// Runs in O(n log n). The sort is stable, so items with equal measures
/// keep their original relative order — callers can rely on that tie-break
/// for deterministic output.
pub fn rank_top_n<T, M, F>(mut items: Vec<T>, measure: F, limit: usize) -> Vec<T>
where
    M: Ord,
    F: Fn(&T) -> M,
{
    items.sort_by_key(|item| Reverse(measure(item)));
    items.truncate(limit);
    items
}
