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

//! Deterministic cache-key construction from ordered parts.

/// Builds cache keys from an ordered sequence of parts.
///
/// Identical part sequences always produce identical keys. Parts are
/// joined with `:`; string parts must not contain the separator
/// themselves (integer parts are rendered in decimal and cannot).
#[derive(Debug, Clone)]
pub struct KeyBuilder {
    parts: Vec<String>,
}

impl KeyBuilder {
    /// Start a key under `namespace`, typically the owning component name.
    pub fn new(namespace: &str) -> Self {
        debug_assert!(!namespace.contains(':'));
        Self {
            parts: vec![namespace.to_string()],
        }
    }

    /// Append a string part.
    pub fn push(mut self, part: &str) -> Self {
        debug_assert!(!part.contains(':'));
        self.parts.push(part.to_string());
        self
    }

    /// Append an integer part.
    pub fn push_int(mut self, part: i64) -> Self {
        self.parts.push(part.to_string());
        self
    }

    /// Render the final key.
    pub fn build(self) -> String {
        self.parts.join(":")
    }
}
