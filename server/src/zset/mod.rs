/*
 * This file is part of kvd, an in-memory key-value server.
 *
 * Copyright (c) 2024, the kvd authors
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program. If not, see <https://www.gnu.org/licenses/>.
 *
*/

//! # Ordered set (component C, §4.C)
//!
//! Pairs the hash table (component A) with the order-statistic AVL tree
//! (component B) to give every zset O(1) point lookup by name and O(log n)
//! rank/range queries by score.

pub mod znode;
#[allow(clippy::module_inception)]
mod zset;

pub use zset::ZSet;
pub use znode::ZKey;
