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

//! # Hash table with progressive rehash
//!
//! The primary key space's index (component A, §4.A). A chained bucket
//! array ([`htab::HTab`]) plus a pair-of-tables scheme ([`hmap::HMap`]) that
//! spreads the cost of growth across many subsequent operations instead of
//! stopping the world to rehash everything at once.

pub mod fnv;
pub mod hmap;
pub mod htab;

pub use hmap::HMap;
pub use htab::{HNode, HTab};
